//! User management commands

use crate::api::validation::{USER_PASSWORD_MIN_LEN, is_valid_email};
use crate::config::Config;
use crate::db::{NewUser, Store};

pub async fn cmd_create_user(
    config: &Config,
    username: &str,
    email: &str,
    password: &str,
    is_admin: bool,
) -> anyhow::Result<()> {
    let username = username.trim();
    let email = email.trim();

    if username.is_empty() {
        anyhow::bail!("--username cannot be empty");
    }
    if !is_valid_email(email) {
        anyhow::bail!("--email must be a valid email address");
    }
    if password.chars().count() < USER_PASSWORD_MIN_LEN {
        anyhow::bail!("--password must be at least {USER_PASSWORD_MIN_LEN} characters");
    }

    let store = Store::new(&config.general.database_path).await?;

    if store.email_taken(email, None).await? {
        anyhow::bail!("email already in use: {email}");
    }
    if store.username_taken(username, None).await? {
        anyhow::bail!("username already in use: {username}");
    }

    let user = store
        .create_user(
            NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                is_admin,
            },
            &config.security,
        )
        .await?;

    println!(
        "✓ Created {} {} <{}> (ID: {})",
        if user.is_admin { "admin" } else { "user" },
        user.username,
        user.email,
        user.id
    );
    Ok(())
}

pub async fn cmd_list_users(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let users = store.list_users().await?;

    if users.is_empty() {
        println!("No users registered.");
        println!();
        println!("Add one with: signdesk create-user --username <name> --email <email> --password <pw>");
        return Ok(());
    }

    println!("Users ({} total)", users.len());
    println!("{:-<70}", "");

    for user in users {
        let role = if user.is_admin { "admin" } else { "user" };
        println!("• {} <{}> [{}]", user.username, user.email, role);
        println!("  ID: {} | Created: {}", user.id, user.created_at);
    }

    Ok(())
}
