#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use signdesk::api::{self, AppState};
use signdesk::config::Config;
use signdesk::db::NewUser;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "root@signdesk.test";
pub const USER_EMAIL: &str = "user@signdesk.test";
pub const PASSWORD: &str = "secret123";

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub root: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

pub fn test_config(root: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", root.join("signdesk.db").display());
    config.general.max_db_connections = 2;
    config.media.media_path = root.join("media").display().to_string();
    config.media.default_timezone = "UTC".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(tweak: impl FnOnce(&mut Config)) -> TestApp {
    let root = std::env::temp_dir().join(format!("signdesk-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&root).unwrap();

    let mut config = test_config(&root);
    tweak(&mut config);
    let security = config.security.clone();

    let state = api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    for (username, email, is_admin) in [("root", ADMIN_EMAIL, true), ("user", USER_EMAIL, false)] {
        state
            .store()
            .create_user(
                NewUser {
                    username: username.to_string(),
                    email: email.to_string(),
                    password: PASSWORD.to_string(),
                    is_admin,
                },
                &security,
            )
            .await
            .unwrap();
    }

    let router = api::router(state.clone());
    TestApp {
        router,
        state,
        root,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/sessions",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, PASSWORD).await
    }

    pub async fn user_token(&self) -> String {
        self.login(USER_EMAIL, PASSWORD).await
    }

    pub async fn user_id(&self, email: &str) -> i32 {
        self.state
            .store()
            .get_user_by_email(email)
            .await
            .unwrap()
            .unwrap()
            .id
    }

    pub fn media_path(&self, file: &str) -> PathBuf {
        self.root.join("media").join(file)
    }
}
