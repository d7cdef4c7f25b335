mod users;

pub use users::{cmd_create_user, cmd_list_users};
