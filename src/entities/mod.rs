pub mod prelude;

pub mod access_tokens;
pub mod html_players;
pub mod password_tokens;
pub mod players;
pub mod users;
