pub mod html_player;
pub mod player;
pub mod token;
pub mod user;
