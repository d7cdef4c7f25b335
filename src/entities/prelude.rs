pub use super::access_tokens::Entity as AccessTokens;
pub use super::html_players::Entity as HtmlPlayers;
pub use super::password_tokens::Entity as PasswordTokens;
pub use super::players::Entity as Players;
pub use super::users::Entity as Users;
