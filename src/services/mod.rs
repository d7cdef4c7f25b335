pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, AuthenticatedUser, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;

pub mod html;
pub use html::{CountdownConfig, NoticeStyle};

pub mod manifest;
pub use manifest::ManifestService;

pub mod media;
pub use media::{MediaError, MediaFile, MediaKind, MediaStorage};
