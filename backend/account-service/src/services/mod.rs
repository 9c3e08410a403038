pub mod assets;
pub mod auth_service;

pub use assets::{AssetStore, HttpAssetStore, UploadedAsset};
pub use auth_service::{AuthService, LoginOutcome, TokenPair};
