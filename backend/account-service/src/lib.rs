// Account Service Library

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod security;
pub mod services;
pub mod validators;

use std::sync::Arc;

pub use error::{AppError, Result};
pub use models::{User, UserProfile};

use services::{AssetStore, AuthService};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub assets: Arc<dyn AssetStore>,
}
