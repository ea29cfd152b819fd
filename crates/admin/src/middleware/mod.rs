//! Middleware and extractors for the admin panel.

pub mod auth;

pub use auth::{
    COOKIE_NAME, RequireCatalogWrite, capability_token, verify_access_key, verify_capability,
};
