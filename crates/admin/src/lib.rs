//! Tandem Admin library.
//!
//! This crate provides the catalog management panel as a library, allowing
//! it to be tested and reused.
//!
//! # Security
//!
//! This crate contains HIGH PRIVILEGE access:
//! - Object store service key (full bucket write access)
//! - Catalog database (full read/write)
//!
//! Only deploy on VPN-protected infrastructure.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod media;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
