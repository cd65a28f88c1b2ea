//! Relay client for communicating with the Jito block engine
//!
//! This crate handles bundle submission, tip account discovery, bundle
//! result subscriptions, authentication and health monitoring.

pub mod auth;
pub mod client;
pub mod health;
mod subscription;
pub mod traits;

pub use auth::*;
pub use client::*;
pub use health::*;
pub use traits::*;
