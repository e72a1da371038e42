//! Support for reading image metadata from a registry server

mod auth;
mod client;

pub use auth::{AccessToken, RefreshToken};
pub use client::*;
