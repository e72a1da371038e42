//! Recover the source-control commit that produced a container image
//!
//! Given a registry, a repository and an image digest, a [registry::Client]
//! exchanges a refresh token for a pull-scoped access token, resolves the
//! manifest (following a multi-platform index to its first entry), and reads
//! the `org.opencontainers.image.revision` label from the image config blob.
//!
//! Registry failures never escape [registry::Client::resolve_commit]; they are
//! logged and the result is simply empty.

#[macro_use] extern crate lazy_static;
#[macro_use] extern crate serde;

pub mod errors;
pub mod image;
pub mod manifest;
pub mod provenance;
pub mod registry;

pub use crate::{
    image::{ContentDigest, ImageCoordinates, Registry, Repository},
    provenance::{Stage, StageError},
    registry::{AccessToken, Client, ClientBuilder, RefreshToken},
};
