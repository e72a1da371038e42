//! Registry, repository and digest identity for a single image


mod digest;
mod registry;
mod repository;

pub use digest::ContentDigest;
pub use registry::{Registry, DEFAULT_REGISTRY_SUFFIX};
pub use repository::Repository;

use std::fmt;

/// Where an image lives, and which exact content we are asking about
///
/// These are the only inputs the provenance lookup needs besides a
/// credential. They are validated on construction, so a malformed argument
/// is rejected before any network traffic happens.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ImageCoordinates {
    registry: Registry,
    repository: Repository,
    digest: ContentDigest,
}

impl ImageCoordinates {
    pub fn new(registry: Registry, repository: Repository, digest: ContentDigest) -> Self {
        ImageCoordinates {
            registry,
            repository,
            digest,
        }
    }

    /// Parse all three parts from strings, deriving the registry host from a
    /// short registry name plus `suffix`
    ///
    /// The digest must be a complete `sha256:<64 hex>` manifest digest.
    ///
    /// ```
    /// # use revprobe::ImageCoordinates;
    /// let image = ImageCoordinates::from_short_name(
    ///     "example",
    ///     ".azurecr.io",
    ///     "raptor/frontend",
    ///     "sha256:00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff",
    /// )
    /// .unwrap();
    /// assert_eq!(image.registry().as_str(), "example.azurecr.io");
    /// ```
    pub fn from_short_name(
        registry_name: &str,
        suffix: &str,
        repository: &str,
        digest: &str,
    ) -> Result<Self, crate::errors::ImageError> {
        let parsed: ContentDigest = digest.parse()?;
        if !parsed.is_sha256() {
            return Err(crate::errors::ImageError::InvalidReferenceFormat(
                digest.to_owned(),
            ));
        }
        Ok(ImageCoordinates::new(
            Registry::from_short_name(registry_name, suffix)?,
            repository.parse()?,
            parsed,
        ))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn digest(&self) -> &ContentDigest {
        &self.digest
    }
}

impl fmt::Display for ImageCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.registry, self.repository, self.digest)
    }
}

impl fmt::Debug for ImageCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
