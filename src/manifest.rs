//! Partial models of the OCI image manifest, image index and config blob
//!
//! Reference: <https://github.com/opencontainers/image-spec/blob/main/manifest.md>
//! and <https://docs.docker.com/registry/spec/manifest-v2-2/>
//!
//! Only the fields needed to get from a manifest digest to an image label
//! are modelled. Everything else in these documents is ignored.

use crate::{errors::ImageError, image::ContentDigest};
use serde::Deserialize;
use std::collections::HashMap;

pub mod media_types {
    pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
    pub const OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";
    pub const DOCKER_MANIFEST: &str = "application/vnd.docker.distribution.manifest.v2+json";
    pub const DOCKER_MANIFEST_LIST: &str =
        "application/vnd.docker.distribution.manifest.list.v2+json";

    /// Every manifest type we know how to interpret, for the `Accept` header
    pub const ACCEPT_MANIFESTS: &str = concat!(
        "application/vnd.oci.image.index.v1+json, ",
        "application/vnd.docker.distribution.manifest.list.v2+json, ",
        "application/vnd.oci.image.manifest.v1+json, ",
        "application/vnd.docker.distribution.manifest.v2+json",
    );
}

/// OCI-standard label holding the source revision an image was built from
pub const REVISION_LABEL: &str = "org.opencontainers.image.revision";

/// Either kind of manifest document, as returned by the manifests endpoint
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(rename = "mediaType", default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub config: Option<Link>,
    #[serde(default)]
    pub manifests: Vec<PlatformLink>,
}

/// Content descriptor for a config blob
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Link {
    #[serde(rename = "mediaType", default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    pub digest: String,
}

/// One entry of an image index or manifest list
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PlatformLink {
    #[serde(rename = "mediaType", default)]
    pub media_type: Option<String>,
    pub digest: String,
    #[serde(default)]
    pub platform: Option<Platform>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Platform {
    pub architecture: String,
    pub os: String,
    #[serde(default)]
    pub variant: Option<String>,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)?;
        if let Some(variant) = &self.variant {
            write!(f, "/{}", variant)?;
        }
        Ok(())
    }
}

/// What a fetched manifest turned out to be
#[derive(Clone, Debug)]
pub enum ManifestKind {
    /// A single-platform image manifest, pointing at its config blob
    Image(ContentDigest),
    /// An index, with at least one platform manifest
    Index(Vec<PlatformLink>),
}

impl Manifest {
    /// Decide whether this is an image manifest or an index
    ///
    /// The document's own `mediaType` wins; if it has none, the response
    /// `Content-Type` is used, and failing that the shape of the document.
    pub fn kind(&self, content_type: Option<&str>) -> Result<ManifestKind, ImageError> {
        let declared = self
            .media_type
            .as_deref()
            .or(content_type)
            .map(|s| s.split(';').next().unwrap_or(s).trim());
        match declared {
            Some(media_types::OCI_INDEX) | Some(media_types::DOCKER_MANIFEST_LIST) => {
                self.as_index()
            }
            Some(media_types::OCI_MANIFEST) | Some(media_types::DOCKER_MANIFEST) => {
                self.as_image()
            }
            Some(other) if !other.is_empty() && other != "application/json" => {
                Err(ImageError::UnsupportedManifestType(other.to_owned()))
            }
            _ => {
                if self.config.is_some() {
                    self.as_image()
                } else {
                    self.as_index()
                }
            }
        }
    }

    fn as_image(&self) -> Result<ManifestKind, ImageError> {
        match &self.config {
            Some(link) => Ok(ManifestKind::Image(link.digest.parse()?)),
            None => Err(ImageError::MissingConfigDigest),
        }
    }

    fn as_index(&self) -> Result<ManifestKind, ImageError> {
        if self.manifests.is_empty() {
            Err(ImageError::EmptyIndex)
        } else {
            Ok(ManifestKind::Index(self.manifests.clone()))
        }
    }
}

/// The image configuration blob
///
/// Labels live under `config.Labels`, and either level may be missing or
/// `null` in real images.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConfigBlob {
    #[serde(default)]
    pub config: Option<ImageConfig>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ImageConfig {
    #[serde(rename = "Labels", default)]
    pub labels: Option<HashMap<String, String>>,
}

impl ConfigBlob {
    pub fn labels(&self) -> Option<&HashMap<String, String>> {
        self.config.as_ref().and_then(|config| config.labels.as_ref())
    }

    /// Look up a label, treating blank values as missing
    ///
    /// The value comes back exactly as stored, surrounding whitespace
    /// included.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels()
            .and_then(|labels| labels.get(key))
            .map(|value| value.as_str())
            .filter(|value| !value.trim().is_empty())
    }
}
