//! Error types you might see while resolving an image's provenance

use thiserror::Error;

/// Errors while talking to a registry or interpreting what it returns
#[derive(Error, Debug)]
pub enum ImageError {
    /// invalid image reference format
    #[error("invalid image reference format: {0:?}")]
    InvalidReferenceFormat(String),

    /// json error
    #[error("json error: {0}")]
    JSON(#[from] serde_json::Error),

    /// network request error
    #[error("network request error: {0}")]
    NetworkRequest(#[from] reqwest::Error),

    /// invalid registry url
    #[error("invalid registry url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// registry server is not allowed by the current configuration
    #[error("registry server is not allowed by the current configuration: {0}")]
    RegistryNotAllowed(crate::image::Registry),

    /// no refresh token was supplied
    #[error("no refresh token was supplied")]
    EmptyRefreshToken,

    /// token endpoint response did not include an access token
    #[error("token endpoint response did not include an access token")]
    MissingAccessToken,

    /// unsupported manifest media type
    #[error("unsupported manifest media type, {0:?}")]
    UnsupportedManifestType(String),

    /// image index lists no platform manifests
    #[error("image index lists no platform manifests")]
    EmptyIndex,

    /// image indexes are nested too deeply
    #[error("image indexes are nested more than {0} levels deep")]
    IndexTooDeep(usize),

    /// manifest has no config descriptor
    #[error("manifest has no config descriptor")]
    MissingConfigDigest,

    /// calculated digest of downloaded content is not what we asked for
    #[error("calculated digest of downloaded content is not what we asked for, expected {expected}, found {found}")]
    ContentDigestMismatch {
        expected: crate::image::ContentDigest,
        found: crate::image::ContentDigest,
    },

    /// label value spans more than one line
    #[error("value of label {0:?} contains a line break")]
    MultilineLabel(String),

    /// image config has no value for the requested label
    #[error("image config has no value for label {0:?}")]
    LabelNotFound(String),
}
