//! Registry client for the token, manifest and blob endpoints

use crate::{
    errors::ImageError,
    image::{ContentDigest, Registry, Repository},
    manifest::{media_types, ConfigBlob, Manifest, ManifestKind, REVISION_LABEL},
    registry::auth::{self, AccessToken, RefreshToken},
};
use http::header::HeaderValue;
use reqwest::{header, header::HeaderMap};
use std::{collections::HashSet, convert::TryInto, time::Duration};

/// How many image indexes we will follow before giving up
pub const MAX_INDEX_DEPTH: usize = 4;

/// Builder for configuring custom [Client] instances
#[derive(Debug)]
pub struct ClientBuilder {
    req: reqwest::ClientBuilder,
    label: String,
    allowed_registries: Option<HashSet<Registry>>,
    allow_http_registries: bool,
    verify_content_digests: bool,
}

impl ClientBuilder {
    /// Start constructing a custom registry client
    pub fn new() -> Self {
        let req = reqwest::Client::builder().user_agent(Client::default_user_agent());
        ClientBuilder {
            req,
            label: REVISION_LABEL.to_owned(),
            allowed_registries: None,
            allow_http_registries: true,
            verify_content_digests: false,
        }
    }

    /// Disallow connecting to registries via HTTP
    ///
    /// Registry hosts with no dots in their domain, like `localhost:5000`,
    /// are contacted over unencrypted HTTP. This setting disallows them.
    pub fn disallow_http(mut self) -> Self {
        self.allow_http_registries = false;
        self
    }

    /// Set a list of allowed registry servers
    ///
    /// All connections will be checked against this list. If no allowed
    /// registry list is set, any server will be allowed. An empty allow list
    /// will disallow all connections.
    pub fn allow_only_connections_to(mut self, allowed: HashSet<Registry>) -> Self {
        self.allowed_registries = Some(allowed);
        self
    }

    /// Read a different label from the image config
    ///
    /// Defaults to [REVISION_LABEL].
    pub fn label<S: Into<String>>(mut self, key: S) -> Self {
        self.label = key.into();
        self
    }

    /// Hash every manifest and config blob we download, and reject content
    /// that doesn't match the digest it was requested by
    pub fn verify_content_digests(mut self) -> Self {
        self.verify_content_digests = true;
        self
    }

    /// Set a timeout for each network request
    ///
    /// This timeout applies from the beginning of a request until the last
    /// byte has been received. By default there is no timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.req = self.req.timeout(timeout);
        self
    }

    /// Set a timeout for only the initial connect phase of each network request
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.req = self.req.connect_timeout(timeout);
        self
    }

    /// Sets the `User-Agent` header used by this client
    pub fn user_agent<V>(mut self, value: V) -> Self
    where
        V: TryInto<HeaderValue>,
        V::Error: Into<http::Error>,
    {
        self.req = self.req.user_agent(value);
        self
    }

    /// Set the default headers for every HTTP request
    pub fn default_request_headers(mut self, headers: HeaderMap) -> Self {
        self.req = self.req.default_headers(headers);
        self
    }

    /// Construct a Client using the parameters from this Builder
    pub fn build(self) -> Result<Client, ImageError> {
        Ok(Client {
            req: self.req.build()?,
            label: self.label,
            allowed_registries: self.allowed_registries,
            allow_http_registries: self.allow_http_registries,
            verify_content_digests: self.verify_content_digests,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        ClientBuilder::new()
    }
}

/// Registry clients read image manifests and config blobs
///
/// A client holds transport settings and policy only. Credentials are passed
/// in per call and nothing is cached between calls, so one client can serve
/// any number of independent lookups, concurrently if you like.
#[derive(Clone, Debug)]
pub struct Client {
    req: reqwest::Client,
    label: String,
    allowed_registries: Option<HashSet<Registry>>,
    allow_http_registries: bool,
    verify_content_digests: bool,
}

impl Client {
    /// Construct a new registry client with default options
    pub fn new() -> Result<Client, ImageError> {
        Client::builder().build()
    }

    /// Construct a registry client with custom options, via ClientBuilder
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Return the default `User-Agent` that we use if no other is set
    pub fn default_user_agent() -> HeaderValue {
        static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
        HeaderValue::from_static(USER_AGENT)
    }

    /// The config label this client extracts
    pub fn label_key(&self) -> &str {
        &self.label
    }

    fn is_registry_allowed(&self, registry: &Registry) -> bool {
        (self.allow_http_registries || registry.is_https())
            && match &self.allowed_registries {
                None => true,
                Some(allow_list) => allow_list.contains(registry),
            }
    }

    /// Exchange a refresh token for an access token that can pull from one
    /// repository
    pub async fn exchange_token(
        &self,
        registry: &Registry,
        repository: &Repository,
        refresh_token: &RefreshToken,
    ) -> Result<AccessToken, ImageError> {
        if !self.is_registry_allowed(registry) {
            log::warn!("registry {} not allowed by configuration", registry);
            return Err(ImageError::RegistryNotAllowed(registry.clone()));
        }
        auth::exchange(&self.req, registry, repository, refresh_token).await
    }

    /// Find the config blob digest for a manifest digest
    ///
    /// If the digest names an image index or manifest list, the first listed
    /// platform manifest is followed. The label we're after is the same on
    /// every platform, so there is no platform matching.
    pub async fn resolve_config_digest(
        &self,
        registry: &Registry,
        repository: &Repository,
        digest: &ContentDigest,
        token: &AccessToken,
    ) -> Result<ContentDigest, ImageError> {
        let mut digest = digest.clone();
        for depth in 0..=MAX_INDEX_DEPTH {
            let (manifest, content_type) =
                self.pull_manifest(registry, repository, &digest, token).await?;
            match manifest.kind(content_type.as_deref())? {
                ManifestKind::Image(config) => {
                    log::info!("{}@{} has config {}", repository, digest, config);
                    return Ok(config);
                }
                ManifestKind::Index(entries) => {
                    if depth == MAX_INDEX_DEPTH {
                        break;
                    }
                    let first = &entries[0];
                    log::info!(
                        "{}@{} is an index of {} manifests, following {} ({})",
                        repository,
                        digest,
                        entries.len(),
                        first.digest,
                        first
                            .platform
                            .as_ref()
                            .map(|p| p.to_string())
                            .unwrap_or_else(|| "unknown platform".to_owned())
                    );
                    digest = first.digest.parse()?;
                }
            }
        }
        Err(ImageError::IndexTooDeep(MAX_INDEX_DEPTH))
    }

    /// Read one label from the config blob at `config_digest`
    ///
    /// A label that is missing, present but blank, or split over several
    /// lines is an error here. Otherwise the value is returned untouched.
    pub async fn extract_label(
        &self,
        registry: &Registry,
        repository: &Repository,
        config_digest: &ContentDigest,
        token: &AccessToken,
        label_key: &str,
    ) -> Result<String, ImageError> {
        let data = self.pull_blob(registry, repository, config_digest, token).await?;
        log::trace!("raw json config, {}", String::from_utf8_lossy(&data));
        let config: ConfigBlob = serde_json::from_slice(&data)?;
        match config.label(label_key) {
            Some(value) if value.contains(|c: char| c == '\n' || c == '\r') => {
                Err(ImageError::MultilineLabel(label_key.to_owned()))
            }
            Some(value) => Ok(value.to_owned()),
            None => Err(ImageError::LabelNotFound(label_key.to_owned())),
        }
    }

    async fn pull_manifest(
        &self,
        registry: &Registry,
        repository: &Repository,
        digest: &ContentDigest,
        token: &AccessToken,
    ) -> Result<(Manifest, Option<String>), ImageError> {
        let url = registry.endpoint(&format!("/v2/{}/manifests/{}", repository, digest))?;
        log::debug!("{}@{} <{}> downloading manifest...", repository, digest, url);
        let response = token
            .include(self.req.get(url))
            .header(header::ACCEPT, media_types::ACCEPT_MANIFESTS)
            .send()
            .await?
            .error_for_status()?;
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_owned());
        let data = response.bytes().await?;
        self.check_content(digest, &data)?;
        log::trace!("raw json manifest, {}", String::from_utf8_lossy(&data));
        Ok((serde_json::from_slice(&data)?, content_type))
    }

    async fn pull_blob(
        &self,
        registry: &Registry,
        repository: &Repository,
        digest: &ContentDigest,
        token: &AccessToken,
    ) -> Result<Vec<u8>, ImageError> {
        let url = registry.endpoint(&format!("/v2/{}/blobs/{}", repository, digest))?;
        log::debug!("{}@{} <{}> downloading blob...", repository, digest, url);
        let data = token
            .include(self.req.get(url))
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        self.check_content(digest, &data)?;
        Ok(data.to_vec())
    }

    fn check_content(&self, digest: &ContentDigest, data: &[u8]) -> Result<(), ImageError> {
        if self.verify_content_digests {
            digest.verify(data)
        } else {
            Ok(())
        }
    }
}
