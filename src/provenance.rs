//! Resolve an image digest to the commit it was built from
//!
//! The lookup is three registry round trips in strict sequence: token
//! exchange, manifest resolution, label extraction. The first failure ends
//! the lookup. Missing provenance is an expected condition (repositories and
//! tags get deleted out from under deployments), so [Client::resolve_commit]
//! reports failures as log warnings and an empty result rather than an error.

use crate::{
    errors::ImageError,
    image::ImageCoordinates,
    registry::{Client, RefreshToken},
};
use std::fmt;
use thiserror::Error;

/// Which part of the lookup failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Authentication,
    Resolution,
    Extraction,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Authentication => "authentication",
            Stage::Resolution => "manifest resolution",
            Stage::Extraction => "label extraction",
        })
    }
}

/// A registry failure, tagged with the stage it happened in
#[derive(Error, Debug)]
#[error("{stage} failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: ImageError,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, StageError>;
}

impl<T> AtStage<T> for Result<T, ImageError> {
    fn at(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|source| StageError { stage, source })
    }
}

impl Client {
    /// Look up the commit label for an image, keeping the failure reason
    pub async fn try_resolve_commit(
        &self,
        image: &ImageCoordinates,
        refresh_token: &RefreshToken,
    ) -> Result<String, StageError> {
        let registry = image.registry();
        let repository = image.repository();

        let token = self
            .exchange_token(registry, repository, refresh_token)
            .await
            .at(Stage::Authentication)?;

        let config_digest = self
            .resolve_config_digest(registry, repository, image.digest(), &token)
            .await
            .at(Stage::Resolution)?;

        let commit = self
            .extract_label(registry, repository, &config_digest, &token, self.label_key())
            .await
            .at(Stage::Extraction)?;

        log::info!("{} was built from {}", image, commit);
        Ok(commit)
    }

    /// Look up the commit label for an image
    ///
    /// Returns `None` if anything along the way fails, after logging a
    /// warning that names the failed stage.
    pub async fn resolve_commit(
        &self,
        image: &ImageCoordinates,
        refresh_token: &RefreshToken,
    ) -> Option<String> {
        match self.try_resolve_commit(image, refresh_token).await {
            Ok(commit) => Some(commit),
            Err(err) => {
                log::warn!("no commit for {}: {}", image, err);
                None
            }
        }
    }
}
