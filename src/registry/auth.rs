use crate::{
    errors::ImageError,
    image::{Registry, Repository},
};
use reqwest::RequestBuilder;
use std::fmt;

/// Long-lived credential, exchanged for a scoped [AccessToken]
///
/// Obtained by the caller through whatever identity mechanism the deployment
/// uses. It is only ever sent to the registry's token endpoint.
#[derive(Clone)]
pub struct RefreshToken(String);

impl RefreshToken {
    pub fn new(token: String) -> Result<Self, ImageError> {
        if token.trim().is_empty() {
            Err(ImageError::EmptyRefreshToken)
        } else {
            Ok(RefreshToken(token))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefreshToken(..)")
    }
}

/// Short-lived bearer credential, scoped to pulling one repository
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn include(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(..)")
    }
}

/// Token endpoint response
///
/// Azure-style endpoints answer with `access_token`, the Docker token spec
/// uses `token`.
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

impl TokenResponse {
    fn into_access_token(self) -> Result<AccessToken, ImageError> {
        self.access_token
            .into_iter()
            .chain(self.token)
            .find(|token| !token.is_empty())
            .map(AccessToken)
            .ok_or(ImageError::MissingAccessToken)
    }
}

/// Exchange a refresh token for a `repository:<repo>:pull` access token
///
/// Reference: <https://github.com/Azure/acr/blob/main/docs/AAD-OAuth.md>
pub async fn exchange(
    req: &reqwest::Client,
    registry: &Registry,
    repository: &Repository,
    refresh_token: &RefreshToken,
) -> Result<AccessToken, ImageError> {
    let url = registry.endpoint("/oauth2/token")?;
    let scope = repository.pull_scope();
    log::debug!("requesting {} token from {}", scope, url);
    let response: TokenResponse = req
        .post(url)
        .form(&[
            ("grant_type", "refresh_token"),
            ("service", registry.as_str()),
            ("scope", scope.as_str()),
            ("refresh_token", refresh_token.as_str()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let token = response.into_access_token()?;
    log::debug!("received token for {}", registry);
    Ok(token)
}
