use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::common::error::ApiError;

/// The caller identity every tenant-scoped operation runs under. Resolved by
/// the identity collaborator; the core never inspects the credential itself.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub tenant_id: String,
    pub email: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, bearer: &str) -> Result<Identity, ApiError>;
}

/// Resolves identities against an external introspection endpoint.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct IntrospectResponse {
    user_id: String,
    tenant_id: String,
    email: Option<String>,
}

impl HttpIdentityProvider {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn resolve(&self, bearer: &str) -> Result<Identity, ApiError> {
        let endpoint = format!("{}/introspect", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(endpoint)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|err| ApiError::UnAuthorized(format!("identity lookup failed: {err}")))?;

        if !response.status().is_success() {
            return Err(ApiError::UnAuthorized("Invalid credential".to_string()));
        }

        let body: IntrospectResponse = response
            .json()
            .await
            .map_err(|err| ApiError::UnAuthorized(format!("identity response malformed: {err}")))?;

        Ok(Identity {
            user_id: body.user_id,
            tenant_id: body.tenant_id,
            email: body.email,
        })
    }
}

/// Fixed identity for userless deployments and tests.
pub struct StaticIdentityProvider {
    identity: Identity,
}

impl StaticIdentityProvider {
    pub fn new(user_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            identity: Identity {
                user_id: user_id.into(),
                tenant_id: tenant_id.into(),
                email: None,
            },
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, _bearer: &str) -> Result<Identity, ApiError> {
        Ok(self.identity.clone())
    }
}
