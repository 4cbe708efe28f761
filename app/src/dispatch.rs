use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::DispatchConfig;
use crate::deployment::JobInputs;

/// Identifiers of the remote packaging run, when the collaborator reports
/// them.
#[derive(Debug, Clone, Default)]
pub struct DispatchReceipt {
    pub run_id: Option<String>,
    pub run_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("packaging dispatch unavailable: {0}")]
    Unavailable(String),

    #[error("packaging dispatch rejected the job: {0}")]
    Rejected(String),
}

/// Hands an assembled job off to the packaging collaborator. Dispatch is
/// fire-and-forget from the caller's perspective; packaging outcomes arrive
/// out of band.
#[async_trait]
pub trait PackagingDispatch: Send + Sync {
    async fn dispatch(&self, inputs: &JobInputs) -> Result<DispatchReceipt, DispatchError>;
}

pub struct HttpDispatch {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DispatchResponse {
    run_id: Option<String>,
    run_url: Option<String>,
}

impl HttpDispatch {
    pub fn from_config(config: &DispatchConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            token: config.token().map(str::to_string),
        })
    }
}

#[async_trait]
impl PackagingDispatch for HttpDispatch {
    async fn dispatch(&self, inputs: &JobInputs) -> Result<DispatchReceipt, DispatchError> {
        let endpoint = format!("{}/jobs/dispatch", self.base_url);

        let mut request = self.client.post(endpoint).json(&json!({ "inputs": inputs }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| DispatchError::Unavailable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected(format!("{status}: {detail}")));
        }

        let body: DispatchResponse = response
            .json()
            .await
            .map_err(|err| DispatchError::Unavailable(err.to_string()))?;

        Ok(DispatchReceipt {
            run_id: body.run_id,
            run_url: body.run_url,
        })
    }
}

/// Dispatch that never leaves the process. Selected via
/// `dispatch.local_packager`; also the fake the test suite records against.
#[derive(Default)]
pub struct LocalDispatch;

#[async_trait]
impl PackagingDispatch for LocalDispatch {
    async fn dispatch(&self, inputs: &JobInputs) -> Result<DispatchReceipt, DispatchError> {
        tracing::info!(display_name = %inputs.display_name, "packaging job recorded locally");
        Ok(DispatchReceipt::default())
    }
}
