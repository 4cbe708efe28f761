use axum::{Extension, Router, extract::State, routing::post};
use serde::Deserialize;

use crate::{
    app::AppState,
    auth::Identity,
    common::{ApiError, ApiResponse, ApiResult},
    config,
    params::Json,
    updates::{TriggerReport, TriggerTarget, trigger_updates},
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/trigger", post(trigger))
}

#[derive(Debug, Deserialize)]
pub struct TriggerEntry {
    pub winget_id: String,
    /// Defaults to the caller's own tenant; MSP callers name other tenants.
    pub tenant_id: Option<String>,
}

/// Either one update or a batch, matching what callers send.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TriggerPayload {
    Batch { updates: Vec<TriggerEntry> },
    Single(TriggerEntry),
}

impl TriggerPayload {
    fn into_targets(self, identity: &Identity) -> Vec<TriggerTarget> {
        let entries = match self {
            TriggerPayload::Batch { updates } => updates,
            TriggerPayload::Single(entry) => vec![entry],
        };
        entries
            .into_iter()
            .map(|entry| TriggerTarget {
                winget_id: entry.winget_id,
                tenant_id: entry
                    .tenant_id
                    .unwrap_or_else(|| identity.tenant_id.clone()),
            })
            .collect()
    }
}

/// Triggers packaging for one or more detected updates.
#[axum::debug_handler]
pub async fn trigger(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<TriggerPayload>,
) -> ApiResult<ApiResponse<TriggerReport>> {
    let updates_config = config::get().updates();

    let targets = payload.into_targets(&identity);
    if targets.is_empty() {
        return Err(ApiError::Validation(
            "at least one update is required".to_string(),
        ));
    }
    let limit = updates_config.batch_limit();
    if targets.len() > limit {
        return Err(ApiError::Validation(format!(
            "a maximum of {limit} updates can be triggered per call"
        )));
    }

    let report = trigger_updates(
        &state.db,
        &state.catalog,
        &state.dispatch,
        state.audit.as_ref(),
        &identity,
        &targets,
        updates_config,
    )
    .await;

    Ok(ApiResponse::ok("updates triggered", Some(report)))
}
