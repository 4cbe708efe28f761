use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::audit::AuditSink;
use crate::auth::Identity;
use crate::catalog::CatalogService;
use crate::config::UpdatesConfig;
use crate::deployment::{DeploymentConfig, JobInputs, silent_switches};
use crate::dispatch::PackagingDispatch;
use crate::entity::{packaging_job, update_check, update_policy};

use super::{ensure_policy, with_escalated_policy};

const JOB_PENDING: &str = "pending";
const JOB_DISPATCHED: &str = "dispatched";

/// One update to trigger, addressed the way callers know it: by winget id
/// within a tenant. MSP callers fan one request across tenants this way.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TriggerTarget {
    pub winget_id: String,
    pub tenant_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerItemResult {
    pub winget_id: String,
    pub tenant_id: String,
    pub triggered: bool,
    pub error: Option<String>,
    pub packaging_job_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerReport {
    pub triggered: usize,
    pub failed: usize,
    pub results: Vec<TriggerItemResult>,
}

/// Triggers packaging for a batch of detected updates. Items fan out in
/// bounded waves and fail independently: a missing update check, an
/// unreachable catalog, or a database error on one item never aborts the
/// batch, so `triggered + failed` always equals the input count.
pub async fn trigger_updates(
    db: &DatabaseConnection,
    catalog: &Arc<dyn CatalogService>,
    dispatch: &Arc<dyn PackagingDispatch>,
    audit: &dyn AuditSink,
    identity: &Identity,
    targets: &[TriggerTarget],
    config: &UpdatesConfig,
) -> TriggerReport {
    let mut report = TriggerReport {
        triggered: 0,
        failed: 0,
        results: Vec::with_capacity(targets.len()),
    };

    let wave_size = config.wave_size().max(1);

    for wave_targets in targets.chunks(wave_size) {
        let mut wave = FuturesUnordered::new();
        for target in wave_targets {
            let catalog = Arc::clone(catalog);
            let dispatch = Arc::clone(dispatch);
            wave.push(async move {
                (target, trigger_one(db, &catalog, &dispatch, identity, target).await)
            });
        }

        while let Some((target, outcome)) = wave.next().await {
            match outcome {
                Ok(Ok(job_id)) => {
                    report.triggered += 1;
                    report.results.push(TriggerItemResult {
                        winget_id: target.winget_id.clone(),
                        tenant_id: target.tenant_id.clone(),
                        triggered: true,
                        error: None,
                        packaging_job_id: Some(job_id),
                    });
                }
                Ok(Err(message)) => {
                    tracing::warn!(winget_id = %target.winget_id, tenant_id = %target.tenant_id, error = %message, "update trigger failed");
                    report.failed += 1;
                    report.results.push(TriggerItemResult {
                        winget_id: target.winget_id.clone(),
                        tenant_id: target.tenant_id.clone(),
                        triggered: false,
                        error: Some(message),
                        packaging_job_id: None,
                    });
                }
                Err(err) => {
                    tracing::error!(winget_id = %target.winget_id, tenant_id = %target.tenant_id, %err, "update trigger hit a database error");
                    report.failed += 1;
                    report.results.push(TriggerItemResult {
                        winget_id: target.winget_id.clone(),
                        tenant_id: target.tenant_id.clone(),
                        triggered: false,
                        error: Some(err.to_string()),
                        packaging_job_id: None,
                    });
                }
            }
        }
    }

    // Stable order regardless of wave completion order.
    report.results.sort_by_key(|result| {
        targets.iter().position(|target| {
            target.winget_id == result.winget_id && target.tenant_id == result.tenant_id
        })
    });

    if let Err(err) = audit
        .record(
            "updates.triggered",
            json!({
                "requested": targets.len(),
                "triggered": report.triggered,
                "failed": report.failed,
            }),
        )
        .await
    {
        tracing::warn!(%err, "audit sink rejected update trigger event");
    }

    report
}

/// One update item end to end: locate the check, ensure a policy, escalate,
/// assemble job inputs, record the packaging job, dispatch. The inner Err is
/// the per-item failure message surfaced to the caller.
async fn trigger_one(
    db: &DatabaseConnection,
    catalog: &Arc<dyn CatalogService>,
    dispatch: &Arc<dyn PackagingDispatch>,
    identity: &Identity,
    target: &TriggerTarget,
) -> Result<Result<i32, String>, DbErr> {
    let check = update_check::Entity::find()
        .filter(update_check::Column::UserId.eq(identity.user_id.as_str()))
        .filter(update_check::Column::TenantId.eq(target.tenant_id.as_str()))
        .filter(update_check::Column::WingetId.eq(target.winget_id.as_str()))
        .order_by_desc(update_check::Column::DetectedAt)
        .one(db)
        .await?;
    let Some(check) = check else {
        return Ok(Err("Update not found".to_string()));
    };

    let policy =
        ensure_policy(db, &identity.user_id, &target.tenant_id, &check.winget_id).await?;
    let Some(policy) = policy else {
        return Ok(Err("No prior deployment found".to_string()));
    };

    let result = with_escalated_policy(db, &policy, || async {
        package_update(db, catalog.as_ref(), dispatch.as_ref(), identity, &check, &policy).await
    })
    .await?;

    match &result {
        Ok(_) => {
            let updated = update_policy::ActiveModel {
                id: Set(policy.id),
                consecutive_failures: Set(0),
                last_auto_update_at: Set(Some(Utc::now())),
                updated_at: Set(Utc::now()),
                ..Default::default()
            };
            updated.update(db).await?;
        }
        Err(_) => {
            let updated = update_policy::ActiveModel {
                id: Set(policy.id),
                consecutive_failures: Set(policy.consecutive_failures + 1),
                updated_at: Set(Utc::now()),
                ..Default::default()
            };
            updated.update(db).await?;
        }
    }

    Ok(result)
}

async fn package_update(
    db: &DatabaseConnection,
    catalog: &dyn CatalogService,
    dispatch: &dyn PackagingDispatch,
    identity: &Identity,
    check: &update_check::Model,
    policy: &update_policy::Model,
) -> Result<i32, String> {
    let manifest = catalog
        .manifest(&check.winget_id, Some(&check.latest_version))
        .await
        .ok()
        .flatten();
    let Some(manifest) = manifest else {
        return Err("Could not get installer information".to_string());
    };
    let Some(installer) = manifest.preferred_installer() else {
        return Err("Could not get installer information".to_string());
    };

    let deployment: DeploymentConfig =
        match serde_json::from_value(policy.deployment_config.clone()) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(policy_id = policy.id, %err, "unreadable deployment config, using defaults");
                DeploymentConfig::default()
            }
        };

    let detection_rules = if deployment.detection_rules.is_empty() {
        manifest.default_detection_rules()
    } else {
        deployment.detection_rules.clone()
    };

    let inputs = JobInputs {
        display_name: deployment
            .display_name
            .clone()
            .unwrap_or_else(|| check.winget_id.clone()),
        publisher: deployment.publisher.clone(),
        version: check.latest_version.clone(),
        installer_url: installer.url.clone(),
        installer_sha256: installer.sha256.clone(),
        silent_switches: silent_switches(
            deployment.install_command.as_deref(),
            installer.installer_type.as_deref(),
        )
        .or_else(|| installer.silent_switches.clone()),
        detection_rules,
        assignments: deployment.assignments.clone(),
        categories: deployment.categories.clone(),
        force_create: true,
    };

    let job_inputs = serde_json::to_value(&inputs).map_err(|err| err.to_string())?;

    let job = packaging_job::ActiveModel {
        user_id: Set(identity.user_id.clone()),
        tenant_id: Set(check.tenant_id.clone()),
        winget_id: Set(check.winget_id.clone()),
        display_name: Set(inputs.display_name.clone()),
        publisher: Set(inputs.publisher.clone()),
        version: Set(check.latest_version.clone()),
        status: Set(JOB_PENDING.to_string()),
        update_check_id: Set(Some(check.id)),
        job_inputs: Set(job_inputs),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|err| err.to_string())?;

    // Dispatch is fire-and-forget: the job row stays pending when the
    // collaborator is unreachable and the item still counts as triggered.
    match dispatch.dispatch(&inputs).await {
        Ok(receipt) => {
            let updated = packaging_job::ActiveModel {
                id: Set(job.id),
                status: Set(JOB_DISPATCHED.to_string()),
                run_id: Set(receipt.run_id),
                run_url: Set(receipt.run_url),
                updated_at: Set(Utc::now()),
                ..Default::default()
            };
            if let Err(err) = updated.update(db).await {
                tracing::warn!(job_id = job.id, %err, "failed to record dispatch receipt");
            }
        }
        Err(err) => {
            tracing::warn!(job_id = job.id, %err, "packaging dispatch failed, job stays pending");
        }
    }

    Ok(job.id)
}
