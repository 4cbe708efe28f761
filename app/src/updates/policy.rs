use std::future::Future;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder,
};

use crate::entity::status::PolicyType;
use crate::entity::{update_policy, upload_history};

/// Runs `body` with the policy escalated to (auto_update, enabled) and
/// restores the prior (policy_type, is_enabled) pair on every exit path,
/// success or failure. A restore failure is logged; it never replaces the
/// body's result.
///
/// The outer error covers the escalation write only; the body's own result is
/// passed through untouched.
pub async fn with_escalated_policy<T, E, F, Fut>(
    db: &DatabaseConnection,
    policy: &update_policy::Model,
    body: F,
) -> Result<Result<T, E>, DbErr>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let prior_type = policy.policy_type.clone();
    let prior_enabled = policy.is_enabled;

    let already_escalated = prior_type == PolicyType::AutoUpdate.as_str() && prior_enabled;

    if !already_escalated {
        let mut active = policy.clone().into_active_model();
        active.policy_type = Set(PolicyType::AutoUpdate.as_str().to_string());
        active.is_enabled = Set(true);
        active.updated_at = Set(Utc::now());
        active.update(db).await?;
    }

    let result = body().await;

    if !already_escalated {
        let restore = update_policy::ActiveModel {
            id: Set(policy.id),
            policy_type: Set(prior_type),
            is_enabled: Set(prior_enabled),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Err(err) = restore.update(db).await {
            tracing::warn!(policy_id = policy.id, %err, "failed to restore update policy after escalation");
        }
    }

    Ok(result)
}

/// Looks up the update policy for one (user, tenant, winget id); when none
/// exists, derives one from the most recent successful deployment. Returns
/// None when there is no policy and no prior deployment to derive from.
pub async fn ensure_policy(
    db: &DatabaseConnection,
    user_id: &str,
    tenant_id: &str,
    winget_id: &str,
) -> Result<Option<update_policy::Model>, DbErr> {
    let existing = update_policy::Entity::find()
        .filter(update_policy::Column::UserId.eq(user_id))
        .filter(update_policy::Column::TenantId.eq(tenant_id))
        .filter(update_policy::Column::WingetId.eq(winget_id))
        .one(db)
        .await?;

    if let Some(policy) = existing {
        return Ok(Some(policy));
    }

    let history = upload_history::Entity::find()
        .filter(upload_history::Column::UserId.eq(user_id))
        .filter(upload_history::Column::TenantId.eq(tenant_id))
        .filter(upload_history::Column::WingetId.eq(winget_id))
        .filter(upload_history::Column::Status.eq("success"))
        .filter(upload_history::Column::DeploymentConfig.is_not_null())
        .order_by_desc(upload_history::Column::CreatedAt)
        .one(db)
        .await?;

    let Some(history) = history else {
        return Ok(None);
    };
    let Some(deployment_config) = history.deployment_config else {
        return Ok(None);
    };

    let policy = update_policy::ActiveModel {
        user_id: Set(user_id.to_string()),
        tenant_id: Set(tenant_id.to_string()),
        winget_id: Set(winget_id.to_string()),
        policy_type: Set(PolicyType::AutoUpdate.as_str().to_string()),
        is_enabled: Set(true),
        deployment_config: Set(deployment_config),
        consecutive_failures: Set(0),
        last_auto_update_at: Set(None),
        upload_history_id: Set(Some(history.id)),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(Some(policy))
}
