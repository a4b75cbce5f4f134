//! Admin handlers for webhook management.
//!
//! CRUD for webhooks, their event-type triggers, and read access to the
//! execution log. Mutations here only change configuration; deliveries
//! happen on the trigger engine's own tasks.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use mqguard_core::error::CoreError;
use mqguard_core::events::ALL_EVENT_TYPES;
use mqguard_core::types::DbId;
use mqguard_db::models::webhook::{CreateWebhook, UpdateWebhook, WebhookAuthType};
use mqguard_db::repositories::WebhookRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::query::{clamp_limit, clamp_offset, PaginationParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Reject event types the bus never emits.
fn validate_event_types(event_types: &[String]) -> Result<(), AppError> {
    for event_type in event_types {
        if !ALL_EVENT_TYPES.contains(&event_type.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Unknown event type: {event_type}"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Webhook CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/webhooks
///
/// Create a webhook, optionally with active triggers for the given
/// event types.
pub async fn create_webhook(
    State(state): State<AppState>,
    Json(input): Json<CreateWebhook>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    if input.url.trim().is_empty() {
        return Err(AppError::BadRequest("url must not be empty".into()));
    }
    if let Some(event_types) = &input.event_types {
        validate_event_types(event_types)?;
    }

    let webhook = WebhookRepo::create(
        &state.pool,
        input.name.trim(),
        input.url.trim(),
        input.http_method.as_deref().unwrap_or("POST"),
        input
            .content_type
            .as_deref()
            .unwrap_or("application/json"),
        input
            .headers
            .as_ref()
            .unwrap_or(&serde_json::json!({})),
        input.payload_template.as_deref(),
        input.auth_type.unwrap_or(WebhookAuthType::None).as_str(),
        input.auth_secret.as_deref(),
        input.auth_header.as_deref(),
        input.timeout_secs.unwrap_or(10),
        input.retry_count.unwrap_or(3),
        input.retry_delay_secs.unwrap_or(5),
        input.is_active.unwrap_or(true),
    )
    .await?;

    if let Some(event_types) = &input.event_types {
        for event_type in event_types {
            WebhookRepo::create_trigger(&state.pool, webhook.id, event_type).await?;
        }
    }

    tracing::info!(webhook_id = webhook.id, url = %webhook.url, "Webhook created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: webhook })))
}

/// GET /api/v1/webhooks
pub async fn list_webhooks(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let webhooks = WebhookRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: webhooks }))
}

/// GET /api/v1/webhooks/{id}
pub async fn get_webhook(
    State(state): State<AppState>,
    Path(webhook_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let webhook = WebhookRepo::find_by_id(&state.pool, webhook_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Webhook",
            id: webhook_id,
        }))?;
    Ok(Json(DataResponse { data: webhook }))
}

/// PUT /api/v1/webhooks/{id}
pub async fn update_webhook(
    State(state): State<AppState>,
    Path(webhook_id): Path<DbId>,
    Json(input): Json<UpdateWebhook>,
) -> AppResult<impl IntoResponse> {
    let updated = WebhookRepo::update(
        &state.pool,
        webhook_id,
        input.name.as_deref(),
        input.url.as_deref(),
        input.http_method.as_deref(),
        input.content_type.as_deref(),
        input.headers.as_ref(),
        input.payload_template.as_deref(),
        input.auth_type.map(WebhookAuthType::as_str),
        input.auth_secret.as_deref(),
        input.auth_header.as_deref(),
        input.timeout_secs,
        input.retry_count,
        input.retry_delay_secs,
        input.is_active,
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Webhook",
        id: webhook_id,
    }))?;

    tracing::info!(webhook_id, "Webhook updated");

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/webhooks/{id}
///
/// Deletes the webhook plus its triggers and executions via cascade.
pub async fn delete_webhook(
    State(state): State<AppState>,
    Path(webhook_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = WebhookRepo::delete(&state.pool, webhook_id).await?;

    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Webhook",
            id: webhook_id,
        }));
    }

    tracing::info!(webhook_id, "Webhook deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Trigger management
// ---------------------------------------------------------------------------

/// Body of `POST /api/v1/webhooks/{id}/triggers`.
#[derive(Debug, Deserialize)]
pub struct CreateTrigger {
    pub event_type: String,
}

/// Body of `PUT /api/v1/webhooks/triggers/{id}`.
#[derive(Debug, Deserialize)]
pub struct SetTriggerActive {
    pub is_active: bool,
}

/// POST /api/v1/webhooks/{id}/triggers
///
/// Bind the webhook to an event type. Re-binding an existing pair
/// reactivates it.
pub async fn create_trigger(
    State(state): State<AppState>,
    Path(webhook_id): Path<DbId>,
    Json(input): Json<CreateTrigger>,
) -> AppResult<impl IntoResponse> {
    validate_event_types(std::slice::from_ref(&input.event_type))?;

    WebhookRepo::find_by_id(&state.pool, webhook_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Webhook",
            id: webhook_id,
        }))?;

    let trigger = WebhookRepo::create_trigger(&state.pool, webhook_id, &input.event_type).await?;

    tracing::info!(webhook_id, event_type = %trigger.event_type, "Trigger created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: trigger })))
}

/// GET /api/v1/webhooks/{id}/triggers
pub async fn list_triggers(
    State(state): State<AppState>,
    Path(webhook_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let triggers = WebhookRepo::list_triggers(&state.pool, webhook_id).await?;
    Ok(Json(DataResponse { data: triggers }))
}

/// PUT /api/v1/webhooks/triggers/{id}
///
/// Enable or disable a trigger without deleting it.
pub async fn set_trigger_active(
    State(state): State<AppState>,
    Path(trigger_id): Path<DbId>,
    Json(input): Json<SetTriggerActive>,
) -> AppResult<impl IntoResponse> {
    let updated = WebhookRepo::set_trigger_active(&state.pool, trigger_id, input.is_active).await?;

    if !updated {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "WebhookTrigger",
            id: trigger_id,
        }));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/webhooks/triggers/{id}
pub async fn delete_trigger(
    State(state): State<AppState>,
    Path(trigger_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = WebhookRepo::delete_trigger(&state.pool, trigger_id).await?;

    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "WebhookTrigger",
            id: trigger_id,
        }));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Execution log
// ---------------------------------------------------------------------------

/// GET /api/v1/webhooks/{id}/executions
///
/// Paginated execution history for a webhook, newest first.
pub async fn list_executions(
    State(state): State<AppState>,
    Path(webhook_id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    WebhookRepo::find_by_id(&state.pool, webhook_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Webhook",
            id: webhook_id,
        }))?;

    let limit = clamp_limit(params.limit, 50, 200);
    let offset = clamp_offset(params.offset);

    let executions = WebhookRepo::list_executions(&state.pool, webhook_id, limit, offset).await?;

    Ok(Json(DataResponse { data: executions }))
}

/// GET /api/v1/webhooks/executions/{id}
pub async fn get_execution(
    State(state): State<AppState>,
    Path(execution_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let execution = WebhookRepo::find_execution(&state.pool, execution_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "WebhookExecution",
            id: execution_id,
        }))?;
    Ok(Json(DataResponse { data: execution }))
}
