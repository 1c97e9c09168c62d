//! HTTP API endpoints.
//!
//! All game endpoints require a bearer token (see `auth`); `POST
//! /api/users` is the only open route.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::error::GameError;
use crate::protocol::*;
use crate::state::{milestone_summary, AppState};
use crate::types::*;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", post(register_user))
        .route("/api/profile", get(get_profile))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{task_id}", put(update_task).delete(delete_task))
        .route("/api/session/start", post(start_session))
        .route("/api/session/complete", post(complete_session))
        .route("/api/session/cancel", post(cancel_session))
        .route("/api/sessions/history", get(session_history))
        .route("/api/inventory", get(get_inventory))
        .route("/api/inventory/equip", post(equip_item))
        .route("/api/worldstate", get(get_world_state))
}

fn encode_cursor(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

fn decode_cursor(cursor: &str) -> Result<DateTime<Utc>, GameError> {
    DateTime::parse_from_rfc3339(cursor)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| GameError::BadRequest("Invalid cursor.".to_string()))
}

fn validate_limit(limit: Option<usize>) -> Result<usize, GameError> {
    let limit = limit.unwrap_or(20);
    if (1..=50).contains(&limit) {
        Ok(limit)
    } else {
        Err(GameError::Validation(
            "Limit must be between 1 and 50.".to_string(),
        ))
    }
}

async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserCreated>), GameError> {
    let display_name = payload.display_name.trim().to_string();
    if display_name.is_empty() {
        return Err(GameError::Validation(
            "Display name must not be empty.".to_string(),
        ));
    }

    let user = state.create_user(display_name).await;
    tracing::info!("Registered user {}", user.id);
    Ok((
        StatusCode::CREATED,
        Json(UserCreated {
            id: user.id,
            token: user.token,
            display_name: user.display_name,
        }),
    ))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileResponse>, GameError> {
    let (hero, world_state) = state.ensure_progression(&user.id).await;
    Ok(Json(ProfileResponse {
        user: UserPublic::from(&user),
        hero: HeroPublic::from(&hero),
        world_state: WorldStatePublic::from(&world_state),
    }))
}

#[derive(Debug, Deserialize)]
struct ListTasksQuery {
    room: Option<Room>,
    limit: Option<usize>,
    cursor: Option<String>,
}

async fn list_tasks(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<PaginatedTasks>, GameError> {
    let limit = validate_limit(query.limit)?;
    let cursor = query.cursor.as_deref().map(decode_cursor).transpose()?;

    let (templates, next_cursor) = state
        .list_task_templates(&user.id, query.room, limit, cursor)
        .await;
    Ok(Json(PaginatedTasks {
        items: templates.iter().map(TaskTemplatePublic::from).collect(),
        next_cursor: next_cursor.map(encode_cursor),
    }))
}

async fn create_task(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<TaskTemplateCreate>,
) -> Result<(StatusCode, Json<TaskTemplatePublic>), GameError> {
    let template = state
        .create_task_template(
            &user.id,
            &payload.name,
            payload.category,
            payload.default_duration_minutes,
            payload.room,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(TaskTemplatePublic::from(&template))))
}

async fn update_task(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<TaskTemplateId>,
    Json(payload): Json<TaskTemplateUpdate>,
) -> Result<Json<TaskTemplatePublic>, GameError> {
    let template = state
        .update_task_template(
            &user.id,
            &task_id,
            payload.name,
            payload.category,
            payload.default_duration_minutes,
            payload.room,
        )
        .await?;
    Ok(Json(TaskTemplatePublic::from(&template)))
}

async fn delete_task(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(task_id): Path<TaskTemplateId>,
) -> Result<Json<serde_json::Value>, GameError> {
    state.delete_task_template(&user.id, &task_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn start_session(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<SessionStartRequest>,
) -> Result<(StatusCode, Json<SessionStartResponse>), GameError> {
    let session = state
        .start_session(&user.id, &payload.task_template_id, payload.duration_minutes)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SessionStartResponse {
            session_id: session.id,
            status: session.status,
            started_at: session.started_at,
            duration_minutes: session.duration_minutes,
            room: session.room,
        }),
    ))
}

async fn complete_session(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<SessionIdentifier>,
) -> Result<Json<SessionCompleteResponse>, GameError> {
    let outcome = state.complete_session(&user.id, &payload.session_id).await?;
    Ok(Json(SessionCompleteResponse {
        session: RewardSummary {
            exp_reward: outcome.exp_reward,
            gold_reward: outcome.gold_reward,
        },
        dropped_item: outcome.dropped_item.as_ref().map(DroppedItem::from),
        hero: HeroPublic::from(&outcome.hero),
        world_state: WorldStatePublic::from(&outcome.world_state),
    }))
}

async fn cancel_session(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<SessionIdentifier>,
) -> Result<Json<SessionHistoryEntry>, GameError> {
    let session = state.cancel_session(&user.id, &payload.session_id).await?;
    Ok(Json(SessionHistoryEntry::from(&session)))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
    cursor: Option<String>,
}

async fn session_history(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<SessionHistoryResponse>, GameError> {
    let limit = validate_limit(query.limit)?;
    let cursor = query.cursor.as_deref().map(decode_cursor).transpose()?;

    let (sessions, next_cursor) = state.session_history(&user.id, limit, cursor).await;
    Ok(Json(SessionHistoryResponse {
        items: sessions.iter().map(SessionHistoryEntry::from).collect(),
        next_cursor: next_cursor.map(encode_cursor),
    }))
}

async fn get_inventory(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<InventoryResponse>, GameError> {
    let (hero, _) = state.ensure_progression(&user.id).await;
    let rows = state.inventory_items(&user.id).await;

    Ok(Json(InventoryResponse {
        items: rows
            .iter()
            .map(|(entry, item)| InventoryItemPublic {
                id: item.id.clone(),
                name: item.name.clone(),
                kind: item.kind,
                rarity: item.rarity,
                sprite_key: item.sprite_key.clone(),
                obtained_at: entry.obtained_at,
            })
            .collect(),
        equipped: HeroEquipped {
            hat_id: hero.equipped_hat_id,
            outfit_id: hero.equipped_outfit_id,
            accessory_id: hero.equipped_accessory_id,
        },
    }))
}

async fn equip_item(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<EquipItemRequest>,
) -> Result<Json<HeroPublic>, GameError> {
    let hero = state.equip_item(&user.id, &payload.item_id).await?;
    Ok(Json(HeroPublic::from(&hero)))
}

async fn get_world_state(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<WorldStateResponse>, GameError> {
    let (_, world_state) = state.ensure_progression(&user.id).await;
    Ok(Json(WorldStateResponse {
        world_state: WorldStatePublic::from(&world_state),
        milestones: milestone_summary(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_round_trip() {
        let now = Utc::now();
        let decoded = decode_cursor(&encode_cursor(now)).unwrap();
        assert_eq!(decoded, now);
    }

    #[test]
    fn test_decode_cursor_rejects_garbage() {
        assert_eq!(
            decode_cursor("yesterday").unwrap_err(),
            GameError::BadRequest("Invalid cursor.".to_string())
        );
    }

    #[test]
    fn test_validate_limit() {
        assert_eq!(validate_limit(None).unwrap(), 20);
        assert_eq!(validate_limit(Some(1)).unwrap(), 1);
        assert_eq!(validate_limit(Some(50)).unwrap(), 50);
        assert!(validate_limit(Some(0)).is_err());
        assert!(validate_limit(Some(51)).is_err());
    }
}
