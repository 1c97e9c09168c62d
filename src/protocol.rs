//! Request and response bodies for the JSON API.

use crate::state::exp_to_next_level;
use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ========== Users & Profile ==========

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUserRequest {
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserCreated {
    pub id: UserId,
    pub token: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPublic {
    pub id: UserId,
    pub display_name: String,
}

impl From<&User> for UserPublic {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            display_name: user.display_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HeroEquipped {
    pub hat_id: Option<ItemId>,
    pub outfit_id: Option<ItemId>,
    pub accessory_id: Option<ItemId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeroPublic {
    pub id: HeroId,
    pub level: u32,
    pub exp: u32,
    pub exp_to_next: u32,
    pub gold: u32,
    pub equipped: HeroEquipped,
}

impl From<&Hero> for HeroPublic {
    fn from(hero: &Hero) -> Self {
        Self {
            id: hero.id.clone(),
            level: hero.level,
            exp: hero.exp,
            exp_to_next: exp_to_next_level(hero.level),
            gold: hero.gold,
            equipped: HeroEquipped {
                hat_id: hero.equipped_hat_id.clone(),
                outfit_id: hero.equipped_outfit_id.clone(),
                accessory_id: hero.equipped_accessory_id.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldStatePublic {
    pub id: WorldStateId,
    pub study_room_level: u32,
    pub build_room_level: u32,
    pub training_room_level: u32,
    pub plaza_level: u32,
    pub total_sessions_success: u32,
    pub day_streak: u32,
    pub last_session_date: Option<NaiveDate>,
}

impl From<&WorldState> for WorldStatePublic {
    fn from(world_state: &WorldState) -> Self {
        Self {
            id: world_state.id.clone(),
            study_room_level: world_state.study_room_level,
            build_room_level: world_state.build_room_level,
            training_room_level: world_state.training_room_level,
            plaza_level: world_state.plaza_level,
            total_sessions_success: world_state.total_sessions_success,
            day_streak: world_state.day_streak,
            last_session_date: world_state.last_session_date,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub user: UserPublic,
    pub hero: HeroPublic,
    pub world_state: WorldStatePublic,
}

// ========== Tasks ==========

fn default_duration() -> u32 {
    25
}

fn default_category() -> TaskCategory {
    TaskCategory::Study
}

fn default_room() -> Room {
    Room::Study
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskTemplateCreate {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: TaskCategory,
    #[serde(default = "default_duration")]
    pub default_duration_minutes: u32,
    #[serde(default = "default_room")]
    pub room: Room,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskTemplateUpdate {
    pub name: Option<String>,
    pub category: Option<TaskCategory>,
    pub default_duration_minutes: Option<u32>,
    pub room: Option<Room>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskTemplatePublic {
    pub id: TaskTemplateId,
    pub name: String,
    pub category: TaskCategory,
    pub default_duration_minutes: u32,
    pub room: Room,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&TaskTemplate> for TaskTemplatePublic {
    fn from(template: &TaskTemplate) -> Self {
        Self {
            id: template.id.clone(),
            name: template.name.clone(),
            category: template.category,
            default_duration_minutes: template.default_duration_minutes,
            room: template.room,
            created_at: template.created_at,
            updated_at: template.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginatedTasks {
    pub items: Vec<TaskTemplatePublic>,
    pub next_cursor: Option<String>,
}

// ========== Sessions ==========

#[derive(Debug, Clone, Deserialize)]
pub struct SessionStartRequest {
    pub task_template_id: TaskTemplateId,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStartResponse {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub room: Room,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionIdentifier {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Serialize)]
pub struct RewardSummary {
    pub exp_reward: u32,
    pub gold_reward: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DroppedItem {
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemType,
    pub rarity: ItemRarity,
    pub sprite_key: String,
}

impl From<&Item> for DroppedItem {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            kind: item.kind,
            rarity: item.rarity,
            sprite_key: item.sprite_key.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionCompleteResponse {
    pub session: RewardSummary,
    pub dropped_item: Option<DroppedItem>,
    pub hero: HeroPublic,
    pub world_state: WorldStatePublic,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionHistoryEntry {
    pub id: SessionId,
    pub status: SessionStatus,
    pub duration_minutes: u32,
    pub room: Room,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub reward_exp: u32,
    pub reward_gold: u32,
}

impl From<&FocusSession> for SessionHistoryEntry {
    fn from(session: &FocusSession) -> Self {
        Self {
            id: session.id.clone(),
            status: session.status,
            duration_minutes: session.duration_minutes,
            room: session.room,
            started_at: session.started_at,
            ended_at: session.ended_at,
            reward_exp: session.reward_exp,
            reward_gold: session.reward_gold,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionHistoryResponse {
    pub items: Vec<SessionHistoryEntry>,
    pub next_cursor: Option<String>,
}

// ========== Inventory & World ==========

#[derive(Debug, Clone, Serialize)]
pub struct InventoryItemPublic {
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemType,
    pub rarity: ItemRarity,
    pub sprite_key: String,
    pub obtained_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryResponse {
    pub items: Vec<InventoryItemPublic>,
    pub equipped: HeroEquipped,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EquipItemRequest {
    pub item_id: ItemId,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldStateResponse {
    pub world_state: WorldStatePublic,
    pub milestones: HashMap<String, u32>,
}
