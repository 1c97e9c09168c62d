use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type UserId = String;
pub type HeroId = String;
pub type TaskTemplateId = String;
pub type SessionId = String;
pub type ItemId = String;
pub type InventoryEntryId = String;
pub type WorldStateId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Active,
    Success,
    Cancel,
    Timeout,
}

impl SessionStatus {
    /// Pending and active sessions can still be completed or cancelled.
    pub fn is_open(&self) -> bool {
        matches!(self, SessionStatus::Pending | SessionStatus::Active)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Study,
    Build,
    Training,
    Custom,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Room {
    #[serde(rename = "study_room")]
    Study,
    #[serde(rename = "build_room")]
    Build,
    #[serde(rename = "training_room")]
    Training,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Hat,
    Outfit,
    Accessory,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemRarity {
    Common,
    Rare,
    Epic,
}

impl ItemRarity {
    pub fn drop_weight(&self) -> f64 {
        match self {
            ItemRarity::Common => 0.75,
            ItemRarity::Rare => 0.20,
            ItemRarity::Epic => 0.05,
        }
    }
}

// ========== Game Balance ==========

/// Focus session lengths users may pick, in minutes
pub const ALLOWED_DURATIONS: [u32; 3] = [25, 50, 90];

/// A user may have at most this many pending/active sessions
pub const MAX_OPEN_SESSIONS: usize = 2;

/// Fraction of the nominal duration that must have elapsed before completion
pub const MIN_ELAPSED_FRACTION: f64 = 0.8;

/// Open sessions older than this multiple of their duration are swept to timeout
pub const TIMEOUT_DURATION_FACTOR: i64 = 2;

/// Chance of a cosmetic drop on a successful completion
pub const DROP_CHANCE: f64 = 0.10;

/// Milestone thresholds: room upgrades unlocked at total successful sessions
pub const ROOM_THRESHOLDS: &[(&str, u32)] = &[
    ("study_room_level_2", 5),
    ("build_room_level_2", 15),
    ("plaza_level_2", 30),
];

pub fn duration_allowed(minutes: u32) -> bool {
    ALLOWED_DURATIONS.contains(&minutes)
}

// ========== Entities ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub token: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hero {
    pub id: HeroId,
    pub user_id: UserId,
    pub level: u32,
    pub exp: u32,
    pub gold: u32,
    pub equipped_hat_id: Option<ItemId>,
    pub equipped_outfit_id: Option<ItemId>,
    pub equipped_accessory_id: Option<ItemId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: TaskTemplateId,
    pub user_id: UserId,
    pub name: String,
    pub category: TaskCategory,
    pub default_duration_minutes: u32,
    pub room: Room,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: SessionId,
    pub user_id: UserId,
    pub task_template_id: Option<TaskTemplateId>,
    pub duration_minutes: u32,
    pub room: Room,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub reward_exp: u32,
    pub reward_gold: u32,
    pub drop_item_id: Option<ItemId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemType,
    pub rarity: ItemRarity,
    pub sprite_key: String,
    /// Some items only drop from sessions run in a specific room
    pub room_affinity: Option<Room>,
    /// Minimum hero level before this item can drop
    pub unlock_level: u32,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub id: InventoryEntryId,
    pub user_id: UserId,
    pub item_id: ItemId,
    pub obtained_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    pub id: WorldStateId,
    pub user_id: UserId,
    pub study_room_level: u32,
    pub build_room_level: u32,
    pub training_room_level: u32,
    pub plaza_level: u32,
    pub total_sessions_success: u32,
    pub day_streak: u32,
    pub last_session_date: Option<NaiveDate>,
}

/// Audit record of every cosmetic drop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropLogEntry {
    pub id: String,
    pub session_id: SessionId,
    pub item_id: ItemId,
    pub rolled_at: DateTime<Utc>,
}
