mod catalog;
mod drops;
mod hero;
mod inventory;
mod session;
mod task;
mod user;
mod world;

pub use hero::{apply_rewards, compute_rewards, exp_to_next_level};
pub use session::CompletionOutcome;
pub use world::{milestone_summary, update_world_state_on_success};

use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Shared application state
///
/// All game entities live in memory behind RwLocks. Heroes and world
/// states are keyed by user id since each user has exactly one of each.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<RwLock<HashMap<UserId, User>>>,
    pub heroes: Arc<RwLock<HashMap<UserId, Hero>>>,
    pub world_states: Arc<RwLock<HashMap<UserId, WorldState>>>,
    pub task_templates: Arc<RwLock<HashMap<TaskTemplateId, TaskTemplate>>>,
    pub sessions: Arc<RwLock<HashMap<SessionId, FocusSession>>>,
    pub items: Arc<RwLock<HashMap<ItemId, Item>>>,
    pub inventory: Arc<RwLock<HashMap<InventoryEntryId, InventoryEntry>>>,
    pub drop_log: Arc<RwLock<Vec<DropLogEntry>>>,
    /// Per-user mutexes serializing session finalization (complete/cancel)
    completion_locks: Arc<Mutex<HashMap<UserId, Arc<Mutex<()>>>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            heroes: Arc::new(RwLock::new(HashMap::new())),
            world_states: Arc::new(RwLock::new(HashMap::new())),
            task_templates: Arc::new(RwLock::new(HashMap::new())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            items: Arc::new(RwLock::new(HashMap::new())),
            inventory: Arc::new(RwLock::new(HashMap::new())),
            drop_log: Arc::new(RwLock::new(Vec::new())),
            completion_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get (or lazily create) the finalization lock for a user.
    ///
    /// Holding the returned mutex guarantees no other completion or
    /// cancellation for the same user runs concurrently, so the status
    /// gate, reward application and drop reconciliation form one
    /// critical section.
    pub(crate) async fn completion_lock(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        let mut locks = self.completion_locks.lock().await;
        locks
            .entry(user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
