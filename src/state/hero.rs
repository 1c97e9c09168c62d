use super::AppState;
use crate::types::*;

/// Experience needed to advance from the given level to the next
pub fn exp_to_next_level(level: u32) -> u32 {
    level.max(1) * 100
}

/// Rewards for a finished session: (exp, gold)
pub fn compute_rewards(duration_minutes: u32) -> (u32, u32) {
    (duration_minutes * 2, duration_minutes)
}

/// Add rewards and carry overflow exp into level-ups.
///
/// A single long session can level the hero more than once.
pub fn apply_rewards(hero: &mut Hero, exp_reward: u32, gold_reward: u32) {
    hero.exp += exp_reward;
    hero.gold += gold_reward;
    while hero.exp >= exp_to_next_level(hero.level) {
        hero.exp -= exp_to_next_level(hero.level);
        hero.level += 1;
    }
}

impl AppState {
    /// Create hero and world state for a user if missing. Idempotent.
    pub async fn ensure_progression(&self, user_id: &UserId) -> (Hero, WorldState) {
        let hero = {
            let mut heroes = self.heroes.write().await;
            heroes
                .entry(user_id.clone())
                .or_insert_with(|| Hero {
                    id: ulid::Ulid::new().to_string(),
                    user_id: user_id.clone(),
                    level: 1,
                    exp: 0,
                    gold: 0,
                    equipped_hat_id: None,
                    equipped_outfit_id: None,
                    equipped_accessory_id: None,
                })
                .clone()
        };

        let world_state = {
            let mut world_states = self.world_states.write().await;
            world_states
                .entry(user_id.clone())
                .or_insert_with(|| WorldState {
                    id: ulid::Ulid::new().to_string(),
                    user_id: user_id.clone(),
                    study_room_level: 1,
                    build_room_level: 1,
                    training_room_level: 1,
                    plaza_level: 1,
                    total_sessions_success: 0,
                    day_streak: 0,
                    last_session_date: None,
                })
                .clone()
        };

        (hero, world_state)
    }

    pub async fn get_hero(&self, user_id: &UserId) -> Option<Hero> {
        self.heroes.read().await.get(user_id).cloned()
    }

    pub async fn get_world_state(&self, user_id: &UserId) -> Option<WorldState> {
        self.world_states.read().await.get(user_id).cloned()
    }
}
