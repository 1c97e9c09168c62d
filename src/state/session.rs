use super::task::ensure_allowed_duration;
use super::AppState;
use crate::error::GameError;
use crate::state::hero::{apply_rewards, compute_rewards};
use crate::state::world::update_world_state_on_success;
use crate::types::*;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Everything a successful completion produced, for the API response
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub session: FocusSession,
    pub exp_reward: u32,
    pub gold_reward: u32,
    pub dropped_item: Option<Item>,
    pub hero: Hero,
    pub world_state: WorldState,
}

impl AppState {
    /// Start a new focus session from a task template.
    ///
    /// A user may run a short break-filler alongside a long session, so
    /// up to two open sessions are allowed.
    pub async fn start_session(
        &self,
        user_id: &UserId,
        template_id: &TaskTemplateId,
        duration_minutes: u32,
    ) -> Result<FocusSession, GameError> {
        ensure_allowed_duration(duration_minutes)?;

        let template = self
            .get_task_template(user_id, template_id)
            .await
            .ok_or_else(|| GameError::NotFound("Task template not found.".to_string()))?;

        let mut sessions = self.sessions.write().await;
        let open_count = sessions
            .values()
            .filter(|s| s.user_id == *user_id && s.status.is_open())
            .count();
        if open_count >= MAX_OPEN_SESSIONS {
            return Err(GameError::Conflict(
                "Too many sessions in progress.".to_string(),
            ));
        }

        let session = FocusSession {
            id: ulid::Ulid::new().to_string(),
            user_id: user_id.clone(),
            task_template_id: Some(template.id.clone()),
            duration_minutes,
            room: template.room,
            started_at: Utc::now(),
            ended_at: None,
            status: SessionStatus::Pending,
            reward_exp: 0,
            reward_gold: 0,
            drop_item_id: None,
        };
        sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    /// Complete a session and collect rewards, using an OS-seeded RNG
    /// for the drop roll.
    pub async fn complete_session(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<CompletionOutcome, GameError> {
        let mut rng = StdRng::from_os_rng();
        self.complete_session_with_rng(user_id, session_id, &mut rng)
            .await
    }

    /// Complete a session with a caller-supplied RNG (deterministic in tests).
    ///
    /// Serialized per user via the completion lock: the status gate, the
    /// reward read-modify-write and the drop reconciliation form a single
    /// critical section, so a session can never pay out twice.
    pub async fn complete_session_with_rng<R: Rng + Send>(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        rng: &mut R,
    ) -> Result<CompletionOutcome, GameError> {
        let lock = self.completion_lock(user_id).await;
        let _guard = lock.lock().await;

        let now = Utc::now();

        // Gate and finalize the session under one write lock so the
        // timeout sweeper cannot interleave.
        let session = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(session_id)
                .filter(|s| s.user_id == *user_id)
                .ok_or_else(|| GameError::NotFound("Session not found.".to_string()))?;

            if !session.status.is_open() {
                return Err(GameError::Conflict("Session already finished.".to_string()));
            }

            let required_secs = session.duration_minutes as f64 * 60.0 * MIN_ELAPSED_FRACTION;
            let elapsed_secs = (now - session.started_at).num_seconds() as f64;
            if elapsed_secs < required_secs {
                return Err(GameError::Validation(
                    "Session cannot be completed yet.".to_string(),
                ));
            }

            let (exp_reward, gold_reward) = compute_rewards(session.duration_minutes);
            session.reward_exp = exp_reward;
            session.reward_gold = gold_reward;
            session.status = SessionStatus::Success;
            session.ended_at = Some(now);
            session.clone()
        };

        self.ensure_progression(user_id).await;

        {
            let mut heroes = self.heroes.write().await;
            if let Some(hero) = heroes.get_mut(user_id) {
                apply_rewards(hero, session.reward_exp, session.reward_gold);
            }
        }

        {
            let mut world_states = self.world_states.write().await;
            if let Some(world_state) = world_states.get_mut(user_id) {
                update_world_state_on_success(world_state, now.date_naive());
            }
        }

        let dropped_item = self
            .maybe_roll_cosmetic_drop(rng, user_id, session_id)
            .await;

        // Re-read so the outcome reflects the drop reconciliation too
        let session = self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| GameError::NotFound("Session not found.".to_string()))?;
        let hero = self
            .get_hero(user_id)
            .await
            .ok_or_else(|| GameError::NotFound("Hero not found.".to_string()))?;
        let world_state = self
            .get_world_state(user_id)
            .await
            .ok_or_else(|| GameError::NotFound("World state not found.".to_string()))?;

        tracing::info!(
            "Session {} completed: +{} exp, +{} gold, drop: {}",
            session_id,
            session.reward_exp,
            session.reward_gold,
            dropped_item.as_ref().map_or("none", |i| i.name.as_str()),
        );

        Ok(CompletionOutcome {
            exp_reward: session.reward_exp,
            gold_reward: session.reward_gold,
            session,
            dropped_item,
            hero,
            world_state,
        })
    }

    /// Cancel an open session. No rewards are paid out.
    pub async fn cancel_session(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<FocusSession, GameError> {
        let lock = self.completion_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .filter(|s| s.user_id == *user_id)
            .ok_or_else(|| GameError::NotFound("Session not found.".to_string()))?;

        if !session.status.is_open() {
            return Err(GameError::Conflict(
                "Session already finalized.".to_string(),
            ));
        }

        session.status = SessionStatus::Cancel;
        session.ended_at = Some(Utc::now());
        Ok(session.clone())
    }

    /// Session history newest-first with cursor pagination (see
    /// `list_task_templates` for the cursor convention).
    pub async fn session_history(
        &self,
        user_id: &UserId,
        limit: usize,
        cursor: Option<DateTime<Utc>>,
    ) -> (Vec<FocusSession>, Option<DateTime<Utc>>) {
        let sessions = self.sessions.read().await;
        let mut page: Vec<FocusSession> = sessions
            .values()
            .filter(|s| s.user_id == *user_id)
            .filter(|s| cursor.is_none_or(|c| s.started_at < c))
            .cloned()
            .collect();
        page.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        let next_cursor = if page.len() > limit {
            page.truncate(limit);
            page.last().map(|s| s.started_at)
        } else {
            None
        };
        (page, next_cursor)
    }

    /// Mark open sessions long past their deadline as timed out.
    ///
    /// Called periodically by the background watcher. Completion holds
    /// the sessions write lock while finalizing, so a session is either
    /// swept or completed, never both.
    pub async fn sweep_timed_out_sessions(&self, now: DateTime<Utc>) -> Vec<SessionId> {
        let mut sessions = self.sessions.write().await;
        let mut swept = Vec::new();
        for session in sessions.values_mut() {
            if !session.status.is_open() {
                continue;
            }
            let horizon = Duration::minutes(
                session.duration_minutes as i64 * TIMEOUT_DURATION_FACTOR,
            );
            if now - session.started_at >= horizon {
                session.status = SessionStatus::Timeout;
                session.ended_at = Some(now);
                swept.push(session.id.clone());
            }
        }
        swept
    }
}
