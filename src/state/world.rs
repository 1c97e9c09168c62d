use chrono::{Days, NaiveDate};
use std::collections::HashMap;

use crate::types::*;

/// Record a successful session on the world state.
///
/// Bumps the success counter, advances or resets the day streak based on
/// the gap to the previous session date, and applies room milestone
/// upgrades. Milestones are monotone: once a threshold is reached the
/// room stays at level 2.
pub fn update_world_state_on_success(world_state: &mut WorldState, today: NaiveDate) {
    world_state.total_sessions_success += 1;

    match world_state.last_session_date {
        Some(last) if last == today => {
            // Same calendar day, streak unchanged
        }
        Some(last) if last.checked_add_days(Days::new(1)) == Some(today) => {
            world_state.day_streak += 1;
        }
        _ => {
            world_state.day_streak = 1;
        }
    }
    world_state.last_session_date = Some(today);

    for (milestone, threshold) in ROOM_THRESHOLDS {
        if world_state.total_sessions_success >= *threshold {
            match *milestone {
                "study_room_level_2" => world_state.study_room_level = 2,
                "build_room_level_2" => world_state.build_room_level = 2,
                "plaza_level_2" => world_state.plaza_level = 2,
                _ => {}
            }
        }
    }
}

/// Milestone thresholds exposed to clients alongside the world state
pub fn milestone_summary() -> HashMap<String, u32> {
    ROOM_THRESHOLDS
        .iter()
        .map(|(name, threshold)| (name.to_string(), *threshold))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_world() -> WorldState {
        WorldState {
            id: "world".to_string(),
            user_id: "user".to_string(),
            study_room_level: 1,
            build_room_level: 1,
            training_room_level: 1,
            plaza_level: 1,
            total_sessions_success: 0,
            day_streak: 0,
            last_session_date: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_first_success_starts_streak() {
        let mut world = fresh_world();
        update_world_state_on_success(&mut world, day(1));

        assert_eq!(world.total_sessions_success, 1);
        assert_eq!(world.day_streak, 1);
        assert_eq!(world.last_session_date, Some(day(1)));
    }

    #[test]
    fn test_same_day_keeps_streak() {
        let mut world = fresh_world();
        update_world_state_on_success(&mut world, day(1));
        update_world_state_on_success(&mut world, day(1));

        assert_eq!(world.total_sessions_success, 2);
        assert_eq!(world.day_streak, 1);
    }

    #[test]
    fn test_consecutive_day_extends_streak() {
        let mut world = fresh_world();
        update_world_state_on_success(&mut world, day(1));
        update_world_state_on_success(&mut world, day(2));
        update_world_state_on_success(&mut world, day(3));

        assert_eq!(world.day_streak, 3);
    }

    #[test]
    fn test_gap_resets_streak() {
        let mut world = fresh_world();
        update_world_state_on_success(&mut world, day(1));
        update_world_state_on_success(&mut world, day(2));
        update_world_state_on_success(&mut world, day(5));

        assert_eq!(world.day_streak, 1);
        assert_eq!(world.last_session_date, Some(day(5)));
    }

    #[test]
    fn test_streak_handles_month_boundary() {
        let mut world = fresh_world();
        update_world_state_on_success(&mut world, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        update_world_state_on_success(&mut world, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());

        assert_eq!(world.day_streak, 2);
    }

    #[test]
    fn test_study_room_milestone_at_five() {
        let mut world = fresh_world();
        for _ in 0..4 {
            update_world_state_on_success(&mut world, day(1));
        }
        assert_eq!(world.study_room_level, 1);

        update_world_state_on_success(&mut world, day(1));
        assert_eq!(world.study_room_level, 2);
        assert_eq!(world.build_room_level, 1);
        assert_eq!(world.plaza_level, 1);
    }

    #[test]
    fn test_all_milestones_at_thirty() {
        let mut world = fresh_world();
        for _ in 0..30 {
            update_world_state_on_success(&mut world, day(1));
        }

        assert_eq!(world.study_room_level, 2);
        assert_eq!(world.build_room_level, 2);
        assert_eq!(world.plaza_level, 2);
        // No milestone exists for the training room
        assert_eq!(world.training_room_level, 1);
    }

    #[test]
    fn test_milestone_summary_lists_thresholds() {
        let summary = milestone_summary();
        assert_eq!(summary.get("study_room_level_2"), Some(&5));
        assert_eq!(summary.get("build_room_level_2"), Some(&15));
        assert_eq!(summary.get("plaza_level_2"), Some(&30));
    }
}
