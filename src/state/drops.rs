use super::AppState;
use crate::types::*;
use chrono::Utc;
use rand::Rng;
use std::collections::{BTreeSet, HashSet};

/// Pick a rarity among the ones actually present, weighted by drop
/// weight. Falls back to common if the total weight is zero.
///
/// The candidate set is deduplicated and ordered so the cumulative walk
/// is deterministic for a given RNG.
pub(crate) fn choose_weighted_rarity<R: Rng>(
    rng: &mut R,
    candidates: impl IntoIterator<Item = ItemRarity>,
) -> ItemRarity {
    let unique: BTreeSet<ItemRarity> = candidates.into_iter().collect();
    let total: f64 = unique.iter().map(|r| r.drop_weight()).sum();
    if total == 0.0 {
        return ItemRarity::Common;
    }

    let pick = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for rarity in &unique {
        cumulative += rarity.drop_weight();
        if pick <= cumulative {
            return *rarity;
        }
    }
    ItemRarity::Common
}

impl AppState {
    /// Roll the drop gate, then reconcile a drop if it hits.
    ///
    /// Only called from within a completion critical section.
    pub(crate) async fn maybe_roll_cosmetic_drop<R: Rng + Send>(
        &self,
        rng: &mut R,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Option<Item> {
        if rng.random::<f64>() >= DROP_CHANCE {
            return None;
        }
        self.roll_cosmetic_drop(rng, user_id, session_id).await
    }

    /// Select a cosmetic for the user and reconcile inventory, drop log,
    /// session record and (possibly) equipment.
    ///
    /// Eligible items are those not yet owned, within the hero's level,
    /// and either room-neutral or matching the session's room. Returns
    /// None when nothing is eligible.
    pub(crate) async fn roll_cosmetic_drop<R: Rng + Send>(
        &self,
        rng: &mut R,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Option<Item> {
        let hero = self.get_hero(user_id).await?;
        let session_room = self
            .sessions
            .read()
            .await
            .get(session_id)
            .map(|s| s.room)?;

        let owned: HashSet<ItemId> = self
            .inventory
            .read()
            .await
            .values()
            .filter(|e| e.user_id == *user_id)
            .map(|e| e.item_id.clone())
            .collect();

        let mut eligible: Vec<Item> = self
            .items
            .read()
            .await
            .values()
            .filter(|i| !owned.contains(&i.id))
            .filter(|i| i.unlock_level <= hero.level)
            .filter(|i| i.room_affinity.is_none_or(|room| room == session_room))
            .cloned()
            .collect();
        if eligible.is_empty() {
            return None;
        }
        // Stable order so the uniform pick below is deterministic in tests
        eligible.sort_by(|a, b| a.id.cmp(&b.id));

        let chosen_rarity = choose_weighted_rarity(rng, eligible.iter().map(|i| i.rarity));
        let mut candidates: Vec<&Item> = eligible
            .iter()
            .filter(|i| i.rarity == chosen_rarity)
            .collect();
        if candidates.is_empty() {
            candidates = eligible.iter().collect();
        }
        let item = candidates[rng.random_range(0..candidates.len())].clone();

        let now = Utc::now();
        let entry = InventoryEntry {
            id: ulid::Ulid::new().to_string(),
            user_id: user_id.clone(),
            item_id: item.id.clone(),
            obtained_at: now,
        };
        self.inventory
            .write()
            .await
            .insert(entry.id.clone(), entry);
        self.drop_log.write().await.push(DropLogEntry {
            id: ulid::Ulid::new().to_string(),
            session_id: session_id.clone(),
            item_id: item.id.clone(),
            rolled_at: now,
        });
        if let Some(session) = self.sessions.write().await.get_mut(session_id) {
            session.drop_item_id = Some(item.id.clone());
        }

        // First drop of a type goes straight onto the hero
        {
            let mut heroes = self.heroes.write().await;
            if let Some(hero) = heroes.get_mut(user_id) {
                let slot = match item.kind {
                    ItemType::Hat => &mut hero.equipped_hat_id,
                    ItemType::Outfit => &mut hero.equipped_outfit_id,
                    ItemType::Accessory => &mut hero.equipped_accessory_id,
                };
                if slot.is_none() {
                    *slot = Some(item.id.clone());
                }
            }
        }

        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    /// RNG returning a fixed 64-bit pattern; value 0 makes every f64
    /// roll 0.0 and every range pick the first candidate.
    struct FixedRng(u64);

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            self.0 as u32
        }
        fn next_u64(&mut self) -> u64 {
            self.0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for chunk in dest.chunks_mut(8) {
                let bytes = self.0.to_le_bytes();
                chunk.copy_from_slice(&bytes[..chunk.len()]);
            }
        }
    }

    async fn setup_state_with_session(state: &AppState) -> (UserId, SessionId) {
        let user = state.create_user("Mara".to_string()).await;
        state.ensure_progression(&user.id).await;
        let template = state
            .create_task_template(&user.id, "Read", TaskCategory::Study, 25, Room::Study)
            .await
            .unwrap();
        let session = state
            .start_session(&user.id, &template.id, 25)
            .await
            .unwrap();
        (user.id, session.id)
    }

    fn item(id: &str, kind: ItemType, rarity: ItemRarity, room: Option<Room>, level: u32) -> Item {
        Item {
            id: id.to_string(),
            name: id.to_string(),
            kind,
            rarity,
            sprite_key: format!("sprite_{id}"),
            room_affinity: room,
            unlock_level: level,
            description: None,
        }
    }

    async fn add_item(state: &AppState, i: Item) {
        state.items.write().await.insert(i.id.clone(), i);
    }

    #[test]
    fn test_choose_weighted_rarity_single_candidate() {
        let mut rng = FixedRng(u64::MAX);
        let rarity = choose_weighted_rarity(&mut rng, [ItemRarity::Epic]);
        assert_eq!(rarity, ItemRarity::Epic);
    }

    #[test]
    fn test_choose_weighted_rarity_zero_roll_picks_first() {
        let mut rng = FixedRng(0);
        // Ordered walk starts at common
        let rarity = choose_weighted_rarity(
            &mut rng,
            [ItemRarity::Epic, ItemRarity::Common, ItemRarity::Rare],
        );
        assert_eq!(rarity, ItemRarity::Common);
    }

    #[test]
    fn test_choose_weighted_rarity_max_roll_picks_last() {
        let mut rng = FixedRng(u64::MAX);
        let rarity =
            choose_weighted_rarity(&mut rng, [ItemRarity::Common, ItemRarity::Epic]);
        assert_eq!(rarity, ItemRarity::Epic);
    }

    #[test]
    fn test_choose_weighted_rarity_empty_falls_back_to_common() {
        let mut rng = FixedRng(0);
        let rarity = choose_weighted_rarity(&mut rng, []);
        assert_eq!(rarity, ItemRarity::Common);
    }

    #[tokio::test]
    async fn test_gate_misses_above_drop_chance() {
        let state = AppState::new();
        let (user_id, session_id) = setup_state_with_session(&state).await;
        add_item(&state, item("cap", ItemType::Hat, ItemRarity::Common, None, 1)).await;

        let mut rng = FixedRng(u64::MAX);
        let dropped = state
            .maybe_roll_cosmetic_drop(&mut rng, &user_id, &session_id)
            .await;
        assert!(dropped.is_none());
        assert!(state.inventory.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_drop_reconciles_everything() {
        let state = AppState::new();
        let (user_id, session_id) = setup_state_with_session(&state).await;
        add_item(&state, item("cap", ItemType::Hat, ItemRarity::Common, None, 1)).await;

        let mut rng = FixedRng(0);
        let dropped = state
            .maybe_roll_cosmetic_drop(&mut rng, &user_id, &session_id)
            .await
            .expect("zero roll must drop");
        assert_eq!(dropped.id, "cap");

        // Inventory entry
        let inventory = state.inventory.read().await;
        assert_eq!(inventory.len(), 1);
        assert!(inventory.values().any(|e| e.item_id == "cap" && e.user_id == user_id));
        drop(inventory);

        // Drop log
        let log = state.drop_log.read().await;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].session_id, session_id);
        assert_eq!(log[0].item_id, "cap");
        drop(log);

        // Session record
        let session = state.sessions.read().await.get(&session_id).cloned().unwrap();
        assert_eq!(session.drop_item_id, Some("cap".to_string()));

        // Auto-equipped into the empty hat slot
        let hero = state.get_hero(&user_id).await.unwrap();
        assert_eq!(hero.equipped_hat_id, Some("cap".to_string()));
    }

    #[tokio::test]
    async fn test_drop_does_not_replace_equipped_item() {
        let state = AppState::new();
        let (user_id, session_id) = setup_state_with_session(&state).await;
        add_item(&state, item("cap_a", ItemType::Hat, ItemRarity::Common, None, 1)).await;
        add_item(&state, item("cap_b", ItemType::Hat, ItemRarity::Common, None, 1)).await;

        let mut rng = FixedRng(0);
        let first = state
            .roll_cosmetic_drop(&mut rng, &user_id, &session_id)
            .await
            .unwrap();
        let second = state
            .roll_cosmetic_drop(&mut rng, &user_id, &session_id)
            .await
            .unwrap();
        assert_ne!(first.id, second.id);

        // Slot keeps the first drop
        let hero = state.get_hero(&user_id).await.unwrap();
        assert_eq!(hero.equipped_hat_id, Some(first.id));
    }

    #[tokio::test]
    async fn test_owned_items_are_not_dropped_again() {
        let state = AppState::new();
        let (user_id, session_id) = setup_state_with_session(&state).await;
        add_item(&state, item("cap", ItemType::Hat, ItemRarity::Common, None, 1)).await;

        let mut rng = FixedRng(0);
        state
            .roll_cosmetic_drop(&mut rng, &user_id, &session_id)
            .await
            .unwrap();

        // Catalog exhausted for this user
        let again = state
            .roll_cosmetic_drop(&mut rng, &user_id, &session_id)
            .await;
        assert!(again.is_none());
        assert_eq!(state.inventory.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_level_gated_items_are_excluded() {
        let state = AppState::new();
        let (user_id, session_id) = setup_state_with_session(&state).await;
        add_item(&state, item("laurel", ItemType::Hat, ItemRarity::Epic, None, 8)).await;

        let mut rng = FixedRng(0);
        let dropped = state
            .roll_cosmetic_drop(&mut rng, &user_id, &session_id)
            .await;
        assert!(dropped.is_none());

        // Levelling up makes it eligible
        state.heroes.write().await.get_mut(&user_id).unwrap().level = 8;
        let dropped = state
            .roll_cosmetic_drop(&mut rng, &user_id, &session_id)
            .await;
        assert_eq!(dropped.map(|i| i.id), Some("laurel".to_string()));
    }

    #[tokio::test]
    async fn test_room_affinity_filters_drops() {
        let state = AppState::new();
        let (user_id, session_id) = setup_state_with_session(&state).await;
        // Session runs in the study room
        add_item(
            &state,
            item("hardhat", ItemType::Hat, ItemRarity::Common, Some(Room::Build), 1),
        )
        .await;
        add_item(
            &state,
            item("quill", ItemType::Accessory, ItemRarity::Common, Some(Room::Study), 1),
        )
        .await;

        let mut rng = FixedRng(0);
        let dropped = state
            .roll_cosmetic_drop(&mut rng, &user_id, &session_id)
            .await
            .unwrap();
        assert_eq!(dropped.id, "quill");
    }

    #[tokio::test]
    async fn test_empty_catalog_yields_no_drop() {
        let state = AppState::new();
        let (user_id, session_id) = setup_state_with_session(&state).await;

        let mut rng = FixedRng(0);
        let dropped = state
            .roll_cosmetic_drop(&mut rng, &user_id, &session_id)
            .await;
        assert!(dropped.is_none());
        assert!(state.drop_log.read().await.is_empty());
    }
}
