use super::AppState;
use crate::types::*;

/// Built-in cosmetic catalog: (name, type, rarity, sprite key, room affinity, unlock level)
const DEFAULT_CATALOG: &[(&str, ItemType, ItemRarity, &str, Option<Room>, u32)] = &[
    // Commons, available from level 1
    ("Paper Crown", ItemType::Hat, ItemRarity::Common, "hat_paper_crown", None, 1),
    ("Scholar's Cap", ItemType::Hat, ItemRarity::Common, "hat_scholar", Some(Room::Study), 1),
    ("Builder's Hardhat", ItemType::Hat, ItemRarity::Common, "hat_hardhat", Some(Room::Build), 1),
    ("Plain Hoodie", ItemType::Outfit, ItemRarity::Common, "outfit_hoodie", None, 1),
    ("Cafe Apron", ItemType::Outfit, ItemRarity::Common, "outfit_apron", None, 1),
    ("Round Glasses", ItemType::Accessory, ItemRarity::Common, "acc_glasses", None, 1),
    ("Sweatband", ItemType::Accessory, ItemRarity::Common, "acc_sweatband", Some(Room::Training), 1),
    // Rares, light level gating
    ("Velvet Beret", ItemType::Hat, ItemRarity::Rare, "hat_beret", None, 2),
    ("Track Jacket", ItemType::Outfit, ItemRarity::Rare, "outfit_track", Some(Room::Training), 2),
    ("Ink Quill", ItemType::Accessory, ItemRarity::Rare, "acc_quill", Some(Room::Study), 3),
    ("Blueprint Tube", ItemType::Accessory, ItemRarity::Rare, "acc_blueprint", Some(Room::Build), 3),
    // Epics, late-game chase items
    ("Star Cloak", ItemType::Outfit, ItemRarity::Epic, "outfit_star_cloak", None, 5),
    ("Clockwork Monocle", ItemType::Accessory, ItemRarity::Epic, "acc_monocle", Some(Room::Study), 6),
    ("Golden Laurel", ItemType::Hat, ItemRarity::Epic, "hat_laurel", None, 8),
];

impl AppState {
    pub async fn add_item(
        &self,
        name: &str,
        kind: ItemType,
        rarity: ItemRarity,
        sprite_key: &str,
        room_affinity: Option<Room>,
        unlock_level: u32,
    ) -> Item {
        let item = Item {
            id: ulid::Ulid::new().to_string(),
            name: name.to_string(),
            kind,
            rarity,
            sprite_key: sprite_key.to_string(),
            room_affinity,
            unlock_level,
            description: None,
        };
        self.items
            .write()
            .await
            .insert(item.id.clone(), item.clone());
        item
    }

    /// Populate the item catalog at startup. No-op if items already exist.
    pub async fn seed_catalog(&self) {
        if !self.items.read().await.is_empty() {
            return;
        }
        for (name, kind, rarity, sprite_key, room_affinity, unlock_level) in DEFAULT_CATALOG {
            self.add_item(name, *kind, *rarity, sprite_key, *room_affinity, *unlock_level)
                .await;
        }
        tracing::info!("Seeded item catalog with {} cosmetics", DEFAULT_CATALOG.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_catalog() {
        let state = AppState::new();
        state.seed_catalog().await;

        let items = state.items.read().await;
        assert_eq!(items.len(), DEFAULT_CATALOG.len());
        assert!(items.values().any(|i| i.rarity == ItemRarity::Epic));
        assert!(items.values().any(|i| i.room_affinity == Some(Room::Build)));
    }

    #[tokio::test]
    async fn test_seed_catalog_is_idempotent() {
        let state = AppState::new();
        state.seed_catalog().await;
        state.seed_catalog().await;

        assert_eq!(state.items.read().await.len(), DEFAULT_CATALOG.len());
    }

    #[tokio::test]
    async fn test_catalog_has_level_one_commons_for_every_room() {
        let state = AppState::new();
        state.seed_catalog().await;

        // A fresh hero in any room must have at least one possible drop
        let items = state.items.read().await;
        for room in [Room::Study, Room::Build, Room::Training] {
            let eligible = items
                .values()
                .filter(|i| i.unlock_level <= 1)
                .filter(|i| i.room_affinity.is_none_or(|r| r == room))
                .count();
            assert!(eligible > 0, "no starter drops for {room:?}");
        }
    }
}
