use super::AppState;
use crate::error::GameError;
use crate::types::*;

impl AppState {
    /// A user's inventory joined with the item catalog, newest first
    pub async fn inventory_items(&self, user_id: &UserId) -> Vec<(InventoryEntry, Item)> {
        let inventory = self.inventory.read().await;
        let items = self.items.read().await;

        let mut rows: Vec<(InventoryEntry, Item)> = inventory
            .values()
            .filter(|e| e.user_id == *user_id)
            .filter_map(|e| items.get(&e.item_id).map(|i| (e.clone(), i.clone())))
            .collect();
        rows.sort_by(|a, b| b.0.obtained_at.cmp(&a.0.obtained_at));
        rows
    }

    /// Equip an owned item into the slot matching its type, replacing
    /// whatever was equipped there.
    pub async fn equip_item(&self, user_id: &UserId, item_id: &ItemId) -> Result<Hero, GameError> {
        self.ensure_progression(user_id).await;

        let owned = self
            .inventory
            .read()
            .await
            .values()
            .any(|e| e.user_id == *user_id && e.item_id == *item_id);
        let item = self.items.read().await.get(item_id).cloned();
        let item = match (owned, item) {
            (true, Some(item)) => item,
            _ => return Err(GameError::NotFound("Item not owned.".to_string())),
        };

        let mut heroes = self.heroes.write().await;
        let hero = heroes
            .get_mut(user_id)
            .ok_or_else(|| GameError::NotFound("Hero not found.".to_string()))?;
        match item.kind {
            ItemType::Hat => hero.equipped_hat_id = Some(item.id.clone()),
            ItemType::Outfit => hero.equipped_outfit_id = Some(item.id.clone()),
            ItemType::Accessory => hero.equipped_accessory_id = Some(item.id.clone()),
        }
        Ok(hero.clone())
    }
}
