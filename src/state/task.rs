use super::AppState;
use crate::error::GameError;
use crate::types::*;
use chrono::{DateTime, Utc};

pub(crate) fn ensure_allowed_duration(minutes: u32) -> Result<(), GameError> {
    if duration_allowed(minutes) {
        Ok(())
    } else {
        Err(GameError::Validation("Duration is not allowed.".to_string()))
    }
}

fn ensure_valid_name(name: &str) -> Result<String, GameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(GameError::Validation("Name must not be empty.".to_string()));
    }
    if trimmed.len() > 255 {
        return Err(GameError::Validation("Name is too long.".to_string()));
    }
    Ok(trimmed.to_string())
}

impl AppState {
    pub async fn create_task_template(
        &self,
        user_id: &UserId,
        name: &str,
        category: TaskCategory,
        default_duration_minutes: u32,
        room: Room,
    ) -> Result<TaskTemplate, GameError> {
        ensure_allowed_duration(default_duration_minutes)?;
        let name = ensure_valid_name(name)?;

        let template = TaskTemplate {
            id: ulid::Ulid::new().to_string(),
            user_id: user_id.clone(),
            name,
            category,
            default_duration_minutes,
            room,
            created_at: Utc::now(),
            updated_at: None,
        };

        self.task_templates
            .write()
            .await
            .insert(template.id.clone(), template.clone());
        Ok(template)
    }

    /// Look up a template scoped to its owner
    pub async fn get_task_template(
        &self,
        user_id: &UserId,
        template_id: &TaskTemplateId,
    ) -> Option<TaskTemplate> {
        self.task_templates
            .read()
            .await
            .get(template_id)
            .filter(|t| t.user_id == *user_id)
            .cloned()
    }

    pub async fn update_task_template(
        &self,
        user_id: &UserId,
        template_id: &TaskTemplateId,
        name: Option<String>,
        category: Option<TaskCategory>,
        default_duration_minutes: Option<u32>,
        room: Option<Room>,
    ) -> Result<TaskTemplate, GameError> {
        // Validate before taking the write lock
        if let Some(minutes) = default_duration_minutes {
            ensure_allowed_duration(minutes)?;
        }
        let name = name.map(|n| ensure_valid_name(&n)).transpose()?;

        let mut templates = self.task_templates.write().await;
        let template = templates
            .get_mut(template_id)
            .filter(|t| t.user_id == *user_id)
            .ok_or_else(|| GameError::NotFound("Task not found.".to_string()))?;

        if let Some(name) = name {
            template.name = name;
        }
        if let Some(category) = category {
            template.category = category;
        }
        if let Some(minutes) = default_duration_minutes {
            template.default_duration_minutes = minutes;
        }
        if let Some(room) = room {
            template.room = room;
        }
        template.updated_at = Some(Utc::now());

        Ok(template.clone())
    }

    pub async fn delete_task_template(
        &self,
        user_id: &UserId,
        template_id: &TaskTemplateId,
    ) -> Result<(), GameError> {
        let mut templates = self.task_templates.write().await;
        match templates.get(template_id) {
            Some(t) if t.user_id == *user_id => {
                templates.remove(template_id);
                Ok(())
            }
            _ => Err(GameError::NotFound("Task not found.".to_string())),
        }
    }

    /// List templates newest-first with optional room filter and cursor.
    ///
    /// The cursor is the `created_at` of the last entry of the previous
    /// page; a second value is returned when more entries remain.
    pub async fn list_task_templates(
        &self,
        user_id: &UserId,
        room: Option<Room>,
        limit: usize,
        cursor: Option<DateTime<Utc>>,
    ) -> (Vec<TaskTemplate>, Option<DateTime<Utc>>) {
        let templates = self.task_templates.read().await;
        let mut page: Vec<TaskTemplate> = templates
            .values()
            .filter(|t| t.user_id == *user_id)
            .filter(|t| room.is_none_or(|r| t.room == r))
            .filter(|t| cursor.is_none_or(|c| t.created_at < c))
            .cloned()
            .collect();
        page.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let next_cursor = if page.len() > limit {
            page.truncate(limit);
            page.last().map(|t| t.created_at)
        } else {
            None
        };
        (page, next_cursor)
    }
}
