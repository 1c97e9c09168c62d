use super::AppState;
use crate::types::*;
use rand::Rng;

/// Safe character set for tokens (excludes 0/O, 1/I/L to avoid confusion)
const TOKEN_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const TOKEN_LENGTH: usize = 12;

fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LENGTH)
        .map(|_| TOKEN_CHARS[rng.random_range(0..TOKEN_CHARS.len())] as char)
        .collect()
}

impl AppState {
    /// Register a new user with a fresh bearer token
    pub async fn create_user(&self, display_name: String) -> User {
        // Generate a unique token (check for collisions)
        let token = loop {
            let candidate = generate_token();
            let users = self.users.read().await;
            if !users.values().any(|u| u.token == candidate) {
                break candidate;
            }
            // Collision - try again
        };

        let user = User {
            id: ulid::Ulid::new().to_string(),
            token,
            display_name,
        };

        self.users
            .write()
            .await
            .insert(user.id.clone(), user.clone());
        user
    }

    /// Resolve a bearer token to its user
    pub async fn get_user_by_token(&self, token: &str) -> Option<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.token == token)
            .cloned()
    }

    pub async fn get_user(&self, user_id: &UserId) -> Option<User> {
        self.users.read().await.get(user_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_use_safe_charset() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.bytes().all(|b| TOKEN_CHARS.contains(&b)));
    }

    #[tokio::test]
    async fn test_create_and_resolve_user() {
        let state = AppState::new();
        let user = state.create_user("Mara".to_string()).await;

        assert_eq!(user.display_name, "Mara");
        assert!(!user.token.is_empty());

        let resolved = state.get_user_by_token(&user.token).await;
        assert_eq!(resolved.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_unknown_token_resolves_to_none() {
        let state = AppState::new();
        assert!(state.get_user_by_token("NOPE").await.is_none());
    }
}
