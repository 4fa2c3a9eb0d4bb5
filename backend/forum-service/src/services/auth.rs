/// Account registration, login and profile management
use crypto_core::jwt::JwtKeys;
use crypto_core::password::{hash_password, verify_password};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{NewUser, ProfileChanges, PublicUser, User};
use crate::store::{ForumStore, UserStore};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Token plus the profile it was issued for
#[derive(Debug, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub expires_in: i64,
    pub user: PublicUser,
}

pub struct AuthService {
    store: Arc<dyn ForumStore>,
    jwt: JwtKeys,
}

/// Emails are compared case-insensitively
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthService {
    pub fn new(store: Arc<dyn ForumStore>, jwt: JwtKeys) -> Self {
        Self { store, jwt }
    }

    fn session_for(&self, user: User) -> Result<AuthSession> {
        let token = self.jwt.issue(user.id, &user.email, &user.username)?;
        Ok(AuthSession {
            token,
            expires_in: self.jwt.expires_in_secs(),
            user: user.into(),
        })
    }

    /// Create an account and sign it in
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<AuthSession> {
        let username = username.trim();
        let email = normalize_email(email);

        if self.store.find_user_by_username(username).await?.is_some() {
            return Err(AppError::Conflict("username already taken".into()));
        }
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("email already registered".into()));
        }

        let user = self
            .store
            .insert_user(NewUser {
                username: username.to_string(),
                email,
                password_hash: hash_password(password)?,
            })
            .await?;

        info!(user_id = %user.id, "user registered");
        self.session_for(user)
    }

    /// Exchange credentials for a token
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(email);
        let Some(user) = self.store.find_user_by_email(&email).await? else {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "failed login attempt");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        info!(user_id = %user.id, "user logged in");
        self.session_for(user)
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<PublicUser> {
        self.store
            .find_user(user_id)
            .await?
            .map(PublicUser::from)
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// Change username and/or bio; blank values are ignored
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        username: Option<String>,
        bio: Option<String>,
    ) -> Result<PublicUser> {
        let username = username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        if let Some(name) = &username {
            if let Some(existing) = self.store.find_user_by_username(name).await? {
                if existing.id != user_id {
                    return Err(AppError::Conflict("username already taken".into()));
                }
            }
        }

        let user = self
            .store
            .update_user_profile(user_id, ProfileChanges { username, bio })
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        info!(%user_id, "profile updated");
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> AuthService {
        let keys = JwtKeys::from_secret("unit-test-secret-unit-test-secret!!", 7).unwrap();
        AuthService::new(Arc::new(MemoryStore::new()), keys)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service();
        let session = auth
            .register("alice", "Alice@Example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(session.user.email, "alice@example.com");
        assert_eq!(auth.jwt.user_id_from_token(&session.token).unwrap(), session.user.id);

        let login = auth.login("alice@example.com", "secret1").await.unwrap();
        assert_eq!(login.user.id, session.user.id);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let auth = service();
        auth.register("alice", "a@example.com", "secret1").await.unwrap();

        let same_name = auth.register("alice", "b@example.com", "secret1").await;
        assert!(matches!(same_name, Err(AppError::Conflict(_))));

        let same_email = auth.register("bob", "A@example.com", "secret1").await;
        assert!(matches!(same_email, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let auth = service();
        auth.register("alice", "a@example.com", "secret1").await.unwrap();

        let wrong_password = auth.login("a@example.com", "nope123").await.unwrap_err();
        let unknown_email = auth.login("x@example.com", "secret1").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let auth = service();
        let alice = auth.register("alice", "a@example.com", "secret1").await.unwrap();
        auth.register("bob", "b@example.com", "secret1").await.unwrap();

        let taken = auth
            .update_profile(alice.user.id, Some("bob".into()), None)
            .await;
        assert!(matches!(taken, Err(AppError::Conflict(_))));

        let updated = auth
            .update_profile(alice.user.id, Some("  ".into()), Some("hello".into()))
            .await
            .unwrap();
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.bio, "hello");

        let renamed = auth
            .update_profile(alice.user.id, Some("alicia".into()), None)
            .await
            .unwrap();
        assert_eq!(renamed.username, "alicia");
    }
}
