//! End-to-end tests of the authentication kernel over an in-memory store:
//! token round-trips, single-use refresh rotation, expiry boundaries, logout
//! invalidation, and the login/refresh/authenticate scenario.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use account_service::db::UserStore;
use account_service::error::AppError;
use account_service::models::{NewUser, User};
use account_service::security::jwt::JwtKeys;
use account_service::security::password;
use account_service::services::AuthService;

/// In-memory account store mirroring the Postgres implementation's contract,
/// including the atomic conditional rotate (the whole map sits behind one
/// lock, so match-and-overwrite is a single critical section).
#[derive(Default)]
struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    fn new() -> Self {
        Self::default()
    }

    fn remove(&self, id: Uuid) {
        self.users.lock().unwrap().remove(&id);
    }

    fn stored_refresh_token(&self, id: Uuid) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .get(&id)
            .and_then(|u| u.refresh_token.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new_user: &NewUser) -> account_service::Result<User> {
        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|u| u.username == new_user.username || u.email == new_user.email)
        {
            return Err(AppError::Conflict(
                "username or email already registered".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username.to_lowercase(),
            email: new_user.email.to_lowercase(),
            full_name: new_user.full_name.clone(),
            avatar_url: new_user.avatar_url.clone(),
            cover_image_url: new_user.cover_image_url.clone(),
            password_hash: new_user.password_hash.clone(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_identifier(&self, identifier: &str) -> account_service::Result<Option<User>> {
        let identifier = identifier.to_lowercase();
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == identifier || u.email == identifier)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> account_service::Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> account_service::Result<Option<User>> {
        let username = username.to_lowercase();
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn set_refresh_token(
        &self,
        id: Uuid,
        token: Option<&str>,
    ) -> account_service::Result<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get_mut(&id) {
            user.refresh_token = token.map(str::to_string);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        presented: &str,
        next: &str,
    ) -> account_service::Result<bool> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&id) {
            Some(user) if user.refresh_token.as_deref() == Some(presented) => {
                user.refresh_token = Some(next.to_string());
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> account_service::Result<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get_mut(&id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn update_account(
        &self,
        id: Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> account_service::Result<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;
        if let Some(full_name) = full_name {
            user.full_name = full_name.to_string();
        }
        if let Some(email) = email {
            user.email = email.to_lowercase();
        }
        Ok(user.clone())
    }

    async fn update_avatar(&self, id: Uuid, avatar_url: &str) -> account_service::Result<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;
        user.avatar_url = avatar_url.to_string();
        Ok(user.clone())
    }

    async fn update_cover_image(
        &self,
        id: Uuid,
        cover_image_url: &str,
    ) -> account_service::Result<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;
        user.cover_image_url = Some(cover_image_url.to_string());
        Ok(user.clone())
    }
}

const ADA_PASSWORD: &str = "correct horse battery";

fn test_keys() -> JwtKeys {
    JwtKeys::new(
        "integration-access-secret-0123456789",
        "integration-refresh-secret-012345678",
        900,
        604800,
    )
}

/// Service over a store seeded with the "ada" identity. The second return
/// value keeps a handle on the store for state assertions.
async fn seeded_service(keys: JwtKeys) -> (AuthService, Arc<MemoryUserStore>, Uuid) {
    let store = Arc::new(MemoryUserStore::new());
    let user = store
        .create(&NewUser {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            full_name: "Ada Lovelace".to_string(),
            avatar_url: "https://assets.example/ada.png".to_string(),
            cover_image_url: None,
            password_hash: password::hash_password(ADA_PASSWORD).unwrap(),
        })
        .await
        .unwrap();

    let service = AuthService::new(store.clone(), keys);
    (service, store, user.id)
}

#[tokio::test]
async fn login_issues_pair_and_persists_refresh_token() {
    let (service, store, ada_id) = seeded_service(test_keys()).await;

    let outcome = service.login("ada", ADA_PASSWORD).await.unwrap();
    assert_eq!(outcome.user.username, "ada");
    assert!(!outcome.tokens.access_token.is_empty());
    assert!(!outcome.tokens.refresh_token.is_empty());

    // The minted refresh token became the account's single outstanding value.
    assert_eq!(
        store.stored_refresh_token(ada_id).as_deref(),
        Some(outcome.tokens.refresh_token.as_str())
    );
}

#[tokio::test]
async fn login_accepts_email_as_identifier() {
    let (service, _store, _) = seeded_service(test_keys()).await;
    assert!(service.login("ada@example.com", ADA_PASSWORD).await.is_ok());
}

#[tokio::test]
async fn login_unknown_identifier_is_not_found() {
    let (service, _store, _) = seeded_service(test_keys()).await;
    let err = service.login("grace", ADA_PASSWORD).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn login_wrong_password_is_credential_mismatch() {
    let (service, _store, _) = seeded_service(test_keys()).await;
    let err = service.login("ada", "wrong").await.unwrap_err();
    assert!(matches!(err, AppError::CredentialMismatch));
}

#[tokio::test]
async fn access_token_round_trips_through_the_gate() {
    let (service, _store, ada_id) = seeded_service(test_keys()).await;

    let outcome = service.login("ada", ADA_PASSWORD).await.unwrap();
    let profile = service
        .authenticate(Some(&outcome.tokens.access_token))
        .await
        .unwrap();

    assert_eq!(profile.id, ada_id);
    assert_eq!(profile.username, "ada");
}

#[tokio::test]
async fn gate_without_token_is_unauthenticated() {
    let (service, _store, _) = seeded_service(test_keys()).await;
    assert!(matches!(
        service.authenticate(None).await.unwrap_err(),
        AppError::Unauthenticated
    ));
    assert!(matches!(
        service.refresh(None).await.unwrap_err(),
        AppError::Unauthenticated
    ));
}

#[tokio::test]
async fn tampered_token_is_invalid() {
    let (service, _store, _) = seeded_service(test_keys()).await;
    let outcome = service.login("ada", ADA_PASSWORD).await.unwrap();

    let mut tampered = outcome.tokens.access_token.clone();
    tampered.pop();
    tampered.push('x');

    assert!(matches!(
        service.authenticate(Some(&tampered)).await.unwrap_err(),
        AppError::InvalidToken(_)
    ));
}

#[tokio::test]
async fn refresh_token_is_single_use() {
    let (service, store, ada_id) = seeded_service(test_keys()).await;
    let outcome = service.login("ada", ADA_PASSWORD).await.unwrap();
    let original = outcome.tokens.refresh_token.clone();

    // First exchange succeeds and rotates the stored value.
    let pair = service.refresh(Some(&original)).await.unwrap();
    assert_ne!(pair.refresh_token, original);
    assert_eq!(
        store.stored_refresh_token(ada_id).as_deref(),
        Some(pair.refresh_token.as_str())
    );

    // Replaying the original token is reuse.
    let err = service.refresh(Some(&original)).await.unwrap_err();
    assert!(matches!(err, AppError::TokenReused));

    // The rotated token still works exactly once.
    assert!(service.refresh(Some(&pair.refresh_token)).await.is_ok());
}

#[tokio::test]
async fn concurrent_refreshes_with_one_token_yield_one_winner() {
    let (service, _store, _) = seeded_service(test_keys()).await;
    let outcome = service.login("ada", ADA_PASSWORD).await.unwrap();
    let token = outcome.tokens.refresh_token;

    let (a, b) = tokio::join!(service.refresh(Some(&token)), service.refresh(Some(&token)));

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one concurrent rotation may win");
    for result in [a, b] {
        if let Err(err) = result {
            assert!(matches!(err, AppError::TokenReused));
        }
    }
}

#[tokio::test]
async fn logout_invalidates_outstanding_refresh_token() {
    let (service, store, ada_id) = seeded_service(test_keys()).await;
    let outcome = service.login("ada", ADA_PASSWORD).await.unwrap();

    service.logout(ada_id).await.unwrap();
    assert_eq!(store.stored_refresh_token(ada_id), None);

    // A valid-but-superseded token must not succeed after logout.
    let err = service
        .refresh(Some(&outcome.tokens.refresh_token))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::TokenReused));
}

#[tokio::test]
async fn expired_tokens_are_rejected_regardless_of_signature() {
    // Issue with TTLs already in the past; signatures remain valid.
    let expired_keys = JwtKeys::new(
        "integration-access-secret-0123456789",
        "integration-refresh-secret-012345678",
        -300,
        -300,
    );
    let (service, _store, _) = seeded_service(expired_keys).await;
    let outcome = service.login("ada", ADA_PASSWORD).await.unwrap();

    match service
        .authenticate(Some(&outcome.tokens.access_token))
        .await
        .unwrap_err()
    {
        AppError::InvalidToken(msg) => assert!(msg.contains("expired")),
        other => panic!("expected expired-token error, got {other:?}"),
    }

    match service
        .refresh(Some(&outcome.tokens.refresh_token))
        .await
        .unwrap_err()
    {
        AppError::InvalidToken(msg) => assert!(msg.contains("expired")),
        other => panic!("expected expired-token error, got {other:?}"),
    }
}

#[tokio::test]
async fn gate_reports_deleted_subject() {
    let (service, store, ada_id) = seeded_service(test_keys()).await;
    let outcome = service.login("ada", ADA_PASSWORD).await.unwrap();

    store.remove(ada_id);

    let err = service
        .authenticate(Some(&outcome.tokens.access_token))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UnknownSubject));
}

#[tokio::test]
async fn refresh_token_is_not_accepted_at_the_access_gate() {
    let (service, _store, _) = seeded_service(test_keys()).await;
    let outcome = service.login("ada", ADA_PASSWORD).await.unwrap();

    // Different secret per kind: the long-lived token must not pass the gate.
    let err = service
        .authenticate(Some(&outcome.tokens.refresh_token))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidToken(_)));
}

#[tokio::test]
async fn register_then_login_and_duplicate_conflicts() {
    let (service, _store, _) = seeded_service(test_keys()).await;

    let profile = service
        .register(
            "Grace",
            "grace@example.com",
            "Grace Hopper",
            "s3cure-password",
            "https://assets.example/grace.png".to_string(),
            None,
        )
        .await
        .unwrap();
    assert_eq!(profile.username, "grace"); // case-normalized

    assert!(service.login("grace", "s3cure-password").await.is_ok());

    let err = service
        .register(
            "grace",
            "other@example.com",
            "Another Grace",
            "s3cure-password",
            "https://assets.example/other.png".to_string(),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn change_password_requires_the_old_secret() {
    let (service, _store, ada_id) = seeded_service(test_keys()).await;

    let err = service
        .change_password(ada_id, "wrong", "new-password-123")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CredentialMismatch));

    service
        .change_password(ada_id, ADA_PASSWORD, "new-password-123")
        .await
        .unwrap();

    assert!(matches!(
        service.login("ada", ADA_PASSWORD).await.unwrap_err(),
        AppError::CredentialMismatch
    ));
    assert!(service.login("ada", "new-password-123").await.is_ok());
}

/// The full scenario: login as ada, rotate the refresh token, confirm the
/// old one is dead and the new access token resolves back to ada.
#[tokio::test]
async fn login_refresh_authenticate_scenario() {
    let (service, _store, ada_id) = seeded_service(test_keys()).await;

    let outcome = service.login("ada", ADA_PASSWORD).await.unwrap();
    let old_refresh = outcome.tokens.refresh_token.clone();

    let pair = service.refresh(Some(&old_refresh)).await.unwrap();
    assert!(matches!(
        service.refresh(Some(&old_refresh)).await.unwrap_err(),
        AppError::TokenReused
    ));

    let profile = service
        .authenticate(Some(&pair.access_token))
        .await
        .unwrap();
    assert_eq!(profile.id, ada_id);
    assert_eq!(profile.username, "ada");
    assert_eq!(profile.email, "ada@example.com");
}
