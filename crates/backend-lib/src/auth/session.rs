// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Session token handling and management.
use super::token_generator::generate_secure_token;
use super::AuthError;
use crate::metrics::{SESSION_CREATED, SESSION_EXPIRED, SESSION_REFRESHED, SESSION_REVOKED};
use crate::storage::{SessionStore, StoreError};
use chrono::Utc;
use gatehouse_common::{Session, UserId};
use metrics::counter;
use std::{future::Future, net::IpAddr, sync::Arc, time::Duration};
use tracing::{debug, warn};
use uuid::Uuid;

/// Session TTL (time to live)
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24); // 24 hours

/// Default upper bound on a single store call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Session manager: issues, validates, refreshes and revokes sessions.
///
/// Expiry is enforced lazily when a session is read; there is no
/// background sweeper. Every store call is bounded by `store_timeout`,
/// and writes run on their own task so that a dropped request future
/// cannot cancel them half-way.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
    store_timeout: Duration,
}

impl SessionManager {
    /// Create a new session manager with the default TTL and store timeout
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self::new_with_timeouts(store, SESSION_TTL, DEFAULT_STORE_TIMEOUT)
    }

    /// Create a new session manager with custom timeouts
    pub fn new_with_timeouts(
        store: Arc<dyn SessionStore>,
        ttl: Duration,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            ttl,
            store_timeout,
        }
    }

    /// Lifetime given to new and refreshed sessions
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Produce a new opaque session token (256 bits, URL-safe)
    pub fn generate_token() -> Result<String, AuthError> {
        generate_secure_token()
    }

    /// Create a session for `user_id`, replacing any session the user already has
    pub async fn create_session(
        &self,
        user_id: UserId,
        client_ip: Option<IpAddr>,
        user_agent: &str,
    ) -> Result<String, AuthError> {
        let token = Self::generate_token()?;
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            token,
            created_at: now,
            expires_at: Some(now + self.chrono_ttl()?),
            ip_address: client_ip,
            user_agent: user_agent.to_string(),
        };

        let store = self.store.clone();
        let token = self
            .write(async move { store.upsert_session(session).await })
            .await?;

        counter!(SESSION_CREATED).increment(1);
        debug!(%user_id, "session created");
        Ok(token)
    }

    /// Look up a session, removing it if it has expired
    pub async fn validate_session(&self, token: &str) -> Result<Session, AuthError> {
        let session = self
            .read(self.store.get_session_by_token(token))
            .await?
            .ok_or(AuthError::InvalidSession)?;

        if session.is_expired_at(Utc::now()) {
            let store = self.store.clone();
            let expired = token.to_string();
            if let Err(e) = self
                .write(async move { store.delete_session_by_token(&expired).await })
                .await
            {
                warn!(user_id = %session.user_id, error = %e, "failed to delete expired session");
            }
            counter!(SESSION_EXPIRED).increment(1);
            return Err(AuthError::SessionExpired);
        }

        Ok(session)
    }

    /// Extend a valid session's expiry to now + TTL; the token is unchanged
    pub async fn refresh_session(&self, token: &str) -> Result<(), AuthError> {
        self.validate_session(token).await?;

        let expires_at = Utc::now() + self.chrono_ttl()?;
        let store = self.store.clone();
        let token = token.to_string();
        self.write(async move { store.update_session_expiry(&token, expires_at).await })
            .await?;

        counter!(SESSION_REFRESHED).increment(1);
        Ok(())
    }

    /// Delete a session. Revoking an unknown token is not an error.
    pub async fn revoke_session(&self, token: &str) -> Result<(), AuthError> {
        let store = self.store.clone();
        let token = token.to_string();
        self.write(async move { store.delete_session_by_token(&token).await })
            .await?;
        counter!(SESSION_REVOKED).increment(1);
        Ok(())
    }

    /// Delete every session of `user_id`
    pub async fn revoke_all_sessions_for_user(&self, user_id: UserId) -> Result<(), AuthError> {
        let store = self.store.clone();
        self.write(async move { store.delete_sessions_by_user(user_id).await })
            .await?;
        counter!(SESSION_REVOKED).increment(1);
        Ok(())
    }

    fn chrono_ttl(&self) -> Result<chrono::Duration, AuthError> {
        chrono::Duration::from_std(self.ttl)
            .map_err(|e| AuthError::Store(StoreError::Internal(e.to_string())))
    }

    async fn read<T>(
        &self,
        op: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, AuthError> {
        bounded(self.store_timeout, op).await
    }

    async fn write<T: Send + 'static>(
        &self,
        op: impl Future<Output = Result<T, StoreError>> + Send + 'static,
    ) -> Result<T, AuthError> {
        detached(self.store_timeout, op).await
    }
}

/// Await a store call for at most `limit`
pub(crate) async fn bounded<T>(
    limit: Duration,
    op: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, AuthError> {
    match tokio::time::timeout(limit, op).await {
        Ok(result) => result.map_err(AuthError::from),
        Err(_) => Err(AuthError::StoreTimeout),
    }
}

/// Run a store write on its own task and wait for it for at most `limit`.
///
/// The task keeps running if the caller is dropped or times out.
pub(crate) async fn detached<T: Send + 'static>(
    limit: Duration,
    op: impl Future<Output = Result<T, StoreError>> + Send + 'static,
) -> Result<T, AuthError> {
    let handle = tokio::spawn(op);
    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(result)) => result.map_err(AuthError::from),
        Ok(Err(join_error)) => Err(AuthError::Store(StoreError::Internal(join_error.to_string()))),
        Err(_) => Err(AuthError::StoreTimeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration};

    fn manager() -> (SessionManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (SessionManager::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_create_then_validate() {
        let (sessions, _) = manager();
        let user_id = Uuid::new_v4();
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        let token = sessions.create_session(user_id, Some(ip), "agent").await.unwrap();
        let session = sessions.validate_session(&token).await.unwrap();

        assert_eq!(session.user_id, user_id);
        assert_eq!(session.token, token);
        assert_eq!(session.ip_address, Some(ip));
        assert_eq!(session.user_agent, "agent");
        assert!(session.expires_at.unwrap() > Utc::now());
    }

    #[tokio::test]
    async fn test_second_session_supersedes_first() {
        let (sessions, _) = manager();
        let user_id = Uuid::new_v4();

        let first = sessions.create_session(user_id, None, "a").await.unwrap();
        let second = sessions.create_session(user_id, None, "b").await.unwrap();

        assert_ne!(first, second);
        assert!(matches!(
            sessions.validate_session(&first).await,
            Err(AuthError::InvalidSession)
        ));
        assert_eq!(sessions.validate_session(&second).await.unwrap().user_id, user_id);
    }

    #[tokio::test]
    async fn test_unknown_token_is_invalid() {
        let (sessions, _) = manager();
        assert!(matches!(
            sessions.validate_session("nope").await,
            Err(AuthError::InvalidSession)
        ));
    }

    #[tokio::test]
    async fn test_expired_session_is_removed_on_read() {
        let (sessions, store) = manager();
        let token = sessions.create_session(Uuid::new_v4(), None, "a").await.unwrap();
        store
            .update_session_expiry(&token, Utc::now() - ChronoDuration::seconds(1))
            .await
            .unwrap();

        assert!(matches!(
            sessions.validate_session(&token).await,
            Err(AuthError::SessionExpired)
        ));
        assert!(matches!(
            sessions.validate_session(&token).await,
            Err(AuthError::InvalidSession)
        ));
    }

    #[tokio::test]
    async fn test_refresh_extends_expiry() {
        let (sessions, store) = manager();
        let token = sessions.create_session(Uuid::new_v4(), None, "a").await.unwrap();
        store
            .update_session_expiry(&token, Utc::now() + ChronoDuration::minutes(1))
            .await
            .unwrap();
        let before = sessions.validate_session(&token).await.unwrap().expires_at.unwrap();

        sessions.refresh_session(&token).await.unwrap();

        let after = sessions.validate_session(&token).await.unwrap();
        assert!(after.expires_at.unwrap() > before);
        assert_eq!(after.token, token);
    }

    #[tokio::test]
    async fn test_refresh_propagates_validation_errors() {
        let (sessions, store) = manager();
        assert!(matches!(
            sessions.refresh_session("missing").await,
            Err(AuthError::InvalidSession)
        ));

        let token = sessions.create_session(Uuid::new_v4(), None, "a").await.unwrap();
        let past = Utc::now() - ChronoDuration::seconds(5);
        store.update_session_expiry(&token, past).await.unwrap();

        assert!(matches!(
            sessions.refresh_session(&token).await,
            Err(AuthError::SessionExpired)
        ));
        assert!(store.get_session_by_token(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revocation_is_idempotent() {
        let (sessions, _) = manager();
        let user_id = Uuid::new_v4();
        let token = sessions.create_session(user_id, None, "a").await.unwrap();

        sessions.revoke_session(&token).await.unwrap();
        sessions.revoke_session(&token).await.unwrap();
        assert!(matches!(
            sessions.validate_session(&token).await,
            Err(AuthError::InvalidSession)
        ));

        let token = sessions.create_session(user_id, None, "a").await.unwrap();
        sessions.revoke_all_sessions_for_user(user_id).await.unwrap();
        sessions.revoke_all_sessions_for_user(user_id).await.unwrap();
        assert!(sessions.validate_session(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_logins_leave_one_session() {
        let (sessions, _) = manager();
        let user_id = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let sessions = sessions.clone();
            handles.push(tokio::spawn(async move {
                sessions.create_session(user_id, None, "a").await.unwrap()
            }));
        }
        let mut tokens = Vec::new();
        for handle in handles {
            tokens.push(handle.await.unwrap());
        }

        let mut live = 0;
        for token in &tokens {
            if sessions.validate_session(token).await.is_ok() {
                live += 1;
            }
        }
        assert_eq!(live, 1);
    }

    /// Store whose every call takes longer than any reasonable timeout
    struct StalledStore;

    #[async_trait]
    impl SessionStore for StalledStore {
        async fn upsert_session(&self, session: Session) -> Result<String, StoreError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(session.token)
        }

        async fn get_session_by_token(&self, _: &str) -> Result<Option<Session>, StoreError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(None)
        }

        async fn delete_session_by_token(&self, _: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn update_session_expiry(&self, _: &str, _: DateTime<Utc>) -> Result<(), StoreError> {
            Ok(())
        }

        async fn delete_sessions_by_user(&self, _: UserId) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_timeout() {
        let sessions = SessionManager::new_with_timeouts(
            Arc::new(StalledStore),
            SESSION_TTL,
            Duration::from_millis(50),
        );

        assert!(matches!(
            sessions.validate_session("any").await,
            Err(AuthError::StoreTimeout)
        ));
        assert!(matches!(
            sessions.create_session(Uuid::new_v4(), None, "a").await,
            Err(AuthError::StoreTimeout)
        ));
    }
}
