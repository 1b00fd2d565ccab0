//! In-memory store, for tests and single-process deployments without persistence.
use super::tables::Tables;
use super::{SessionStore, StoreError, UserStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_common::{NewUser, Session, User, UserId};
use parking_lot::RwLock;

/// Process-local store. A single lock guards both tables so every
/// operation, including the session upsert, is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn upsert_session(&self, session: Session) -> Result<String, StoreError> {
        Ok(self.tables.write().upsert_session(session))
    }

    async fn get_session_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.tables.read().session_by_token(token))
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<(), StoreError> {
        self.tables.write().delete_session_by_token(token);
        Ok(())
    }

    async fn update_session_expiry(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.tables.write().update_session_expiry(token, expires_at);
        Ok(())
    }

    async fn delete_sessions_by_user(&self, user_id: UserId) -> Result<(), StoreError> {
        self.tables.write().delete_sessions_by_user(user_id);
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.tables.write().create_user(user)
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().user_by_id(id))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().user_by_email(email))
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        self.tables.write().delete_user(id);
        Ok(())
    }
}
