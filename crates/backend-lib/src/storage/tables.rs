//! In-process tables shared by the memory and flat-file stores.
use super::StoreError;
use chrono::{DateTime, Utc};
use gatehouse_common::{NewUser, Session, User, UserId};
use std::collections::HashMap;
use uuid::Uuid;

/// Users and sessions plus the secondary indexes needed for
/// lookups by email and by token.
#[derive(Debug, Default, Clone)]
pub(crate) struct Tables {
    users: HashMap<UserId, User>,
    emails: HashMap<String, UserId>,
    /// Keyed by owner, which is what keeps one session per user
    sessions: HashMap<UserId, Session>,
    tokens: HashMap<String, UserId>,
}

impl Tables {
    /// Rebuild tables and indexes from persisted rows
    pub(crate) fn from_rows(users: Vec<User>, sessions: Vec<Session>) -> Self {
        let mut tables = Self::default();
        for user in users {
            tables.emails.insert(user.email.clone(), user.id);
            tables.users.insert(user.id, user);
        }
        for session in sessions {
            tables.upsert_session(session);
        }
        tables
    }

    pub(crate) fn user_rows(&self) -> Vec<User> {
        let mut rows: Vec<User> = self.users.values().cloned().collect();
        rows.sort_by_key(|u| u.created_at);
        rows
    }

    pub(crate) fn session_rows(&self) -> Vec<Session> {
        let mut rows: Vec<Session> = self.sessions.values().cloned().collect();
        rows.sort_by_key(|s| s.created_at);
        rows
    }

    pub(crate) fn upsert_session(&mut self, mut session: Session) -> String {
        if let Some(previous) = self.sessions.remove(&session.user_id) {
            self.tokens.remove(&previous.token);
            session.id = previous.id;
        }
        let token = session.token.clone();
        self.tokens.insert(token.clone(), session.user_id);
        self.sessions.insert(session.user_id, session);
        token
    }

    pub(crate) fn session_by_token(&self, token: &str) -> Option<Session> {
        self.tokens
            .get(token)
            .and_then(|user_id| self.sessions.get(user_id))
            .cloned()
    }

    /// Returns whether a row was removed
    pub(crate) fn delete_session_by_token(&mut self, token: &str) -> bool {
        match self.tokens.remove(token) {
            Some(user_id) => self.sessions.remove(&user_id).is_some(),
            None => false,
        }
    }

    /// Returns whether a row was updated
    pub(crate) fn update_session_expiry(&mut self, token: &str, expires_at: DateTime<Utc>) -> bool {
        let Some(user_id) = self.tokens.get(token) else {
            return false;
        };
        match self.sessions.get_mut(user_id) {
            Some(session) => {
                session.expires_at = Some(expires_at);
                true
            },
            None => false,
        }
    }

    /// Returns whether a row was removed
    pub(crate) fn delete_sessions_by_user(&mut self, user_id: UserId) -> bool {
        match self.sessions.remove(&user_id) {
            Some(session) => {
                self.tokens.remove(&session.token);
                true
            },
            None => false,
        }
    }

    pub(crate) fn create_user(&mut self, new_user: NewUser) -> Result<User, StoreError> {
        if self.emails.contains_key(&new_user.email) {
            return Err(StoreError::EmailTaken(new_user.email));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            external_id: new_user.external_id,
            created_at: now,
            updated_at: now,
        };

        self.emails.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub(crate) fn user_by_id(&self, id: UserId) -> Option<User> {
        self.users.get(&id).cloned()
    }

    pub(crate) fn user_by_email(&self, email: &str) -> Option<User> {
        self.emails
            .get(email)
            .and_then(|id| self.users.get(id))
            .cloned()
    }

    /// Returns whether a row was removed
    pub(crate) fn delete_user(&mut self, id: UserId) -> bool {
        match self.users.remove(&id) {
            Some(user) => {
                self.emails.remove(&user.email);
                true
            },
            None => false,
        }
    }
}
