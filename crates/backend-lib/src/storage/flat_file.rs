// ============================
// crates/backend-lib/src/storage/flat_file.rs
// ============================
//! Flat-file implementation of the store traits.
//!
//! Rows live in memory and are written back as `users.json` and
//! `sessions.json` under the data directory after every mutation.
use super::tables::Tables;
use super::{SessionStore, StoreError, UserStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_common::{NewUser, Session, User, UserId};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tokio::{fs as tokio_fs, sync::Mutex};
use tracing::debug;

const USERS_FILE: &str = "users.json";
const SESSIONS_FILE: &str = "sessions.json";

/// JSON-file backed store.
///
/// The table lock is held across the file write, so mutations are
/// serialized and each file always reflects a complete state. A mutation
/// is applied to a staged copy and only becomes visible once its file
/// write has succeeded.
#[derive(Debug)]
pub struct FlatFileStore {
    root: PathBuf,
    tables: Mutex<Tables>,
}

impl FlatFileStore {
    /// Open the store rooted at `root`, loading any existing rows
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let users: Vec<User> = read_rows(&root.join(USERS_FILE))?;
        let sessions: Vec<Session> = read_rows(&root.join(SESSIONS_FILE))?;
        debug!(
            path = %root.display(),
            users = users.len(),
            sessions = sessions.len(),
            "flat-file store opened"
        );

        Ok(Self {
            root,
            tables: Mutex::new(Tables::from_rows(users, sessions)),
        })
    }

    async fn write_sessions(&self, tables: &Tables) -> Result<(), StoreError> {
        write_rows(&self.root.join(SESSIONS_FILE), &tables.session_rows()).await
    }

    async fn write_users(&self, tables: &Tables) -> Result<(), StoreError> {
        write_rows(&self.root.join(USERS_FILE), &tables.user_rows()).await
    }
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&content)?)
}

/// Write to a sibling temp file, then rename over the target
async fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(rows)?;
    let tmp = path.with_extension("json.tmp");
    tokio_fs::write(&tmp, json).await?;
    tokio_fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl SessionStore for FlatFileStore {
    async fn upsert_session(&self, session: Session) -> Result<String, StoreError> {
        let mut tables = self.tables.lock().await;
        let mut staged = tables.clone();
        let token = staged.upsert_session(session);
        self.write_sessions(&staged).await?;
        *tables = staged;
        Ok(token)
    }

    async fn get_session_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.tables.lock().await.session_by_token(token))
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let mut staged = tables.clone();
        if staged.delete_session_by_token(token) {
            self.write_sessions(&staged).await?;
            *tables = staged;
        }
        Ok(())
    }

    async fn update_session_expiry(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let mut staged = tables.clone();
        if staged.update_session_expiry(token, expires_at) {
            self.write_sessions(&staged).await?;
            *tables = staged;
        }
        Ok(())
    }

    async fn delete_sessions_by_user(&self, user_id: UserId) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let mut staged = tables.clone();
        if staged.delete_sessions_by_user(user_id) {
            self.write_sessions(&staged).await?;
            *tables = staged;
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for FlatFileStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.lock().await;
        let mut staged = tables.clone();
        let user = staged.create_user(user)?;
        self.write_users(&staged).await?;
        *tables = staged;
        Ok(user)
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.tables.lock().await.user_by_id(id))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.tables.lock().await.user_by_email(email))
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let mut staged = tables.clone();
        if staged.delete_user(id) {
            self.write_users(&staged).await?;
            *tables = staged;
        }
        Ok(())
    }
}
