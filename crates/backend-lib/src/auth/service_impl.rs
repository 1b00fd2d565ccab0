use crate::auth::session::{bounded, detached};
use crate::auth::{AuthError, AuthService, CredentialHasher};
use crate::storage::{StoreError, UserStore};
use async_trait::async_trait;
use gatehouse_common::{NewUser, User, UserId};
use std::{sync::Arc, time::Duration};
use tracing::info;
use zeroize::Zeroizing;

/// Store-backed account service
pub struct DefaultAuth {
    users: Arc<dyn UserStore>,
    hasher: CredentialHasher,
    store_timeout: Duration,
}

impl DefaultAuth {
    pub fn new(users: Arc<dyn UserStore>, hasher: CredentialHasher, store_timeout: Duration) -> Self {
        Self {
            users,
            hasher,
            store_timeout,
        }
    }

    /// Hash on the blocking pool; scrypt is deliberately slow
    async fn hash_password(&self, plain: &str) -> Result<String, AuthError> {
        let hasher = self.hasher;
        let plain = Zeroizing::new(plain.to_owned());
        tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn verify_password(&self, hash: &str, plain: &str) -> Result<bool, AuthError> {
        let hasher = self.hasher;
        let hash = hash.to_owned();
        let plain = Zeroizing::new(plain.to_owned());
        tokio::task::spawn_blocking(move || hasher.verify(&hash, &plain))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        // Cheap pre-check so a duplicate does not pay for a hash;
        // the store's own uniqueness check below is authoritative.
        if bounded(self.store_timeout, self.users.get_user_by_email(email))
            .await?
            .is_some()
        {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = self.hash_password(password).await?;
        let users = self.users.clone();
        let new_user = NewUser {
            email: email.to_string(),
            password_hash: Some(password_hash),
            external_id: None,
        };

        let user = detached(self.store_timeout, async move { users.create_user(new_user).await })
            .await
            .map_err(|e| match e {
                AuthError::Store(StoreError::EmailTaken(_)) => AuthError::EmailAlreadyExists,
                other => other,
            })?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = bounded(self.store_timeout, self.users.get_user_by_email(email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AuthError::InvalidCredentials);
        };

        if self.verify_password(hash, password).await? {
            Ok(user)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, AuthError> {
        bounded(self.store_timeout, self.users.get_user_by_id(id)).await
    }
}
