//! User directory collaborator contract
//!
//! Resolves a task's owner to the profile slice the engine needs: timezone
//! and notification preference.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::User;
use crate::store::StoreError;

/// Owner resolution consumed by the generator and dispatcher
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up a user by id; `None` when the owner is unknown.
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError>;
}

/// Fixed in-memory directory, for tests and embedders whose store does not
/// carry user profiles.
#[derive(Default)]
pub struct StaticUserDirectory {
    users: HashMap<String, User>,
}

impl StaticUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.users.insert(user.id.clone(), user);
        self
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(id).cloned())
    }
}
