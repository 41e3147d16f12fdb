use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// A registered learner. Credentials are handled outside this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            created_at: Utc::now(),
        }
    }
}

impl Store {
    pub fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let name_key = keys::username_index_key(&user.username);

        // CAS on the username index: two concurrent registrations of the same
        // name cannot both pass.
        let cas_result = self
            .users
            .compare_and_swap(
                name_key.as_bytes(),
                None::<&[u8]>,
                Some(user.id.as_bytes().to_vec()),
            )
            .map_err(StoreError::Sled)?;

        if cas_result.is_err() {
            return Err(StoreError::Conflict {
                entity: "username".to_string(),
                key: user.username.clone(),
            });
        }

        let user_key = keys::user_key(&user.id);
        let user_bytes = Self::serialize(user)?;
        if let Err(e) = self.users.insert(user_key.as_bytes(), user_bytes) {
            let _ = self.users.remove(name_key.as_bytes());
            return Err(StoreError::Sled(e));
        }

        Ok(())
    }

    pub fn get_user_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let key = keys::user_key(user_id);
        match self.users.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let index_key = keys::username_index_key(username);
        let Some(user_id_raw) = self.users.get(index_key.as_bytes())? else {
            return Ok(None);
        };
        let user_id = match String::from_utf8(user_id_raw.to_vec()) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid UTF-8 in username index");
                return Ok(None);
            }
        };
        self.get_user_by_id(&user_id)
    }
}
