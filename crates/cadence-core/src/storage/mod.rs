//! Persistence collaborator.
//!
//! The engine never touches storage. Hosts read entities through an
//! [`EntityStore`], run the engine, and write the result back. Entities are
//! stored as JSON bodies keyed by `(kind, id)` and indexed by owner.

mod config;
pub mod database;
mod memory;
pub mod migrations;

pub use config::{Config, NotificationsConfig, ProfileConfig, RemindersConfig};
pub use database::SqliteStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;
use crate::habit::Habit;
use crate::profile::Profile;
use crate::reminder::Reminder;

/// Returns `~/.config/cadence[-dev]/` based on CADENCE_ENV.
///
/// Set CADENCE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CADENCE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("cadence-dev")
    } else {
        base_dir.join("cadence")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(e.to_string()))?;
    Ok(dir)
}

/// Something an [`EntityStore`] can hold.
pub trait Entity: Serialize + DeserializeOwned {
    /// Namespace for ids of this type.
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn owner_id(&self) -> &str;
}

impl Entity for Habit {
    const KIND: &'static str = "habit";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Entity for Reminder {
    const KIND: &'static str = "reminder";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

impl Entity for Profile {
    const KIND: &'static str = "profile";

    fn id(&self) -> &str {
        &self.owner_id
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }
}

/// Key-value persistence keyed by entity id.
///
/// Implementors provide raw JSON access; the typed `get`/`list`/`put`/`delete`
/// operations are layered on top.
pub trait EntityStore {
    fn get_raw(&self, kind: &str, id: &str) -> Result<Option<String>, StorageError>;

    /// `(id, body)` pairs for every entity of `kind` owned by `owner_id`,
    /// ordered by id.
    fn list_raw(&self, kind: &str, owner_id: &str) -> Result<Vec<(String, String)>, StorageError>;

    fn put_raw(&self, kind: &str, id: &str, owner_id: &str, body: &str) -> Result<(), StorageError>;

    /// Returns `true` if something was deleted.
    fn delete_raw(&self, kind: &str, id: &str) -> Result<bool, StorageError>;

    fn get<T: Entity>(&self, id: &str) -> Result<Option<T>, StorageError>
    where
        Self: Sized,
    {
        self.get_raw(T::KIND, id)?
            .map(|body| decode::<T>(id, &body))
            .transpose()
    }

    /// Like [`EntityStore::get`] but a missing entity is an error.
    fn require<T: Entity>(&self, id: &str) -> Result<T, StorageError>
    where
        Self: Sized,
    {
        self.get(id)?.ok_or_else(|| StorageError::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        })
    }

    /// Every decodable entity of `T` owned by `owner_id`.
    ///
    /// Records that fail to decode are logged and skipped so one bad row
    /// cannot hide the rest.
    fn list<T: Entity>(&self, owner_id: &str) -> Result<Vec<T>, StorageError>
    where
        Self: Sized,
    {
        let (items, corrupt) = self.list_checked::<T>(owner_id)?;
        for err in corrupt {
            tracing::warn!(error = %err, "skipping undecodable record");
        }
        Ok(items)
    }

    /// Decoded entities plus one error per undecodable record.
    fn list_checked<T: Entity>(
        &self,
        owner_id: &str,
    ) -> Result<(Vec<T>, Vec<StorageError>), StorageError>
    where
        Self: Sized,
    {
        let mut items = Vec::new();
        let mut corrupt = Vec::new();
        for (id, body) in self.list_raw(T::KIND, owner_id)? {
            match decode::<T>(&id, &body) {
                Ok(item) => items.push(item),
                Err(e) => corrupt.push(e),
            }
        }
        Ok((items, corrupt))
    }

    fn put<T: Entity>(&self, entity: &T) -> Result<(), StorageError>
    where
        Self: Sized,
    {
        let body = serde_json::to_string(entity).map_err(|e| StorageError::Corrupt {
            kind: T::KIND,
            id: entity.id().to_string(),
            message: e.to_string(),
        })?;
        self.put_raw(T::KIND, entity.id(), entity.owner_id(), &body)
    }

    fn delete<T: Entity>(&self, id: &str) -> Result<bool, StorageError>
    where
        Self: Sized,
    {
        self.delete_raw(T::KIND, id)
    }
}

fn decode<T: Entity>(id: &str, body: &str) -> Result<T, StorageError> {
    serde_json::from_str(body).map_err(|e| StorageError::Corrupt {
        kind: T::KIND,
        id: id.to_string(),
        message: e.to_string(),
    })
}
