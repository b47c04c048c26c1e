mod file;
mod memory;
mod redis;

use async_trait::async_trait;
use log::{ error, info };
use serde::{ de::DeserializeOwned, Serialize };
use std::error::Error;
use std::sync::Arc;

use crate::cli::Args;
use crate::error::StoreError;

pub use self::file::FileStore;
pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Raw string key-value backend.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
    async fn clear_all(&self) -> Result<(), StoreError>;
}

/// JSON view over a [`KeyValueStore`] that never fails towards the caller.
///
/// Reads fall back to the supplied default on any backend or decode error;
/// writes log the error and carry on.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueStore>,
}

impl Storage {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        match self.backend.get(key).await {
            Ok(Some(json)) =>
                match serde_json::from_str(&json) {
                    Ok(value) => value,
                    Err(e) => {
                        error!("Storage get error for key \"{}\": {}", key, e);
                        fallback
                    }
                }
            Ok(None) => fallback,
            Err(e) => {
                error!("Storage get error for key \"{}\": {}", key, e);
                fallback
            }
        }
    }

    /// Like [`Storage::get`] but surfaces backend and decode errors, for
    /// read-modify-write cycles that must not write over data they could not read.
    pub async fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.backend.get(key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                error!("Storage set error for key \"{}\": {}", key, e);
                return;
            }
        };
        if let Err(e) = self.backend.set(key, &json).await {
            error!("Storage set error for key \"{}\": {}", key, e);
        }
    }

    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.backend.remove(key).await {
            error!("Storage remove error for key \"{}\": {}", key, e);
        }
    }

    pub async fn clear_all(&self) {
        if let Err(e) = self.backend.clear_all().await {
            error!("Storage clear error: {}", e);
        }
    }
}

pub fn create_store(args: &Args) -> Result<Arc<dyn KeyValueStore>, Box<dyn Error + Send + Sync>> {
    match args.store_type.to_lowercase().as_str() {
        "redis" => {
            let store = RedisStore::new(&args.store_host, &args.store_prefix)?;
            Ok(Arc::new(store))
        }
        "file" => Ok(Arc::new(FileStore::new(&args.store_path))),
        "memory" => Ok(Arc::new(MemoryStore::new())),
        other => Err(Box::new(StoreError::UnsupportedType(other.to_string()))),
    }
}

pub fn initialize_storage(args: &Args) -> Result<Storage, Box<dyn Error + Send + Sync>> {
    let location = match args.store_type.to_lowercase().as_str() {
        "redis" => args.store_host.clone(),
        "file" => args.store_path.clone(),
        _ => "process memory".to_string(),
    };
    info!("Journal data will be stored in: {} at {}", args.store_type, location);
    Ok(Storage::new(create_store(args)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk gone")))
        }
        async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk gone")))
        }
        async fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk gone")))
        }
        async fn clear_all(&self) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk gone")))
        }
    }

    #[tokio::test]
    async fn failing_backend_degrades_to_fallback() {
        let storage = Storage::new(Arc::new(BrokenStore));
        assert_eq!(storage.get("messages", vec![1, 2]).await, vec![1, 2]);
        storage.set("messages", &vec![3]).await;
        storage.remove("messages").await;
        storage.clear_all().await;
    }

    #[tokio::test]
    async fn undecodable_value_returns_fallback() {
        let backend = Arc::new(MemoryStore::new());
        backend.set("onboardingCompleted", "not json").await.unwrap();
        let storage = Storage::new(backend);
        assert!(!storage.get("onboardingCompleted", false).await);
    }

    #[tokio::test]
    async fn try_get_reports_what_get_hides() {
        let broken = Storage::new(Arc::new(BrokenStore));
        assert!(matches!(broken.try_get::<Vec<i32>>("messages").await, Err(StoreError::Io(_))));

        let backend = Arc::new(MemoryStore::new());
        backend.set("messages", "{ not json").await.unwrap();
        let storage = Storage::new(backend);
        assert!(matches!(storage.try_get::<Vec<i32>>("messages").await, Err(StoreError::Json(_))));
        assert_eq!(storage.try_get::<Vec<i32>>("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn round_trips_json_values() {
        let storage = Storage::new(Arc::new(MemoryStore::new()));
        storage.set("onboardingCompleted", &true).await;
        assert!(storage.get("onboardingCompleted", false).await);
        storage.remove("onboardingCompleted").await;
        assert!(!storage.get("onboardingCompleted", false).await);
    }
}
