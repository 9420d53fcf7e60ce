use crate::database::error::StoreError;
use crate::database::models::{BurnEvent, Coin, CoinsData};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Mutation applied to the latest persisted document under the write lock
pub type CoinsMutation = Box<dyn FnOnce(&mut CoinsData) -> Result<(), StoreError> + Send>;

/// Coin repository trait - the record store seen by the sync engine and the API
///
/// Readers always get a complete document. Writers are totally ordered: each
/// write starts only after the previous one finished.
#[async_trait]
pub trait CoinRepository: Send + Sync {
    /// Read the whole document; missing or corrupt storage yields an empty one
    async fn read_all(&self) -> CoinsData;

    /// Persist the whole document, replacing what was there
    async fn replace(&self, data: CoinsData) -> Result<(), StoreError>;

    /// Read-modify-write as one ordered write
    async fn update(&self, mutate: CoinsMutation) -> Result<(), StoreError>;

    /// Find coin by ID
    async fn find_by_id(&self, id: &str) -> Option<Coin> {
        self.read_all().await.find_coin(id).cloned()
    }

    /// Append a coin; ids must be unique
    async fn add_coin(&self, coin: Coin) -> Result<(), StoreError> {
        self.update(Box::new(move |data: &mut CoinsData| {
            if data.find_coin(&coin.id).is_some() {
                return Err(StoreError::DuplicateCoin(coin.id.clone()));
            }
            data.coins.push(coin);
            Ok(())
        }))
        .await
    }

    /// Append to the burn-event log
    async fn add_burn_event(&self, event: BurnEvent) -> Result<(), StoreError> {
        self.update(Box::new(move |data: &mut CoinsData| {
            data.burn_events.push(event);
            Ok(())
        }))
        .await
    }
}

/// Coin repository backed by a single pretty-printed JSON file
///
/// Writes go to a sibling temp file that is then renamed over the target, so a
/// concurrent reader sees either the old or the new document, never a torn one.
pub struct JsonFileCoinRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileCoinRepository {
    /// Create repository for the given data file (created on first write)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create repository from `COINS_DATA_PATH` or `data/coins.json`
    pub fn with_env_config() -> Self {
        let path = std::env::var("COINS_DATA_PATH").unwrap_or_else(|_| "data/coins.json".to_string());

        tracing::info!("📁 Coin store: {}", path);
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load for writers: a missing file is an empty document, anything unreadable is an error
    async fn load_strict(&self) -> Result<CoinsData, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| StoreError::Unreadable {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CoinsData::default()),
            Err(e) => Err(StoreError::Unreadable {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
        }
    }

    async fn persist(&self, data: &CoinsData) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(data)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        tracing::debug!(
            "Persisted {} coins and {} burn events to {}",
            data.coins.len(),
            data.burn_events.len(),
            self.path.display()
        );

        Ok(())
    }
}

#[async_trait]
impl CoinRepository for JsonFileCoinRepository {
    async fn read_all(&self) -> CoinsData {
        match self.load_strict().await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Falling back to empty coin data: {}", e);
                CoinsData::default()
            }
        }
    }

    async fn replace(&self, data: CoinsData) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.persist(&data).await
    }

    async fn update(&self, mutate: CoinsMutation) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut data = self.load_strict().await?;
        mutate(&mut data)?;
        self.persist(&data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn repo_in(dir: &TempDir) -> JsonFileCoinRepository {
        JsonFileCoinRepository::new(dir.path().join("data").join("coins.json"))
    }

    fn burn_event(id: usize) -> BurnEvent {
        BurnEvent {
            id: format!("burn-{}", id),
            coin_id: "pare".to_string(),
            amount: 1_000.0,
            tx_hash: format!("tx{}", id),
            timestamp: Utc::now(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir);

        assert_eq!(repo.read_all().await, CoinsData::default());
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileCoinRepository::new(dir.path().join("coins.json"));
        std::fs::write(repo.path(), "{ not json").unwrap();

        assert_eq!(repo.read_all().await, CoinsData::default());
    }

    #[tokio::test]
    async fn test_update_refuses_to_clobber_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileCoinRepository::new(dir.path().join("coins.json"));
        std::fs::write(repo.path(), "{ not json").unwrap();

        let result = repo.add_burn_event(burn_event(1)).await;
        assert!(matches!(result, Err(StoreError::Unreadable { .. })));
        assert_eq!(std::fs::read_to_string(repo.path()).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn test_replace_then_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir);

        let mut synced = Coin::new("pare", "PARE", "Pareidolia", "PaRe111");
        synced.price = Some(dec!(0.000123));
        synced.volume_24h = Some(1500.5);
        synced.last_sync_at = Some(Utc::now());

        let data = CoinsData {
            coins: vec![synced, Coin::new("face", "FACE", "Face Coin", "FaCe222")],
            burn_events: vec![burn_event(1)],
        };

        repo.replace(data.clone()).await.unwrap();
        assert_eq!(repo.read_all().await, data);
    }

    #[tokio::test]
    async fn test_replace_empty_round_trip() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir);
        repo.add_coin(Coin::new("pare", "PARE", "Pareidolia", "PaRe111"))
            .await
            .unwrap();

        repo.replace(CoinsData::default()).await.unwrap();
        assert_eq!(repo.read_all().await, CoinsData::default());
    }

    #[tokio::test]
    async fn test_add_coin_rejects_duplicate_id() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir);

        repo.add_coin(Coin::new("pare", "PARE", "Pareidolia", "PaRe111"))
            .await
            .unwrap();
        let result = repo
            .add_coin(Coin::new("pare", "PARE2", "Other", "Other111"))
            .await;

        assert!(matches!(result, Err(StoreError::DuplicateCoin(id)) if id == "pare"));
        assert_eq!(repo.read_all().await.coins.len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir);
        repo.add_coin(Coin::new("pare", "PARE", "Pareidolia", "PaRe111"))
            .await
            .unwrap();

        assert_eq!(repo.find_by_id("pare").await.unwrap().symbol, "PARE");
        assert!(repo.find_by_id("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_writes_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(repo_in(&dir));

        let mut handles = Vec::new();
        for i in 0..20 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.add_burn_event(burn_event(i)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let data = repo.read_all().await;
        assert_eq!(data.burn_events.len(), 20);
    }
}
