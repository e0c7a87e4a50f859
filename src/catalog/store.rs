use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use super::model::Stock;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to flush catalog to disk: {0}")]
    FlushFailed(#[from] std::io::Error),
}

/// Result of [`CatalogStore::update`], spec §4.1.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Success { new_quantity: u64 },
    NotFound,
    /// `quantity + quantity_change` would be negative (invariant C1).
    Insufficient { current_quantity: u64 },
}

/// The Catalog's in-memory map plus its CSV persistence, guarded by a
/// single multi-reader/single-writer lock (spec §4.1, §5).
pub struct CatalogStore {
    stocks: RwLock<FxHashMap<String, Stock>>,
    data_path: String,
}

impl CatalogStore {
    /// Load from `data_path`, creating an empty (header-only) file if one
    /// does not exist yet — matching `catalog.py::load_catalog`.
    pub fn load(data_path: impl Into<String>) -> std::io::Result<Self> {
        let data_path = data_path.into();
        let path = Path::new(&data_path);
        let mut stocks = FxHashMap::default();

        if path.exists() {
            let file = std::fs::File::open(path)?;
            for line in BufReader::new(file).lines().skip(1) {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(stock) = Stock::from_csv_row(&line) {
                    stocks.insert(stock.name.clone(), stock);
                } else {
                    tracing::warn!(row = %line, "skipping malformed catalog row");
                }
            }
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            write_csv(path, stocks.values())?;
        }

        Ok(Self {
            stocks: RwLock::new(stocks),
            data_path,
        })
    }

    /// Seed the catalog directly (used by tests and in-process fixtures).
    pub fn with_stocks(data_path: impl Into<String>, stocks: Vec<Stock>) -> Self {
        let map = stocks.into_iter().map(|s| (s.name.clone(), s)).collect();
        Self {
            stocks: RwLock::new(map),
            data_path: data_path.into(),
        }
    }

    pub async fn lookup(&self, name: &str) -> Option<Stock> {
        self.stocks.read().await.get(name).cloned()
    }

    /// Conditional quantity update (spec §4.1). Flushes to disk before
    /// acknowledging; on flush failure the in-memory mutation is rolled
    /// back so a durability failure never becomes a silently-applied write.
    pub async fn update(
        &self,
        name: &str,
        quantity_change: i64,
    ) -> Result<UpdateOutcome, CatalogError> {
        let mut guard = self.stocks.write().await;

        let Some(stock) = guard.get(name) else {
            return Ok(UpdateOutcome::NotFound);
        };

        let current = stock.quantity;
        let new_quantity_signed = current as i64 + quantity_change;
        if new_quantity_signed < 0 {
            return Ok(UpdateOutcome::Insufficient {
                current_quantity: current,
            });
        }
        let new_quantity = new_quantity_signed as u64;

        let previous = stock.clone();
        {
            let stock = guard.get_mut(name).expect("checked above");
            stock.quantity = new_quantity;
            if quantity_change != 0 {
                stock.volume += quantity_change.unsigned_abs();
            }
        }

        if let Err(err) = write_csv(Path::new(&self.data_path), guard.values()) {
            tracing::error!(%name, error = %err, "catalog flush failed, rolling back update");
            guard.insert(previous.name.clone(), previous);
            return Err(CatalogError::FlushFailed(err));
        }

        Ok(UpdateOutcome::Success { new_quantity })
    }

    /// Background durability floor (spec §4.1): holds only a read lock, so
    /// it never starves a concurrent update.
    async fn flush_snapshot(&self) -> std::io::Result<()> {
        let guard = self.stocks.read().await;
        write_csv(Path::new(&self.data_path), guard.values())
    }

    pub fn spawn_background_flush(
        self: Arc<Self>,
        interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if let Err(err) = self.flush_snapshot().await {
                    tracing::error!(error = %err, "periodic catalog flush failed");
                }
            }
        })
    }
}

fn write_csv<'a>(
    path: &Path,
    stocks: impl Iterator<Item = &'a Stock>,
) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "name,price,quantity,volume")?;
    for stock in stocks {
        writeln!(file, "{}", stock.to_csv_row())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(stocks: Vec<Stock>) -> CatalogStore {
        CatalogStore::with_stocks("/tmp/unused-in-this-test.csv", stocks)
    }

    #[tokio::test]
    async fn lookup_hit_and_miss() {
        let store = store_with(vec![Stock::new("AAPL", 100.0, 5, 0)]);
        assert_eq!(store.lookup("AAPL").await, Some(Stock::new("AAPL", 100.0, 5, 0)));
        assert_eq!(store.lookup("MSFT").await, None);
    }

    #[tokio::test]
    async fn update_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        let store = CatalogStore::with_stocks(path.to_string_lossy().to_string(), vec![]);
        let outcome = store.update("AAPL", -1).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::NotFound);
    }

    #[tokio::test]
    async fn update_insufficient_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        let store =
            CatalogStore::with_stocks(path.to_string_lossy().to_string(), vec![Stock::new("AAPL", 100.0, 5, 0)]);
        let outcome = store.update("AAPL", -100).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Insufficient { current_quantity: 5 });
        assert_eq!(store.lookup("AAPL").await.unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn successful_buy_and_sell_update_volume_and_quantity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        let store =
            CatalogStore::with_stocks(path.to_string_lossy().to_string(), vec![Stock::new("AAPL", 100.0, 5, 0)]);

        let outcome = store.update("AAPL", -2).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Success { new_quantity: 3 });
        let stock = store.lookup("AAPL").await.unwrap();
        assert_eq!(stock.quantity, 3);
        assert_eq!(stock.volume, 2);

        let outcome = store.update("AAPL", 4).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Success { new_quantity: 7 });
        let stock = store.lookup("AAPL").await.unwrap();
        assert_eq!(stock.quantity, 7);
        assert_eq!(stock.volume, 6);
    }

    #[tokio::test]
    async fn load_creates_header_only_file_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        let store = CatalogStore::load(path.to_string_lossy().to_string()).unwrap();
        assert_eq!(store.lookup("AAPL").await, None);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), "name,price,quantity,volume");
    }

    #[tokio::test]
    async fn load_round_trips_persisted_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        std::fs::write(&path, "name,price,quantity,volume\nAAPL,100.0,5,0\n").unwrap();
        let store = CatalogStore::load(path.to_string_lossy().to_string()).unwrap();
        assert_eq!(store.lookup("AAPL").await, Some(Stock::new("AAPL", 100.0, 5, 0)));
    }
}
