use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::RwLock;

use super::model::OrderRecord;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("failed to flush order log to disk: {0}")]
    FlushFailed(#[from] std::io::Error),
}

struct OrderState {
    orders: BTreeMap<i64, OrderRecord>,
    next_id: i64,
}

/// The Order replica's in-memory log plus CSV persistence (spec §4.2).
///
/// `orders` doubles as both "the log" and "the id→record map" from the
/// spec: a `BTreeMap` gives id-ascending iteration for `LookUpOrdersById`
/// for free, whether ids arrived in order (the leader) or out of order
/// (a follower catching up via `BulkUpsert`).
pub struct OrderStore {
    state: RwLock<OrderState>,
    data_path: String,
    pub replica_id: u32,
}

impl OrderStore {
    pub fn load(data_path: impl Into<String>, replica_id: u32) -> std::io::Result<Self> {
        let data_path = data_path.into();
        let path = Path::new(&data_path);
        let mut orders = BTreeMap::new();

        if path.exists() {
            let file = std::fs::File::open(path)?;
            for line in BufReader::new(file).lines().skip(1) {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(record) = OrderRecord::from_csv_row(&line) {
                    orders.insert(record.transaction_id, record);
                } else {
                    tracing::warn!(row = %line, "skipping malformed order row");
                }
            }
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            write_csv(path, orders.values())?;
        }

        let next_id = orders.keys().next_back().map(|id| id + 1).unwrap_or(0);

        Ok(Self {
            state: RwLock::new(OrderState { orders, next_id }),
            data_path,
            replica_id,
        })
    }

    pub fn empty(data_path: impl Into<String>, replica_id: u32) -> Self {
        Self {
            state: RwLock::new(OrderState {
                orders: BTreeMap::new(),
                next_id: 0,
            }),
            data_path: data_path.into(),
            replica_id,
        }
    }

    pub async fn lookup(&self, transaction_id: i64) -> Option<OrderRecord> {
        self.state.read().await.orders.get(&transaction_id).cloned()
    }

    /// The id that would be assigned next (spec §4.2 `LatestId`).
    pub async fn next_id(&self) -> i64 {
        self.state.read().await.next_id
    }

    pub async fn orders_after(&self, transaction_id: i64) -> Vec<OrderRecord> {
        self.state
            .read()
            .await
            .orders
            .range((transaction_id + 1)..)
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Assigns the next id, appends the record, and flushes — all under
    /// the write lock (spec §4.2 step d, invariant I1: monotone ids).
    /// The caller must already have completed the Catalog RPCs with the
    /// lock released (spec §5).
    pub async fn append_new(
        &self,
        stock_name: String,
        order_type: super::model::OrderType,
        quantity: u64,
    ) -> Result<OrderRecord, OrderError> {
        let mut guard = self.state.write().await;
        let transaction_id = guard.next_id;

        let record = OrderRecord {
            transaction_id,
            stock_name,
            order_type,
            quantity,
        };
        guard.orders.insert(transaction_id, record.clone());
        guard.next_id += 1;

        if let Err(err) = write_csv(Path::new(&self.data_path), guard.orders.values()) {
            guard.orders.remove(&transaction_id);
            guard.next_id -= 1;
            return Err(OrderError::FlushFailed(err));
        }

        Ok(record)
    }

    /// Idempotent single-record upsert (spec §4.2 `SyncOrder`). Returns
    /// `true` if the record was newly inserted, `false` if it was already
    /// present ("already in sync").
    pub async fn sync_order(&self, record: OrderRecord) -> Result<bool, OrderError> {
        let mut guard = self.state.write().await;
        if guard.orders.contains_key(&record.transaction_id) {
            return Ok(false);
        }

        let transaction_id = record.transaction_id;
        guard.orders.insert(transaction_id, record);
        guard.next_id = guard.next_id.max(transaction_id);

        write_csv(Path::new(&self.data_path), guard.orders.values())?;
        Ok(true)
    }

    /// Idempotent bulk upsert for catch-up (spec §4.2 `BulkUpsert`).
    /// Existing ids are skipped; processed in the order given.
    pub async fn bulk_upsert(&self, records: Vec<OrderRecord>) -> Result<(), OrderError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut guard = self.state.write().await;
        let last_id = records.last().map(|r| r.transaction_id);

        for record in records {
            guard.orders.entry(record.transaction_id).or_insert(record);
        }

        if let Some(last_id) = last_id {
            guard.next_id = guard.next_id.max(last_id);
        }

        write_csv(Path::new(&self.data_path), guard.orders.values())
    }

    async fn flush_snapshot(&self) -> std::io::Result<()> {
        let guard = self.state.read().await;
        write_csv(Path::new(&self.data_path), guard.orders.values())
    }

    pub fn spawn_background_flush(
        self: Arc<Self>,
        interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if let Err(err) = self.flush_snapshot().await {
                    tracing::error!(error = %err, "periodic order log flush failed");
                }
            }
        })
    }
}

fn write_csv<'a>(
    path: &Path,
    records: impl Iterator<Item = &'a OrderRecord>,
) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "transaction_id,stock_name,order_type,quantity")?;
    for record in records {
        writeln!(file, "{}", record.to_csv_row())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::model::OrderType;

    fn temp_store(replica_id: u32) -> (tempfile::TempDir, OrderStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        let store = OrderStore::empty(path.to_string_lossy().to_string(), replica_id);
        (dir, store)
    }

    #[tokio::test]
    async fn append_new_assigns_contiguous_ids() {
        let (_dir, store) = temp_store(1);
        let a = store
            .append_new("AAPL".into(), OrderType::Buy, 2)
            .await
            .unwrap();
        let b = store
            .append_new("AAPL".into(), OrderType::Sell, 1)
            .await
            .unwrap();
        assert_eq!(a.transaction_id, 0);
        assert_eq!(b.transaction_id, 1);
        assert_eq!(store.next_id().await, 2);
    }

    #[tokio::test]
    async fn sync_order_is_idempotent() {
        let (_dir, store) = temp_store(2);
        let record = OrderRecord {
            transaction_id: 5,
            stock_name: "AAPL".into(),
            order_type: OrderType::Buy,
            quantity: 1,
        };
        assert!(store.sync_order(record.clone()).await.unwrap());
        assert!(!store.sync_order(record).await.unwrap());
        assert_eq!(store.next_id().await, 5);
    }

    #[tokio::test]
    async fn orders_after_returns_ascending_strictly_greater() {
        let (_dir, store) = temp_store(3);
        for id in [0i64, 1, 2] {
            store
                .sync_order(OrderRecord {
                    transaction_id: id,
                    stock_name: "AAPL".into(),
                    order_type: OrderType::Buy,
                    quantity: 1,
                })
                .await
                .unwrap();
        }
        let after = store.orders_after(0).await;
        let ids: Vec<i64> = after.iter().map(|r| r.transaction_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn bulk_upsert_skips_existing_and_advances_next_id() {
        let (_dir, store) = temp_store(4);
        store
            .sync_order(OrderRecord {
                transaction_id: 0,
                stock_name: "AAPL".into(),
                order_type: OrderType::Buy,
                quantity: 1,
            })
            .await
            .unwrap();

        let batch = vec![
            OrderRecord {
                transaction_id: 0,
                stock_name: "AAPL".into(),
                order_type: OrderType::Sell,
                quantity: 99,
            },
            OrderRecord {
                transaction_id: 1,
                stock_name: "MSFT".into(),
                order_type: OrderType::Buy,
                quantity: 3,
            },
        ];
        store.bulk_upsert(batch).await.unwrap();

        assert_eq!(store.lookup(0).await.unwrap().order_type, OrderType::Buy);
        assert!(store.lookup(1).await.is_some());
        assert_eq!(store.next_id().await, 1);
    }

    #[tokio::test]
    async fn load_recovers_next_id_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        std::fs::write(
            &path,
            "transaction_id,stock_name,order_type,quantity\n0,AAPL,buy,2\n1,AAPL,sell,1\n",
        )
        .unwrap();
        let store = OrderStore::load(path.to_string_lossy().to_string(), 1).unwrap();
        assert_eq!(store.next_id().await, 2);
    }
}
