use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::config::ReplicaTarget;
use crate::error::RpcError;
use crate::order::server::PlaceOrderResponse;
use crate::order::{OrderClient, OrderRecord, OrderType};

#[derive(Debug, Clone)]
struct ReplicaDescriptor {
    replica_id: u32,
    status: bool,
}

struct ReplicationState {
    replicas: Vec<ReplicaDescriptor>,
    leader: Option<u32>,
}

/// Leader election, health monitoring, and replication for the Order
/// cluster (spec §4.3 "Leader / replication manager"). One instance is
/// shared (via `Arc`) across every HTTP request and the background
/// health-check task — it is process-wide state, not per-request (see
/// `DESIGN.md` on the source's per-request-copy bug, §9).
pub struct ReplicationCoordinator {
    state: RwLock<ReplicationState>,
    clients: HashMap<u32, OrderClient>,
}

impl ReplicationCoordinator {
    pub fn new(targets: &[ReplicaTarget], rpc_timeout: Duration) -> Self {
        let mut replicas = Vec::with_capacity(targets.len());
        let mut clients = HashMap::with_capacity(targets.len());
        for target in targets {
            replicas.push(ReplicaDescriptor {
                replica_id: target.replica_id,
                status: false,
            });
            clients.insert(
                target.replica_id,
                OrderClient::new(target.address.clone(), rpc_timeout),
            );
        }

        Self {
            state: RwLock::new(ReplicationState {
                replicas,
                leader: None,
            }),
            clients,
        }
    }

    fn client(&self, replica_id: u32) -> &OrderClient {
        self.clients
            .get(&replica_id)
            .expect("replica_id always drawn from the configured roster")
    }

    pub async fn current_leader(&self) -> Option<u32> {
        self.state.read().await.leader
    }

    async fn current_followers(&self) -> Vec<u32> {
        let state = self.state.read().await;
        state
            .replicas
            .iter()
            .filter(|r| state.leader != Some(r.replica_id) && r.status)
            .map(|r| r.replica_id)
            .collect()
    }

    /// Election (spec §4.3 "Leader election" + "Follower update"): highest
    /// `replica_id` live replica wins, no quorum, no split-brain
    /// protection — a documented single-coordinator design.
    pub async fn refresh_leadership(&self) {
        let mut ids: Vec<u32> = {
            let state = self.state.read().await;
            state.replicas.iter().map(|r| r.replica_id).collect()
        };
        ids.sort_unstable_by(|a, b| b.cmp(a));

        let mut new_leader = None;
        for id in &ids {
            if self.client(*id).health_check().await.is_ok() {
                new_leader = Some(*id);
                break;
            }
        }

        let mut statuses = HashMap::new();
        for id in &ids {
            if Some(*id) == new_leader {
                statuses.insert(*id, true);
                continue;
            }
            let healthy = self.client(*id).health_check().await.is_ok();
            statuses.insert(*id, healthy);
        }

        let mut state = self.state.write().await;
        state.leader = new_leader;
        for replica in &mut state.replicas {
            if let Some(status) = statuses.get(&replica.replica_id) {
                replica.status = *status;
            }
        }

        tracing::info!(leader = ?new_leader, "leadership refreshed");
    }

    /// Spec §4.3 background fault check loop. Caller picks the sweep
    /// interval; the spec requires a bounded backoff to avoid a tight
    /// spin since the source has none.
    pub fn spawn_background_fault_check(
        self: Arc<Self>,
        sweep_interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(sweep_interval).await;
                self.fault_check_sweep().await;
            }
        })
    }

    async fn fault_check_sweep(&self) {
        let down: Vec<u32> = {
            let state = self.state.read().await;
            state
                .replicas
                .iter()
                .filter(|r| !r.status)
                .map(|r| r.replica_id)
                .collect()
        };

        for replica_id in down {
            if self.client(replica_id).health_check().await.is_err() {
                continue;
            }
            if let Err(err) = self.catch_up(replica_id).await {
                tracing::warn!(replica_id, error = %err, "catch-up failed, leaving replica down");
                continue;
            }
            {
                let mut state = self.state.write().await;
                if let Some(r) = state.replicas.iter_mut().find(|r| r.replica_id == replica_id) {
                    r.status = true;
                }
            }
            tracing::info!(replica_id, "replica recovered and caught up");
        }
    }

    /// Catch-up (spec §4.3, GLOSSARY): LatestId on the recovered replica,
    /// LookUpOrdersById on the leader, BulkUpsert on the recovered replica.
    async fn catch_up(&self, replica_id: u32) -> Result<(), RpcError> {
        let Some(leader_id) = self.current_leader().await else {
            return Err(RpcError::Unavailable("no leader to catch up from".into()));
        };

        let latest = self.client(replica_id).latest_id().await?;
        let since = latest.transaction_id - 1;
        let missing = self
            .client(leader_id)
            .look_up_orders_by_id(since)
            .await?;

        if missing.data.is_empty() {
            return Ok(());
        }

        let resp = self.client(replica_id).bulk_upsert(&missing.data).await?;
        if !resp.success {
            return Err(RpcError::Upstream(resp.message));
        }
        Ok(())
    }

    /// PlaceOrder with single-retry failover (spec §4.3 "On leader RPC
    /// failure"): one retry against a freshly-elected leader on a
    /// transient error, never more.
    pub async fn place_order(
        &self,
        stock_name: &str,
        order_type: OrderType,
        quantity: u64,
    ) -> Result<(u32, PlaceOrderResponse), RpcError> {
        let Some(leader_id) = self.current_leader().await else {
            self.refresh_leadership().await;
            let Some(leader_id) = self.current_leader().await else {
                return Err(RpcError::Unavailable("no leader available".into()));
            };
            let resp = self
                .client(leader_id)
                .place_order(stock_name, order_type, quantity)
                .await?;
            return Ok((leader_id, resp));
        };

        match self
            .client(leader_id)
            .place_order(stock_name, order_type, quantity)
            .await
        {
            Ok(resp) => Ok((leader_id, resp)),
            Err(err) if err.is_transient() => {
                self.refresh_leadership().await;
                let Some(new_leader) = self.current_leader().await else {
                    return Err(err);
                };
                let resp = self
                    .client(new_leader)
                    .place_order(stock_name, order_type, quantity)
                    .await?;
                Ok((new_leader, resp))
            }
            Err(err) => Err(err),
        }
    }

    /// LookUpOrder with the same single-retry failover as `place_order`.
    pub async fn look_up_order(
        &self,
        transaction_id: i64,
    ) -> Result<crate::order::server::LookUpOrderResponse, RpcError> {
        let Some(leader_id) = self.current_leader().await else {
            return Err(RpcError::Unavailable("no leader available".into()));
        };

        match self.client(leader_id).look_up_order(transaction_id).await {
            Ok(resp) => Ok(resp),
            Err(err) if err.is_transient() => {
                self.refresh_leadership().await;
                let Some(new_leader) = self.current_leader().await else {
                    return Err(err);
                };
                self.client(new_leader).look_up_order(transaction_id).await
            }
            Err(err) => Err(err),
        }
    }

    /// Order placement coordination (spec §4.3): called by the caller
    /// after a successful PlaceOrder, with the cache already invalidated.
    /// Sync failures to individual followers are logged, not propagated —
    /// the client's request has already succeeded.
    pub async fn sync_to_followers(&self, record: &OrderRecord) {
        let followers = self.current_followers().await;
        for replica_id in followers {
            if self.client(replica_id).health_check().await.is_err() {
                let mut state = self.state.write().await;
                if let Some(r) = state.replicas.iter_mut().find(|r| r.replica_id == replica_id) {
                    r.status = false;
                }
                continue;
            }
            if let Err(err) = self.client(replica_id).sync_order(record).await {
                tracing::warn!(replica_id, error = %err, "follower sync failed");
            }
        }
    }
}
