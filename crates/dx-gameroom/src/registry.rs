use super::*;
use dx_core::TableId;
use dx_database::Records;
use dx_settle::SettleError;
use dx_settle::SettleRequest;
use dx_settle::Settlement;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use tokio_postgres::Client;

/// Owns the live table runtimes: spawns them lazily from stored rows and
/// finalises their hands through the settlement engine.
pub struct GameService {
    db: Arc<Client>,
    settlement: Arc<Settlement>,
    runtimes: RwLock<HashMap<TableId, RuntimeHandle>>,
    finish_tx: mpsc::UnboundedSender<FinishReport>,
}

impl GameService {
    /// Builds the service and starts its finisher task.
    pub fn new(db: Arc<Client>, settlement: Arc<Settlement>) -> Arc<Self> {
        let (finish_tx, finish_rx) = mpsc::unbounded_channel();
        let service = Arc::new(Self {
            db,
            settlement,
            runtimes: RwLock::new(HashMap::new()),
            finish_tx,
        });
        tokio::spawn(service.clone().run_finisher(finish_rx));
        service
    }

    /// Handle to a table's runtime, spawning the actor on first use from
    /// the stored table, scene, and active match.
    pub async fn runtime(&self, table_id: TableId) -> Result<RuntimeHandle, GameError> {
        if let Some(handle) = self.runtimes.read().await.get(&table_id) {
            return Ok(handle.clone());
        }
        let table = self
            .db
            .table(table_id)
            .await?
            .ok_or(GameError::TableNotFound(table_id))?;
        let scene = self
            .db
            .scene(table.scene_id)
            .await?
            .ok_or(GameError::SceneNotFound(table.scene_id))?;
        let match_id = self
            .db
            .active_match(table_id)
            .await?
            .map(|m| m.id)
            .unwrap_or(0);

        let mut runtimes = self.runtimes.write().await;
        if let Some(handle) = runtimes.get(&table_id) {
            return Ok(handle.clone());
        }
        let handle = TableRuntime::spawn(
            Some(self.db.clone()),
            &table,
            &scene,
            match_id,
            Some(self.finish_tx.clone()),
        );
        runtimes.insert(table_id, handle.clone());
        log::info!("spawned runtime for table {} (match {})", table_id, match_id);
        Ok(handle)
    }

    /// Finisher: persists the carried streak, settles the hand exactly
    /// once, and retires the runtime.
    async fn run_finisher(self: Arc<Self>, mut reports: mpsc::UnboundedReceiver<FinishReport>) {
        while let Some(report) = reports.recv().await {
            if let Err(e) = self
                .db
                .set_table_streak(report.table_id, report.mango_streak)
                .await
            {
                log::warn!(
                    "failed to persist mango streak for table {}: {}",
                    report.table_id,
                    e
                );
            }
            if report.match_id == 0 || report.results.is_empty() {
                self.retire(report.table_id).await;
                continue;
            }
            let request = SettleRequest {
                match_id: report.match_id,
                scene_id: report.scene_id,
                results: report.results,
            };
            match self.settlement.settle(&request).await {
                Ok(()) => self.retire(report.table_id).await,
                Err(SettleError::MatchAlreadySettled(id)) => {
                    log::warn!("match {} was already settled", id);
                    self.retire(report.table_id).await;
                }
                Err(e) => {
                    // leave the runtime registered; an operator retries
                    log::error!("settlement failed for match {}: {}", report.match_id, e);
                }
            }
        }
    }

    async fn retire(&self, table_id: TableId) {
        if let Some(handle) = self.runtimes.write().await.remove(&table_id) {
            handle.stop().await;
        }
        log::debug!("retired runtime for table {}", table_id);
    }
}
