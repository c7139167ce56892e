use super::*;
use dx_core::SceneId;
use dx_core::TableId;
use dx_core::UserId;
use dx_database::Records;
use dx_database::Scene;
use dx_database::Transactional;
use dx_ephemeral::Ephemeral;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_postgres::Client;

/// Matchmaker service: the public join/cancel/status contract plus one
/// composer task per enabled scene.
pub struct MatchService<E> {
    db: Arc<Client>,
    /// Dedicated connection for the create-table/match transaction.
    txdb: Mutex<Client>,
    store: E,
    cfg: MatchConfig,
}

impl<E: Ephemeral> MatchService<E> {
    pub fn new(db: Arc<Client>, txdb: Client, store: E, cfg: MatchConfig) -> Self {
        Self {
            db,
            txdb: Mutex::new(txdb),
            store,
            cfg,
        }
    }

    pub fn store(&self) -> &E {
        &self.store
    }

    /// Enqueues a player for a scene after validating the scene, the
    /// buy-in bounds, and the wallet snapshot.
    pub async fn join(&self, req: JoinRequest) -> Result<String, MatchError> {
        let scene = self
            .db
            .scene(req.scene_id)
            .await?
            .filter(Scene::enabled)
            .ok_or(MatchError::SceneNotFound(req.scene_id))?;
        if !buy_in_allowed(&scene, req.buy_in) {
            return Err(MatchError::InvalidBuyIn);
        }
        let balance = self.db.balance_available(req.user_id).await?;
        if balance < req.buy_in {
            return Err(MatchError::InsufficientBalance);
        }
        let member = QueueMember {
            user_id: req.user_id,
            scene_id: req.scene_id,
            buy_in: req.buy_in,
            gps_lat: req.gps_lat,
            gps_lng: req.gps_lng,
            ip: req.ip,
            balance_snapshot: balance,
            joined_at_ms: dx_core::now_ms(),
        };
        queue::join(&self.store, &self.cfg, member).await
    }

    pub async fn cancel(
        &self,
        user: UserId,
        scene: SceneId,
        reason: &str,
    ) -> Result<(), MatchError> {
        queue::cancel(&self.store, scene, user, reason).await
    }

    pub async fn status(&self, user: UserId, scene: SceneId) -> Result<StatusResult, MatchError> {
        queue::status(&self.store, scene, user).await
    }

    /// Verifies the viewer holds a seat at the table before the gateway
    /// subscribes them.
    pub async fn validate_table_access(
        &self,
        user: UserId,
        table: TableId,
    ) -> Result<(), MatchError> {
        if user == 0 {
            return Err(MatchError::Unauthorized);
        }
        let row = self
            .db
            .table(table)
            .await?
            .ok_or(MatchError::TableNotFound(table))?;
        let seated = row
            .players
            .as_object()
            .map(|players| {
                players
                    .values()
                    .filter_map(|seat| seat.get("userId"))
                    .filter_map(user_id_of)
                    .any(|id| id == user)
            })
            .unwrap_or(false);
        if seated {
            Ok(())
        } else {
            Err(MatchError::TableAccessDenied)
        }
    }

    /// One composition attempt for a scene: expire stale entries, hydrate
    /// the queue head, filter, and atomically seat a full table.
    pub async fn compose_tick(&self, scene: &Scene) -> Result<(), MatchError> {
        if let Err(e) = queue::expire_stale(&self.store, &self.cfg, scene.id).await {
            log::warn!("queue cleanup error for scene {}: {}", scene.id, e);
        }

        let required = scene.seat_count as usize;
        let limit = required * self.cfg.candidate_multiplier.max(2);
        let head = self
            .store
            .zrange_head(&queue_key(scene.id), limit)
            .await?;
        if head.len() < required {
            return Ok(());
        }

        let mut candidates = Vec::with_capacity(head.len());
        for raw in head {
            let Ok(user) = raw.parse::<UserId>() else {
                continue;
            };
            // missing snapshot: the entry will be swept by expiry
            if let Some(member) = queue::hydrate(&self.store, scene.id, user).await? {
                candidates.push(member);
            }
        }

        let selected = select_players(&self.cfg, scene, &candidates);
        if selected.len() < required {
            return Ok(());
        }
        if !queue::remove_selected(&self.store, scene.id, &selected).await? {
            return Ok(());
        }

        for player in &selected {
            self.store
                .del(&member_key(scene.id, player.user_id))
                .await?;
            self.store
                .put(
                    &lock_key(player.user_id),
                    &scene.id.to_string(),
                    self.cfg.matched_lock_ttl,
                )
                .await?;
        }

        let (table_id, match_id) = self.create_table_and_match(scene, &selected).await?;

        let notice = MatchNotice {
            scene_id: scene.id,
            table_id,
            match_id,
        };
        let payload = serde_json::to_string(&notice)
            .map_err(|e| MatchError::Store(dx_ephemeral::StoreError(e.to_string())))?;
        for player in &selected {
            self.store
                .put(
                    &notify_key(player.user_id),
                    &payload,
                    self.cfg.matched_notify_ttl,
                )
                .await?;
        }

        log::info!(
            "match composed: scene {} table {} match {} players {}",
            scene.id,
            table_id,
            match_id,
            selected.len()
        );
        Ok(())
    }

    async fn create_table_and_match(
        &self,
        scene: &Scene,
        selected: &[QueueMember],
    ) -> Result<(TableId, dx_core::MatchId), MatchError> {
        let players = players_json(selected);
        let mut client = self.txdb.lock().await;
        let tx = client.transaction().await?;
        let table_id = tx.create_table(scene, players).await?;
        let match_id = tx.create_match(table_id, scene.id).await?;
        tx.commit().await?;
        Ok((table_id, match_id))
    }
}

impl<E: Ephemeral + Send + Sync + 'static> MatchService<E> {
    /// Spawns one composer task per enabled scene. Tasks stop when the
    /// shutdown sender drops.
    pub async fn spawn_composers(
        self: &Arc<Self>,
        shutdown: &tokio::sync::broadcast::Sender<()>,
    ) -> Result<(), MatchError> {
        for scene in self.db.enabled_scenes().await? {
            let service = self.clone();
            let mut quit = shutdown.subscribe();
            tokio::spawn(async move {
                log::info!(
                    "matcher started: scene {} ({} seats)",
                    scene.id,
                    scene.seat_count
                );
                let mut tick = tokio::time::interval(service.cfg.matcher_interval);
                tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = quit.recv() => break,
                        _ = tick.tick() => {
                            if let Err(e) = service.compose_tick(&scene).await {
                                log::warn!("matcher compose error for scene {}: {}", scene.id, e);
                            }
                        }
                    }
                }
                log::info!("matcher stopped: scene {}", scene.id);
            });
        }
        Ok(())
    }
}

/// `userId` values arrive as either JSON numbers or strings.
fn user_id_of(value: &serde_json::Value) -> Option<UserId> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// Buy-in must reach the scene minimum; `max_in = 0` waives the ceiling.
pub fn buy_in_allowed(scene: &Scene, buy_in: dx_core::Points) -> bool {
    buy_in >= scene.min_in && (scene.max_in == 0 || buy_in <= scene.max_in)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(min_in: i64, max_in: i64) -> Scene {
        Scene {
            id: 1,
            name: "test".into(),
            seat_count: 2,
            min_in,
            max_in,
            base_pi: 10,
            min_unit_pi: 2,
            mango_enabled: false,
            bobo_enabled: false,
            distance_threshold_m: 0,
            status: "enabled".into(),
            rake_rule_id: 0,
        }
    }

    #[test]
    fn zero_max_in_means_unbounded() {
        let s = scene(100, 0);
        assert!(!buy_in_allowed(&s, 99));
        assert!(buy_in_allowed(&s, 100));
        assert!(buy_in_allowed(&s, 1_000_000_000));
    }

    #[test]
    fn bounded_buy_in() {
        let s = scene(100, 500);
        assert!(buy_in_allowed(&s, 500));
        assert!(!buy_in_allowed(&s, 501));
    }

    #[test]
    fn seated_user_ids_parse_both_shapes() {
        assert_eq!(user_id_of(&serde_json::json!(7)), Some(7));
        assert_eq!(user_id_of(&serde_json::json!("7")), Some(7));
        assert_eq!(user_id_of(&serde_json::json!(null)), None);
    }
}
