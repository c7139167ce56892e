//! Queue mechanics over the ephemeral store.
//!
//! These functions own the queue sorted set, the member snapshots, the
//! per-user join lock, and the match-ready notices. They assume the caller
//! has already validated the scene and the wallet.

use super::*;
use dx_ephemeral::Ephemeral;

/// Appends a validated member to its scene queue.
///
/// Duplicate entries are rejected; a short SET-IF-ABSENT lock serialises
/// concurrent joins from the same user. Returns the queued member id.
pub async fn join<E: Ephemeral>(
    store: &E,
    cfg: &MatchConfig,
    member: QueueMember,
) -> Result<String, MatchError> {
    let key = queue_key(member.scene_id);
    let member_id = member.user_id.to_string();

    if store.zscore(&key, &member_id).await?.is_some() {
        return Err(MatchError::AlreadyInQueue);
    }
    let lock = lock_key(member.user_id);
    if !store
        .put_nx(&lock, &member.scene_id.to_string(), cfg.queue_lock_ttl)
        .await?
    {
        return Err(MatchError::QueueProcessing);
    }

    let result = async {
        let snapshot = serde_json::to_string(&member)
            .map_err(|e| MatchError::Store(dx_ephemeral::StoreError(e.to_string())))?;
        store
            .put(
                &member_key(member.scene_id, member.user_id),
                &snapshot,
                cfg.queue_member_ttl,
            )
            .await?;
        if !store.zadd(&key, &member_id, member.joined_at_ms).await? {
            store
                .del(&member_key(member.scene_id, member.user_id))
                .await?;
            return Err(MatchError::AlreadyInQueue);
        }
        Ok(member_id.clone())
    }
    .await;

    store.del(&lock).await?;
    result.inspect(|_| {
        log::info!(
            "user {} joined queue for scene {}",
            member.user_id,
            member.scene_id
        )
    })
}

/// Removes a user from a scene queue. Idempotent; also clears the snapshot
/// and any stale match-ready notice.
pub async fn cancel<E: Ephemeral>(
    store: &E,
    scene: SceneId,
    user: dx_core::UserId,
    reason: &str,
) -> Result<(), MatchError> {
    store.zrem(&queue_key(scene), &user.to_string()).await?;
    store.del(&member_key(scene, user)).await?;
    store.del(&notify_key(user)).await?;
    log::info!(
        "queue cancelled: user {} scene {} reason {}",
        user,
        scene,
        reason
    );
    Ok(())
}

/// Answers a status poll. A pending match notice wins over a live queue
/// entry; otherwise the queue entry's snapshot provides the join time.
pub async fn status<E: Ephemeral>(
    store: &E,
    scene: SceneId,
    user: dx_core::UserId,
) -> Result<StatusResult, MatchError> {
    if let Some(raw) = store.get(&notify_key(user)).await? {
        if let Ok(notice) = serde_json::from_str::<MatchNotice>(&raw) {
            return Ok(StatusResult {
                status: QueueStatus::Matched,
                scene_id: notice.scene_id,
                table_id: Some(notice.table_id),
                match_id: Some(notice.match_id),
                joined_at: None,
            });
        }
    }
    if store
        .zscore(&queue_key(scene), &user.to_string())
        .await?
        .is_some()
    {
        let joined_at = hydrate(store, scene, user).await?.map(|m| m.joined_at_ms);
        return Ok(StatusResult {
            status: QueueStatus::Queued,
            scene_id: scene,
            table_id: None,
            match_id: None,
            joined_at,
        });
    }
    Ok(StatusResult {
        status: QueueStatus::Idle,
        scene_id: scene,
        table_id: None,
        match_id: None,
        joined_at: None,
    })
}

/// Loads a member snapshot; None when it has expired or never existed.
pub async fn hydrate<E: Ephemeral>(
    store: &E,
    scene: SceneId,
    user: dx_core::UserId,
) -> Result<Option<QueueMember>, MatchError> {
    match store.get(&member_key(scene, user)).await? {
        Some(raw) => Ok(serde_json::from_str(&raw).ok()),
        None => Ok(None),
    }
}

/// Cancels every queue entry older than the queue timeout.
pub async fn expire_stale<E: Ephemeral>(
    store: &E,
    cfg: &MatchConfig,
    scene: SceneId,
) -> Result<(), MatchError> {
    let deadline = dx_core::now_ms() - cfg.queue_timeout.as_millis() as i64;
    for member in store.zrange_upto(&queue_key(scene), deadline).await? {
        let Ok(user) = member.parse::<dx_core::UserId>() else {
            continue;
        };
        cancel(store, scene, user, "timeout").await?;
    }
    Ok(())
}

/// Atomically removes the selected players from the queue.
///
/// If any removal reports the member already gone (raced with a cancel or
/// expiry), every removal done so far is rolled back at its original score
/// and the whole composition is abandoned for this tick.
pub async fn remove_selected<E: Ephemeral>(
    store: &E,
    scene: SceneId,
    selected: &[QueueMember],
) -> Result<bool, MatchError> {
    let key = queue_key(scene);
    let mut removed: Vec<&QueueMember> = Vec::with_capacity(selected.len());
    for member in selected {
        if store.zrem(&key, &member.user_id.to_string()).await? {
            removed.push(member);
            continue;
        }
        for survivor in removed {
            store
                .zadd(&key, &survivor.user_id.to_string(), survivor.joined_at_ms)
                .await?;
        }
        return Ok(false);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dx_ephemeral::MemoryStore;
    use std::time::Duration;

    fn member(user: i64, joined_at_ms: i64) -> QueueMember {
        QueueMember {
            user_id: user,
            scene_id: 10,
            buy_in: 500,
            gps_lat: 0.0,
            gps_lng: 0.0,
            ip: format!("1.2.{}.4", user),
            balance_snapshot: 1000,
            joined_at_ms,
        }
    }

    #[tokio::test]
    async fn join_then_status_is_queued() {
        let store = MemoryStore::new();
        let cfg = MatchConfig::default();
        join(&store, &cfg, member(1, 1000)).await.unwrap();
        let status = status(&store, 10, 1).await.unwrap();
        assert_eq!(status.status, QueueStatus::Queued);
        assert_eq!(status.joined_at, Some(1000));
    }

    #[tokio::test]
    async fn duplicate_join_rejected() {
        let store = MemoryStore::new();
        let cfg = MatchConfig::default();
        join(&store, &cfg, member(1, 1000)).await.unwrap();
        assert!(matches!(
            join(&store, &cfg, member(1, 2000)).await,
            Err(MatchError::AlreadyInQueue)
        ));
    }

    #[tokio::test]
    async fn join_cancel_leaves_nothing() {
        let store = MemoryStore::new();
        let cfg = MatchConfig::default();
        join(&store, &cfg, member(1, 1000)).await.unwrap();
        cancel(&store, 10, 1, "user").await.unwrap();
        assert_eq!(
            status(&store, 10, 1).await.unwrap().status,
            QueueStatus::Idle
        );
        assert!(hydrate(&store, 10, 1).await.unwrap().is_none());
        // idempotent
        cancel(&store, 10, 1, "user").await.unwrap();
    }

    #[tokio::test]
    async fn held_lock_means_processing() {
        let store = MemoryStore::new();
        let cfg = MatchConfig::default();
        store
            .put_nx(&lock_key(1), "10", Duration::from_secs(10))
            .await
            .unwrap();
        assert!(matches!(
            join(&store, &cfg, member(1, 1000)).await,
            Err(MatchError::QueueProcessing)
        ));
    }

    #[tokio::test]
    async fn matched_notice_wins_over_queue_entry() {
        let store = MemoryStore::new();
        let cfg = MatchConfig::default();
        join(&store, &cfg, member(1, 1000)).await.unwrap();
        let notice = serde_json::to_string(&MatchNotice {
            scene_id: 10,
            table_id: 77,
            match_id: 88,
        })
        .unwrap();
        store
            .put(&notify_key(1), &notice, Duration::from_secs(60))
            .await
            .unwrap();
        let status = status(&store, 10, 1).await.unwrap();
        assert_eq!(status.status, QueueStatus::Matched);
        assert_eq!(status.table_id, Some(77));
        assert_eq!(status.match_id, Some(88));
    }

    #[tokio::test]
    async fn expiry_cancels_old_entries_only() {
        let store = MemoryStore::new();
        let cfg = MatchConfig::default();
        let stale = dx_core::now_ms() - (cfg.queue_timeout.as_millis() as i64) - 1000;
        join(&store, &cfg, member(1, stale)).await.unwrap();
        join(&store, &cfg, member(2, dx_core::now_ms())).await.unwrap();
        expire_stale(&store, &cfg, 10).await.unwrap();
        assert_eq!(
            status(&store, 10, 1).await.unwrap().status,
            QueueStatus::Idle
        );
        assert_eq!(
            status(&store, 10, 2).await.unwrap().status,
            QueueStatus::Queued
        );
    }

    #[tokio::test]
    async fn racy_removal_rolls_back() {
        let store = MemoryStore::new();
        let cfg = MatchConfig::default();
        let a = member(1, 1000);
        let b = member(2, 2000);
        join(&store, &cfg, a.clone()).await.unwrap();
        // b never joined; removal must put a back at its original position
        let ok = remove_selected(&store, 10, &[a, b]).await.unwrap();
        assert!(!ok);
        let head = store.zrange_head(&queue_key(10), 10).await.unwrap();
        assert_eq!(head, vec!["1"]);
        assert_eq!(store.zscore(&queue_key(10), "1").await.unwrap(), Some(1000));
    }
}
