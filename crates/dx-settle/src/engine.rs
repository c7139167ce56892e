use super::*;
use dx_database::Records;
use dx_database::Transactional;
use std::collections::BTreeSet;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio_postgres::Client;

/// The settlement engine. Owns a dedicated database connection so its row
/// locks never interleave with unrelated traffic; one settlement runs at a
/// time.
pub struct Settlement {
    db: Mutex<Client>,
}

impl Settlement {
    pub fn new(db: Client) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Settles one finished hand atomically.
    ///
    /// The `ended_at` gate under the match row lock makes this idempotent:
    /// a replay observes the stamp and returns `MatchAlreadySettled`
    /// without touching a wallet.
    pub async fn settle(&self, req: &SettleRequest) -> Result<(), SettleError> {
        req.validate()?;
        let mut client = self.db.lock().await;
        let tx = client.transaction().await?;

        let matched = tx
            .lock_match(req.match_id)
            .await?
            .ok_or(SettleError::MatchNotFound(req.match_id))?;
        if matched.ended_at.is_some() {
            return Err(SettleError::MatchAlreadySettled(req.match_id));
        }
        if req.scene_id != 0 && matched.scene_id != req.scene_id {
            return Err(SettleError::SceneMismatch {
                expected: req.scene_id,
                found: matched.scene_id,
            });
        }
        let scene = tx
            .scene(matched.scene_id)
            .await?
            .ok_or(SettleError::SceneNotFound(matched.scene_id))?;

        let rake_rule = match scene.rake_rule_id {
            0 => None,
            id => match tx.rake_rule(id).await? {
                Some(row) => RakeRule::parse(&row.kind, &row.config),
                None => {
                    log::warn!("scene {} references missing rake rule {}", scene.id, id);
                    None
                }
            },
        };
        let level_ratios = tx
            .newest_agent_rule()
            .await?
            .map(|rule| parse_level_ratios(&rule.level_ratios))
            .unwrap_or_default();

        let mut chains = HashMap::new();
        for res in req.results.iter().filter(|r| r.net_points > 0) {
            let chain = match tx.user(res.user_id).await? {
                Some(user) => resolve_chain(&user.agent_path, user.bind_agent_id),
                None => Vec::new(),
            };
            chains.insert(res.user_id, chain);
        }

        // lock wallets in ascending id order so concurrent settlements
        // cannot deadlock
        let mut participants: BTreeSet<UserId> =
            req.results.iter().map(|r| r.user_id).collect();
        participants.extend(chains.values().flatten().copied());
        let mut book = WalletBook::new();
        for user in participants {
            book.insert(tx.wallet_for_update(user).await?);
        }

        let ctx = SettleContext {
            match_id: matched.id,
            scene_id: scene.id,
            rake_rule,
            level_ratios,
            chains,
        };
        let plan = build(&ctx, &req.results, book);

        for wallet in plan.wallets.iter() {
            tx.save_wallet(wallet).await?;
        }
        for log in &plan.billing {
            tx.insert_billing(log).await?;
        }
        for log in &plan.profits {
            tx.insert_agent_profit(log).await?;
        }
        for &(agent, amount) in &plan.agent_bumps {
            tx.bump_agent_total(agent, amount).await?;
        }
        tx.finish_match(matched.id, plan.result_json.clone(), plan.rake_json.clone())
            .await?;
        tx.end_table(matched.table_id).await?;
        tx.commit().await?;

        log::info!(
            "settled match {} (rake {}, platform {})",
            matched.id,
            plan.total_rake,
            plan.platform_income
        );
        Ok(())
    }
}
