use super::*;
use dx_core::MatchId;
use dx_core::Points;
use dx_core::SceneId;
use dx_core::TableId;
use dx_core::UserId;
use tokio_postgres::GenericClient;
use tokio_postgres::Transaction;

/// Read-mostly record access. Implemented for every
/// [`GenericClient`], so the same queries run on the shared client and
/// inside transactions.
#[allow(async_fn_in_trait)]
pub trait Records {
    async fn scene(&self, id: SceneId) -> Result<Option<Scene>, PgErr>;
    async fn enabled_scenes(&self) -> Result<Vec<Scene>, PgErr>;
    async fn user(&self, id: UserId) -> Result<Option<User>, PgErr>;
    async fn wallet(&self, user: UserId) -> Result<Option<Wallet>, PgErr>;
    /// Snapshot read used by queue admission; absent wallet reads as zero.
    async fn balance_available(&self, user: UserId) -> Result<Points, PgErr>;
    async fn table(&self, id: TableId) -> Result<Option<TableRow>, PgErr>;
    /// The newest unsettled match on a table, if any.
    async fn active_match(&self, table: TableId) -> Result<Option<MatchRow>, PgErr>;
    /// Persists the mango streak carried between hands on the same table.
    async fn set_table_streak(&self, table: TableId, streak: i32) -> Result<(), PgErr>;
    async fn rake_rule(&self, id: i64) -> Result<Option<RakeRuleRow>, PgErr>;
    /// The newest agent rule row governs all distributions.
    async fn newest_agent_rule(&self) -> Result<Option<AgentRuleRow>, PgErr>;
    async fn append_round_log(
        &self,
        match_id: MatchId,
        round_no: i32,
        actions: serde_json::Value,
        cards: Option<serde_json::Value>,
    ) -> Result<(), PgErr>;
}

impl<C: GenericClient + Sync> Records for C {
    async fn scene(&self, id: SceneId) -> Result<Option<Scene>, PgErr> {
        self.query_opt(
            const_format::concatcp!("SELECT * FROM ", SCENES, " WHERE id = $1"),
            &[&id],
        )
        .await
        .map(|opt| opt.as_ref().map(Scene::from))
    }
    async fn enabled_scenes(&self) -> Result<Vec<Scene>, PgErr> {
        self.query(
            const_format::concatcp!(
                "SELECT * FROM ",
                SCENES,
                " WHERE status = 'enabled' ORDER BY id"
            ),
            &[],
        )
        .await
        .map(|rows| rows.iter().map(Scene::from).collect())
    }
    async fn user(&self, id: UserId) -> Result<Option<User>, PgErr> {
        self.query_opt(
            const_format::concatcp!("SELECT * FROM ", USERS, " WHERE id = $1"),
            &[&id],
        )
        .await
        .map(|opt| opt.as_ref().map(User::from))
    }
    async fn wallet(&self, user: UserId) -> Result<Option<Wallet>, PgErr> {
        self.query_opt(
            const_format::concatcp!("SELECT * FROM ", WALLETS, " WHERE user_id = $1"),
            &[&user],
        )
        .await
        .map(|opt| opt.as_ref().map(Wallet::from))
    }
    async fn balance_available(&self, user: UserId) -> Result<Points, PgErr> {
        self.query_opt(
            const_format::concatcp!(
                "SELECT balance_available FROM ",
                WALLETS,
                " WHERE user_id = $1"
            ),
            &[&user],
        )
        .await
        .map(|opt| opt.map_or(0, |row| row.get(0)))
    }
    async fn table(&self, id: TableId) -> Result<Option<TableRow>, PgErr> {
        self.query_opt(
            const_format::concatcp!("SELECT * FROM ", TABLES, " WHERE id = $1"),
            &[&id],
        )
        .await
        .map(|opt| opt.as_ref().map(TableRow::from))
    }
    async fn active_match(&self, table: TableId) -> Result<Option<MatchRow>, PgErr> {
        self.query_opt(
            const_format::concatcp!(
                "SELECT * FROM ",
                MATCHES,
                " WHERE table_id = $1 AND ended_at IS NULL ORDER BY id DESC LIMIT 1"
            ),
            &[&table],
        )
        .await
        .map(|opt| opt.as_ref().map(MatchRow::from))
    }
    async fn set_table_streak(&self, table: TableId, streak: i32) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!("UPDATE ", TABLES, " SET mango_streak = $2 WHERE id = $1"),
            &[&table, &streak],
        )
        .await
        .map(|_| ())
    }
    async fn rake_rule(&self, id: i64) -> Result<Option<RakeRuleRow>, PgErr> {
        self.query_opt(
            const_format::concatcp!("SELECT * FROM ", RAKE_RULES, " WHERE id = $1"),
            &[&id],
        )
        .await
        .map(|opt| opt.as_ref().map(RakeRuleRow::from))
    }
    async fn newest_agent_rule(&self) -> Result<Option<AgentRuleRow>, PgErr> {
        self.query_opt(
            const_format::concatcp!("SELECT * FROM ", AGENT_RULES, " ORDER BY id DESC LIMIT 1"),
            &[],
        )
        .await
        .map(|opt| opt.as_ref().map(AgentRuleRow::from))
    }
    async fn append_round_log(
        &self,
        match_id: MatchId,
        round_no: i32,
        actions: serde_json::Value,
        cards: Option<serde_json::Value>,
    ) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                MATCH_ROUND_LOGS,
                " (match_id, round_no, actions_json, cards_json) VALUES ($1, $2, $3, $4)"
            ),
            &[&match_id, &round_no, &actions, &cards],
        )
        .await
        .map(|_| ())
    }
}

/// Row-locking and write operations that only make sense inside a
/// transaction: match composition and settlement.
#[allow(async_fn_in_trait)]
pub trait Transactional {
    /// Locks the match row; the idempotence gate reads `ended_at` under
    /// this lock.
    async fn lock_match(&self, id: MatchId) -> Result<Option<MatchRow>, PgErr>;
    /// Locks (or materialises) a wallet row for update.
    async fn wallet_for_update(&self, user: UserId) -> Result<Wallet, PgErr>;
    async fn save_wallet(&self, wallet: &Wallet) -> Result<(), PgErr>;
    async fn insert_billing(&self, log: &BillingLog) -> Result<(), PgErr>;
    async fn insert_agent_profit(&self, log: &AgentProfitLog) -> Result<(), PgErr>;
    async fn bump_agent_total(&self, agent: UserId, amount: Points) -> Result<(), PgErr>;
    /// Writes result/rake blobs and stamps `ended_at`.
    async fn finish_match(
        &self,
        id: MatchId,
        result: serde_json::Value,
        rake: serde_json::Value,
    ) -> Result<(), PgErr>;
    async fn end_table(&self, id: TableId) -> Result<(), PgErr>;
    async fn create_table(
        &self,
        scene: &Scene,
        players: serde_json::Value,
    ) -> Result<TableId, PgErr>;
    async fn create_match(&self, table: TableId, scene: SceneId) -> Result<MatchId, PgErr>;
}

impl Transactional for Transaction<'_> {
    async fn lock_match(&self, id: MatchId) -> Result<Option<MatchRow>, PgErr> {
        self.query_opt(
            const_format::concatcp!("SELECT * FROM ", MATCHES, " WHERE id = $1 FOR UPDATE"),
            &[&id],
        )
        .await
        .map(|opt| opt.as_ref().map(MatchRow::from))
    }
    async fn wallet_for_update(&self, user: UserId) -> Result<Wallet, PgErr> {
        let locked = self
            .query_opt(
                const_format::concatcp!(
                    "SELECT * FROM ",
                    WALLETS,
                    " WHERE user_id = $1 FOR UPDATE"
                ),
                &[&user],
            )
            .await?;
        Ok(locked
            .as_ref()
            .map(Wallet::from)
            .unwrap_or_else(|| Wallet::empty(user)))
    }
    async fn save_wallet(&self, wallet: &Wallet) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                WALLETS,
                " (user_id, balance_total, balance_available, balance_frozen,
                   total_win, total_consume, total_rake, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, now())
                 ON CONFLICT (user_id) DO UPDATE SET
                   balance_total = EXCLUDED.balance_total,
                   balance_available = EXCLUDED.balance_available,
                   balance_frozen = EXCLUDED.balance_frozen,
                   total_win = EXCLUDED.total_win,
                   total_consume = EXCLUDED.total_consume,
                   total_rake = EXCLUDED.total_rake,
                   updated_at = now()"
            ),
            &[
                &wallet.user_id,
                &wallet.balance_total,
                &wallet.balance_available,
                &wallet.balance_frozen,
                &wallet.total_win,
                &wallet.total_consume,
                &wallet.total_rake,
            ],
        )
        .await
        .map(|_| ())
    }
    async fn insert_billing(&self, log: &BillingLog) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                BILLING_LOGS,
                " (user_id, kind, delta, balance_after, match_id, meta_json)
                 VALUES ($1, $2, $3, $4, $5, $6)"
            ),
            &[
                &log.user_id,
                &log.kind,
                &log.delta,
                &log.balance_after,
                &log.match_id,
                &log.meta,
            ],
        )
        .await
        .map(|_| ())
    }
    async fn insert_agent_profit(&self, log: &AgentProfitLog) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                AGENT_PROFIT_LOGS,
                " (agent_id, from_user_id, match_id, level, rake_amount, profit_amount)
                 VALUES ($1, $2, $3, $4, $5, $6)"
            ),
            &[
                &log.agent_id,
                &log.from_user_id,
                &log.match_id,
                &log.level,
                &log.rake_amount,
                &log.profit_amount,
            ],
        )
        .await
        .map(|_| ())
    }
    async fn bump_agent_total(&self, agent: UserId, amount: Points) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                AGENTS,
                " (id, total_profit) VALUES ($1, $2)
                 ON CONFLICT (id) DO UPDATE SET total_profit = ",
                AGENTS,
                ".total_profit + EXCLUDED.total_profit"
            ),
            &[&agent, &amount],
        )
        .await
        .map(|_| ())
    }
    async fn finish_match(
        &self,
        id: MatchId,
        result: serde_json::Value,
        rake: serde_json::Value,
    ) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "UPDATE ",
                MATCHES,
                " SET result_json = $2, rake_json = $3, ended_at = now() WHERE id = $1"
            ),
            &[&id, &result, &rake],
        )
        .await
        .map(|_| ())
    }
    async fn end_table(&self, id: TableId) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!("UPDATE ", TABLES, " SET status = 'ended' WHERE id = $1"),
            &[&id],
        )
        .await
        .map(|_| ())
    }
    async fn create_table(
        &self,
        scene: &Scene,
        players: serde_json::Value,
    ) -> Result<TableId, PgErr> {
        self.query_one(
            const_format::concatcp!(
                "INSERT INTO ",
                TABLES,
                " (scene_id, status, seat_count, mango_streak, players_json)
                 VALUES ($1, 'waiting', $2, 0, $3) RETURNING id"
            ),
            &[&scene.id, &scene.seat_count, &players],
        )
        .await
        .map(|row| row.get(0))
    }
    async fn create_match(&self, table: TableId, scene: SceneId) -> Result<MatchId, PgErr> {
        self.query_one(
            const_format::concatcp!(
                "INSERT INTO ",
                MATCHES,
                " (table_id, scene_id) VALUES ($1, $2) RETURNING id"
            ),
            &[&table, &scene],
        )
        .await
        .map(|row| row.get(0))
    }
}
