use super::*;

/// Full DDL for the platform's durable entities.
#[rustfmt::skip]
const CREATES: &str = const_format::concatcp!(
    "CREATE TABLE IF NOT EXISTS ", USERS, " (
        id             BIGSERIAL PRIMARY KEY,
        phone          TEXT NOT NULL UNIQUE,
        nickname       TEXT NOT NULL DEFAULT '',
        invite_code    TEXT NOT NULL UNIQUE,
        bind_agent_id  BIGINT,
        agent_path     TEXT NOT NULL DEFAULT '',
        status         TEXT NOT NULL DEFAULT 'normal',
        created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at     TIMESTAMPTZ NOT NULL DEFAULT now()
    );
    CREATE TABLE IF NOT EXISTS ", AGENTS, " (
        id             BIGINT PRIMARY KEY,
        level          INT NOT NULL DEFAULT 1,
        total_invited  INT NOT NULL DEFAULT 0,
        total_profit   BIGINT NOT NULL DEFAULT 0,
        created_at     TIMESTAMPTZ NOT NULL DEFAULT now()
    );
    CREATE TABLE IF NOT EXISTS ", AGENT_RULES, " (
        id                   BIGSERIAL PRIMARY KEY,
        max_level            INT NOT NULL DEFAULT 1,
        level_ratios_json    JSONB NOT NULL DEFAULT '{}',
        base_platform_ratio  DOUBLE PRECISION NOT NULL DEFAULT 0.6
    );
    CREATE TABLE IF NOT EXISTS ", AGENT_PROFIT_LOGS, " (
        id             BIGSERIAL PRIMARY KEY,
        agent_id       BIGINT NOT NULL,
        from_user_id   BIGINT NOT NULL,
        match_id       BIGINT NOT NULL,
        level          INT NOT NULL,
        rake_amount    BIGINT NOT NULL,
        profit_amount  BIGINT NOT NULL,
        created_at     TIMESTAMPTZ NOT NULL DEFAULT now()
    );
    CREATE TABLE IF NOT EXISTS ", WALLETS, " (
        user_id            BIGINT PRIMARY KEY,
        balance_total      BIGINT NOT NULL DEFAULT 0,
        balance_available  BIGINT NOT NULL DEFAULT 0,
        balance_frozen     BIGINT NOT NULL DEFAULT 0,
        total_win          BIGINT NOT NULL DEFAULT 0,
        total_consume      BIGINT NOT NULL DEFAULT 0,
        total_rake         BIGINT NOT NULL DEFAULT 0,
        updated_at         TIMESTAMPTZ NOT NULL DEFAULT now()
    );
    CREATE TABLE IF NOT EXISTS ", BILLING_LOGS, " (
        id             BIGSERIAL PRIMARY KEY,
        user_id        BIGINT NOT NULL,
        kind           TEXT NOT NULL,
        delta          BIGINT NOT NULL,
        balance_after  BIGINT NOT NULL,
        match_id       BIGINT,
        meta_json      JSONB NOT NULL DEFAULT '{}',
        created_at     TIMESTAMPTZ NOT NULL DEFAULT now()
    );
    CREATE TABLE IF NOT EXISTS ", SCENES, " (
        id                    BIGSERIAL PRIMARY KEY,
        name                  TEXT NOT NULL DEFAULT '',
        seat_count            INT NOT NULL,
        min_in                BIGINT NOT NULL DEFAULT 0,
        max_in                BIGINT NOT NULL DEFAULT 0,
        base_pi               BIGINT NOT NULL DEFAULT 0,
        min_unit_pi           BIGINT NOT NULL DEFAULT 0,
        mango_enabled         BOOLEAN NOT NULL DEFAULT FALSE,
        bobo_enabled          BOOLEAN NOT NULL DEFAULT FALSE,
        distance_threshold_m  INT NOT NULL DEFAULT 0,
        status                TEXT NOT NULL DEFAULT 'enabled',
        rake_rule_id          BIGINT NOT NULL DEFAULT 0,
        created_at            TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at            TIMESTAMPTZ NOT NULL DEFAULT now()
    );
    CREATE TABLE IF NOT EXISTS ", RAKE_RULES, " (
        id           BIGSERIAL PRIMARY KEY,
        name         TEXT NOT NULL DEFAULT '',
        kind         TEXT NOT NULL,
        status       TEXT NOT NULL DEFAULT 'enabled',
        config_json  JSONB NOT NULL DEFAULT '{}',
        created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at   TIMESTAMPTZ NOT NULL DEFAULT now()
    );
    CREATE TABLE IF NOT EXISTS ", TABLES, " (
        id            BIGSERIAL PRIMARY KEY,
        scene_id      BIGINT NOT NULL,
        status        TEXT NOT NULL DEFAULT 'waiting',
        seat_count    INT NOT NULL,
        mango_streak  INT NOT NULL DEFAULT 0,
        players_json  JSONB NOT NULL DEFAULT '{}',
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    );
    CREATE TABLE IF NOT EXISTS ", MATCHES, " (
        id           BIGSERIAL PRIMARY KEY,
        table_id     BIGINT NOT NULL,
        scene_id     BIGINT NOT NULL,
        result_json  JSONB NOT NULL DEFAULT '{}',
        rake_json    JSONB NOT NULL DEFAULT '{}',
        created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
        ended_at     TIMESTAMPTZ
    );
    CREATE TABLE IF NOT EXISTS ", MATCH_ROUND_LOGS, " (
        id            BIGSERIAL PRIMARY KEY,
        match_id      BIGINT NOT NULL,
        round_no      INT NOT NULL,
        actions_json  JSONB NOT NULL DEFAULT '[]',
        cards_json    JSONB,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    );"
);

#[rustfmt::skip]
const INDICES: &str = const_format::concatcp!(
    "CREATE INDEX IF NOT EXISTS idx_billing_user  ON ", BILLING_LOGS, " (user_id);
     CREATE INDEX IF NOT EXISTS idx_billing_match ON ", BILLING_LOGS, " (match_id);
     CREATE INDEX IF NOT EXISTS idx_matches_table ON ", MATCHES, " (table_id);
     CREATE INDEX IF NOT EXISTS idx_roundlog_match ON ", MATCH_ROUND_LOGS, " (match_id);
     CREATE INDEX IF NOT EXISTS idx_profit_agent  ON ", AGENT_PROFIT_LOGS, " (agent_id);"
);

/// Creates all tables and indices. `SKIP_USER_MIGRATE=1` opts out, for
/// deployments that manage schema externally.
pub async fn migrate(client: &tokio_postgres::Client) -> Result<(), PgErr> {
    if std::env::var("SKIP_USER_MIGRATE").map_or(false, |v| v == "1") {
        log::info!("schema migration skipped (SKIP_USER_MIGRATE=1)");
        return Ok(());
    }
    log::info!("running schema migration");
    client.batch_execute(CREATES).await?;
    client.batch_execute(INDICES).await?;
    Ok(())
}
