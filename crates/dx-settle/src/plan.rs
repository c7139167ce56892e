use super::*;
use dx_database::AgentProfitLog;
use dx_database::BillingLog;
use dx_database::Wallet;
use serde::Serialize;
use std::collections::HashMap;

/// Everything the money arithmetic needs, loaded up front so the
/// computation itself is a pure function.
#[derive(Debug, Default)]
pub struct SettleContext {
    pub match_id: MatchId,
    pub scene_id: SceneId,
    pub rake_rule: Option<RakeRule>,
    pub level_ratios: HashMap<u32, f64>,
    /// Winner -> agent chain, direct agent first.
    pub chains: HashMap<UserId, Vec<UserId>>,
}

/// Wallets participating in one settlement, keyed by owner. The engine
/// loads them under row locks; [`build`] mutates them in memory.
#[derive(Debug, Default)]
pub struct WalletBook {
    entries: HashMap<UserId, Wallet>,
}

impl WalletBook {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, wallet: Wallet) {
        self.entries.insert(wallet.user_id, wallet);
    }
    pub fn ensure(&mut self, user: UserId) -> &mut Wallet {
        self.entries.entry(user).or_insert_with(|| Wallet::empty(user))
    }
    pub fn get(&self, user: UserId) -> Option<&Wallet> {
        self.entries.get(&user)
    }
    pub fn iter(&self) -> impl Iterator<Item = &Wallet> {
        self.entries.values()
    }
}

/// One winner's recorded outcome in `match.resultJson`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultRecord {
    user_id: UserId,
    net_points: Points,
    rake: Points,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    meta: serde_json::Value,
}

/// One agent's cut, recorded in `match.rakeJson` and the audit log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentShare {
    pub agent_id: UserId,
    pub level: i32,
    pub amount: Points,
}

#[derive(Debug, Serialize)]
struct RakeSummary {
    total: Points,
    platform: Points,
    agents: Vec<AgentShare>,
}

/// The complete effect of settling one hand: mutated wallets plus every
/// row the transaction must append.
#[derive(Debug)]
pub struct SettlePlan {
    pub wallets: WalletBook,
    pub billing: Vec<BillingLog>,
    pub profits: Vec<AgentProfitLog>,
    pub agent_bumps: Vec<(UserId, Points)>,
    pub result_json: serde_json::Value,
    pub rake_json: serde_json::Value,
    pub total_rake: Points,
    pub platform_income: Points,
}

/// Computes the settlement. `wallets` must contain a locked row for every
/// participant and every chained agent (missing entries materialise as
/// zero wallets, mirroring first-touch users).
///
/// Conservation: the signed sum of all `balance_available` deltas plus the
/// platform income equals zero.
pub fn build(ctx: &SettleContext, results: &[PlayerResult], mut wallets: WalletBook) -> SettlePlan {
    let mut billing = Vec::with_capacity(results.len() * 3);
    let mut profits = Vec::new();
    let mut bumps: HashMap<UserId, Points> = HashMap::new();
    let mut records = Vec::with_capacity(results.len());
    let mut shares = Vec::new();
    let mut total_rake = 0;
    let mut platform_income = 0;

    for res in results {
        if res.net_points > 0 {
            let rake = rake_of(&ctx.rake_rule, res.net_points);
            total_rake += rake;
            let net_win = res.net_points - rake;

            let wallet = wallets.ensure(res.user_id);
            wallet.balance_available += net_win;
            wallet.balance_total += net_win;
            wallet.total_win += net_win;
            wallet.total_rake += rake;
            let balance_after = wallet.balance_available;

            let win_meta = serde_json::json!({
                "matchId": ctx.match_id,
                "sceneId": ctx.scene_id,
                "rawWin": res.net_points,
            });
            billing.push(BillingLog {
                user_id: res.user_id,
                kind: "win".into(),
                delta: net_win,
                balance_after,
                match_id: Some(ctx.match_id),
                meta: win_meta.clone(),
            });
            if rake > 0 {
                billing.push(BillingLog {
                    user_id: res.user_id,
                    kind: "rake".into(),
                    delta: -rake,
                    balance_after,
                    match_id: Some(ctx.match_id),
                    meta: win_meta.clone(),
                });
                let platform_share = distribute(
                    ctx,
                    res.user_id,
                    rake,
                    &mut wallets,
                    &mut billing,
                    &mut profits,
                    &mut bumps,
                    &mut shares,
                );
                if platform_share > 0 {
                    platform_income += platform_share;
                    billing.push(BillingLog {
                        user_id: 0,
                        kind: "platform_income".into(),
                        delta: platform_share,
                        balance_after: 0,
                        match_id: Some(ctx.match_id),
                        meta: win_meta,
                    });
                }
            }
            records.push(ResultRecord {
                user_id: res.user_id,
                net_points: net_win,
                rake,
                meta: res.meta.clone(),
            });
        } else {
            let loss = res.net_points;
            let wallet = wallets.ensure(res.user_id);
            wallet.balance_available += loss;
            wallet.balance_total += loss;
            wallet.total_consume += -loss;
            let balance_after = wallet.balance_available;

            billing.push(BillingLog {
                user_id: res.user_id,
                kind: "lose".into(),
                delta: loss,
                balance_after,
                match_id: Some(ctx.match_id),
                meta: serde_json::json!({
                    "matchId": ctx.match_id,
                    "sceneId": ctx.scene_id,
                }),
            });
            records.push(ResultRecord {
                user_id: res.user_id,
                net_points: loss,
                rake: 0,
                meta: res.meta.clone(),
            });
        }
    }

    let summary = RakeSummary {
        total: total_rake,
        platform: platform_income,
        agents: shares,
    };
    SettlePlan {
        wallets,
        billing,
        profits,
        agent_bumps: bumps.into_iter().collect(),
        result_json: serde_json::to_value(&records).unwrap_or_default(),
        rake_json: serde_json::to_value(&summary).unwrap_or_default(),
        total_rake,
        platform_income,
    }
}

/// Splits one winner's rake across their agent chain; returns the platform
/// residual. Cumulative shares never exceed the rake.
#[allow(clippy::too_many_arguments)]
fn distribute(
    ctx: &SettleContext,
    winner: UserId,
    rake: Points,
    wallets: &mut WalletBook,
    billing: &mut Vec<BillingLog>,
    profits: &mut Vec<AgentProfitLog>,
    bumps: &mut HashMap<UserId, Points>,
    shares: &mut Vec<AgentShare>,
) -> Points {
    let chain = match ctx.chains.get(&winner) {
        Some(chain) if !chain.is_empty() => chain,
        _ => return rake,
    };
    let mut remaining = rake;
    let mut distributed = 0;
    for (idx, &agent) in chain.iter().enumerate() {
        let level = idx as i32 + 1;
        let ratio = ctx.level_ratios.get(&(level as u32)).copied().unwrap_or(0.0);
        if ratio <= 0.0 {
            continue;
        }
        let share = ((rake as f64 * ratio).round() as Points).min(remaining);
        if share <= 0 {
            continue;
        }
        remaining -= share;
        distributed += share;

        let wallet = wallets.ensure(agent);
        wallet.balance_available += share;
        wallet.balance_total += share;
        wallet.total_win += share;
        let balance_after = wallet.balance_available;

        billing.push(BillingLog {
            user_id: agent,
            kind: "agent_share".into(),
            delta: share,
            balance_after,
            match_id: Some(ctx.match_id),
            meta: serde_json::json!({
                "matchId": ctx.match_id,
                "sceneId": ctx.scene_id,
                "fromUserId": winner,
                "level": level,
            }),
        });
        profits.push(AgentProfitLog {
            agent_id: agent,
            from_user_id: winner,
            match_id: ctx.match_id,
            level,
            rake_amount: rake,
            profit_amount: share,
        });
        *bumps.entry(agent).or_insert(0) += share;
        shares.push(AgentShare {
            agent_id: agent,
            level,
            amount: share,
        });
    }
    rake - distributed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn book(balances: &[(UserId, Points)]) -> WalletBook {
        let mut book = WalletBook::new();
        for &(user, balance) in balances {
            let mut w = Wallet::empty(user);
            w.balance_available = balance;
            w.balance_total = balance;
            book.insert(w);
        }
        book
    }

    fn conservation(plan: &SettlePlan, before: &HashMap<UserId, Points>) {
        let delta: Points = plan
            .wallets
            .iter()
            .map(|w| w.balance_available - before.get(&w.user_id).copied().unwrap_or(0))
            .sum();
        assert_eq!(delta + plan.platform_income, 0, "conservation violated");
    }

    #[test]
    fn showdown_with_ratio_rake() {
        // two players bet 100 each; winner nets +100 with 5% rake
        let ctx = SettleContext {
            match_id: 7,
            scene_id: 10,
            rake_rule: RakeRule::parse("ratio", &json!({"ratio": 0.05, "cap": 0})),
            ..SettleContext::default()
        };
        let results = vec![PlayerResult::new(1, 100), PlayerResult::new(2, -100)];
        let wallets = book(&[(1, 1000), (2, 1000)]);
        let before = HashMap::from([(1, 1000), (2, 1000)]);
        let plan = build(&ctx, &results, wallets);

        assert_eq!(plan.total_rake, 5);
        assert_eq!(plan.platform_income, 5);
        assert_eq!(plan.wallets.get(1).unwrap().balance_available, 1095);
        assert_eq!(plan.wallets.get(2).unwrap().balance_available, 900);
        assert_eq!(plan.wallets.get(1).unwrap().total_rake, 5);
        assert_eq!(plan.wallets.get(2).unwrap().total_consume, 100);
        conservation(&plan, &before);

        let kinds: Vec<&str> = plan.billing.iter().map(|b| b.kind.as_str()).collect();
        assert_eq!(kinds, vec!["win", "rake", "platform_income", "lose"]);
        assert_eq!(plan.billing[2].user_id, 0);
    }

    #[test]
    fn agent_chain_distribution() {
        // winner nets +400, 10% rake = 40; chain 9002 (L1) then 9001 (L2)
        let ctx = SettleContext {
            match_id: 8,
            scene_id: 10,
            rake_rule: RakeRule::parse("ratio", &json!({"ratio": 0.10})),
            level_ratios: HashMap::from([(1, 0.5), (2, 0.25)]),
            chains: HashMap::from([(5, vec![9002, 9001])]),
        };
        let results = vec![PlayerResult::new(5, 400), PlayerResult::new(6, -400)];
        let before = HashMap::new();
        let plan = build(&ctx, &results, WalletBook::new());

        assert_eq!(plan.total_rake, 40);
        assert_eq!(plan.wallets.get(5).unwrap().balance_available, 360);
        assert_eq!(plan.wallets.get(9002).unwrap().balance_available, 20);
        assert_eq!(plan.wallets.get(9001).unwrap().balance_available, 10);
        assert_eq!(plan.platform_income, 10);
        conservation(&plan, &before);

        let kinds: Vec<(&str, UserId, Points)> = plan
            .billing
            .iter()
            .map(|b| (b.kind.as_str(), b.user_id, b.delta))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("win", 5, 360),
                ("rake", 5, -40),
                ("agent_share", 9002, 20),
                ("agent_share", 9001, 10),
                ("platform_income", 0, 10),
                ("lose", 6, -400),
            ]
        );
        assert_eq!(plan.profits.len(), 2);
        assert_eq!(plan.profits[0].level, 1);
        assert_eq!(plan.profits[0].rake_amount, 40);
    }

    #[test]
    fn shares_clamp_at_rake() {
        let ctx = SettleContext {
            match_id: 9,
            scene_id: 1,
            rake_rule: RakeRule::parse("fixed", &json!({"amount": 10})),
            level_ratios: HashMap::from([(1, 0.9), (2, 0.9)]),
            chains: HashMap::from([(1, vec![100, 200])]),
        };
        let results = vec![PlayerResult::new(1, 50), PlayerResult::new(2, -50)];
        let plan = build(&ctx, &results, WalletBook::new());
        let agent_total: Points = plan
            .billing
            .iter()
            .filter(|b| b.kind == "agent_share")
            .map(|b| b.delta)
            .sum();
        assert!(agent_total <= plan.total_rake);
        assert_eq!(agent_total + plan.platform_income, plan.total_rake);
        conservation(&plan, &HashMap::new());
    }

    #[test]
    fn zero_results_write_lose_rows_only() {
        // liu-ju refund: everyone nets zero, nothing moves
        let ctx = SettleContext::default();
        let results = vec![PlayerResult::new(1, 0), PlayerResult::new(2, 0)];
        let plan = build(&ctx, &results, WalletBook::new());
        assert_eq!(plan.total_rake, 0);
        assert!(plan.billing.iter().all(|b| b.kind == "lose" && b.delta == 0));
        conservation(&plan, &HashMap::new());
    }
}
