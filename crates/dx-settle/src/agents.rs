use dx_core::UserId;
use std::collections::HashMap;
use std::collections::HashSet;

/// Parses `levelRatiosJson` (`{"L1": 0.5, "L2": 0.25}`) into level → ratio.
/// Malformed keys and non-numeric values are skipped.
pub fn parse_level_ratios(value: &serde_json::Value) -> HashMap<u32, f64> {
    let mut ratios = HashMap::new();
    let Some(map) = value.as_object() else {
        return ratios;
    };
    for (key, val) in map {
        let Some(level) = key
            .to_uppercase()
            .strip_prefix('L')
            .and_then(|n| n.parse::<u32>().ok())
        else {
            continue;
        };
        if level == 0 {
            continue;
        }
        if let Some(ratio) = val.as_f64() {
            ratios.insert(level, ratio);
        }
    }
    ratios
}

/// Resolves a winner's agent chain, direct agent first.
///
/// `agent_path` is the canonical root-to-direct ancestor list joined by
/// `>`; it is parsed newest-to-oldest. `bind_agent_id` is only consulted
/// when the path is empty. Zero ids and duplicates are dropped.
pub fn resolve_chain(agent_path: &str, bind_agent_id: Option<UserId>) -> Vec<UserId> {
    let mut chain: Vec<UserId> = agent_path
        .split('>')
        .rev()
        .filter_map(|part| part.trim().parse::<UserId>().ok())
        .filter(|id| *id != 0)
        .collect();
    if chain.is_empty() {
        if let Some(id) = bind_agent_id.filter(|id| *id != 0) {
            chain.push(id);
        }
    }
    let mut seen = HashSet::new();
    chain.retain(|id| seen.insert(*id));
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ratios_parse() {
        let ratios = parse_level_ratios(&json!({"L1": 0.5, "l2": 0.25, "X3": 0.1, "L0": 0.9}));
        assert_eq!(ratios.get(&1), Some(&0.5));
        assert_eq!(ratios.get(&2), Some(&0.25));
        assert_eq!(ratios.len(), 2);
    }

    #[test]
    fn chain_is_newest_first() {
        // 9002 is the direct agent, 9001 its parent
        assert_eq!(resolve_chain("9001>9002", None), vec![9002, 9001]);
    }

    #[test]
    fn chain_falls_back_to_bind() {
        assert_eq!(resolve_chain("", Some(7)), vec![7]);
        assert_eq!(resolve_chain("", None), Vec::<UserId>::new());
        // a path always wins over the fallback
        assert_eq!(resolve_chain("5", Some(7)), vec![5]);
    }

    #[test]
    fn chain_dedupes_and_skips_junk() {
        assert_eq!(resolve_chain("1>2>1> x >0", None), vec![2, 1]);
    }
}
