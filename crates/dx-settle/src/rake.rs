use dx_core::Points;
use serde::Deserialize;

/// A parsed rake rule: the commission taken from a winner's gross win.
///
/// The stored form is a `kind` discriminator plus a JSON config; unknown
/// kinds and malformed configs parse to nothing so settlement proceeds
/// rake-free instead of blocking on config drift.
#[derive(Debug, Clone, PartialEq)]
pub enum RakeRule {
    Ratio { ratio: f64, cap: Points },
    Fixed { amount: Points },
    Ladder(Vec<LadderStep>),
}

/// One ladder band; a 0 bound is open and the first containing band wins.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LadderStep {
    #[serde(default)]
    pub min: Points,
    #[serde(default)]
    pub max: Points,
    #[serde(default)]
    pub ratio: f64,
    #[serde(default)]
    pub value: Points,
}

#[derive(Deserialize)]
struct RatioConfig {
    ratio: f64,
    #[serde(default)]
    cap: Points,
}

#[derive(Deserialize)]
struct FixedConfig {
    amount: Points,
}

impl RakeRule {
    /// Parses a rule row. Returns None (with a warn) on any unknown kind
    /// or malformed config.
    pub fn parse(kind: &str, config: &serde_json::Value) -> Option<Self> {
        let parsed = match kind.to_lowercase().as_str() {
            "ratio" => serde_json::from_value::<RatioConfig>(config.clone())
                .ok()
                .map(|c| Self::Ratio {
                    ratio: c.ratio,
                    cap: c.cap,
                }),
            "fixed" => serde_json::from_value::<FixedConfig>(config.clone())
                .ok()
                .map(|c| Self::Fixed { amount: c.amount }),
            "ladder" => serde_json::from_value::<Vec<LadderStep>>(config.clone())
                .ok()
                .map(Self::Ladder),
            _ => None,
        };
        if parsed.is_none() {
            log::warn!("unusable rake rule kind={} config={}", kind, config);
        }
        parsed
    }

    /// Rake owed on a gross win. Never exceeds the win, never negative.
    pub fn apply(&self, win: Points) -> Points {
        if win <= 0 {
            return 0;
        }
        match self {
            Self::Ratio { ratio, cap } => clamp((win as f64 * ratio).round() as Points, win, *cap),
            Self::Fixed { amount } => clamp(*amount, win, 0),
            Self::Ladder(steps) => {
                for step in steps {
                    let contains =
                        (step.min == 0 || win >= step.min) && (step.max == 0 || win <= step.max);
                    if !contains {
                        continue;
                    }
                    if step.ratio > 0.0 {
                        return clamp((win as f64 * step.ratio).round() as Points, win, 0);
                    }
                    if step.value > 0 {
                        return clamp(step.value, win, 0);
                    }
                }
                0
            }
        }
    }
}

/// Optional rake of an optional rule.
pub fn rake_of(rule: &Option<RakeRule>, win: Points) -> Points {
    rule.as_ref().map_or(0, |r| r.apply(win))
}

fn clamp(value: Points, win: Points, cap: Points) -> Points {
    let mut v = value.max(0);
    if cap > 0 {
        v = v.min(cap);
    }
    v.min(win)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ratio_rounds_and_caps() {
        let rule = RakeRule::parse("ratio", &json!({"ratio": 0.05, "cap": 0})).unwrap();
        assert_eq!(rule.apply(100), 5);
        assert_eq!(rule.apply(49), 2);
        assert_eq!(rule.apply(50), 3);
        let capped = RakeRule::parse("ratio", &json!({"ratio": 0.5, "cap": 10})).unwrap();
        assert_eq!(capped.apply(100), 10);
    }

    #[test]
    fn ratio_ten_percent() {
        let rule = RakeRule::parse("ratio", &json!({"ratio": 0.10})).unwrap();
        assert_eq!(rule.apply(400), 40);
    }

    #[test]
    fn fixed_clamps_to_win() {
        let rule = RakeRule::parse("fixed", &json!({"amount": 30})).unwrap();
        assert_eq!(rule.apply(100), 30);
        assert_eq!(rule.apply(20), 20);
        assert_eq!(rule.apply(0), 0);
    }

    #[test]
    fn ladder_first_band_wins() {
        let rule = RakeRule::parse(
            "ladder",
            &json!([
                {"min": 0, "max": 100, "ratio": 0.05},
                {"min": 101, "max": 0, "value": 20}
            ]),
        )
        .unwrap();
        assert_eq!(rule.apply(100), 5);
        assert_eq!(rule.apply(500), 20);
    }

    #[test]
    fn ladder_prefers_ratio_over_value() {
        let rule = RakeRule::parse("ladder", &json!([{"ratio": 0.1, "value": 99}])).unwrap();
        assert_eq!(rule.apply(100), 10);
    }

    #[test]
    fn unknown_kind_and_bad_config_parse_to_none() {
        assert_eq!(RakeRule::parse("tiered", &json!({})), None);
        assert_eq!(RakeRule::parse("ratio", &json!("garbage")), None);
        assert_eq!(rake_of(&None, 1000), 0);
    }

    #[test]
    fn never_negative_never_exceeds_win() {
        let rule = RakeRule::parse("ratio", &json!({"ratio": 2.0})).unwrap();
        assert_eq!(rule.apply(100), 100);
        let negative = RakeRule::parse("fixed", &json!({"amount": -5})).unwrap();
        assert_eq!(negative.apply(100), 0);
    }
}
