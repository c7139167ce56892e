//! Simple high-card/pair scoring for non-Chexuan scenes.
//!
//! Cards are standard poker codes like "As" or "Td". Scenes without the
//! Chexuan split rules just compare the strongest pair or high card.

/// Numeric rank of a poker card code, 2..=14. Unparseable input ranks 0.
fn rank_of(card: &str) -> i64 {
    match card.chars().next() {
        Some(c @ '2'..='9') => c as i64 - '0' as i64,
        Some('T') => 10,
        Some('J') => 11,
        Some('Q') => 12,
        Some('K') => 13,
        Some('A') => 14,
        _ => 0,
    }
}

/// Scores a hand for comparison; higher wins.
///
/// A pair scores `1_000_000 * rank`; otherwise the two strongest ranks
/// combine as `high * 100 + second`.
pub fn evaluate(cards: &[String]) -> i64 {
    let mut ranks: Vec<i64> = cards.iter().map(|c| rank_of(c)).collect();
    ranks.sort_unstable_by(|a, b| b.cmp(a));
    match ranks.as_slice() {
        [] => 0,
        [a] => a * 100,
        [a, b, ..] if a == b => 1_000_000 * a,
        [a, b, ..] => a * 100 + b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(cards: &[&str]) -> Vec<String> {
        cards.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn pair_beats_high_card() {
        let aces = evaluate(&hand(&["As", "Ad"]));
        let king_high = evaluate(&hand(&["Kc", "Qh"]));
        assert!(aces > king_high);
    }

    #[test]
    fn high_card_ordering() {
        assert!(evaluate(&hand(&["Kc", "Qh"])) > evaluate(&hand(&["Kc", "Jh"])));
        assert!(evaluate(&hand(&["Ac", "2h"])) > evaluate(&hand(&["Kc", "Qh"])));
    }

    #[test]
    fn empty_hand_scores_zero() {
        assert_eq!(evaluate(&[]), 0);
    }
}
