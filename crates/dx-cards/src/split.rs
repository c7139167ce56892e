use super::code::Code;
use super::score::max_rank;
use super::score::score_group;

/// A head/tail split of a 3- or 4-card hand.
///
/// `score` is the composite `head * 10^6 + tail` used to pick among valid
/// splits. A split where the tail outranks the head is "daoba" and carries
/// `valid = false`; such hands lose any non-tied comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub head: Vec<Code>,
    pub tail: Vec<Code>,
    pub head_score: i64,
    pub tail_score: i64,
    pub score: i64,
    pub valid: bool,
}

impl Split {
    /// Strongest single card in the head; the participant-sort tiebreak.
    pub fn head_max(&self) -> i64 {
        max_rank(&self.head)
    }
}

/// Selects the best head/tail split.
///
/// Enumerates every 2-card head; the complement is the tail. A split is
/// valid iff the head scores at least the tail, where equal scores break on
/// the strongest single card. Returns the valid split maximizing the
/// composite score, or the best overall split flagged invalid when every
/// split is daoba. Hands of fewer than 2 cards have no split.
pub fn best_split(cards: &[Code]) -> Option<Split> {
    let n = cards.len();
    if n < 2 {
        return None;
    }
    if n == 2 {
        let head = cards.to_vec();
        let head_score = score_group(&head);
        return Some(Split {
            head,
            tail: Vec::new(),
            head_score,
            tail_score: 0,
            score: head_score * 1_000_000,
            valid: true,
        });
    }

    let mut best_valid: Option<Split> = None;
    let mut best_overall: Option<Split> = None;
    for i in 0..n {
        for j in (i + 1)..n {
            let head = vec![cards[i], cards[j]];
            let tail: Vec<Code> = cards
                .iter()
                .enumerate()
                .filter(|(k, _)| *k != i && *k != j)
                .map(|(_, c)| *c)
                .collect();
            let head_score = score_group(&head);
            let tail_score = score_group(&tail);
            let valid = match head_score.cmp(&tail_score) {
                std::cmp::Ordering::Greater => true,
                std::cmp::Ordering::Equal => max_rank(&head) >= max_rank(&tail),
                std::cmp::Ordering::Less => false,
            };
            let split = Split {
                head,
                tail,
                head_score,
                tail_score,
                score: head_score * 1_000_000 + tail_score,
                valid,
            };
            if valid && best_valid.as_ref().map_or(true, |b| split.score > b.score) {
                best_valid = Some(split.clone());
            }
            if best_overall
                .as_ref()
                .map_or(true, |b| split.score > b.score)
            {
                best_overall = Some(split);
            }
        }
    }
    best_valid.or(best_overall.map(|mut s| {
        s.valid = false;
        s
    }))
}

/// True when the hand contains one of the two three-flower motifs, which
/// force a tie against every opponent.
pub fn is_sanhua(cards: &[Code]) -> bool {
    if cards.len() < 3 {
        return false;
    }
    let has = |c: Code| cards.contains(&c);
    (has(Code::B10) && has(Code::R10) && has(Code::BJ))
        || (has(Code::B6) && has(Code::R6) && has(Code::BK))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::score::score_pair;

    #[test]
    fn two_card_hand_is_head_only() {
        let s = best_split(&[Code::RQ, Code::R2]).unwrap();
        assert!(s.valid);
        assert!(s.tail.is_empty());
        assert_eq!(s.head_score, score_pair(Code::RQ, Code::R2));
    }

    #[test]
    fn prefers_special_head() {
        // BK+R3 is DingHuang; any split keeping them together dominates
        let s = best_split(&[Code::BK, Code::R3, Code::B5, Code::B7]).unwrap();
        assert!(s.valid);
        let mut head = s.head.clone();
        head.sort();
        assert_eq!(head, vec![Code::R3, Code::BK]);
    }

    #[test]
    fn pair_head_over_points() {
        let s = best_split(&[Code::RQ, Code::RQ, Code::B4, Code::B6]).unwrap();
        assert!(s.valid);
        assert_eq!(s.head, vec![Code::RQ, Code::RQ]);
        // B4 (4) + B6 (6) = 10 -> 0 points
        assert_eq!(s.tail_score, 110);
    }

    #[test]
    fn optimality_no_valid_split_ranks_higher() {
        let hands = [
            [Code::RQ, Code::R2, Code::B8, Code::B9],
            [Code::B5, Code::B7, Code::R6, Code::R10],
            [Code::BJ, Code::B8, Code::RQ, Code::R4],
        ];
        for cards in hands {
            let best = best_split(&cards).unwrap();
            for i in 0..4 {
                for j in (i + 1)..4 {
                    let head = vec![cards[i], cards[j]];
                    let tail: Vec<Code> = cards
                        .iter()
                        .enumerate()
                        .filter(|(k, _)| *k != i && *k != j)
                        .map(|(_, c)| *c)
                        .collect();
                    let hs = score_group(&head);
                    let ts = score_group(&tail);
                    let valid = hs > ts || (hs == ts && max_rank(&head) >= max_rank(&tail));
                    if valid && best.valid {
                        assert!(
                            (best.head_score, best.tail_score) >= (hs, ts),
                            "split {:?}/{:?} beats chosen for {:?}",
                            head,
                            tail,
                            cards
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn sanhua_motifs() {
        assert!(is_sanhua(&[Code::B10, Code::R10, Code::BJ, Code::R2]));
        assert!(is_sanhua(&[Code::B6, Code::R6, Code::BK]));
        assert!(!is_sanhua(&[Code::B10, Code::R10, Code::R2, Code::R4]));
        assert!(!is_sanhua(&[Code::B10, Code::R10]));
    }
}
