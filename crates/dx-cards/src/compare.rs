use super::code::Code;
use super::split::best_split;
use super::split::is_sanhua;

/// A seat's evaluated standing entering the pairwise showdown.
#[derive(Debug, Clone, Default)]
pub struct Contender {
    pub folded: bool,
    /// Daoba: no valid split exists.
    pub invalid: bool,
    /// Three-flower hands tie everything and skip pair comparisons.
    pub sanhua: bool,
    pub head_score: i64,
    pub tail_score: i64,
    pub head_max: i64,
}

impl Contender {
    /// Evaluates a live hand into a contender.
    pub fn evaluate(cards: &[Code]) -> Self {
        if is_sanhua(cards) {
            return Self {
                sanhua: true,
                ..Self::default()
            };
        }
        match best_split(cards) {
            Some(split) => Self {
                invalid: !split.valid,
                head_score: split.head_score,
                tail_score: split.tail_score,
                head_max: split.head_max(),
                ..Self::default()
            },
            None => Self {
                invalid: true,
                ..Self::default()
            },
        }
    }
    /// A contender for a folded seat.
    pub fn folded() -> Self {
        Self {
            folded: true,
            head_score: -1,
            tail_score: -1,
            ..Self::default()
        }
    }
}

/// Pairwise showdown outcome: 1 if `a` wins, -1 if `b` wins, 0 for a tie.
///
/// SanHua on either side ties. Folded loses to anything live; daoba loses
/// to any valid hand. Otherwise `a` wins iff it is at least as good on both
/// head and tail and strictly better on one.
pub fn compare(a: &Contender, b: &Contender) -> i8 {
    if a.sanhua || b.sanhua {
        return 0;
    }
    match (a.folded, b.folded) {
        (true, true) => return 0,
        (true, false) => return -1,
        (false, true) => return 1,
        (false, false) => {}
    }
    match (a.invalid, b.invalid) {
        (true, true) => return 0,
        (true, false) => return -1,
        (false, true) => return 1,
        (false, false) => {}
    }
    let head = a.head_score.cmp(&b.head_score);
    let tail = a.tail_score.cmp(&b.tail_score);
    use std::cmp::Ordering::*;
    match (head, tail) {
        (Greater, Greater) | (Greater, Equal) | (Equal, Greater) => 1,
        (Less, Less) | (Less, Equal) | (Equal, Less) => -1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(head: i64, tail: i64) -> Contender {
        Contender {
            head_score: head,
            tail_score: tail,
            ..Contender::default()
        }
    }

    #[test]
    fn dominance_wins() {
        assert_eq!(compare(&live(900, 500), &live(800, 400)), 1);
        assert_eq!(compare(&live(900, 400), &live(900, 500)), -1);
    }

    #[test]
    fn mixed_results_tie() {
        // better head but worse tail is a push
        assert_eq!(compare(&live(900, 300), &live(800, 400)), 0);
    }

    #[test]
    fn folded_and_invalid_lose() {
        let folded = Contender::folded();
        let daoba = Contender {
            invalid: true,
            ..Contender::default()
        };
        assert_eq!(compare(&folded, &live(100, 50)), -1);
        assert_eq!(compare(&daoba, &live(100, 50)), -1);
        assert_eq!(compare(&folded, &folded), 0);
        assert_eq!(compare(&daoba, &daoba), 0);
        // folded loses even to daoba
        assert_eq!(compare(&folded, &daoba), -1);
    }

    #[test]
    fn antisymmetric_except_sanhua() {
        let hands = [
            live(900, 500),
            live(800, 400),
            live(900, 400),
            Contender::folded(),
            Contender {
                invalid: true,
                ..Contender::default()
            },
        ];
        for a in &hands {
            for b in &hands {
                assert_eq!(compare(a, b), -compare(b, a));
            }
        }
        let sanhua = Contender {
            sanhua: true,
            ..Contender::default()
        };
        for other in &hands {
            assert_eq!(compare(&sanhua, other), 0);
            assert_eq!(compare(other, &sanhua), 0);
        }
    }

    #[test]
    fn sanhua_hand_always_ties() {
        let c = Contender::evaluate(&[Code::B10, Code::R10, Code::BJ, Code::R2]);
        assert!(c.sanhua);
        assert_eq!(compare(&c, &live(10_000_900, 10_000_900)), 0);
    }
}
