use super::code::Code;

/// Score tier offsets. Special hands beat pairs beat point hands.
const SPECIAL_TIER: i64 = 10_000_000;
const PAIR_TIER: i64 = 9_000_000;

/// Weight of a named special hand within the special tier, or None.
///
/// DingHuang > NaiGou > TianGang > DiGang > TianGuan > DiGuan > RenPai >
/// HeWu > ChangEr > HuTou.
pub fn special_weight(a: Code, b: Code) -> Option<i64> {
    let pair = if a <= b { (a, b) } else { (b, a) };
    match pair {
        // DingHuang: big king with the lone red 3
        (Code::R3, Code::BK) => Some(900),
        // NaiGou: red Q with a black 9
        (Code::RQ, Code::B9) => Some(850),
        // TianGang: red Q with any 8
        (Code::RQ, Code::B8) | (Code::RQ, Code::R8) => Some(840),
        // DiGang: red 2 with any 8
        (Code::R2, Code::B8) | (Code::R2, Code::R8) => Some(830),
        // TianGuan: red Q with any 7
        (Code::RQ, Code::B7) | (Code::RQ, Code::R7) => Some(820),
        // DiGuan: red 2 with any 7
        (Code::R2, Code::B7) | (Code::R2, Code::R7) => Some(810),
        // RenPai: red 8 with the black J
        (Code::R8, Code::BJ) => Some(800),
        // HeWu: red 4 with the black 5
        (Code::R4, Code::B5) => Some(790),
        // ChangEr: black 4 with the black 5
        (Code::B4, Code::B5) => Some(780),
        // HuTou: black 8 with the black J
        (Code::BJ, Code::B8) => Some(770),
        _ => None,
    }
}

/// Scores a 2-card group. Higher wins.
///
/// Tiers: special table, then pairs by rank, then points mod 10 broken by
/// the stronger single card.
pub fn score_pair(a: Code, b: Code) -> i64 {
    if let Some(w) = special_weight(a, b) {
        return SPECIAL_TIER + w;
    }
    if a == b {
        return PAIR_TIER + a.rank();
    }
    let points = (a.point() + b.point()) % 10;
    points * 100 + a.rank().max(b.rank())
}

/// Scores a group given as a slice; groups smaller than two cards score 0.
pub fn score_group(cards: &[Code]) -> i64 {
    match cards {
        [a, b, ..] => score_pair(*a, *b),
        _ => 0,
    }
}

/// Strongest single-card rank in a group; ties between equal group scores
/// break on this.
pub fn max_rank(cards: &[Code]) -> i64 {
    cards.iter().map(|c| c.rank()).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn special_table() {
        assert_eq!(special_weight(Code::BK, Code::R3), Some(900));
        assert_eq!(special_weight(Code::B9, Code::RQ), Some(850));
        assert_eq!(special_weight(Code::R8, Code::RQ), Some(840));
        assert_eq!(special_weight(Code::B8, Code::R2), Some(830));
        assert_eq!(special_weight(Code::R7, Code::RQ), Some(820));
        assert_eq!(special_weight(Code::B7, Code::R2), Some(810));
        assert_eq!(special_weight(Code::BJ, Code::R8), Some(800));
        assert_eq!(special_weight(Code::B5, Code::R4), Some(790));
        assert_eq!(special_weight(Code::B4, Code::B5), Some(780));
        assert_eq!(special_weight(Code::B8, Code::BJ), Some(770));
        assert_eq!(special_weight(Code::RQ, Code::R2), None);
    }
    #[test]
    fn special_beats_pair_beats_points() {
        let special = score_pair(Code::BK, Code::R3);
        let pair = score_pair(Code::RQ, Code::RQ);
        let points = score_pair(Code::R2, Code::R7);
        assert!(special > pair);
        assert!(pair > points);
    }
    #[test]
    fn pair_score_carries_rank() {
        assert_eq!(score_pair(Code::RQ, Code::RQ), 9_000_000 + 150);
        assert!(score_pair(Code::RQ, Code::RQ) > score_pair(Code::B9, Code::B9));
    }
    #[test]
    fn mod_ten_points() {
        // R7 (7) + B6 (6) = 13 -> 3 points, high card R7 at rank 100
        assert_eq!(score_pair(Code::R7, Code::B6), 3 * 100 + 100);
        // B10 counts zero: B10 (0) + B9 (9) = 9 points
        assert_eq!(score_pair(Code::B10, Code::B9), 9 * 100 + 110);
    }
    #[test]
    fn symmetric() {
        assert_eq!(
            score_pair(Code::R2, Code::B8),
            score_pair(Code::B8, Code::R2)
        );
    }
}
