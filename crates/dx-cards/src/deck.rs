use super::code::Code;
use rand::seq::SliceRandom;

/// The 32-card deck template: two copies of every kind except the single
/// R3 and BK.
const TEMPLATE: [(Code, usize); 17] = [
    (Code::RQ, 2),
    (Code::R2, 2),
    (Code::R8, 2),
    (Code::R4, 2),
    (Code::B10, 2),
    (Code::B4, 2),
    (Code::B6, 2),
    (Code::BJ, 2),
    (Code::R10, 2),
    (Code::R6, 2),
    (Code::R7, 2),
    (Code::B5, 2),
    (Code::B7, 2),
    (Code::B8, 2),
    (Code::B9, 2),
    (Code::R3, 1),
    (Code::BK, 1),
];

/// Returns a freshly shuffled 32-card Chexuan deck.
pub fn deck() -> Vec<Code> {
    let mut cards = Vec::with_capacity(32);
    for (code, copies) in TEMPLATE {
        for _ in 0..copies {
            cards.push(code);
        }
    }
    cards.shuffle(&mut rand::rng());
    cards
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn thirty_two_cards() {
        assert_eq!(deck().len(), 32);
    }
    #[test]
    fn singles_appear_once() {
        let d = deck();
        assert_eq!(d.iter().filter(|&&c| c == Code::R3).count(), 1);
        assert_eq!(d.iter().filter(|&&c| c == Code::BK).count(), 1);
        assert_eq!(d.iter().filter(|&&c| c == Code::RQ).count(), 2);
    }
}
