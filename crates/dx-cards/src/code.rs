/// One of the 17 Chexuan card kinds.
///
/// Rank tiers follow the house ordering:
/// tier 1: RQ > R2 > R8 > R4;
/// tier 2: B10 = B4 = B6;
/// tier 3: BJ = R10 = R6 = R7;
/// tier 4: B5 = B7 = B8 = B9 = R3 = BK.
///
/// Points feed the mod-10 default scoring; tens count as zero,
/// Q as 2, J as 1, and the big king as 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Code {
    RQ,
    R2,
    R8,
    R4,
    B10,
    B4,
    B6,
    BJ,
    R10,
    R6,
    R7,
    B5,
    B7,
    B8,
    B9,
    R3,
    BK,
}

/// Card color; the big king stands alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suit {
    Red,
    Black,
    Special,
}

impl Code {
    /// Ordering weight; higher is stronger.
    pub fn rank(self) -> i64 {
        match self {
            Code::RQ => 150,
            Code::R2 => 140,
            Code::R8 => 130,
            Code::R4 => 120,
            Code::B10 | Code::B4 | Code::B6 => 110,
            Code::BJ | Code::R10 | Code::R6 | Code::R7 => 100,
            Code::B5 | Code::B7 | Code::B8 | Code::B9 | Code::R3 | Code::BK => 90,
        }
    }
    /// Point value used by the mod-10 default scoring.
    pub fn point(self) -> i64 {
        match self {
            Code::RQ | Code::R2 => 2,
            Code::R8 | Code::B8 => 8,
            Code::R4 | Code::B4 => 4,
            Code::B10 | Code::R10 => 0,
            Code::B6 | Code::R6 | Code::BK => 6,
            Code::BJ => 1,
            Code::R7 | Code::B7 => 7,
            Code::B5 => 5,
            Code::B9 => 9,
            Code::R3 => 3,
        }
    }
    pub fn suit(self) -> Suit {
        match self {
            Code::RQ
            | Code::R2
            | Code::R8
            | Code::R4
            | Code::R10
            | Code::R6
            | Code::R7
            | Code::R3 => Suit::Red,
            Code::B10 | Code::B4 | Code::B6 | Code::BJ | Code::B5 | Code::B7 | Code::B8
            | Code::B9 => Suit::Black,
            Code::BK => Suit::Special,
        }
    }
    /// Standard-poker display code shown to clients: red maps to hearts,
    /// black to spades, and the big king to the ace of spades.
    pub fn poker_code(self) -> &'static str {
        match self {
            Code::RQ => "Qh",
            Code::R2 => "2h",
            Code::R8 => "8h",
            Code::R4 => "4h",
            Code::B10 => "Ts",
            Code::B4 => "4s",
            Code::B6 => "6s",
            Code::BJ => "Js",
            Code::R10 => "Th",
            Code::R6 => "6h",
            Code::R7 => "7h",
            Code::B5 => "5s",
            Code::B7 => "7s",
            Code::B8 => "8s",
            Code::B9 => "9s",
            Code::R3 => "3h",
            Code::BK => "As",
        }
    }
    /// All 17 kinds in rank order.
    pub fn all() -> &'static [Code] {
        &[
            Code::RQ,
            Code::R2,
            Code::R8,
            Code::R4,
            Code::B10,
            Code::B4,
            Code::B6,
            Code::BJ,
            Code::R10,
            Code::R6,
            Code::R7,
            Code::B5,
            Code::B7,
            Code::B8,
            Code::B9,
            Code::R3,
            Code::BK,
        ]
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Code::RQ => "RQ",
            Code::R2 => "R2",
            Code::R8 => "R8",
            Code::R4 => "R4",
            Code::B10 => "B10",
            Code::B4 => "B4",
            Code::B6 => "B6",
            Code::BJ => "BJ",
            Code::R10 => "R10",
            Code::R6 => "R6",
            Code::R7 => "R7",
            Code::B5 => "B5",
            Code::B7 => "B7",
            Code::B8 => "B8",
            Code::B9 => "B9",
            Code::R3 => "R3",
            Code::BK => "BK",
        };
        write!(f, "{}", s)
    }
}

/// str isomorphism, case-insensitive.
impl TryFrom<&str> for Code {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_uppercase().as_str() {
            "RQ" => Ok(Code::RQ),
            "R2" => Ok(Code::R2),
            "R8" => Ok(Code::R8),
            "R4" => Ok(Code::R4),
            "B10" => Ok(Code::B10),
            "B4" => Ok(Code::B4),
            "B6" => Ok(Code::B6),
            "BJ" => Ok(Code::BJ),
            "R10" => Ok(Code::R10),
            "R6" => Ok(Code::R6),
            "R7" => Ok(Code::R7),
            "B5" => Ok(Code::B5),
            "B7" => Ok(Code::B7),
            "B8" => Ok(Code::B8),
            "B9" => Ok(Code::B9),
            "R3" => Ok(Code::R3),
            "BK" => Ok(Code::BK),
            other => Err(format!("unknown card code: {}", other)),
        }
    }
}

impl serde::Serialize for Code {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Code {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Code::try_from(s.as_str()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn bijective_str() {
        for &code in Code::all() {
            assert_eq!(Code::try_from(code.to_string().as_str()), Ok(code));
        }
    }
    #[test]
    fn case_insensitive_parse() {
        assert_eq!(Code::try_from("rq"), Ok(Code::RQ));
        assert_eq!(Code::try_from(" b10 "), Ok(Code::B10));
        assert!(Code::try_from("ZZ").is_err());
    }
    #[test]
    fn rank_tiers() {
        assert!(Code::RQ.rank() > Code::R2.rank());
        assert_eq!(Code::B10.rank(), Code::B6.rank());
        assert_eq!(Code::BK.rank(), 90);
    }
    #[test]
    fn tens_count_zero() {
        assert_eq!(Code::B10.point(), 0);
        assert_eq!(Code::R10.point(), 0);
    }
}
