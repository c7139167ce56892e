use super::*;
use dx_core::Points;
use serde::Deserialize;
use serde::Serialize;

/// Client-to-server frame: `{type, seq?, data?}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub seq: Option<i64>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// A parsed player command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Ready,
    Pass,
    Call,
    Raise(Points),
    Fold,
    KnockBobo,
    /// Replays authoritative state to the requesting viewer only.
    Rejoin,
    Ping,
}

impl Action {
    /// Parses a wire frame. Unknown types are rejected; a raise without an
    /// amount parses as `Raise(0)` and fails validation downstream (or
    /// coerces to a knock where bobo is enabled).
    pub fn parse(frame: &ClientFrame) -> Result<Self, GameError> {
        match frame.kind.as_str() {
            "ready" => Ok(Self::Ready),
            "pass" => Ok(Self::Pass),
            "call" => Ok(Self::Call),
            "fold" => Ok(Self::Fold),
            "knock_bobo" => Ok(Self::KnockBobo),
            "rejoin" => Ok(Self::Rejoin),
            "ping" => Ok(Self::Ping),
            "raise" => {
                let amount = frame
                    .data
                    .as_ref()
                    .and_then(|d| d.get("amount"))
                    .and_then(amount_of)
                    .unwrap_or(0);
                Ok(Self::Raise(amount))
            }
            other => Err(GameError::UnsupportedAction(other.to_string())),
        }
    }
    /// Wire name, also used in the round log.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Pass => "pass",
            Self::Call => "call",
            Self::Raise(_) => "raise",
            Self::Fold => "fold",
            Self::KnockBobo => "knock_bobo",
            Self::Rejoin => "rejoin",
            Self::Ping => "ping",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Raise(amount) => write!(f, "raise {}", amount),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Amounts arrive as JSON numbers or numeric strings.
fn amount_of(value: &serde_json::Value) -> Option<Points> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// Server-to-client frame. `seq` is assigned by the runtime and strictly
/// increases per table; dropped frames leave gaps that viewers close via
/// `rejoin`.
#[derive(Debug, Clone, Serialize)]
pub struct Outgoing {
    #[serde(rename = "type")]
    pub kind: String,
    pub seq: i64,
    pub data: serde_json::Value,
}

impl Outgoing {
    pub fn state(seq: i64, state: &TableState) -> Self {
        Self {
            kind: "state".into(),
            seq,
            data: serde_json::to_value(state).unwrap_or_default(),
        }
    }
    pub fn pong(seq: i64) -> Self {
        Self {
            kind: "pong".into(),
            seq,
            data: serde_json::json!({"message": "pong"}),
        }
    }
    pub fn error(message: &str) -> Self {
        Self {
            kind: "error".into(),
            seq: 0,
            data: serde_json::json!({"message": message}),
        }
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize outgoing frame")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(json: &str) -> ClientFrame {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_plain_actions() {
        assert_eq!(
            Action::parse(&frame(r#"{"type":"fold"}"#)).unwrap(),
            Action::Fold
        );
        assert_eq!(
            Action::parse(&frame(r#"{"type":"ping","seq":3}"#)).unwrap(),
            Action::Ping
        );
    }

    #[test]
    fn parses_raise_amounts() {
        assert_eq!(
            Action::parse(&frame(r#"{"type":"raise","data":{"amount":50}}"#)).unwrap(),
            Action::Raise(50)
        );
        assert_eq!(
            Action::parse(&frame(r#"{"type":"raise","data":{"amount":"50"}}"#)).unwrap(),
            Action::Raise(50)
        );
        assert_eq!(
            Action::parse(&frame(r#"{"type":"raise"}"#)).unwrap(),
            Action::Raise(0)
        );
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(matches!(
            Action::parse(&frame(r#"{"type":"cheat"}"#)),
            Err(GameError::UnsupportedAction(_))
        ));
    }

    #[test]
    fn outgoing_wire_shape() {
        let json = Outgoing::pong(7).to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "pong");
        assert_eq!(value["seq"], 7);
    }
}
