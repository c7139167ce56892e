use super::*;
use aes_gcm::aead::Aead;
use aes_gcm::aead::OsRng;
use aes_gcm::AeadCore;
use aes_gcm::Aes256Gcm;
use aes_gcm::Key;
use aes_gcm::KeyInit;
use aes_gcm::Nonce;
use base64::Engine;
use dx_core::Points;
use dx_core::UserId;
use dx_database::Records;
use serde::Serialize;
use sha2::Digest;

/// One entry of the append-only round ledger.
#[derive(Debug, Clone, Serialize)]
pub struct RoundLogEntry {
    pub seq: i64,
    pub ts: i64,
    pub action: String,
    pub seat: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Points>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl TableRuntime {
    /// Appends one action to `match_round_logs`. Fire-and-forget: a failed
    /// write warns and the hand continues.
    pub(crate) async fn persist_action(&mut self, mut entry: RoundLogEntry) {
        let Some(db) = self.db.clone() else {
            return;
        };
        if self.match_id == 0 {
            return;
        }
        entry.seq = self.next_seq();
        entry.ts = dx_core::now_ms();
        let match_id = self.match_id;
        let round = self.round;
        let actions = serde_json::to_value(vec![entry]).unwrap_or_default();
        tokio::spawn(async move {
            if let Err(e) = db.append_round_log(match_id, round, actions, None).await {
                log::warn!("round log write failed for match {}: {}", match_id, e);
            }
        });
    }

    /// Marks a round start in the ledger, attaching the per-viewer
    /// encrypted card map so a replay reveals only the viewer's own hand.
    pub(crate) async fn persist_round_start(&mut self) {
        let Some(db) = self.db.clone() else {
            return;
        };
        if self.match_id == 0 {
            return;
        }
        let entry = RoundLogEntry {
            seq: self.next_seq(),
            ts: dx_core::now_ms(),
            action: format!("round{}_start", self.round),
            seat: self.turn_seat,
            amount: None,
            meta: None,
        };
        let match_id = self.match_id;
        let round = self.round;
        let actions = serde_json::to_value(vec![entry]).unwrap_or_default();
        let cards = self.encrypted_cards();
        tokio::spawn(async move {
            if let Err(e) = db.append_round_log(match_id, round, actions, cards).await {
                log::warn!("round log write failed for match {}: {}", match_id, e);
            }
        });
    }

    /// `userId -> base64(nonce || ciphertext)` for every dealt seat.
    pub(crate) fn encrypted_cards(&self) -> Option<serde_json::Value> {
        let mut map = serde_json::Map::new();
        for seat in &self.seats {
            if seat.cards.is_empty() || seat.user == 0 {
                continue;
            }
            let Ok(plain) = serde_json::to_vec(&seat.cards) else {
                continue;
            };
            match encrypt_for_user(seat.user, &plain) {
                Ok(blob) => {
                    map.insert(seat.user.to_string(), serde_json::Value::String(blob));
                }
                Err(e) => log::warn!("card encryption failed for user {}: {}", seat.user, e),
            }
        }
        match map.is_empty() {
            true => None,
            false => Some(serde_json::Value::Object(map)),
        }
    }
}

fn user_key(user: UserId) -> Key<Aes256Gcm> {
    let digest = sha2::Sha256::digest(user.to_string().as_bytes());
    Key::<Aes256Gcm>::clone_from_slice(&digest)
}

/// Encrypts a blob under a key derived from the user id. This yields
/// per-viewer reveal-on-replay, not protection from a store-level
/// attacker.
pub fn encrypt_for_user(user: UserId, plain: &[u8]) -> Result<String, String> {
    let cipher = Aes256Gcm::new(&user_key(user));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plain)
        .map_err(|e| e.to_string())?;
    let mut blob = nonce.to_vec();
    blob.extend_from_slice(&ciphertext);
    Ok(base64::engine::general_purpose::STANDARD.encode(blob))
}

/// Inverse of [`encrypt_for_user`]; used by hand replays.
pub fn decrypt_for_user(user: UserId, blob: &str) -> Result<Vec<u8>, String> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(blob)
        .map_err(|e| e.to_string())?;
    if raw.len() < 12 {
        return Err("ciphertext too short".into());
    }
    let (nonce, ciphertext) = raw.split_at(12);
    let cipher = Aes256Gcm::new(&user_key(user));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_round_trip() {
        let plain = br#"["RQ","B8"]"#;
        let blob = encrypt_for_user(42, plain).unwrap();
        assert_eq!(decrypt_for_user(42, &blob).unwrap(), plain);
    }

    #[test]
    fn other_viewer_cannot_decrypt() {
        let blob = encrypt_for_user(42, b"secret hand").unwrap();
        assert!(decrypt_for_user(43, &blob).is_err());
    }

    #[test]
    fn nonces_differ_between_encryptions() {
        let a = encrypt_for_user(42, b"hand").unwrap();
        let b = encrypt_for_user(42, b"hand").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_truncated_blob() {
        assert!(decrypt_for_user(42, "AAAA").is_err());
    }
}
