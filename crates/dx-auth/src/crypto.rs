use super::*;

const ACCESS_TOKEN_DURATION: std::time::Duration = std::time::Duration::from_secs(24 * 3600);

/// JWT encoding/decoding keys shared across handlers.
pub struct Crypto {
    encoding: jsonwebtoken::EncodingKey,
    decoding: jsonwebtoken::DecodingKey,
}

impl Crypto {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: jsonwebtoken::EncodingKey::from_secret(secret),
            decoding: jsonwebtoken::DecodingKey::from_secret(secret),
        }
    }
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set")
                .as_bytes(),
        )
    }
    pub fn encode(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(&jsonwebtoken::Header::default(), claims, &self.encoding)
    }
    pub fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &jsonwebtoken::Validation::default())
            .map(|data| data.claims)
    }
    pub const fn duration() -> std::time::Duration {
        ACCESS_TOKEN_DURATION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn round_trip() {
        let crypto = Crypto::new(b"test-secret");
        let claims = Claims::new(42);
        let token = crypto.encode(&claims).unwrap();
        let decoded = crypto.decode(&token).unwrap();
        assert_eq!(decoded.sub, 42);
        assert!(!decoded.expired());
    }
    #[test]
    fn rejects_wrong_secret() {
        let token = Crypto::new(b"one").encode(&Claims::new(1)).unwrap();
        assert!(Crypto::new(b"two").decode(&token).is_err());
    }
}
