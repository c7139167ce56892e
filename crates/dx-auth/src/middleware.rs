use super::*;
use actix_web::FromRequest;
use actix_web::HttpRequest;
use actix_web::dev::Payload;
use actix_web::web;
use dx_core::UserId;
use std::future::Future;
use std::pin::Pin;

/// Extractor for authenticated requests.
///
/// Accepts `Authorization: Bearer <token>` or a `?token=` query parameter
/// (the websocket gateway cannot set headers from browsers).
pub struct Auth(pub Claims);

impl Auth {
    pub fn claims(&self) -> &Claims {
        &self.0
    }
    pub fn user(&self) -> UserId {
        self.0.user()
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    if let Some(header) = req.headers().get("Authorization") {
        if let Some(token) = header.to_str().ok().and_then(|h| h.strip_prefix("Bearer ")) {
            return Some(token.to_owned());
        }
    }
    web::Query::<std::collections::HashMap<String, String>>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.get("token").cloned())
}

impl FromRequest for Auth {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;
    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let crypto = req.app_data::<web::Data<Crypto>>().cloned();
        let token = bearer_token(req);
        Box::pin(async move {
            let token = token
                .ok_or_else(|| actix_web::error::ErrorUnauthorized("missing token"))?;
            let crypto = crypto.ok_or_else(|| {
                actix_web::error::ErrorInternalServerError("token service not configured")
            })?;
            let claims = crypto
                .decode(&token)
                .map_err(|_| actix_web::error::ErrorUnauthorized("invalid token"))?;
            if claims.expired() {
                return Err(actix_web::error::ErrorUnauthorized("token expired"));
            }
            Ok(Auth(claims))
        })
    }
}
