use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;

/// Uniform response envelope: `{code, data, msg}` with `code` mirroring
/// the HTTP status.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub code: u16,
    pub data: Option<T>,
    pub msg: String,
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Envelope {
        code: 200,
        data: Some(data),
        msg: "ok".into(),
    })
}

pub fn fail(status: StatusCode, msg: &str) -> HttpResponse {
    HttpResponse::build(status).json(Envelope::<()> {
        code: status.as_u16(),
        data: None,
        msg: msg.into(),
    })
}

/// Maps matchmaker errors onto the player HTTP surface.
pub fn match_error(e: &dx_match::MatchError) -> HttpResponse {
    use dx_match::MatchError;
    let status = match e {
        MatchError::SceneNotFound(_) | MatchError::TableNotFound(_) => StatusCode::NOT_FOUND,
        MatchError::InvalidBuyIn | MatchError::InsufficientBalance => StatusCode::BAD_REQUEST,
        MatchError::AlreadyInQueue => StatusCode::CONFLICT,
        MatchError::QueueProcessing => StatusCode::TOO_MANY_REQUESTS,
        MatchError::TableAccessDenied => StatusCode::FORBIDDEN,
        MatchError::Unauthorized => StatusCode::UNAUTHORIZED,
        MatchError::Store(_) | MatchError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    fail(status, &e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dx_match::MatchError;

    #[test]
    fn error_mapping_matches_surface() {
        assert_eq!(match_error(&MatchError::SceneNotFound(1)).status(), 404);
        assert_eq!(match_error(&MatchError::InvalidBuyIn).status(), 400);
        assert_eq!(match_error(&MatchError::InsufficientBalance).status(), 400);
        assert_eq!(match_error(&MatchError::AlreadyInQueue).status(), 409);
        assert_eq!(match_error(&MatchError::QueueProcessing).status(), 429);
        assert_eq!(match_error(&MatchError::TableAccessDenied).status(), 403);
    }
}
