use super::respond;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use dx_auth::Auth;
use dx_database::Records;
use dx_ephemeral::RedisStore;
use dx_match::JoinRequest;
use dx_match::MatchService;
use serde::Deserialize;
use std::sync::Arc;
use tokio_postgres::Client;

pub type Matches = web::Data<Arc<MatchService<RedisStore>>>;

pub async fn health(db: web::Data<Arc<Client>>) -> impl Responder {
    match db
        .execute("SELECT 1", &[])
        .await
        .inspect_err(|e| log::error!("health check failed: {}", e))
    {
        Ok(_) => HttpResponse::Ok().body("ok"),
        Err(_) => HttpResponse::ServiceUnavailable().body("database unavailable"),
    }
}

pub async fn scenes(db: web::Data<Arc<Client>>) -> impl Responder {
    match db.enabled_scenes().await {
        Ok(scenes) => respond::ok(
            scenes
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "id": s.id,
                        "name": s.name,
                        "seatCount": s.seat_count,
                        "minIn": s.min_in,
                        "maxIn": s.max_in,
                        "basePi": s.base_pi,
                        "minUnitPi": s.min_unit_pi,
                        "mangoEnabled": s.mango_enabled,
                        "boboEnabled": s.bobo_enabled,
                        "distanceThresholdM": s.distance_threshold_m,
                    })
                })
                .collect::<Vec<_>>(),
        ),
        Err(e) => respond::fail(
            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
            &e.to_string(),
        ),
    }
}

pub async fn wallet(db: web::Data<Arc<Client>>, auth: Auth) -> impl Responder {
    match db.wallet(auth.user()).await {
        Ok(wallet) => {
            let wallet = wallet.unwrap_or_else(|| dx_database::Wallet::empty(auth.user()));
            respond::ok(serde_json::json!({
                "userId": wallet.user_id,
                "balanceAvailable": wallet.balance_available,
                "balanceFrozen": wallet.balance_frozen,
                "balanceTotal": wallet.balance_total,
                "totalWin": wallet.total_win,
                "totalConsume": wallet.total_consume,
                "totalRake": wallet.total_rake,
            }))
        }
        Err(e) => respond::fail(
            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
            &e.to_string(),
        ),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinBody {
    pub scene_id: i64,
    pub buy_in: i64,
    #[serde(default)]
    pub gps_lat: f64,
    #[serde(default)]
    pub gps_lng: f64,
}

pub async fn join(
    matches: Matches,
    auth: Auth,
    req: HttpRequest,
    body: web::Json<JoinBody>,
) -> impl Responder {
    let request = JoinRequest {
        user_id: auth.user(),
        scene_id: body.scene_id,
        buy_in: body.buy_in,
        gps_lat: body.gps_lat,
        gps_lng: body.gps_lng,
        ip: client_ip(&req),
    };
    match matches.join(request).await {
        Ok(queue_id) => respond::ok(serde_json::json!({
            "queueId": queue_id,
            "status": "queued",
        })),
        Err(e) => respond::match_error(&e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBody {
    pub scene_id: i64,
}

pub async fn cancel(matches: Matches, auth: Auth, body: web::Json<CancelBody>) -> impl Responder {
    match matches.cancel(auth.user(), body.scene_id, "user").await {
        Ok(()) => respond::ok(serde_json::json!({"status": "cancelled"})),
        Err(e) => respond::match_error(&e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub scene_id: i64,
}

pub async fn status(matches: Matches, auth: Auth, query: web::Query<StatusQuery>) -> impl Responder {
    match matches.status(auth.user(), query.scene_id).await {
        Ok(status) => respond::ok(status),
        Err(e) => respond::match_error(&e),
    }
}

/// Best client address available: forwarded header first, then the peer.
pub fn client_ip(req: &HttpRequest) -> String {
    req.headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
        .unwrap_or_default()
}
