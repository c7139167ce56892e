//! HTTP + WebSocket front for the daxuan platform.
//!
//! Player-side surface only: scene and wallet reads, the match queue
//! endpoints, and the per-table session gateway. Authentication token
//! issuance and the admin console live in external services.

pub mod gateway;
pub mod handlers;
pub mod respond;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use dx_ephemeral::RedisStore;
use dx_gameroom::GameService;
use dx_match::MatchConfig;
use dx_match::MatchService;
use dx_settle::Settlement;
use std::sync::Arc;

#[rustfmt::skip]
pub async fn run() -> anyhow::Result<()> {
    let db = dx_database::db().await;
    dx_database::migrate(&db).await?;

    let store = RedisStore::from_env().map_err(|e| anyhow::anyhow!("{}", e))?;
    let settlement = Arc::new(Settlement::new(dx_database::connect().await));
    let matches = Arc::new(MatchService::new(
        db.clone(),
        dx_database::connect().await,
        store,
        MatchConfig::from_env(),
    ));
    let game = GameService::new(db.clone(), settlement);
    let crypto = web::Data::new(dx_auth::Crypto::from_env());

    let (shutdown, _) = tokio::sync::broadcast::channel(1);
    matches
        .spawn_composers(&shutdown)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let matches = web::Data::new(matches);
    let game = web::Data::new(game);
    let client = web::Data::new(db);
    log::info!("starting server");
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(matches.clone())
            .app_data(game.clone())
            .app_data(crypto.clone())
            .app_data(client.clone())
            .route("/health", web::get().to(handlers::health))
            .route("/scenes", web::get().to(handlers::scenes))
            .route("/wallet", web::get().to(handlers::wallet))
            .service(
                web::scope("/match")
                    .route("/join", web::post().to(handlers::join))
                    .route("/cancel", web::post().to(handlers::cancel))
                    .route("/status", web::get().to(handlers::status)),
            )
            .route("/ws/table/{table_id}", web::get().to(gateway::enter))
    })
    .workers(6)
    .bind(std::env::var("BIND_ADDR").expect("BIND_ADDR must be set"))?
    .run()
    .await?;

    let _ = shutdown.send(());
    Ok(())
}
