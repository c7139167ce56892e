use super::handlers::Matches;
use super::respond;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use dx_auth::Auth;
use dx_core::TableId;
use dx_core::UserId;
use dx_gameroom::Action;
use dx_gameroom::ClientFrame;
use dx_gameroom::GameService;
use dx_gameroom::Outgoing;
use dx_gameroom::RuntimeHandle;
use futures::StreamExt;
use std::sync::Arc;

/// `GET /ws/table/{tableId}?token=...` — authenticate, check the seat,
/// subscribe, and bridge frames both ways. The gateway is not
/// authoritative: every action goes through the table actor.
pub async fn enter(
    game: web::Data<Arc<GameService>>,
    matches: Matches,
    auth: Auth,
    path: web::Path<TableId>,
    body: web::Payload,
    req: HttpRequest,
) -> impl Responder {
    let table_id = path.into_inner();
    let user = auth.user();
    if let Err(e) = matches.validate_table_access(user, table_id).await {
        return respond::match_error(&e);
    }
    let handle = match game.runtime(table_id).await {
        Ok(handle) => handle,
        Err(e) => {
            return respond::fail(actix_web::http::StatusCode::NOT_FOUND, &e.to_string());
        }
    };
    let receiver = match handle.subscribe(user).await {
        Ok(receiver) => receiver,
        Err(e) => {
            return respond::fail(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                &e.to_string(),
            );
        }
    };
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            log::info!("user {} entered table {}", user, table_id);
            actix_web::rt::spawn(bridge(handle, user, session, stream, receiver));
            response
        }
        Err(e) => {
            handle.unsubscribe(user).await;
            respond::fail(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                &e.to_string(),
            )
        }
    }
}

/// Pumps runtime frames out and client frames in until either side drops.
async fn bridge(
    handle: RuntimeHandle,
    user: UserId,
    mut session: actix_ws::Session,
    mut stream: actix_ws::MessageStream,
    mut receiver: tokio::sync::mpsc::Receiver<Outgoing>,
) {
    loop {
        tokio::select! {
            biased;
            frame = receiver.recv() => match frame {
                Some(frame) => {
                    if session.text(frame.to_json()).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            message = stream.next() => match message {
                Some(Ok(actix_ws::Message::Text(text))) => {
                    serve(&handle, user, &mut session, &text).await;
                }
                Some(Ok(actix_ws::Message::Close(_))) | Some(Err(_)) | None => break,
                _ => continue,
            },
        }
    }
    handle.unsubscribe(user).await;
    log::debug!("user {} left the table bridge", user);
}

/// Parses and submits one client frame; failures come back as an `error`
/// frame to this viewer only.
async fn serve(handle: &RuntimeHandle, user: UserId, session: &mut actix_ws::Session, text: &str) {
    let action = serde_json::from_str::<ClientFrame>(text)
        .map_err(|e| e.to_string())
        .and_then(|frame| Action::parse(&frame).map_err(|e| e.to_string()));
    let outcome = match action {
        Ok(action) => handle.action(user, action).await.map_err(|e| e.to_string()),
        Err(e) => Err(e),
    };
    if let Err(message) = outcome {
        let _ = session.text(Outgoing::error(&message).to_json()).await;
    }
}
