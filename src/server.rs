// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;
use tokio::net::TcpListener;

use crate::error::Fallible;
use crate::scheduler::Scheduler;
use crate::shim::envelope::Invocation;
use crate::shim::envelope::Reply;
use crate::shim::failure::BatchError;
use crate::shim::handle;
use crate::shim::handle_event;
use crate::shim::respond;
use crate::types::timestamp::Timestamp;

#[derive(Clone)]
pub struct ServerState {
    pub scheduler: Arc<dyn Scheduler>,
}

pub fn router(state: ServerState) -> Router {
    let app = Router::new();
    let app = app.route("/review", post(review_handler));
    let app = app.route("/invoke", post(invoke_handler));
    let app = app.fallback(not_found_handler);
    app.with_state(state)
}

pub async fn start_server(bind: &str, state: ServerState) -> Fallible<()> {
    let app = router(state);
    log::info!("Starting server on {bind}");
    let listener = TcpListener::bind(bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

/// Takes the batch as the request body and answers with the reply's status,
/// headers, and body.
async fn review_handler(State(state): State<ServerState>, body: Bytes) -> Response {
    let reply = match decode_text(body) {
        Ok(body) => {
            let invocation = Invocation { body: Some(body) };
            handle(&invocation, state.scheduler.as_ref(), Timestamp::now())
        }
        Err(err) => respond::failure(&err),
    };
    into_response(reply)
}

/// Takes a full invocation envelope and answers with the reply envelope.
async fn invoke_handler(State(state): State<ServerState>, event: Bytes) -> Json<Reply> {
    let reply = match decode_text(event) {
        Ok(event) => handle_event(&event, state.scheduler.as_ref(), Timestamp::now()),
        Err(err) => respond::failure(&err),
    };
    Json(reply)
}

fn decode_text(bytes: Bytes) -> Result<String, BatchError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        log::info!("Rejected request body: {e}");
        BatchError::MalformedBody {
            detail: e.to_string(),
        }
    })
}

async fn not_found_handler() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

fn into_response(reply: Reply) -> Response {
    let status =
        StatusCode::from_u16(reply.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut headers = HeaderMap::new();
    for (name, value) in reply.headers.into_iter().flatten() {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => log::error!("Dropping invalid header {name:?}"),
        }
    }
    (status, headers, reply.body).into_response()
}
