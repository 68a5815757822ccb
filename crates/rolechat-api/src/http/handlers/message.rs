//! SSE chat endpoint.
//!
//! POST /api/messages/{role_id}
//!
//! The response body is the relay's output channel: the upstream bytes
//! exactly as received, or a single terminal `data: {"error": ...}` event
//! when the upstream could not be reached. Errors raised before the stream
//! starts (unknown role, unbound agent, empty text, user message not
//! stored) are plain JSON errors.

use std::convert::Infallible;

use axum::Json;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::{self, HeaderName};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

use rolechat_types::message::SendMessageRequest;

use super::parse_role_id;
use crate::http::error::AppError;
use crate::state::AppState;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// POST /api/messages/{role_id} - Stream one chat turn.
pub async fn send_message(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = body?;
    let role_id = parse_role_id(&role_id)?;
    let turn = state.chat_service.send_message(&role_id, &body.message).await?;

    // Detached: the relay logs its own summary.
    drop(turn.relay);

    let stream = ReceiverStream::new(turn.body).map(Ok::<_, Infallible>);
    let headers = [
        (header::CONTENT_TYPE, "text/event-stream; charset=utf-8"),
        (header::CACHE_CONTROL, "no-cache, no-transform"),
        (header::CONNECTION, "keep-alive"),
        (X_ACCEL_BUFFERING, "no"),
    ];
    Ok((headers, Body::from_stream(stream)).into_response())
}
