//! HTTP handlers.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use voxrelay_agent::{RunOutcome, RunRequest};
use voxrelay_core::error::ClientError;
use voxrelay_core::language::{LanguageSelection, ReplyLanguage, SpeechLocale};
use voxrelay_core::types::{AudioClip, HistoryEntry, PipelineMode};

use crate::state::GatewayState;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Language(#[from] ClientError),

    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let code = match &self {
            Self::Language(_) => "unsupported_language",
            Self::BadRequest(_) => "bad_request",
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message: self.to_string(),
            },
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

pub async fn health(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "runs": state.runs_started(),
    }))
}

/// Query parameters of `POST /api/process`. Absent values fall back to the session's.
#[derive(Debug, Default, Deserialize)]
pub struct ProcessParams {
    pub speech_lang: Option<String>,
    pub reply_lang: Option<String>,
    pub mode: Option<String>,
    /// Force spoken output on or off.
    pub speak: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub run_id: u64,
    #[serde(flatten)]
    pub outcome: RunOutcome,
    /// Base64 of the synthesized reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_mime_type: Option<String>,
}

fn parse_mode(raw: Option<&str>) -> Result<Option<PipelineMode>, ApiError> {
    raw.map(|m| m.parse::<PipelineMode>().map_err(ApiError::BadRequest))
        .transpose()
}

/// Run the pipeline on the uploaded WAV body.
pub async fn process(
    State(state): State<Arc<GatewayState>>,
    params: Result<Query<ProcessParams>, QueryRejection>,
    body: Bytes,
) -> Result<Json<ProcessResponse>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let speech = params
        .speech_lang
        .as_deref()
        .map(str::parse::<SpeechLocale>)
        .transpose()?;
    let reply = params
        .reply_lang
        .as_deref()
        .map(str::parse::<ReplyLanguage>)
        .transpose()?;
    let mode = parse_mode(params.mode.as_deref())?;

    let clip = (!body.is_empty()).then(|| AudioClip::new(body.to_vec()));
    let run_id = state.next_run_id();
    debug!(run_id, bytes = body.len(), ?mode, "Process request received");

    let mut session = state.session.lock().await;
    let request = RunRequest {
        languages: Some(LanguageSelection {
            speech: speech.unwrap_or(session.languages.speech),
            reply: reply.unwrap_or(session.languages.reply),
        }),
        mode,
        synthesize: params.speak,
    };
    let outcome = state.pipeline.run(&mut session, clip, request).await;
    drop(session);

    let (audio, audio_mime_type) = match &outcome.audio {
        Some(a) => (
            Some(base64::engine::general_purpose::STANDARD.encode(&a.data)),
            Some(a.mime_type.clone()),
        ),
        None => (None, None),
    };

    info!(run_id, complete = outcome.is_complete(), "Process request finished");
    Ok(Json(ProcessResponse {
        run_id,
        outcome,
        audio,
        audio_mime_type,
    }))
}

pub async fn history(State(state): State<Arc<GatewayState>>) -> Json<Vec<HistoryEntry>> {
    let session = state.session.lock().await;
    Json(session.history.render_all().to_vec())
}

pub async fn languages() -> impl IntoResponse {
    let speech: Vec<_> = SpeechLocale::ALL
        .into_iter()
        .map(|l| json!({ "tag": l.as_str(), "voice": l.voice() }))
        .collect();
    let reply: Vec<_> = ReplyLanguage::ALL
        .into_iter()
        .map(|l| json!({ "code": l.code(), "name": l.name() }))
        .collect();
    let modes: Vec<_> = [
        PipelineMode::Assistant,
        PipelineMode::Chat,
        PipelineMode::Translate,
    ]
    .into_iter()
    .map(PipelineMode::as_str)
    .collect();

    Json(json!({ "speech": speech, "reply": reply, "modes": modes }))
}
