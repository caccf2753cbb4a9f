//! End-to-end pipeline runs against a local stub of all four services.
//!
//! Run with: `cargo test -p voxrelay-agent --test pipeline`

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use voxrelay_agent::{NO_AUDIO_MESSAGE, Pipeline, RunRequest};
use voxrelay_core::credentials::Credentials;
use voxrelay_core::error::{ErrorKind, Service};
use voxrelay_core::language::LanguageSelection;
use voxrelay_core::session::SessionContext;
use voxrelay_core::types::{AudioClip, PipelineMode};
use voxrelay_media::pcm_to_wav;
use voxrelay_providers::chat::ChatCompletionClient;
use voxrelay_providers::speech_to_text::AzureSpeechToText;
use voxrelay_providers::synthesis::AzureSynthesizer;
use voxrelay_providers::translator::AzureTranslator;
use voxrelay_providers::{HttpPolicy, ServiceClients};

const STT_PATH: &str = "/speech/recognition/conversation/cognitiveservices/v1";

#[derive(Clone)]
struct Stub {
    hits: Arc<AtomicUsize>,
    stt_status: StatusCode,
}

fn stub_router(stub: Stub) -> Router {
    let stt = stub.clone();
    let chat = stub.clone();
    let tts = stub.clone();
    let translate = stub;

    Router::new()
        .route(
            STT_PATH,
            post(move || {
                let stub = stt.clone();
                async move {
                    stub.hits.fetch_add(1, Ordering::SeqCst);
                    if stub.stt_status.is_success() {
                        (stub.stt_status, r#"{"RecognitionStatus":"Success","DisplayText":"hello"}"#)
                    } else {
                        (stub.stt_status, "recognizer unavailable")
                    }
                }
            }),
        )
        .route(
            "/v1/chat/completions",
            post(move |Json(req): Json<serde_json::Value>| {
                let stub = chat.clone();
                async move {
                    stub.hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({
                        "choices": [{ "message": { "content": req["messages"][1]["content"] } }]
                    }))
                }
            }),
        )
        .route(
            "/cognitiveservices/v1",
            post(move || {
                let stub = tts.clone();
                async move {
                    stub.hits.fetch_add(1, Ordering::SeqCst);
                    "AUDIO"
                }
            }),
        )
        .route(
            "/translate",
            post(move || {
                let stub = translate.clone();
                async move {
                    stub.hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!([{ "translations": [{ "text": "bonjour", "to": "fr" }] }]))
                }
            }),
        )
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn setup(stt_status: StatusCode) -> (Pipeline, Arc<AtomicUsize>, tempfile::TempDir) {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(stub_router(Stub {
        hits: hits.clone(),
        stt_status,
    }))
    .await;

    let policy = HttpPolicy {
        timeout: Duration::from_secs(5),
        max_attempts: 1,
        backoff: Duration::from_millis(10),
    };
    let clients = ServiceClients {
        transcriber: Arc::new(AzureSpeechToText::new(policy.clone()).with_base_url(&base)),
        translator: Arc::new(AzureTranslator::new(policy.clone()).with_endpoint(&base)),
        generator: Arc::new(ChatCompletionClient::openrouter(Some(&base), policy.clone())),
        synthesizer: Arc::new(AzureSynthesizer::new(policy).with_base_url(&base)),
    };

    let spool = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(clients, spool.path().to_path_buf());
    (pipeline, hits, spool)
}

fn session(mode: PipelineMode) -> SessionContext {
    let mut creds = Credentials::default();
    creds.set_speech_key("speech-key".into());
    creds.set_speech_region("eastasia".into());
    creds.set_translator_key("translator-key".into());
    creds.set_translator_region("global".into());
    creds.set_llm_key("llm-key".into());
    SessionContext::new(creds, LanguageSelection::default(), mode)
}

fn recording() -> Option<AudioClip> {
    Some(AudioClip::new(pcm_to_wav(&[250i16; 3200], 16000).unwrap()))
}

#[tokio::test]
async fn test_assistant_run_against_stub_services() {
    let (pipeline, hits, _spool) = setup(StatusCode::OK).await;
    let mut ctx = session(PipelineMode::Assistant);

    let outcome = pipeline.run(&mut ctx, recording(), RunRequest::default()).await;

    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    assert_eq!(outcome.transcript.as_ref().unwrap().text, "hello");
    assert_eq!(outcome.reply.as_ref().unwrap().text, "hello");
    assert_eq!(outcome.audio.as_ref().unwrap().data, b"AUDIO");
    assert_eq!(hits.load(Ordering::SeqCst), 3);

    let history = serde_json::to_value(&ctx.history).unwrap();
    assert_eq!(history[0]["user"], "hello");
    assert_eq!(history[0]["llm"], "hello");

    let clip_path = outcome.clip_path.unwrap();
    assert!(!clip_path.exists(), "{} still exists", clip_path.display());
}

#[tokio::test]
async fn test_translate_run_against_stub_services() {
    let (pipeline, hits, _spool) = setup(StatusCode::OK).await;
    let mut ctx = session(PipelineMode::Translate);

    let outcome = pipeline.run(&mut ctx, recording(), RunRequest::default()).await;

    assert_eq!(outcome.reply.unwrap().text, "bonjour");
    assert!(outcome.audio.is_none());
    // STT + translate; speaking translations is off by default
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(ctx.history.render_all()[0].reply_text, "bonjour");
}

#[tokio::test]
async fn test_failed_transcription_removes_clip_and_stops() {
    let (pipeline, hits, spool) = setup(StatusCode::SERVICE_UNAVAILABLE).await;
    let mut ctx = session(PipelineMode::Assistant);

    let outcome = pipeline.run(&mut ctx, recording(), RunRequest::default()).await;

    let failure = outcome.failure_for(Service::SpeechToText).unwrap();
    assert_eq!(failure.kind(), ErrorKind::UpstreamStatus);
    assert!(failure.error.message.contains("recognizer unavailable"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(ctx.history.is_empty());
    assert!(!outcome.clip_path.unwrap().exists());
    assert_eq!(std::fs::read_dir(spool.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_no_audio_never_reaches_the_network() {
    let (pipeline, hits, _spool) = setup(StatusCode::OK).await;
    let mut ctx = session(PipelineMode::Assistant);

    let outcome = pipeline.run(&mut ctx, None, RunRequest::default()).await;

    assert_eq!(outcome.messages, [NO_AUDIO_MESSAGE]);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_history_accumulates_across_runs() {
    let (pipeline, _hits, _spool) = setup(StatusCode::OK).await;
    let mut ctx = session(PipelineMode::Chat);

    for _ in 0..3 {
        pipeline.run(&mut ctx, recording(), RunRequest::default()).await;
    }

    let outcome = pipeline.run(&mut ctx, recording(), RunRequest::default()).await;
    assert_eq!(outcome.history.len(), 4);
    assert_eq!(ctx.history.len(), 4);
}
