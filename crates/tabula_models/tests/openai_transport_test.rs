//! Tests for provider failure classification over a local HTTP stub.

use axum::{
    Router,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tabula_core::LlmConfig;
use tabula_error::GenerationErrorKind;
use tabula_models::{ChatCompletionRequest, ChatTransport, Message, OpenAiClient};

/// Canned reply of the stub provider.
#[derive(Clone)]
struct Reply {
    status: StatusCode,
    content_type: &'static str,
    body: &'static str,
    delay: Duration,
}

impl Reply {
    fn new(status: StatusCode, body: &'static str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body,
            delay: Duration::ZERO,
        }
    }
}

/// Serves `reply` at `/v1/chat/completions` and counts authorized hits.
async fn spawn_provider(reply: Reply) -> anyhow::Result<(String, Arc<AtomicUsize>)> {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/v1/chat/completions",
        post(move |headers: HeaderMap| {
            let reply = reply.clone();
            let counter = counter.clone();
            async move {
                if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok())
                    == Some("Bearer sk-test")
                {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                tokio::time::sleep(reply.delay).await;
                (
                    reply.status,
                    [(header::CONTENT_TYPE, reply.content_type)],
                    reply.body,
                )
                    .into_response()
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{}/v1", addr), hits))
}

fn client(base_url: String, timeout_secs: Option<u64>) -> anyhow::Result<OpenAiClient> {
    let config = LlmConfig {
        api_key: "sk-test".to_string(),
        base_url,
        timeout_secs,
        ..Default::default()
    };
    Ok(OpenAiClient::new(&config)?)
}

fn request() -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: "gpt-4o-mini".to_string(),
        messages: vec![Message::user("Who invented the telephone?")],
        temperature: Some(0.2),
        max_tokens: None,
        response_format: None,
    }
}

#[tokio::test]
async fn test_success_parses_envelope() -> anyhow::Result<()> {
    let (base, hits) = spawn_provider(Reply::new(
        StatusCode::OK,
        r#"{"id":"c1","model":"gpt-4o-mini-2024-07-18","choices":[{"message":{"role":"assistant","content":"{}"}}],"usage":{"prompt_tokens":3,"completion_tokens":1,"total_tokens":4}}"#,
    ))
    .await?;

    let response = client(base, None)?.send(&request()).await?;

    assert_eq!(response.model.as_deref(), Some("gpt-4o-mini-2024-07-18"));
    assert_eq!(response.choices.len(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_rate_limit_is_retryable_connection_error() -> anyhow::Result<()> {
    let (base, hits) = spawn_provider(Reply::new(
        StatusCode::TOO_MANY_REQUESTS,
        r#"{"error":{"message":"slow down"}}"#,
    ))
    .await?;

    let err = client(base, None)?.send(&request()).await.unwrap_err();

    assert!(matches!(err.kind, GenerationErrorKind::Connection(_)));
    assert!(err.kind.is_retryable());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_bad_request_is_rejected_with_body() -> anyhow::Result<()> {
    let (base, _hits) = spawn_provider(Reply::new(
        StatusCode::BAD_REQUEST,
        r#"{"error":{"message":"unknown field"}}"#,
    ))
    .await?;

    let err = client(base, None)?.send(&request()).await.unwrap_err();

    match &err.kind {
        GenerationErrorKind::Rejected(detail) => {
            assert!(detail.starts_with("400"));
            assert!(detail.contains("unknown field"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert!(!err.kind.is_retryable());
    Ok(())
}

#[tokio::test]
async fn test_server_error_is_rejected() -> anyhow::Result<()> {
    let (base, _hits) =
        spawn_provider(Reply::new(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")).await?;

    let err = client(base, None)?.send(&request()).await.unwrap_err();

    assert!(matches!(err.kind, GenerationErrorKind::Rejected(_)));
    assert!(!err.kind.is_retryable());
    Ok(())
}

#[tokio::test]
async fn test_unparseable_envelope_is_rejected() -> anyhow::Result<()> {
    let (base, _hits) = spawn_provider(Reply {
        content_type: "text/html",
        ..Reply::new(StatusCode::OK, "<html>gateway</html>")
    })
    .await?;

    let err = client(base, None)?.send(&request()).await.unwrap_err();

    match &err.kind {
        GenerationErrorKind::Rejected(detail) => {
            assert!(detail.starts_with("Failed to parse response"))
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert!(!err.kind.is_retryable());
    Ok(())
}

#[tokio::test]
async fn test_closed_port_is_retryable_connection_error() -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let err = client(format!("http://{}/v1", addr), None)?
        .send(&request())
        .await
        .unwrap_err();

    assert!(matches!(err.kind, GenerationErrorKind::Connection(_)));
    assert!(err.kind.is_retryable());
    Ok(())
}

#[tokio::test]
async fn test_timeout_is_retryable_connection_error() -> anyhow::Result<()> {
    let (base, _hits) = spawn_provider(Reply {
        delay: Duration::from_secs(5),
        ..Reply::new(StatusCode::OK, "{}")
    })
    .await?;

    let err = client(base, Some(1))?.send(&request()).await.unwrap_err();

    assert!(matches!(err.kind, GenerationErrorKind::Connection(_)));
    assert!(err.kind.is_retryable());
    Ok(())
}
