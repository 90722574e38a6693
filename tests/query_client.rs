use std::time::{Duration, Instant};

use farmin_ai::config::FALLBACK_REPLY;
use farmin_ai::{ChatSession, ModelClient, ModelConfig, QueryError, QueryOptions, Role};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "test-org/farm-model";
const MODEL_PATH: &str = "/models/test-org/farm-model";

fn client_for(server: &MockServer) -> ModelClient {
    let config = ModelConfig::default()
        .with_base_url(format!("{}/models", server.uri()))
        .with_api_token("test-token");
    ModelClient::new(config).expect("client should build")
}

fn fast_options(max_retries: u32) -> QueryOptions {
    QueryOptions::default()
        .with_timeout(Duration::from_millis(200))
        .with_retry_delay(Duration::from_millis(50))
        .with_max_retries(max_retries)
}

fn generation(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!([{ "generated_text": text }]))
}

async fn attempts(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .len()
}

#[tokio::test]
async fn reply_is_truncated_at_turn_marker() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "parameters": {
                "do_sample": true,
                "return_full_text": false,
                "stop": ["Farmer:", "FarminAi:"]
            }
        })))
        .respond_with(generation("X Farmer: junk"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = client.query("Which crops fix nitrogen?", MODEL, &fast_options(3)).await;

    assert_eq!(reply, Ok("X".to_string()));
}

#[tokio::test]
async fn blank_reply_uses_fallback_sentence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(generation("   "))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = client.query("?", MODEL, &fast_options(3)).await;

    assert_eq!(reply.as_deref(), Ok(FALLBACK_REPLY));
    assert_eq!(FALLBACK_REPLY, "Sorry, I couldn't understand your question.");
}

#[tokio::test]
async fn timeouts_are_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(generation("too late").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let options = fast_options(3);
    let started = Instant::now();
    let reply = client.query("How much water do goats need?", MODEL, &options).await;
    let elapsed = started.elapsed();

    assert_eq!(reply, Err(QueryError::Timeout { attempts: 3 }));
    assert_eq!(attempts(&server).await, 3);
    // Three deadlines plus two delays; no delay after the last attempt.
    assert!(elapsed >= options.timeout * 3 + options.retry_delay * 2);
    assert!(elapsed < Duration::from_secs(2));

    let text = client.query_text("again?", MODEL, &fast_options(1)).await;
    assert!(text.starts_with("⏱️ Timeout:"), "got {text}");
}

#[tokio::test]
async fn timeout_then_success_takes_two_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(generation("slow").set_delay(Duration::from_secs(2)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(generation("  Plant cover crops in autumn.\nFarmer: thanks"))
        .with_priority(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = client.query("How do I protect bare soil?", MODEL, &fast_options(3)).await;

    assert_eq!(reply, Ok("Plant cover crops in autumn.".to_string()));
    assert_eq!(attempts(&server).await, 2);
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = client.query("Is my soil too acidic?", MODEL, &fast_options(3)).await;

    match reply {
        Err(QueryError::Network(detail)) => {
            assert!(detail.contains("500"), "got {detail}");
            assert!(detail.contains("model crashed"), "got {detail}");
        }
        other => panic!("expected network error, got {other:?}"),
    }
    assert_eq!(attempts(&server).await, 1);
}

#[tokio::test]
async fn malformed_body_is_unexpected_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "loading" })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let text = client.query_text("hello", MODEL, &fast_options(3)).await;

    assert!(text.starts_with("❌ Unexpected error:"), "got {text}");
    assert_eq!(attempts(&server).await, 1);
}

#[tokio::test]
async fn unreachable_endpoint_is_network_error() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    // Dropping the server frees the port; nothing answers afterwards.
    drop(server);

    let reply = client.query("anyone there?", MODEL, &fast_options(3)).await;

    assert!(matches!(reply, Err(QueryError::Network(_))), "got {reply:?}");
}

#[tokio::test]
async fn session_records_both_turns() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(generation("Every 3-4 years. FarminAi: extra"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(503))
        .with_priority(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut session = ChatSession::new(MODEL, fast_options(3));

    let reply = session
        .ask(&client, "  How often should I rotate potatoes? ")
        .await
        .expect("first question succeeds");
    assert_eq!(reply.content, "Every 3-4 years.");

    let err = session.ask(&client, "And onions?").await.unwrap_err();
    assert!(matches!(err, QueryError::Network(_)));

    let messages = session.conversation.messages();
    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, [Role::User, Role::Assistant, Role::User, Role::Assistant]);
    assert_eq!(messages[0].content, "How often should I rotate potatoes?");
    assert!(messages[3].content.starts_with("❌ Network error:"));

    session.reset();
    assert!(session.conversation.is_empty());
}
