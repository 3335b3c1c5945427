// tests/dispatcher_tests.rs

use hn_digest::chunker::Chunk;
use hn_digest::config::{ApiFlavor, AppConfig};
use hn_digest::dispatcher;
use hn_digest::openai::GenerationClient;
use secrecy::SecretString;
use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

fn test_config(api_base: &str) -> AppConfig {
    AppConfig {
        hnitem: "123456".to_string(),
        topic: "test".to_string(),
        api_key: SecretString::new("test-key".to_string()),
        model: "gpt-4o-mini".to_string(),
        api_base: Url::parse(api_base).expect("mock server URI"),
        hn_api_base: Url::parse(api_base).expect("mock server URI"),
        api_flavor: ApiFlavor::Responses,
        max_output_tokens: 512,
        chunk_token_limit: 1000,
        connect_timeout_secs: 5,
        request_timeout_secs: 10,
        skip_categorize: false,
    }
}

fn chunk_of(text: &str) -> Chunk {
    Chunk {
        text: text.to_string(),
        token_count: 10,
        char_count: text.chars().count(),
    }
}

/// Matches requests whose body does NOT contain the given substring.
/// Structured requests carry a "json_schema" format block; the free-text
/// fallback does not, which is the only way to tell the two apart.
struct BodyLacks(&'static str);

impl Match for BodyLacks {
    fn matches(&self, request: &Request) -> bool {
        !String::from_utf8_lossy(&request.body).contains(self.0)
    }
}

fn structured_body(rows: Value) -> Value {
    json!({
        "output": [{
            "type": "message",
            "content": [{
                "type": "output_text",
                "parsed": { "summaries": rows }
            }]
        }]
    })
}

async fn run_dispatch(server: &MockServer, chunks: &[Chunk]) -> String {
    let config = test_config(&server.uri());
    let client = GenerationClient::new(&config).expect("client");
    let mut out: Vec<u8> = Vec::new();
    dispatcher::run(
        &client,
        &config.model,
        "# HN Topic: [test](url), (hnitem id 1), and discussion",
        chunks,
        "summarize",
        config.max_output_tokens,
        &mut out,
    )
    .await
    .expect("dispatch run");
    String::from_utf8(out).expect("artifact is UTF-8")
}

#[tokio::test]
async fn artifact_header_block_precedes_table() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_string_contains("json_schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(structured_body(
            json!([{"participant": "alice", "argument": "likes it", "urls": ""}]),
        )))
        .mount(&server)
        .await;

    let artifact = run_dispatch(&server, &[chunk_of("only chunk\n")]).await;

    let lines: Vec<&str> = artifact.split('\n').collect();
    assert!(lines[0].starts_with("# HN Topic:"));
    assert_eq!(lines[1], "");
    assert!(lines[2].starts_with("## Date: "));
    assert!(lines[2].ends_with(". LLM: gpt-4o-mini"));
    assert!(artifact.contains("| Participant/User name |"));
    assert!(artifact.contains("| alice | likes it |  |"));
}

// Chunk 1 yields two structured rows; chunk 2's structured call fails and
// its fallback returns plain text, which lands after the table.
#[tokio::test]
async fn fallback_text_lands_after_table_rows() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_string_contains("json_schema"))
        .and(body_string_contains("chunk one"))
        .respond_with(ResponseTemplate::new(200).set_body_json(structured_body(json!([
            {"participant": "alice", "argument": "first point", "urls": ""},
            {"participant": "bob", "argument": "second point", "urls": ""}
        ]))))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_string_contains("json_schema"))
        .and(body_string_contains("chunk two"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(BodyLacks("json_schema"))
        .and(body_string_contains("chunk two"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output_text": "fallback text"})))
        .mount(&server)
        .await;

    let artifact = run_dispatch(&server, &[chunk_of("chunk one\n"), chunk_of("chunk two\n")]).await;

    // exactly one header/separator pair
    assert_eq!(artifact.matches("| Participant/User name |").count(), 1);
    assert_eq!(artifact.matches("| --- | --- | --- |").count(), 1);

    let header = artifact.find("| Participant/User name |").unwrap();
    let alice = artifact.find("| alice |").unwrap();
    let bob = artifact.find("| bob |").unwrap();
    let fallback = artifact.find("fallback text").unwrap();
    assert!(header < alice && alice < bob && bob < fallback);

    // the fallback line is raw text, not a table row
    let fallback_line = artifact
        .split('\n')
        .find(|l| l.contains("fallback text"))
        .unwrap();
    assert!(!fallback_line.starts_with('|'));
}

#[tokio::test]
async fn pipes_in_fields_are_escaped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_string_contains("json_schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(structured_body(
            json!([{"participant": "eve", "argument": "a|b", "urls": "x|y"}]),
        )))
        .mount(&server)
        .await;

    let artifact = run_dispatch(&server, &[chunk_of("chunk\n")]).await;
    assert!(artifact.contains("| eve | a\\|b | x\\|y |"));
    assert!(!artifact.contains("| a|b |"));
}

// A chunk that fails both structured and fallback generation contributes
// nothing, and every other chunk still lands, in order.
#[tokio::test]
async fn failed_chunk_is_isolated() {
    let server = MockServer::start().await;

    for (marker, participant) in [("chunk one", "alice"), ("chunk three", "carol")] {
        Mock::given(method("POST"))
            .and(path("/v1/responses"))
            .and(body_string_contains("json_schema"))
            .and(body_string_contains(marker))
            .respond_with(ResponseTemplate::new(200).set_body_json(structured_body(
                json!([{"participant": participant, "argument": "point", "urls": ""}]),
            )))
            .mount(&server)
            .await;
    }

    // chunk two fails on both paths
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_string_contains("chunk two"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let artifact = run_dispatch(
        &server,
        &[
            chunk_of("chunk one\n"),
            chunk_of("chunk two\n"),
            chunk_of("chunk three\n"),
        ],
    )
    .await;

    assert_eq!(artifact.matches("| Participant/User name |").count(), 1);
    let alice = artifact.find("| alice |").unwrap();
    let carol = artifact.find("| carol |").unwrap();
    assert!(alice < carol);
}

// Failures before the first structured success must not emit a premature
// header; it appears immediately before the first row that exists.
#[tokio::test]
async fn header_waits_for_first_structured_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_string_contains("chunk one"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_string_contains("json_schema"))
        .and(body_string_contains("chunk two"))
        .respond_with(ResponseTemplate::new(200).set_body_json(structured_body(
            json!([{"participant": "bob", "argument": "late point", "urls": ""}]),
        )))
        .mount(&server)
        .await;

    let artifact = run_dispatch(&server, &[chunk_of("chunk one\n"), chunk_of("chunk two\n")]).await;

    assert_eq!(artifact.matches("| Participant/User name |").count(), 1);
    let lines: Vec<&str> = artifact.split('\n').collect();
    let header_idx = lines
        .iter()
        .position(|l| l.starts_with("| Participant/User name |"))
        .unwrap();
    assert_eq!(lines[header_idx + 1], "| --- | --- | --- |");
    assert!(lines[header_idx + 2].starts_with("| bob |"));
}

// An HTTP 200 whose payload parses to zero rows is a structured failure
// and takes the fallback path.
#[tokio::test]
async fn empty_structured_payload_falls_back_to_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_string_contains("json_schema"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(structured_body(json!([]))),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(BodyLacks("json_schema"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"output_text": "plain summary"})),
        )
        .mount(&server)
        .await;

    let artifact = run_dispatch(&server, &[chunk_of("chunk\n")]).await;
    assert!(!artifact.contains("| Participant/User name |"));
    assert!(artifact.contains("plain summary"));
}
