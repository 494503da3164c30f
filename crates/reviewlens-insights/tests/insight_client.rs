//! Integration tests for `InsightClient` using wiremock HTTP mocks.

use chrono::{TimeZone, Utc};
use reviewlens_core::{RetryPolicy, Review};
use reviewlens_insights::{InsightClient, InsightError, DEFAULT_SAMPLE_SIZE};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer, api_key: Option<&str>, timeout_secs: u64) -> InsightClient {
    InsightClient::new(
        &format!("{}/v1/chat/completions", server.uri()),
        api_key,
        "test-model",
        timeout_secs,
        "reviewlens-test/0.1",
    )
    .expect("client construction should not fail")
}

fn reviews(ratings: &[u8]) -> Vec<Review> {
    ratings
        .iter()
        .enumerate()
        .map(|(i, &rating)| Review {
            id: (i + 1).to_string(),
            rating,
            text: format!("review {}", i + 1),
            author: format!("user{}", i + 1),
            date: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        })
        .collect()
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }
        ]
    })
}

fn insights_json() -> String {
    json!({
        "commonPraises": ["Great playlists"],
        "commonComplaints": ["Ads"],
        "featureRequests": ["Offline lyrics"],
        "userExperience": "Mostly positive.",
        "sentimentAnalysis": {
            "positivePercentage": 67,
            "negativePercentage": 33,
            "keyEmotions": ["joy"]
        },
        "actionableRecommendations": ["Fewer ads"]
    })
    .to_string()
}

#[tokio::test]
async fn analyze_sends_prompt_and_parses_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "response_format": { "type": "json_object" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&insights_json())))
        .expect(1)
        .mount(&server)
        .await;

    let insights = test_client(&server, Some("sk-test"), 5)
        .analyze(
            "Spotify Music",
            &reviews(&[5, 5, 1]),
            DEFAULT_SAMPLE_SIZE,
            &RetryPolicy::immediate(1),
            &CancellationToken::new(),
        )
        .await
        .expect("analysis should succeed");

    assert_eq!(insights.common_praises, ["Great playlists"]);
    assert_eq!(insights.user_experience, "Mostly positive.");
    assert!((insights.sentiment_analysis.positive_percentage - 67.0).abs() < 1e-9);

    let requests = server.received_requests().await.expect("recording enabled");
    let body: serde_json::Value = requests[0].body_json().expect("request body is JSON");
    assert_eq!(body["messages"][0]["role"], "system");
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("\"Spotify Music\""));
    assert!(prompt.contains("Average rating: 3.67/5"));
}

#[tokio::test]
async fn fenced_reply_is_accepted() {
    let server = MockServer::start().await;

    let fenced = format!("```json\n{}\n```", insights_json());
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&fenced)))
        .mount(&server)
        .await;

    let insights = test_client(&server, Some("sk-test"), 5)
        .analyze(
            "App",
            &reviews(&[4]),
            DEFAULT_SAMPLE_SIZE,
            &RetryPolicy::immediate(1),
            &CancellationToken::new(),
        )
        .await
        .expect("fenced reply should parse");
    assert_eq!(insights.actionable_recommendations, ["Fewer ads"]);
}

#[tokio::test]
async fn provider_rejection_surfaces_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server, Some("sk-wrong"), 5)
        .complete("App", "prompt", &RetryPolicy::immediate(3), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        InsightError::ProviderError { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("expected ProviderError, got {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
        .expect(1)
        .mount(&server)
        .await;

    let content = test_client(&server, Some("sk-test"), 5)
        .complete("App", "prompt", &RetryPolicy::immediate(2), &CancellationToken::new())
        .await
        .expect("second attempt should succeed");
    assert_eq!(content, "{}");
}

#[tokio::test]
async fn empty_choices_is_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = test_client(&server, Some("sk-test"), 5)
        .complete("App", "prompt", &RetryPolicy::immediate(1), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, InsightError::EmptyResponse), "got {err:?}");
}

#[tokio::test]
async fn null_content_is_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        })))
        .mount(&server)
        .await;

    let err = test_client(&server, Some("sk-test"), 5)
        .complete("App", "prompt", &RetryPolicy::immediate(1), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, InsightError::EmptyResponse), "got {err:?}");
}

#[tokio::test]
async fn non_json_content_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("not json")))
        .mount(&server)
        .await;

    let err = test_client(&server, Some("sk-test"), 5)
        .analyze(
            "App",
            &reviews(&[3]),
            DEFAULT_SAMPLE_SIZE,
            &RetryPolicy::immediate(1),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        InsightError::MalformedInsights { raw, .. } => assert_eq!(raw, "not json"),
        other => panic!("expected MalformedInsights, got {other:?}"),
    }
}

#[tokio::test]
async fn non_envelope_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = test_client(&server, Some("sk-test"), 5)
        .complete("App", "prompt", &RetryPolicy::immediate(1), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, InsightError::Deserialize { .. }), "got {err:?}");
}

#[tokio::test]
async fn slow_provider_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("{}"))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = test_client(&server, Some("sk-test"), 1)
        .complete("App", "prompt", &RetryPolicy::immediate(1), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(
        matches!(err, InsightError::Timeout { timeout_secs: 1 }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn missing_credential_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
        .expect(0)
        .mount(&server)
        .await;

    for key in [None, Some(""), Some("your-api-key")] {
        let err = test_client(&server, key, 5)
            .analyze(
                "App",
                &reviews(&[5]),
                DEFAULT_SAMPLE_SIZE,
                &RetryPolicy::immediate(1),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InsightError::MissingCredential), "got {err:?}");
    }
}
