mod common;

use chrono::Duration;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;
use review_notifier::firing::FiringResult;
use review_notifier::notifier::{MattermostConfig, MattermostNotifier, NotificationSink};
use review_notifier::NotifierError;

fn stale_result() -> FiringResult {
    FiringResult::StaleMergeRequest {
        merge_request: merge_request(7, 42, alice(), t0() - Duration::days(5)),
    }
}

#[tokio::test]
async fn test_notify_posts_single_attachment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hooks/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut tenant = tenant(1, 5);
    tenant.webhook_url = format!("{}/hooks/abc", mock_server.uri());
    tenant.merge_request_old_mention = "@backend".to_string();

    let notifier = MattermostNotifier::new(MattermostConfig {
        username: Some("review-bot".to_string()),
        ..MattermostConfig::default()
    })
    .unwrap();
    notifier.notify(&stale_result(), &tenant).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["username"], "review-bot");
    assert!(body.get("channel").is_none());

    let attachments = body["attachments"].as_array().unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0]["color"], "#ff0000");
    let text = attachments[0]["text"].as_str().unwrap();
    assert!(text.contains("[!42 Merge request 42]"));
    assert!(text.contains("@alice"));
    assert!(text.ends_with("@backend"));
}

#[tokio::test]
async fn test_non_success_status_is_delivery_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hooks/abc"))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(2000)))
        .mount(&mock_server)
        .await;

    let mut tenant = tenant(1, 5);
    tenant.webhook_url = format!("{}/hooks/abc", mock_server.uri());

    let notifier = MattermostNotifier::new(MattermostConfig::default()).unwrap();
    let err = notifier.notify(&stale_result(), &tenant).await.unwrap_err();

    match err {
        NotifierError::Delivery(message) => {
            assert!(message.contains("500"));
            assert!(message.len() < 600);
        }
        other => panic!("unexpected error {:?}", other),
    }
}
