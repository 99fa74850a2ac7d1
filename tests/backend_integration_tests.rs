use parlor::backend::{BackendError, ChatBackend, FeedEvent, HttpBackend, SendRequest};
use parlor::core::message::Origin;
use parlor::core::status::{ProcessStatus, ThreadState};
use tokio::sync::mpsc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

fn request(content: &str) -> SendRequest<'_> {
    SendRequest {
        content,
        user_id: Some("u-1"),
        channel_id: Some("c-1"),
    }
}

async fn collect_events(mut receiver: mpsc::Receiver<FeedEvent>) -> Vec<FeedEvent> {
    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        events.push(event);
    }
    events
}

// ============================================================================
// Send
// ============================================================================

#[tokio::test]
async fn test_send_posts_content_and_identity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_partial_json(serde_json::json!({
            "content": "hello",
            "userId": "u-1",
            "channelId": "c-1",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success":true}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let reply = backend.send(request("hello")).await.unwrap();

    assert!(reply.success);
    assert_eq!(reply.channel_id, None);
}

#[tokio::test]
async fn test_send_carries_a_client_message_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    backend.send(request("a")).await.unwrap();

    let received = mock_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let id = body["clientMessageId"].as_str().unwrap();
    assert_eq!(id.len(), 36);
}

#[tokio::test]
async fn test_send_empty_body_counts_as_accepted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let reply = backend.send(request("hi")).await.unwrap();
    assert!(reply.success);
}

#[tokio::test]
async fn test_send_reports_rejection_and_new_channel() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"success":false,"channelId":"new"}"#),
        )
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(format!("{}/", mock_server.uri()));
    let reply = backend.send(request("hi")).await.unwrap();

    assert!(!reply.success);
    assert_eq!(reply.channel_id.as_deref(), Some("new"));
}

#[tokio::test]
async fn test_send_server_error_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let result = backend.send(request("hi")).await;

    match result {
        Err(BackendError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_send_garbage_reply_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    assert!(matches!(
        backend.send(request("hi")).await,
        Err(BackendError::Parse(_))
    ));
}

#[tokio::test]
async fn test_send_unreachable_server_is_network_error() {
    let backend = HttpBackend::new("http://127.0.0.1:1");
    assert!(matches!(
        backend.send(request("hi")).await,
        Err(BackendError::Network(_))
    ));
}

// ============================================================================
// Typing
// ============================================================================

#[tokio::test]
async fn test_typing_signal_posts_flag() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/c-1/typing"))
        .and(body_partial_json(serde_json::json!({ "typing": true })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    backend.set_typing("c-1", true).await.unwrap();
}

// ============================================================================
// Event feed
// ============================================================================

#[tokio::test]
async fn test_feed_decodes_events_in_order() {
    let mock_server = MockServer::start().await;

    let sse_response = "\
event: snapshot
data: [{\"type\":\"human\",\"content\":\"hi\"}]

event: loading
data: {\"isLoading\":true}

event: message
data: {\"type\":\"ai\",\"content\":[\"a\",\"b\"],\"sequence\":1,\"total\":2}

event: thread_state
data: {\"state\":\"ACTIVE\"}

event: status
data: {\"processStatus\":\"ANALYSIS\",\"inputDisabled\":true}

";

    Mock::given(method("GET"))
        .and(path("/channels/c-1/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse_response),
        )
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let (tx, rx) = mpsc::channel(100);
    backend.stream_events("c-1", tx).await.unwrap();

    let events = collect_events(rx).await;
    assert_eq!(events.len(), 6);
    assert_eq!(events[0], FeedEvent::Opened);
    assert!(matches!(&events[1], FeedEvent::Snapshot(m) if m.len() == 1));
    assert_eq!(events[2], FeedEvent::Loading(true));
    match &events[3] {
        FeedEvent::Message(m) => {
            assert_eq!(m.origin, Origin::Ai);
            assert_eq!(m.progress_label().as_deref(), Some("1/2"));
        }
        other => panic!("Expected message, got {:?}", other),
    }
    assert_eq!(events[4], FeedEvent::ThreadState(ThreadState::Active));
    assert_eq!(
        events[5],
        FeedEvent::Status {
            process_status: Some(ProcessStatus::Analysis),
            input_disabled: Some(true),
        }
    );
}

#[tokio::test]
async fn test_feed_skips_malformed_and_unknown_events() {
    let mock_server = MockServer::start().await;

    let sse_response = "\
event: loading
data: not-json

event: heartbeat
data: {}

event: loading
data: {\"isLoading\":false}

";

    Mock::given(method("GET"))
        .and(path("/channels/c-1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_response))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let (tx, rx) = mpsc::channel(100);
    backend.stream_events("c-1", tx).await.unwrap();

    assert_eq!(collect_events(rx).await, vec![FeedEvent::Opened, FeedEvent::Loading(false)]);
}

#[tokio::test]
async fn test_feed_snapshot_keeps_good_entries_around_bad_ones() {
    let mock_server = MockServer::start().await;

    let sse_response = "\
event: snapshot
data: [{\"type\":\"human\",\"content\":\"안녕하세요\"},{\"type\":\"system\"},{\"type\":\"ai\",\"content\":\"네\",\"timestamp\":1700000000000}]

";

    Mock::given(method("GET"))
        .and(path("/channels/c-1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse_response))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let (tx, rx) = mpsc::channel(100);
    backend.stream_events("c-1", tx).await.unwrap();

    let events = collect_events(rx).await;
    assert_eq!(events.len(), 2);
    let FeedEvent::Snapshot(messages) = &events[1] else {
        panic!("Expected snapshot, got {:?}", events[1]);
    };
    let bodies: Vec<String> = messages.iter().map(|m| m.body.joined()).collect();
    assert_eq!(bodies, vec!["안녕하세요", "", "네"]);
    assert_eq!(messages[1].origin, Origin::Ai);
    assert!(messages[2].timestamp.is_some());
}

#[tokio::test]
async fn test_feed_not_found_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels/missing/events"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such channel"))
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let (tx, _rx) = mpsc::channel(10);
    let result = backend.stream_events("missing", tx).await;

    assert!(matches!(result, Err(BackendError::Api { status: 404, .. })));
}

#[tokio::test]
async fn test_feed_dropped_receiver_is_channel_closed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels/c-1/events"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("event: loading\ndata: {\"isLoading\":true}\n\n"),
        )
        .mount(&mock_server)
        .await;

    let backend = HttpBackend::new(mock_server.uri());
    let (tx, rx) = mpsc::channel(10);
    drop(rx);
    let result = backend.stream_events("c-1", tx).await;

    assert!(matches!(result, Err(BackendError::ChannelClosed)));
}
