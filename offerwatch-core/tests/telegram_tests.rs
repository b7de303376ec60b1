use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use offerwatch_core::{MessageSink, NotifyError, TelegramClient, TelegramSink};

#[tokio::test]
async fn sink_posts_message_to_configured_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendMessage"))
        .and(body_json(json!({ "chat_id": "818", "text": "hello" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": {} })))
        .expect(1)
        .mount(&server)
        .await;

    let client = TelegramClient::new(Client::new(), server.uri(), "TOKEN");
    let sink = TelegramSink::new(client, "818");
    sink.send("hello").await.unwrap();
}

#[tokio::test]
async fn api_refusal_is_a_delivery_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendMessage"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "ok": false,
            "error_code": 429,
            "description": "Too Many Requests: retry after 5"
        })))
        .mount(&server)
        .await;

    let client = TelegramClient::new(Client::new(), format!("{}/", server.uri()), "TOKEN");
    let err = client.send_message("818", "hi", Some(7)).await.unwrap_err();
    match err {
        NotifyError::Rejected { status, description } => {
            assert_eq!(status.as_u16(), 429);
            assert!(description.contains("Too Many Requests"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn get_updates_decodes_text_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/botTOKEN/getUpdates"))
        .and(query_param("offset", "11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": [
                {
                    "update_id": 11,
                    "message": {
                        "message_id": 5,
                        "chat": { "id": 818, "type": "private" },
                        "text": "/postal 75011"
                    }
                },
                { "update_id": 12 }
            ]
        })))
        .mount(&server)
        .await;

    let client = TelegramClient::new(Client::new(), server.uri(), "TOKEN");
    let updates = client.get_updates(Some(11), 0).await.unwrap();

    assert_eq!(updates.len(), 2);
    let message = updates[0].message.as_ref().unwrap();
    assert_eq!(message.chat.id, 818);
    assert_eq!(message.text.as_deref(), Some("/postal 75011"));
    assert!(updates[1].message.is_none());
}
