// --- CONSTANTS ---
#[allow(dead_code)]
pub const CHANNEL_SECRET: &str = "8c570fa6dd201bb328f1c1eac23a96d8";
#[allow(dead_code)]
pub const ACCESS_TOKEN: &str = "aBcDeFgHiJkLmNoPqRsTuVwXyZ==";
#[allow(dead_code)]
pub const REPLY_TOKEN: &str = "nHuyWiB7yP5Zw52FIkcQobQuGDXCTA";
#[allow(dead_code)]
pub const USER_ID: &str = "U4af4980629d8e6c2f4e3b0e8b4a1c2d3";

use std::time::Duration;

use axum::{body::Body, http::Request};
use line_webhook_rs::{
    router::ReplyBot,
    signature::{sign, SIGNATURE_HEADER},
    Client, WebhookService,
};
use serde_json::{json, Value};
use wiremock::MockServer;

// --- HELPERS ---

/// A client pointed at the mock server.
#[allow(dead_code)]
pub fn client(mock_server: &MockServer) -> Client {
    Client::builder()
        .base_url(mock_server.uri())
        .timeout(Duration::from_secs(2))
        .auth(ACCESS_TOKEN)
        .build()
        .unwrap()
}

/// The reply bot behind a webhook service, talking to the mock server.
#[allow(dead_code)]
pub fn service(mock_server: &MockServer) -> WebhookService<ReplyBot<Client>> {
    WebhookService::builder()
        .channel_secret(CHANNEL_SECRET)
        .build(ReplyBot::new(client(mock_server)))
        .unwrap()
}

/// A POST to `uri` signed with the test channel secret.
#[allow(dead_code)]
pub fn signed_post(uri: &str, body: &Value) -> Request<Body> {
    let body = serde_json::to_vec(body).unwrap();
    Request::post(uri)
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, sign(&body, CHANNEL_SECRET))
        .body(Body::from(body))
        .unwrap()
}

/// A webhook envelope around `events`.
#[allow(dead_code)]
pub fn envelope(events: Value) -> Value {
    json!({ "destination": "Ubot0000", "events": events })
}

#[allow(dead_code)]
pub fn text_event(reply_token: &str, text: &str) -> Value {
    json!({
        "type": "message",
        "mode": "active",
        "timestamp": 1462629479859i64,
        "webhookEventId": format!("01FZ74A0TD{reply_token}"),
        "deliveryContext": {"isRedelivery": false},
        "replyToken": reply_token,
        "source": {"type": "user", "userId": USER_ID},
        "message": {"type": "text", "id": "444573844083572737", "text": text}
    })
}
