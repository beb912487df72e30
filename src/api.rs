use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Wire types ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    response_format: ResponseFormat,
    messages: &'a [Message],
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: usize,
    pub message: Message,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// ── Errors ──

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API key not set (expected in ${0})")]
    MissingKey(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },
}

// ── Client ──

/// One-call-at-a-time chat client. `fetch` spawns a worker thread with a
/// blocking HTTP client; the event loop drains the result via `poll`.
/// No retry, no timeout, no cancellation.
pub struct ApiClient {
    endpoint: String,
    model: String,
    key_env: String,
    pub in_flight: bool,
    pub last_response: Option<ChatResponse>,
    rx: Option<Receiver<Result<ChatResponse, ApiError>>>,
}

impl ApiClient {
    pub fn new(endpoint: String, model: String, key_env: String) -> Self {
        Self {
            endpoint,
            model,
            key_env,
            in_flight: false,
            last_response: None,
            rx: None,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the conversation. `json_mode` asks the model for a JSON object
    /// reply (the review); otherwise plain text (elaborations). Ignored
    /// while a call is already in flight.
    pub fn fetch(&mut self, messages: Vec<Message>, json_mode: bool) {
        if self.in_flight {
            return;
        }
        // Read the key up front so a missing one fails on the next poll
        // instead of inside the worker's request builder.
        let key = std::env::var(&self.key_env)
            .map_err(|_| ApiError::MissingKey(self.key_env.clone()));

        let endpoint = self.endpoint.clone();
        let model = self.model.clone();
        let (tx, rx) = mpsc::channel();
        self.in_flight = true;
        self.rx = Some(rx);

        thread::spawn(move || {
            let result = key.and_then(|key| send_request(&endpoint, &model, &key, &messages, json_mode));
            let _ = tx.send(result);
        });
    }

    /// Non-blocking check for a finished call. On completion the in-flight
    /// flag clears and a successful response is also stored as
    /// `last_response`.
    pub fn poll(&mut self) -> Option<Result<ChatResponse, ApiError>> {
        let result = self.rx.as_ref()?.try_recv().ok()?;
        self.in_flight = false;
        self.rx = None;
        if let Ok(resp) = &result {
            self.last_response = Some(resp.clone());
        }
        Some(result)
    }

    /// Drop the stored response (restart).
    pub fn clear(&mut self) {
        self.last_response = None;
    }
}

fn send_request(
    endpoint: &str,
    model: &str,
    key: &str,
    messages: &[Message],
    json_mode: bool,
) -> Result<ChatResponse, ApiError> {
    let request = ChatRequest {
        model,
        response_format: ResponseFormat {
            format_type: if json_mode { "json_object" } else { "text" },
        },
        messages,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(None::<Duration>)
        .build()?;
    let resp = client
        .post(endpoint)
        .bearer_auth(key)
        .json(&request)
        .send()?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            body: resp.text().unwrap_or_default(),
        });
    }
    Ok(resp.json()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_to_wire_shape() {
        let messages = vec![Message::system("sys"), Message::user("hi")];
        let request = ChatRequest {
            model: "gpt-4-1106-preview",
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            messages: &messages,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4-1106-preview");
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn roles_round_trip_lowercase() {
        let msg = Message {
            role: Role::Assistant,
            content: "x".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""role":"assistant""#));
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.role, Role::Assistant);
    }

    #[test]
    fn response_deserializes_with_usage() {
        let json = r#"{
            "id": "chatcmpl-1",
            "model": "gpt-4-1106-preview",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "{}"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30}
        }"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.choices.len(), 1);
        assert_eq!(resp.choices[0].message.content, "{}");
        assert_eq!(resp.usage.map(|u| u.total_tokens), Some(30));
    }

    #[test]
    fn response_tolerates_missing_optional_fields() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": "ok"}}]}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.choices[0].message.content, "ok");
        assert!(resp.usage.is_none());
    }

    #[test]
    fn missing_key_surfaces_on_poll() {
        let mut client = ApiClient::new(
            "http://localhost:1".to_string(),
            "m".to_string(),
            "REVU_TEST_NO_SUCH_KEY".to_string(),
        );
        client.fetch(vec![Message::user("hi")], true);
        assert!(client.in_flight);

        let mut result = None;
        for _ in 0..50 {
            if let Some(r) = client.poll() {
                result = Some(r);
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        match result {
            Some(Err(ApiError::MissingKey(var))) => assert_eq!(var, "REVU_TEST_NO_SUCH_KEY"),
            other => panic!("expected MissingKey, got {:?}", other.map(|r| r.is_ok())),
        }
        assert!(!client.in_flight);
        assert!(client.last_response.is_none());
    }

    #[test]
    fn fetch_ignored_while_in_flight() {
        let mut client = ApiClient::new(
            "http://localhost:1".to_string(),
            "m".to_string(),
            "REVU_TEST_NO_SUCH_KEY".to_string(),
        );
        client.in_flight = true;
        client.fetch(vec![Message::user("hi")], true);
        assert!(client.rx.is_none());
    }
}
