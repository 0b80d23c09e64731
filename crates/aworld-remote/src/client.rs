use crate::error::{RemoteError, Result};
use crate::fileref;
use crate::sse::{self, Accumulator};
use aworld_core::{AgentInfo, AgentSourceType, ChatResponse, Usage};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

#[derive(Debug, Deserialize)]
struct RemoteAgentListEntry {
    name: String,
    #[serde(default)]
    desc: String,
    #[serde(default)]
    metadata: aworld_core::Metadata,
}

/// Talks to one remote agent backend. `disable_live_display` governs
/// whether the caller is allowed to rewrite a single status line in place
/// (interactive mode) or must print plainly (batch mode) — enforced by the
/// caller, recorded here so it can be threaded through to callers that
/// branch on it.
pub struct RemoteClient {
    base_url: String,
    http: reqwest::Client,
    user_id: String,
    session_id: String,
    disable_live_display: bool,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>, user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            disable_live_display: false,
        }
    }

    pub fn with_live_display_disabled(mut self) -> Self {
        self.disable_live_display = true;
        self
    }

    pub fn disable_live_display(&self) -> bool {
        self.disable_live_display
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn list_agents(&self) -> Result<Vec<AgentInfo>> {
        let url = format!("{}/agents", self.base_url);
        let response = self.http.get(&url).send().await.map_err(|e| RemoteError::Request {
            url: url.clone(),
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Backend { status, body });
        }

        let entries: Vec<RemoteAgentListEntry> = response
            .json()
            .await
            .map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;

        Ok(entries
            .into_iter()
            .map(|entry| AgentInfo {
                name: entry.name,
                description: entry.desc,
                source_type: AgentSourceType::Remote,
                source_location: self.base_url.clone(),
                metadata: entry.metadata,
            })
            .collect())
    }

    /// Send `prompt` to `agent_name` and return the accumulated response
    /// plus whatever usage accounting the backend attached to it. `task_id`
    /// is propagated as a header when present (batch mode).
    pub async fn chat(&self, agent_name: &str, prompt: &str, task_id: Option<&str>) -> Result<ChatResponse> {
        let (text, images) = fileref::resolve_file_references(prompt);
        let content = fileref::build_content(&text, &images);

        let body = json!({
            "model": agent_name,
            "messages": [{ "role": "user", "content": content }],
            "stream": true,
        });

        let message_id = ulid::Ulid::new().to_string();
        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self
            .http
            .post(&url)
            .header("x-aworld-user-id", &self.user_id)
            .header("x-aworld-session-id", &self.session_id)
            .header("x-aworld-message-id", &message_id)
            .json(&body);

        if let Some(task_id) = task_id {
            request = request.header("x-aworld-task-id", task_id);
        }

        let response = request.send().await.map_err(|e| RemoteError::Request {
            url: url.clone(),
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Backend { status, body });
        }

        let is_event_stream = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("text/event-stream"))
            .unwrap_or(false);

        if !is_event_stream {
            let payload: Value = response
                .json()
                .await
                .map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;
            let text = extract_non_streaming_text(&payload);
            let usage = payload.get("usage").map(parse_usage);
            return Ok(ChatResponse { text, usage });
        }

        self.consume_event_stream(response).await
    }

    async fn consume_event_stream(&self, response: reqwest::Response) -> Result<ChatResponse> {
        let mut accumulator = Accumulator::default();
        let mut byte_stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = byte_stream.next().await {
            let chunk = chunk.map_err(|e| RemoteError::StreamError(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim_end_matches('\r').to_string();
                buffer.drain(..=newline);

                let Some(payload) = line.strip_prefix("data:") else {
                    continue;
                };
                let payload = payload.trim();
                if payload == "[DONE]" {
                    let usage = accumulator.usage.as_ref().map(parse_usage);
                    return Ok(ChatResponse { text: accumulator.content, usage });
                }
                if payload.is_empty() {
                    continue;
                }

                let event: Value = match serde_json::from_str(payload) {
                    Ok(v) => v,
                    Err(err) => {
                        warn!(error = %err, "skipping malformed SSE frame");
                        continue;
                    }
                };

                if let Some(classified) = sse::classify(&event) {
                    if !accumulator.apply(classified) {
                        return Err(RemoteError::StreamError(
                            accumulator.error.unwrap_or_else(|| "stream reported an error".to_string()),
                        ));
                    }
                }
            }
        }

        let usage = accumulator.usage.as_ref().map(parse_usage);
        Ok(ChatResponse { text: accumulator.content, usage })
    }
}

fn extract_non_streaming_text(payload: &Value) -> String {
    payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

/// Normalizes the handful of shapes a backend reports usage in, favoring
/// OpenAI's field names but accepting the aworld-style ones too.
fn parse_usage(value: &Value) -> Usage {
    Usage {
        input_tokens: value.get("input_tokens").or_else(|| value.get("prompt_tokens")).and_then(Value::as_u64),
        output_tokens: value.get("output_tokens").or_else(|| value.get("completion_tokens")).and_then(Value::as_u64),
        total_tokens: value.get("total_tokens").and_then(Value::as_u64),
        cost: value.get("cost").or_else(|| value.get("total_cost")).and_then(Value::as_f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_streaming_extraction() {
        let payload = json!({ "choices": [{ "message": { "content": "hi" } }] });
        assert_eq!(extract_non_streaming_text(&payload), "hi");
    }

    #[test]
    fn parse_usage_prefers_input_output_tokens() {
        let usage = parse_usage(&json!({ "input_tokens": 10, "output_tokens": 5, "cost": 0.02 }));
        assert_eq!(usage.input_tokens, Some(10));
        assert_eq!(usage.output_tokens, Some(5));
        assert_eq!(usage.cost, Some(0.02));
    }

    #[test]
    fn parse_usage_falls_back_to_openai_field_names() {
        let usage = parse_usage(&json!({ "prompt_tokens": 3, "completion_tokens": 4, "total_tokens": 7 }));
        assert_eq!(usage.input_tokens, Some(3));
        assert_eq!(usage.output_tokens, Some(4));
        assert_eq!(usage.total_tokens, Some(7));
    }

    #[test]
    fn construction_defaults_to_live_display_enabled() {
        let client = RemoteClient::new("http://localhost:8080", "user", "session");
        assert!(!client.disable_live_display());
    }

    #[test]
    fn batch_mode_disables_live_display() {
        let client = RemoteClient::new("http://localhost:8080", "user", "session").with_live_display_disabled();
        assert!(client.disable_live_display());
    }
}
