//! Classifies server-sent-event payloads from `/chat/completions` into the
//! handful of effects the caller needs to render: status lines, streamed
//! text, tool call/result notices, and terminal signals.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A single live status line; only one may be shown at a time.
    Activity(String),
    /// A named pipeline step starting, finishing, or failing.
    Step(String),
    /// A chunk of assistant-visible response text (reasoning, if present,
    /// comes first).
    Message(String),
    /// The name of a function the backend is calling.
    ToolCall(String),
    /// Tool name plus a preview of its result, truncated to 200 chars.
    ToolCallResult(String),
    /// A task result, rendered as JSON-highlighted markdown when the
    /// payload parses as JSON, plain text otherwise.
    TaskResult(String),
    /// Terminal marker with no accumulator change.
    Finished,
    /// Token/cost accounting attached to a chunk (commonly the final one).
    Usage(Value),
    /// The stream reported an error; processing stops here.
    Error(String),
}

const TOOL_RESULT_PREVIEW_LIMIT: usize = 200;

/// Classify one decoded `data: <json>` event payload. Returns `None` for
/// payload shapes that carry no renderable effect (caller should keep
/// reading).
pub fn classify(event: &Value) -> Option<StreamEvent> {
    if let Some(error) = event.get("error") {
        let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
        return Some(StreamEvent::Error(message));
    }

    if let Some(usage) = event.get("usage") {
        if !usage.is_null() {
            return Some(StreamEvent::Usage(usage.clone()));
        }
    }

    if let Some(event_type) = event.pointer("/metadata/type").and_then(Value::as_str) {
        return classify_typed(event_type, event);
    }

    classify_openai(event)
}

fn classify_typed(event_type: &str, event: &Value) -> Option<StreamEvent> {
    let data = event.get("data");
    match event_type {
        "activity" => Some(StreamEvent::Activity(string_or_json(data))),
        "step" => Some(StreamEvent::Step(string_or_json(data))),
        "message" => {
            let mut text = String::new();
            if let Some(reasoning) = event.get("reasoning").and_then(Value::as_str) {
                text.push_str(reasoning);
            }
            if let Some(response) = event.get("response").and_then(Value::as_str) {
                text.push_str(response);
            }
            Some(StreamEvent::Message(text))
        }
        "tool_call" => Some(StreamEvent::ToolCall(string_or_json(data))),
        "tool_call_result" => {
            let full = string_or_json(data);
            let preview: String = full.chars().take(TOOL_RESULT_PREVIEW_LIMIT).collect();
            Some(StreamEvent::ToolCallResult(preview))
        }
        "task_result" => Some(StreamEvent::TaskResult(string_or_json(data))),
        "finished_signal" => Some(StreamEvent::Finished),
        _ => None,
    }
}

fn classify_openai(event: &Value) -> Option<StreamEvent> {
    if let Some(content) = event.pointer("/choices/0/delta/content").and_then(Value::as_str) {
        return Some(StreamEvent::Message(content.to_string()));
    }
    if let Some(content) = event.pointer("/choices/0/message/content").and_then(Value::as_str) {
        return Some(StreamEvent::Message(content.to_string()));
    }
    None
}

fn string_or_json(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Accumulates stream events into the final response text, mirroring the
/// accumulator rules: only `message`/`activity`/`step`/`tool_*`/`task_result`
/// contribute text; `finished_signal` and errors stop the accumulation.
#[derive(Debug, Default)]
pub struct Accumulator {
    pub content: String,
    pub error: Option<String>,
    pub usage: Option<Value>,
}

impl Accumulator {
    pub fn apply(&mut self, event: StreamEvent) -> bool {
        match event {
            StreamEvent::Activity(s) | StreamEvent::Step(s) => {
                self.content.push_str(&s);
                self.content.push('\n');
                true
            }
            StreamEvent::Message(s) => {
                self.content.push_str(&s);
                true
            }
            StreamEvent::ToolCall(s) => {
                self.content.push_str(&s);
                true
            }
            StreamEvent::ToolCallResult(s) => {
                self.content.push_str(&s);
                true
            }
            StreamEvent::TaskResult(s) => {
                self.content.push_str(&s);
                true
            }
            StreamEvent::Finished => true,
            StreamEvent::Usage(value) => {
                self.usage = Some(value);
                true
            }
            StreamEvent::Error(message) => {
                self.error = Some(message);
                false
            }
        }
    }
}
