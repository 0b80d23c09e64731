//! Resolves `@<path>` tokens embedded in outgoing chat text into either
//! inline text content (appended to the message) or base64-encoded image
//! parts, following the OpenAI multimodal `content: [...]` convention.

use base64::Engine;
use serde_json::{json, Value};
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Replace `@<path>` tokens in `text` with nothing (they're stripped once
/// resolved), returning the cleaned text plus any image parts discovered.
pub fn resolve_file_references(text: &str) -> (String, Vec<Value>) {
    let mut cleaned = String::new();
    let mut appended_text = String::new();
    let mut images = Vec::new();

    for token in text.split_whitespace() {
        if let Some(path_str) = token.strip_prefix('@') {
            let path = Path::new(path_str);
            if !path.is_file() {
                cleaned.push_str(token);
                cleaned.push(' ');
                continue;
            }

            if is_image(path) {
                if let Ok(bytes) = std::fs::read(path) {
                    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
                    let mime = mime_for(path);
                    images.push(json!({
                        "type": "image_url",
                        "image_url": { "url": format!("data:{mime};base64,{encoded}") }
                    }));
                    continue;
                }
            } else if let Ok(contents) = std::fs::read_to_string(path) {
                appended_text.push_str(&format!("\n\n--- {path_str} ---\n{contents}\n"));
                continue;
            }

            cleaned.push_str(token);
            cleaned.push(' ');
        } else {
            cleaned.push_str(token);
            cleaned.push(' ');
        }
    }

    let mut final_text = cleaned.trim_end().to_string();
    final_text.push_str(&appended_text);
    (final_text, images)
}

/// Build an OpenAI-style multimodal content value: plain string when there
/// are no images, otherwise `[{type:text,...}, {type:image_url,...}, ...]`.
pub fn build_content(text: &str, images: &[Value]) -> Value {
    if images.is_empty() {
        return Value::String(text.to_string());
    }
    let mut parts = vec![json!({ "type": "text", "text": text })];
    parts.extend(images.iter().cloned());
    Value::Array(parts)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn plain_text_without_references_is_unchanged() {
        let (text, images) = resolve_file_references("hello world");
        assert_eq!(text, "hello world");
        assert!(images.is_empty());
    }

    #[test]
    fn unresolvable_reference_is_kept_verbatim() {
        let (text, images) = resolve_file_references("look at @missing.txt please");
        assert!(text.contains("@missing.txt"));
        assert!(images.is_empty());
    }

    #[test]
    fn text_file_reference_is_inlined() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "important context").unwrap();
        let prompt = format!("summarize @{}", file.display());
        let (text, images) = resolve_file_references(&prompt);
        assert!(text.contains("important context"));
        assert!(images.is_empty());
    }

    #[test]
    fn image_reference_becomes_a_content_part() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("photo.png");
        std::fs::write(&file, [0x89, 0x50, 0x4e, 0x47]).unwrap();
        let prompt = format!("describe @{}", file.display());
        let (_, images) = resolve_file_references(&prompt);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0]["type"], "image_url");
    }

    #[test]
    fn build_content_is_plain_string_without_images() {
        let value = build_content("hi", &[]);
        assert_eq!(value, Value::String("hi".to_string()));
    }

    #[test]
    fn build_content_is_array_with_images() {
        let img = json!({ "type": "image_url", "image_url": { "url": "data:..." } });
        let value = build_content("hi", &[img]);
        assert!(value.is_array());
        assert_eq!(value.as_array().unwrap().len(), 2);
    }
}
