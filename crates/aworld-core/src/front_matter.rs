//! Hand-rolled front-matter extractor shared by the skill registry and the
//! markdown agent parser. Deliberately not a general YAML/TOML parser: it
//! only needs to recognize `key: value` lines where `value` may itself be
//! a (possibly multi-line, possibly malformed) JSON blob.

use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct FrontMatter {
    pub fields: HashMap<String, serde_json::Value>,
    pub body_start_line: usize,
}

impl FrontMatter {
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }
}

/// `key: rest` where `key` has no leading whitespace and is made of
/// alphanumerics, `_` or `-`. Used both to split a line and, during
/// multi-line JSON recovery, to detect "this must be the next field".
fn split_key_line(line: &str) -> Option<(&str, &str)> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    let colon = line.find(':')?;
    let key = &line[..colon];
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return None;
    }
    Some((key, line[colon + 1..].trim()))
}

fn brace_bracket_delta(s: &str) -> i64 {
    s.chars()
        .map(|c| match c {
            '{' | '[' => 1,
            '}' | ']' => -1,
            _ => 0,
        })
        .sum()
}

fn decode_value(raw: &str) -> serde_json::Value {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => value,
        Err(_) => serde_json::Value::String(raw.to_string()),
    }
}

/// Parse a leading `---`-fenced front-matter block. Returns an empty block
/// (and `body_start_line = 0`) when the file doesn't open with a bare
/// `---` line.
pub fn parse(content: &str) -> FrontMatter {
    let lines: Vec<&str> = content.lines().collect();

    if lines.first().map(|l| l.trim()) != Some("---") {
        return FrontMatter::default();
    }

    let mut fields = HashMap::new();
    let mut i = 1;

    while i < lines.len() {
        let line = lines[i];
        if line.trim() == "---" {
            i += 1;
            break;
        }

        let Some((key, rest)) = split_key_line(line) else {
            i += 1;
            continue;
        };

        if rest.starts_with('{') || rest.starts_with('[') {
            let mut balance = brace_bracket_delta(rest);
            let mut collected = rest.to_string();
            let mut j = i + 1;

            if balance != 0 {
                while j < lines.len() {
                    let next = lines[j];
                    if next.trim() == "---" {
                        break;
                    }
                    if split_key_line(next).is_some() {
                        break;
                    }
                    collected.push('\n');
                    collected.push_str(next);
                    balance += brace_bracket_delta(next);
                    j += 1;
                    if balance == 0 {
                        break;
                    }
                }
            }

            fields.insert(key.to_string(), decode_value(&collected));
            i = j;
        } else {
            fields.insert(key.to_string(), serde_json::Value::String(rest.to_string()));
            i += 1;
        }
    }

    FrontMatter {
        fields,
        body_start_line: i,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_front_matter_returns_empty() {
        let fm = parse("# Just a heading\nbody text\n");
        assert!(fm.fields.is_empty());
        assert_eq!(fm.body_start_line, 0);
    }

    #[test]
    fn scalar_fields() {
        let fm = parse("---\nname: weather\ndescription: gets the weather\n---\nbody\n");
        assert_eq!(fm.get_str("name"), Some("weather"));
        assert_eq!(fm.get_str("description"), Some("gets the weather"));
        assert_eq!(fm.body_start_line, 3);
    }

    #[test]
    fn single_line_json_array() {
        let fm = parse("---\nmcp_servers: [\"fs\", \"search\"]\n---\n");
        let value = fm.fields.get("mcp_servers").unwrap();
        assert_eq!(value, &serde_json::json!(["fs", "search"]));
    }

    #[test]
    fn multi_line_json_object() {
        let content = "---\ntool_list: {\n  \"fs\": [\"read\", \"write\"]\n}\nname: x\n---\n";
        let fm = parse(content);
        let value = fm.fields.get("tool_list").unwrap();
        assert_eq!(value, &serde_json::json!({"fs": ["read", "write"]}));
        assert_eq!(fm.get_str("name"), Some("x"));
    }

    #[test]
    fn malformed_json_recovers_as_next_key_boundary() {
        let content = "---\ntool_list: {\n  \"fs\": [\"read\"\nname: x\n---\n";
        let fm = parse(content);
        // Malformed JSON falls back to the raw collected string.
        assert!(fm.fields.get("tool_list").unwrap().is_string());
        assert_eq!(fm.get_str("name"), Some("x"));
    }
}
