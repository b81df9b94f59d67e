//! Pulling a scene list out of free-form LLM output.
//!
//! Models asked for `{scene_prompts:'a/b/c'}` answer in many shapes: fenced
//! JSON, bare JSON, single-quoted pseudo-JSON, bullet lists, or prose with
//! reasoning blocks in front. Extraction tries the strict shapes first and
//! degrades to heuristics.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// JSON key holding the scene list.
pub const SCENE_PROMPTS_KEY: &str = "scene_prompts";

static THINK_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:think|uncensored_think)>.*?</(?:think|uncensored_think)>")
        .expect("Valid think block regex")
});
static THINK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?(?:think|uncensored_think)>").expect("Valid think tag regex")
});
static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)scene_prompts['":\s]+([^}'"]+)"#).expect("Valid key/value regex")
});
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+(.+)$").expect("Valid list item regex")
});
static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("Valid quoted segment regex"));
static SLASH_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/+").expect("Valid slash regex"));
static COMMA_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",+").expect("Valid comma regex"));
static SPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Valid space regex"));

/// Extract a slash-delimited scene list from an LLM response.
///
/// Strategies, in order:
/// 1. JSON object (fenced or bare) with a `scene_prompts` string or array
/// 2. `scene_prompts: ...` key/value text
/// 3. Bullet or numbered lines, else quoted segments, joined with `/`
/// 4. The whole response after reasoning blocks are removed
///
/// # Returns
///
/// `None` only when nothing non-empty remains.
///
/// # Examples
///
/// ```
/// use storyforge_prompt::extract_scene_prompts;
///
/// let response = "<think>they want JSON</think>{\"scene_prompts\": \"a//b, ,c\"}";
/// assert_eq!(extract_scene_prompts(response).as_deref(), Some("a/b, ,c"));
///
/// let pseudo = "{scene_prompts:'walking/sitting'}";
/// assert_eq!(extract_scene_prompts(pseudo).as_deref(), Some("walking/sitting"));
/// ```
pub fn extract_scene_prompts(content: &str) -> Option<String> {
    let stripped = strip_reasoning(content);

    if let Some(scenes) = from_json(&stripped).and_then(clean_candidate) {
        tracing::debug!(strategy = "json", "Extracted scene prompts");
        return Some(scenes);
    }

    if let Some(scenes) = KEY_VALUE
        .captures(&stripped)
        .and_then(|caps| caps.get(1))
        .and_then(|m| clean_candidate(m.as_str().to_string()))
    {
        tracing::debug!(strategy = "key_value", "Extracted scene prompts");
        return Some(scenes);
    }

    if let Some(scenes) = from_heuristics(&stripped).and_then(clean_candidate) {
        tracing::debug!(strategy = "heuristic", "Extracted scene prompts");
        return Some(scenes);
    }

    let passthrough = clean_candidate(stripped);
    if passthrough.is_some() {
        tracing::debug!(strategy = "passthrough", "Using cleaned response as scene prompts");
    } else {
        tracing::warn!(length = content.len(), "No scene prompts in response");
    }
    passthrough
}

/// Remove reasoning blocks and any unpaired reasoning tags.
fn strip_reasoning(content: &str) -> String {
    let without_blocks = THINK_BLOCK.replace_all(content, "");
    THINK_TAG.replace_all(&without_blocks, "").into_owned()
}

/// Collapse repeated slashes, commas and whitespace, then trim.
fn clean_candidate(text: String) -> Option<String> {
    let text = SLASH_RUN.replace_all(&text, "/");
    let text = COMMA_RUN.replace_all(&text, ",");
    let text = SPACE_RUN.replace_all(&text, " ");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn from_json(text: &str) -> Option<String> {
    let candidates = [extract_from_code_block(text), extract_balanced(text, '{', '}')];

    candidates.into_iter().flatten().find_map(|json| {
        let value: Value = serde_json::from_str(json).ok()?;
        match value.get(SCENE_PROMPTS_KEY)? {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => {
                let scenes: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                (!scenes.is_empty()).then(|| scenes.join("/"))
            }
            _ => None,
        }
    })
}

fn from_heuristics(text: &str) -> Option<String> {
    let items: Vec<&str> = text
        .lines()
        .filter_map(|line| LIST_ITEM.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|item| !item.is_empty())
        .collect();
    if !items.is_empty() {
        return Some(items.join("/"));
    }

    let quoted: Vec<&str> = QUOTED
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|q| !q.is_empty() && *q != SCENE_PROMPTS_KEY)
        .collect();
    (!quoted.is_empty()).then(|| quoted.join("/"))
}

/// Content of the first fenced code block, tolerating a missing closing fence.
fn extract_from_code_block(text: &str) -> Option<&str> {
    let start = text.find("```")? + 3;
    // Skip the language tag, if any
    let body_start = text[start..]
        .find('\n')
        .map(|n| start + n + 1)
        .unwrap_or(start);
    let body = &text[body_start..];
    let body = body.find("```").map(|end| &body[..end]).unwrap_or(body);
    Some(body.trim())
}

/// First `open`..`close` span with balanced nesting, ignoring delimiters in strings.
fn extract_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_skips_braces_in_strings() {
        let text = r#"noise {"a": "}{", "b": {"c": 1}} tail"#;
        assert_eq!(
            extract_balanced(text, '{', '}'),
            Some(r#"{"a": "}{", "b": {"c": 1}}"#)
        );
    }

    #[test]
    fn code_block_without_closing_fence() {
        assert_eq!(extract_from_code_block("```json\n{\"x\":1}"), Some("{\"x\":1}"));
    }

    #[test]
    fn unpaired_think_tag_is_removed() {
        assert_eq!(strip_reasoning("</think>hello"), "hello");
    }
}
