//! Prompt text cleanup.

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("Valid whitespace regex"));
static COMMA_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",{2,}").expect("Valid comma regex"));
static PIPE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|{2,}").expect("Valid pipe regex"));

/// Clean a prompt fragment for the image API.
///
/// Underscores become spaces, whitespace runs collapse to one space, spaces
/// before commas are removed, repeated commas and pipes collapse, and the
/// result is trimmed. Applying it twice gives the same result as once.
///
/// # Examples
///
/// ```
/// use storyforge_prompt::normalize;
///
/// assert_eq!(normalize("[Aria],  , long_hair ,, smiling ||| "), "[Aria], long hair, smiling |");
/// ```
pub fn normalize(text: &str) -> String {
    let text = text.replace('_', " ");
    let text = WHITESPACE_RUN.replace_all(&text, " ");
    let text = text.replace(" ,", ",");
    let text = COMMA_RUN.replace_all(&text, ",");
    let text = PIPE_RUN.replace_all(&text, "|");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent_on_awkward_inputs() {
        let inputs = [
            "",
            "   ",
            "a , ,b",
            "x  ,, , y",
            "tab\t\t, then_underscore__run",
            " , leading comma",
            "trailing pipes ||||",
            "[Name], , , scene, , quality",
            "mixed \n\n newlines , here",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn collapses_empty_fields() {
        assert_eq!(
            normalize("[Aria], , red dress, , "),
            "[Aria], red dress,"
        );
    }
}
