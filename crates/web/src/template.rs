//! Minimal template engine: strict `{{name}}` substitution, no control flow.
//!
//! Variables come from a JSON object. Strings substitute their raw content,
//! numbers and booleans their display form; anything else — including a
//! missing key — substitutes the empty string. An unterminated `{{` is
//! copied through literally.

use std::io;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// Substitutes `{{name}}` placeholders in a template string.
pub fn render_str(template: &str, vars: &Value) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                output.push_str(&substitution(vars, &after[..end]));
                rest = &after[end + 2..];
            }
            None => {
                output.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    output.push_str(rest);
    output
}

/// Reads a template file and substitutes its placeholders.
pub fn render_file(path: impl AsRef<Path>, vars: &Value) -> Result<String, TemplateError> {
    let template = std::fs::read_to_string(path)?;
    Ok(render_str(&template, vars))
}

fn substitution(vars: &Value, name: &str) -> String {
    match vars.get(name) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use serde_json::json;

    use super::*;

    #[test]
    fn substitutes_known_variables() {
        let template = indoc! {r#"
            <html><head><title>{{title}}</title></head>
            <body>
            <h1>{{heading}}</h1>
            <p>Welcome, {{user_name}}!</p>
            <p>You have {{message_count}} new messages.</p>
            </body></html>
        "#};
        let vars = json!({
            "title": "Template Example",
            "heading": "Demo",
            "user_name": "Visitor",
            "message_count": 42,
        });

        let rendered = render_str(template, &vars);
        assert!(rendered.contains("<title>Template Example</title>"));
        assert!(rendered.contains("<h1>Demo</h1>"));
        assert!(rendered.contains("Welcome, Visitor!"));
        assert!(rendered.contains("You have 42 new messages."));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn missing_variables_become_empty() {
        let vars = json!({ "known": "yes" });
        assert_eq!(render_str("[{{known}}][{{unknown}}]", &vars), "[yes][]");
    }

    #[test]
    fn booleans_and_numbers_display() {
        let vars = json!({ "flag": true, "count": 7 });
        assert_eq!(render_str("{{flag}}/{{count}}", &vars), "true/7");
    }

    #[test]
    fn non_scalar_values_become_empty() {
        let vars = json!({ "list": [1, 2], "object": {"a": 1} });
        assert_eq!(render_str("[{{list}}][{{object}}]", &vars), "[][]");
    }

    #[test]
    fn unterminated_braces_stay_literal() {
        let vars = json!({ "name": "x" });
        assert_eq!(render_str("hello {{name", &vars), "hello {{name");
        assert_eq!(render_str("{{name}} and {{tail", &vars), "x and {{tail");
    }

    #[test]
    fn plain_text_passes_through() {
        let vars = json!({});
        assert_eq!(render_str("no placeholders here", &vars), "no placeholders here");
        assert_eq!(render_str("", &vars), "");
    }
}
