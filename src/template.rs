//! Command template rendering.
//!
//! Command templates carry `<$name>` placeholders inside otherwise literal JSON.
//! Rendering happens in three passes: literal braces are escaped, placeholders are
//! rewritten into `{name}` fields, then the fields are filled from named values.
//! Fields may index into arrays or objects, e.g. `<$params[0]>` or `<$result[volume]>`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Named values available to a template.
pub type TemplateValues = HashMap<String, Value>;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<\$([a-zA-Z0-9_\[\]]+)>").expect("placeholder pattern is valid")
});

/// Errors raised while filling a template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A field names a value (or index) that was not supplied.
    #[error("missing value for placeholder '{0}'")]
    MissingPlaceholder(String),

    /// A field could not be parsed as `name[index]...`.
    #[error("invalid placeholder '{0}'")]
    InvalidField(String),

    /// Unbalanced brace at the given byte offset.
    #[error("unbalanced brace at position {position}")]
    Malformed { position: usize },
}

/// Doubles every brace so it survives [`format_named`] literally.
pub fn escape_braces(template: &str) -> String {
    template.replace('{', "{{").replace('}', "}}")
}

/// Rewrites `<$name>` placeholders into `{name}` fields.
pub fn convert_placeholders(template: &str) -> String {
    PLACEHOLDER.replace_all(template, "{${1}}").into_owned()
}

/// Escapes, converts and fills `template` in one go.
///
/// # Errors
///
/// Returns an error if a placeholder refers to a value that is not in `values`.
pub fn render(template: &str, values: &TemplateValues) -> Result<String, TemplateError> {
    let prepared = convert_placeholders(&escape_braces(template));
    format_named(&prepared, values)
}

/// Fills `{field}` occurrences from `values`; `{{` and `}}` become literal braces.
///
/// String values are inserted as-is, anything else as compact JSON.
pub fn format_named(template: &str, values: &TemplateValues) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }

                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, '{')) | None => return Err(TemplateError::Malformed { position }),
                        Some((_, ch)) => field.push(ch),
                    }
                }

                push_value(&mut out, resolve(&field, values)?);
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(TemplateError::Malformed { position });
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

fn resolve<'a>(field: &str, values: &'a TemplateValues) -> Result<&'a Value, TemplateError> {
    let (name, mut rest) = match field.find('[') {
        Some(idx) => field.split_at(idx),
        None => (field, ""),
    };
    if name.is_empty() {
        return Err(TemplateError::InvalidField(field.to_string()));
    }

    let mut current = values
        .get(name)
        .ok_or_else(|| TemplateError::MissingPlaceholder(field.to_string()))?;

    while !rest.is_empty() {
        let close = rest
            .find(']')
            .filter(|_| rest.starts_with('['))
            .ok_or_else(|| TemplateError::InvalidField(field.to_string()))?;
        let key = &rest[1..close];
        rest = &rest[close + 1..];

        let next = match current {
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            Value::Object(map) => map.get(key),
            _ => None,
        };
        current = next.ok_or_else(|| TemplateError::MissingPlaceholder(field.to_string()))?;
    }

    Ok(current)
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(s),
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn params(list: &[&str]) -> TemplateValues {
        let mut values = TemplateValues::new();
        values.insert("params".to_string(), json!(list));
        values
    }

    #[test]
    fn test_escape_braces() {
        assert_eq!(escape_braces(r#"{"a": {}}"#), r#"{{"a": {{}}}}"#);
    }

    #[test]
    fn test_convert_placeholders() {
        assert_eq!(convert_placeholders("x=<$params[0]>, y=<$name>"), "x={params[0]}, y={name}");
        // `$` is required
        assert_eq!(convert_placeholders("<params>"), "<params>");
    }

    #[test]
    fn test_render_indexed_param_keeps_literal_braces() {
        let template = r#"{"jsonrpc":"2.0","method":"Player.Seek","params":{"playerid":1,"value":<$params[0]>},"id":1}"#;
        let rendered = render(template, &params(&["10", "20"])).unwrap();
        assert_eq!(
            rendered,
            r#"{"jsonrpc":"2.0","method":"Player.Seek","params":{"playerid":1,"value":10},"id":1}"#
        );
    }

    #[test]
    fn test_render_object_result() {
        let mut values = TemplateValues::new();
        values.insert("result".to_string(), json!({"volume": 42, "muted": false}));

        assert_eq!(render("Volume <$result[volume]>", &values).unwrap(), "Volume 42");
        assert_eq!(
            render("<$result>", &values).unwrap(),
            r#"{"muted":false,"volume":42}"#
        );
    }

    #[test]
    fn test_render_string_result_is_raw() {
        let mut values = TemplateValues::new();
        values.insert("result".to_string(), json!("OK"));
        assert_eq!(render("Result: <$result>", &values).unwrap(), "Result: OK");
    }

    #[test]
    fn test_missing_placeholder() {
        let err = render("<$params[2]>", &params(&["a"])).unwrap_err();
        assert_eq!(err, TemplateError::MissingPlaceholder("params[2]".to_string()));

        let err = render("<$other>", &params(&["a"])).unwrap_err();
        assert_eq!(err, TemplateError::MissingPlaceholder("other".to_string()));
    }

    #[test]
    fn test_invalid_field() {
        let err = render("<$params[0>", &params(&["a"])).unwrap_err();
        assert_eq!(err, TemplateError::InvalidField("params[0".to_string()));
    }

    #[test]
    fn test_format_named_rejects_stray_brace() {
        let values = TemplateValues::new();
        assert_eq!(format_named("a } b", &values), Err(TemplateError::Malformed { position: 2 }));
        assert_eq!(format_named("{open", &values), Err(TemplateError::Malformed { position: 0 }));
    }

    proptest! {
        #[test]
        fn render_without_placeholders_is_identity(template in "[ -~\n]{0,64}") {
            prop_assume!(!PLACEHOLDER.is_match(&template));
            let rendered = render(&template, &TemplateValues::new()).unwrap();
            prop_assert_eq!(rendered, template);
        }
    }
}
