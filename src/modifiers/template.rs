//! Docstring Templates
//!
//! Minimal `{name}` placeholder substitution for per-output documentation.
//! `{{` and `}}` produce literal braces. Placeholders must be identifiers;
//! anything else (including empty `{}`) cannot be satisfied.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Extracts placeholder names from a template, in order of appearance.
///
/// # Example
/// ```
/// use dagwright::modifiers::template::placeholder_names;
///
/// let names = placeholder_names("Function with {parameter1} as first input");
/// assert_eq!(names, vec!["parameter1"]);
/// ```
pub fn placeholder_names(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
            }
            '{' => {
                let mut name = String::new();
                for inner in chars.by_ref() {
                    if inner == '}' {
                        break;
                    }
                    name.push(inner);
                }
                names.push(name);
            }
            _ => {}
        }
    }

    names
}

/// Substitutes every placeholder with its value.
///
/// Fails if a placeholder has no value or a brace is left unbalanced.
pub fn render(template: &str, values: &BTreeMap<String, String>) -> Result<String> {
    let mut rendered = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            // Escaped braces
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                rendered.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                rendered.push('}');
            }
            // Placeholder
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    name.push(inner);
                }
                if !closed {
                    return Err(Error::invalid(format!(
                        "unterminated placeholder in docstring: '{{{}'",
                        name
                    )));
                }
                let value = values.get(&name).ok_or_else(|| {
                    Error::invalid(format!("docstring placeholder '{{{}}}' has no value", name))
                })?;
                rendered.push_str(value);
            }
            // Unbalanced
            '}' => {
                return Err(Error::invalid("single '}' encountered in docstring"));
            }
            _ => rendered.push(ch),
        }
    }

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_placeholder_names() {
        assert_eq!(placeholder_names("{a} and {b}"), vec!["a", "b"]);
        assert_eq!(placeholder_names("no placeholders"), Vec::<String>::new());
        assert_eq!(placeholder_names("{{escaped}} {real}"), vec!["real"]);
    }

    #[test]
    fn test_render() {
        let result = render(
            "Function with {parameter1} as first input",
            &values(&[("parameter1", "input_1")]),
        )
        .unwrap();
        assert_eq!(result, "Function with input_1 as first input");
    }

    #[test]
    fn test_render_missing_value() {
        let result = render("Function with {foo} as input", &values(&[("bar", "x")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_render_escaped_braces() {
        let result = render("{{literal}} {x}", &values(&[("x", "1")])).unwrap();
        assert_eq!(result, "{literal} 1");
    }

    #[test]
    fn test_render_empty_placeholder_fails() {
        assert!(render("positional {}", &values(&[])).is_err());
    }

    #[test]
    fn test_render_unbalanced() {
        assert!(render("open {x", &values(&[("x", "1")])).is_err());
        assert!(render("close x}", &values(&[])).is_err());
    }
}
