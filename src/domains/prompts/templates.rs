//! Template formatters.
//!
//! Two interchangeable variable syntaxes are supported:
//!
//! - **brace**: `{name}`, with `{{` and `}}` as escaped literal braces. A
//!   referenced variable with no binding is an error.
//! - **dollar**: `$name` or `${name}`, with `$$` as an escaped literal dollar.
//!   A referenced variable with no binding is left verbatim.
//!
//! Both are flat text substitution: bindings are plain strings, substituted
//! values are never rescanned, and anything that is not a well-formed token
//! is copied through unchanged.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::PromptError;
use super::model::Bindings;
use crate::core::security::{
    is_identifier_continue, is_identifier_start, is_identifier_syntax, validate_identifier,
};

/// Variable syntax used in prompt bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatterKind {
    /// `{name}` placeholders.
    #[default]
    Brace,
    /// `$name` placeholders.
    Dollar,
}

impl FormatterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brace => "brace",
            Self::Dollar => "dollar",
        }
    }
}

impl fmt::Display for FormatterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatterKind {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brace" => Ok(Self::Brace),
            "dollar" => Ok(Self::Dollar),
            other => Err(PromptError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Variable extraction and substitution over prompt bodies.
pub trait Formatter: Send + Sync + fmt::Debug {
    /// Which syntax this formatter implements.
    fn kind(&self) -> FormatterKind;

    /// Names of all well-formed variable tokens in `text`.
    fn extract(&self, text: &str) -> BTreeSet<String>;

    /// Substitute `bindings` into `text`.
    ///
    /// Every binding key must be a valid identifier, otherwise this fails
    /// with [`PromptError::InvalidIdentifier`].
    fn render(&self, text: &str, bindings: &Bindings) -> Result<String, PromptError>;
}

/// Build the formatter for `kind`.
pub fn get_formatter(kind: FormatterKind) -> Arc<dyn Formatter> {
    match kind {
        FormatterKind::Brace => Arc::new(BraceFormatter),
        FormatterKind::Dollar => Arc::new(DollarFormatter),
    }
}

/// A lexed piece of template text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    /// Copied to the output as-is (escapes already collapsed).
    Literal(&'a str),
    /// A variable reference; `raw` is the full token as written.
    Variable { name: &'a str, raw: &'a str },
}

/// Collects segments, coalescing literal runs by slice bounds.
struct Lexer<'a> {
    text: &'a str,
    segments: Vec<Segment<'a>>,
    literal_start: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            segments: Vec::new(),
            literal_start: 0,
        }
    }

    fn flush_literal(&mut self, end: usize) {
        if end > self.literal_start {
            self.segments
                .push(Segment::Literal(&self.text[self.literal_start..end]));
        }
    }

    /// Replace `text[start..end]` with the literal `replacement`.
    fn escape(&mut self, start: usize, end: usize, replacement: &'a str) {
        self.flush_literal(start);
        self.segments.push(Segment::Literal(replacement));
        self.literal_start = end;
    }

    /// Record `text[start..end]` as a reference to `name`.
    fn variable(&mut self, start: usize, end: usize, name: &'a str) {
        self.flush_literal(start);
        self.segments.push(Segment::Variable {
            name,
            raw: &self.text[start..end],
        });
        self.literal_start = end;
    }

    fn finish(mut self) -> Vec<Segment<'a>> {
        self.flush_literal(self.text.len());
        self.segments
    }
}

/// If `text[open + 1..]` holds `ident}`, return the identifier's end offset.
fn closed_identifier(text: &str, open: usize) -> Option<usize> {
    let rest = &text[open + 1..];
    let len = rest.find('}')?;
    is_identifier_syntax(&rest[..len]).then_some(open + 1 + len)
}

fn validate_binding_keys(bindings: &Bindings) -> Result<(), PromptError> {
    let mut keys: Vec<&String> = bindings.keys().collect();
    keys.sort();
    for key in keys {
        validate_identifier(key)?;
    }
    Ok(())
}

fn collect_names(segments: &[Segment<'_>]) -> BTreeSet<String> {
    segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::Variable { name, .. } => Some((*name).to_string()),
            Segment::Literal(_) => None,
        })
        .collect()
}

/// Formatter for `{var}` syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceFormatter;

impl BraceFormatter {
    fn segments(text: &str) -> Vec<Segment<'_>> {
        let bytes = text.as_bytes();
        let mut lexer = Lexer::new(text);
        let mut i = 0;

        while i < bytes.len() {
            match (bytes[i], bytes.get(i + 1)) {
                (b'{', Some(b'{')) => {
                    lexer.escape(i, i + 2, "{");
                    i += 2;
                }
                (b'}', Some(b'}')) => {
                    lexer.escape(i, i + 2, "}");
                    i += 2;
                }
                (b'{', _) => match closed_identifier(text, i) {
                    Some(close) => {
                        lexer.variable(i, close + 1, &text[i + 1..close]);
                        i = close + 1;
                    }
                    None => i += 1,
                },
                _ => i += 1,
            }
        }

        lexer.finish()
    }
}

impl Formatter for BraceFormatter {
    fn kind(&self) -> FormatterKind {
        FormatterKind::Brace
    }

    fn extract(&self, text: &str) -> BTreeSet<String> {
        collect_names(&Self::segments(text))
    }

    fn render(&self, text: &str, bindings: &Bindings) -> Result<String, PromptError> {
        validate_binding_keys(bindings)?;

        let mut out = String::with_capacity(text.len());
        for segment in Self::segments(text) {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Variable { name, .. } => {
                    let value = bindings
                        .get(name)
                        .ok_or_else(|| PromptError::missing_variable(name))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

/// Formatter for `$var` syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct DollarFormatter;

impl DollarFormatter {
    fn segments(text: &str) -> Vec<Segment<'_>> {
        let bytes = text.as_bytes();
        let mut lexer = Lexer::new(text);
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'$' {
                i += 1;
                continue;
            }

            match bytes.get(i + 1) {
                Some(b'$') => {
                    lexer.escape(i, i + 2, "$");
                    i += 2;
                }
                Some(b'{') => match closed_identifier(text, i + 1) {
                    Some(close) => {
                        lexer.variable(i, close + 1, &text[i + 2..close]);
                        i = close + 1;
                    }
                    None => i += 1,
                },
                Some(&c) if is_identifier_start(c as char) => {
                    let end = text[i + 1..]
                        .find(|c: char| !is_identifier_continue(c))
                        .map_or(text.len(), |len| i + 1 + len);
                    lexer.variable(i, end, &text[i + 1..end]);
                    i = end;
                }
                _ => i += 1,
            }
        }

        lexer.finish()
    }
}

impl Formatter for DollarFormatter {
    fn kind(&self) -> FormatterKind {
        FormatterKind::Dollar
    }

    fn extract(&self, text: &str) -> BTreeSet<String> {
        collect_names(&Self::segments(text))
    }

    fn render(&self, text: &str, bindings: &Bindings) -> Result<String, PromptError> {
        validate_binding_keys(bindings)?;

        let mut out = String::with_capacity(text.len());
        for segment in Self::segments(text) {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Variable { name, raw } => {
                    out.push_str(bindings.get(name).map_or(raw, String::as_str));
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, &str)]) -> Bindings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_brace_extract_and_render() {
        let content = "Hello {name}, welcome to {project}! Bye {name}.";

        assert_eq!(BraceFormatter.extract(content), names(&["name", "project"]));

        let result = BraceFormatter
            .render(content, &bindings(&[("name", "Alice"), ("project", "Rust")]))
            .unwrap();
        assert_eq!(result, "Hello Alice, welcome to Rust! Bye Alice.");
    }

    #[test]
    fn test_brace_escapes_collapse() {
        let content = "{{literal}} and {{ {value} }}";

        assert_eq!(BraceFormatter.extract(content), names(&["value"]));
        let result = BraceFormatter
            .render(content, &bindings(&[("value", "{{x}}")]))
            .unwrap();
        assert_eq!(result, "{literal} and { {{x}} }");
    }

    #[test]
    fn test_brace_missing_variable_fails() {
        let err = BraceFormatter
            .render("Hi {user}", &Bindings::new())
            .unwrap_err();
        assert!(matches!(err, PromptError::MissingVariable(ref n) if n == "user"));
    }

    #[test]
    fn test_brace_malformed_tokens_left_verbatim() {
        let content = r#"{"json": 1} {not valid} {1st} { } lonely } and { open"#;

        assert!(BraceFormatter.extract(content).is_empty());
        assert_eq!(
            BraceFormatter.render(content, &Bindings::new()).unwrap(),
            content
        );
    }

    #[test]
    fn test_brace_nested_open_brace() {
        // The first `{` has no identifier before `}`, the inner one does.
        let content = "{a{b}";
        assert_eq!(BraceFormatter.extract(content), names(&["b"]));
        assert_eq!(
            BraceFormatter.render(content, &bindings(&[("b", "B")])).unwrap(),
            "{aB"
        );
    }

    #[test]
    fn test_dollar_extract_and_render() {
        let content = "Hello $name, welcome to ${project}s!";

        assert_eq!(DollarFormatter.extract(content), names(&["name", "project"]));

        let result = DollarFormatter
            .render(content, &bindings(&[("name", "Bob"), ("project", "Python")]))
            .unwrap();
        assert_eq!(result, "Hello Bob, welcome to Pythons!");
    }

    #[test]
    fn test_dollar_unbound_left_verbatim() {
        let content = "echo $HOME costs $5 and ${unset} $$ $";
        let result = DollarFormatter.render(content, &Bindings::new()).unwrap();
        assert_eq!(result, "echo $HOME costs $5 and ${unset} $ $");
    }

    #[test]
    fn test_dollar_escape_not_a_variable() {
        let content = "$$name";
        assert!(DollarFormatter.extract(content).is_empty());
        assert_eq!(
            DollarFormatter
                .render(content, &bindings(&[("name", "x")]))
                .unwrap(),
            "$name"
        );
    }

    #[test]
    fn test_render_rejects_invalid_binding_keys() {
        let bad = bindings(&[("__class__", "x")]);
        for formatter in [get_formatter(FormatterKind::Brace), get_formatter(FormatterKind::Dollar)] {
            let err = formatter.render("plain", &bad).unwrap_err();
            assert!(matches!(err, PromptError::InvalidIdentifier(_)));
        }

        let err = DollarFormatter
            .render("$a", &bindings(&[("a b", "x")]))
            .unwrap_err();
        assert!(matches!(err, PromptError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let result = BraceFormatter
            .render("{a}", &bindings(&[("a", "{b}")]))
            .unwrap();
        assert_eq!(result, "{b}");

        let result = DollarFormatter
            .render("$a", &bindings(&[("a", "$b")]))
            .unwrap();
        assert_eq!(result, "$b");
    }

    #[test]
    fn test_multibyte_text_is_preserved() {
        let result = BraceFormatter
            .render("こんにちは {name} 🎉", &bindings(&[("name", "世界")]))
            .unwrap();
        assert_eq!(result, "こんにちは 世界 🎉");

        let result = DollarFormatter
            .render("€$amount—$€", &bindings(&[("amount", "5")]))
            .unwrap();
        assert_eq!(result, "€5—$€");
    }

    #[test]
    fn test_formatter_kind_parsing() {
        assert_eq!("brace".parse::<FormatterKind>().unwrap(), FormatterKind::Brace);
        assert_eq!(" Dollar ".parse::<FormatterKind>().unwrap(), FormatterKind::Dollar);
        assert!(matches!(
            "jinja".parse::<FormatterKind>(),
            Err(PromptError::UnsupportedFormat(ref f)) if f == "jinja"
        ));
        assert_eq!(
            get_formatter(FormatterKind::Dollar).kind(),
            FormatterKind::Dollar
        );
    }
}
