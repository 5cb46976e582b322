//! `{name}` and `{fn(args)}` substitution inside string values
//!
//! `%{...}` is already rule syntax and is left alone.

use crate::config::compile_time::symbols::MAX_INTERPOLATIONS_PER_STRING;
use crate::visitor::error::{CodegenError, CodegenResult};
use regex::Regex;
use std::sync::OnceLock;

const SUBSTITUTE_PATTERN: &str = r"\{([a-zA-Z_@][a-zA-Z0-9_.@-]*(?:\([^)]*\))?)\}";

/// Parsed contents of one `{...}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder<'a> {
    Name(&'a str),
    Call { name: &'a str, args: Vec<&'a str> },
}

impl<'a> Placeholder<'a> {
    fn parse(inner: &'a str) -> Self {
        match inner.split_once('(') {
            Some((name, rest)) => {
                let arg_str = rest.trim_end_matches(')').trim();
                let args = if arg_str.is_empty() {
                    Vec::new()
                } else {
                    arg_str.split(',').map(str::trim).collect()
                };
                Placeholder::Call {
                    name: name.trim(),
                    args,
                }
            }
            None => Placeholder::Name(inner.trim()),
        }
    }
}

fn substitution_pattern() -> CodegenResult<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(SUBSTITUTE_PATTERN))
        .as_ref()
        .map_err(|e| CodegenError::interpolation("pattern", e))
}

/// Replace every placeholder in `text` with what `resolve` returns for it.
///
/// The first failing placeholder aborts the substitution; its error names
/// the placeholder text.
pub fn substitute<F>(text: &str, mut resolve: F) -> CodegenResult<String>
where
    F: FnMut(&Placeholder<'_>) -> CodegenResult<String>,
{
    let pattern = substitution_pattern()?;
    let mut out = String::with_capacity(text.len());
    let mut last_end = 0;
    let mut count = 0usize;

    for captures in pattern.captures_iter(text) {
        let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if text[..whole.start()].ends_with('%') {
            continue;
        }

        count += 1;
        if count > MAX_INTERPOLATIONS_PER_STRING {
            return Err(CodegenError::TooManyInterpolations {
                limit: MAX_INTERPOLATIONS_PER_STRING,
            });
        }

        let placeholder = Placeholder::parse(inner.as_str());
        let replacement = resolve(&placeholder)
            .map_err(|e| CodegenError::interpolation(inner.as_str(), e))?;

        out.push_str(&text[last_end..whole.start()]);
        out.push_str(&replacement);
        last_end = whole.end();
    }

    out.push_str(&text[last_end..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolError;
    use assert_matches::assert_matches;

    fn fake(placeholder: &Placeholder<'_>) -> CodegenResult<String> {
        match placeholder {
            Placeholder::Name("inbound.ip") => Ok("%{IP:CLIENT}".to_string()),
            Placeholder::Call { name: "random", args } => Ok(format!("%{{RANDOM:{}}}", args.join(","))),
            Placeholder::Name(other) => Err(SymbolError::resolution(other).into()),
            Placeholder::Call { name, .. } => Err(CodegenError::unknown_function(name)),
        }
    }

    #[test]
    fn test_names_and_calls() {
        let out = substitute("ip={inbound.ip} r={random(100)}", fake).unwrap();
        assert_eq!(out, "ip=%{IP:CLIENT} r=%{RANDOM:100}");
    }

    #[test]
    fn test_rule_syntax_is_untouched() {
        let out = substitute("%{STATE-FLAG:0} and {inbound.ip}", fake).unwrap();
        assert_eq!(out, "%{STATE-FLAG:0} and %{IP:CLIENT}");
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(substitute("no braces here", fake).unwrap(), "no braces here");
        assert_eq!(substitute("{ spaced }", fake).unwrap(), "{ spaced }");
    }

    #[test]
    fn test_failure_names_placeholder() {
        let err = substitute("x {bogus} y", fake).unwrap_err();
        assert_eq!(err.to_string(), "symbol error in {bogus}: Unknown symbol: bogus");
        assert_matches!(err, CodegenError::Interpolation { .. });
    }

    #[test]
    fn test_placeholder_parse() {
        assert_eq!(
            Placeholder::parse("cidr(24, 64)"),
            Placeholder::Call {
                name: "cidr",
                args: vec!["24", "64"]
            }
        );
        assert_eq!(
            Placeholder::parse("cache()"),
            Placeholder::Call {
                name: "cache",
                args: vec![]
            }
        );
    }
}
