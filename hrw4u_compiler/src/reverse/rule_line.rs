//! Line-level reading of header_rewrite rule text

use super::error::{ReverseError, ReverseResult};
use crate::tables::Section;

/// One classified line of rule text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleLine {
    /// Blank or `#` comment
    Blank,
    /// `cond %{<HOOK>}` opening a group
    Hook(Section),
    Cond { text: String, mods: Vec<String> },
    If,
    Elif,
    Else,
    Endif,
    Operator {
        name: String,
        args: Vec<String>,
        mods: Vec<String>,
    },
}

impl RuleLine {
    pub fn parse(line: &str) -> ReverseResult<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(RuleLine::Blank);
        }

        match trimmed {
            "if" => return Ok(RuleLine::If),
            "elif" => return Ok(RuleLine::Elif),
            "else" => return Ok(RuleLine::Else),
            "endif" => return Ok(RuleLine::Endif),
            _ => {}
        }

        let (body, mods) = split_modifiers(trimmed);

        if body == "cond" {
            return Err(ReverseError::malformed("'cond' without a condition"));
        }
        if let Some(rest) = body
            .strip_prefix("cond")
            .filter(|rest| rest.starts_with(char::is_whitespace))
        {
            let text = rest.trim().to_string();
            if let Some(section) = hook_marker(&text) {
                return Ok(RuleLine::Hook(section));
            }
            return Ok(RuleLine::Cond { text, mods });
        }

        let mut words = split_words(body)?.into_iter();
        let name = words
            .next()
            .ok_or_else(|| ReverseError::malformed("empty operator line"))?;
        Ok(RuleLine::Operator {
            name,
            args: words.collect(),
            mods,
        })
    }
}

fn hook_marker(text: &str) -> Option<Section> {
    let inner = text.strip_prefix("%{")?.strip_suffix('}')?;
    Section::from_hook(inner)
}

/// Split a trailing ` [A,B]` off a line, upper-casing the names
fn split_modifiers(line: &str) -> (&str, Vec<String>) {
    let Some(stripped) = line.strip_suffix(']') else {
        return (line, Vec::new());
    };
    let Some(open) = stripped.rfind('[') else {
        return (line, Vec::new());
    };

    let inner = &stripped[open + 1..];
    let body = &line[..open];
    let is_modifier_list = !inner.is_empty()
        && inner
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == ',' || c == ' ')
        && body.ends_with(char::is_whitespace);

    if !is_modifier_list {
        return (line, Vec::new());
    }

    let mods = inner
        .split(',')
        .map(|m| m.trim().to_ascii_uppercase())
        .filter(|m| !m.is_empty())
        .collect();
    (body.trim_end(), mods)
}

/// Whitespace-separated words; double-quoted words keep their quotes
pub fn split_words(text: &str) -> ReverseResult<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_quotes {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_quotes = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_quotes = true;
                current.push(c);
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if in_quotes {
        return Err(ReverseError::malformed("unterminated string"));
    }
    if !current.is_empty() {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_hook_marker() {
        assert_eq!(
            RuleLine::parse("cond %{REMAP_PSEUDO_HOOK} [AND]").unwrap(),
            RuleLine::Hook(Section::Remap)
        );
        assert_eq!(
            RuleLine::parse("cond %{SEND_RESPONSE_HDR_HOOK}").unwrap(),
            RuleLine::Hook(Section::SendResponse)
        );
    }

    #[test]
    fn test_condition_with_modifiers() {
        assert_eq!(
            RuleLine::parse("    cond %{CLIENT-URL:PATH} /^api/ [NOT,nocase]").unwrap(),
            RuleLine::Cond {
                text: "%{CLIENT-URL:PATH} /^api/".into(),
                mods: vec!["NOT".into(), "NOCASE".into()],
            }
        );
    }

    #[test]
    fn test_bracket_inside_regex_is_not_a_modifier() {
        assert_eq!(
            RuleLine::parse("cond %{METHOD} /[A-Z]/").unwrap(),
            RuleLine::Cond {
                text: "%{METHOD} /[A-Z]/".into(),
                mods: vec![],
            }
        );
    }

    #[test]
    fn test_operator_words() {
        assert_eq!(
            RuleLine::parse("  set-header X-Msg \"hello world\" [L]").unwrap(),
            RuleLine::Operator {
                name: "set-header".into(),
                args: vec!["X-Msg".into(), "\"hello world\"".into()],
                mods: vec!["L".into()],
            }
        );
        assert_eq!(RuleLine::parse("    no-op [L]").unwrap(), RuleLine::Operator {
            name: "no-op".into(),
            args: vec![],
            mods: vec!["L".into()],
        });
    }

    #[test]
    fn test_keywords_and_blanks() {
        assert_eq!(RuleLine::parse("elif").unwrap(), RuleLine::Elif);
        assert_eq!(RuleLine::parse("    endif").unwrap(), RuleLine::Endif);
        assert_eq!(RuleLine::parse("# comment").unwrap(), RuleLine::Blank);
        assert_eq!(RuleLine::parse("   ").unwrap(), RuleLine::Blank);
    }

    #[test]
    fn test_malformed_lines() {
        assert_matches!(RuleLine::parse("cond"), Err(ReverseError::MalformedRule { .. }));
        assert_matches!(
            RuleLine::parse("set-header X \"open"),
            Err(ReverseError::MalformedRule { .. })
        );
    }
}
