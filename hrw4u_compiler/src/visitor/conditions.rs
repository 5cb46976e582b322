//! Condition lines and their bracketed modifiers

use crate::visitor::error::{CodegenError, CodegenResult};

/// How a condition links to the one after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    And,
    Or,
}

/// Modifiers rendered in `[...]` after a condition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CondState {
    pub not: bool,
    pub link: Option<Link>,
    pub last: bool,
    pub nocase: bool,
    pub ext: bool,
    pub pre: bool,
}

impl CondState {
    pub fn negated(not: bool) -> Self {
        Self {
            not,
            ..Self::default()
        }
    }

    /// Apply one `with` modifier, case-insensitive
    pub fn add_modifier(&mut self, modifier: &str) -> CodegenResult<()> {
        match modifier.to_ascii_uppercase().as_str() {
            "NOCASE" | "NC" | "I" => self.nocase = true,
            "EXT" => self.ext = true,
            "PRE" => self.pre = true,
            _ => {
                return Err(CodegenError::InvalidModifier {
                    modifier: modifier.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Modifier names in emission order
    pub fn to_list(&self) -> Vec<&'static str> {
        let mut mods = Vec::new();
        if self.not {
            mods.push("NOT");
        }
        match self.link {
            Some(Link::Or) => mods.push("OR"),
            Some(Link::And) => mods.push("AND"),
            None => {}
        }
        if self.last {
            mods.push("L");
        }
        if self.nocase {
            mods.push("NOCASE");
        }
        if self.ext {
            mods.push("EXT");
        }
        if self.pre {
            mods.push("PRE");
        }
        mods
    }

    /// ` [A,B]`, or nothing without modifiers
    pub fn suffix(&self) -> String {
        let mods = self.to_list();
        if mods.is_empty() {
            String::new()
        } else {
            format!(" [{}]", mods.join(","))
        }
    }
}

/// One `cond ...` line waiting for its link to be known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondLine {
    /// Text after `cond `
    pub text: String,
    pub indent: usize,
    pub state: CondState,
}

impl CondLine {
    pub fn new(text: impl Into<String>, indent: usize, state: CondState) -> Self {
        Self {
            text: text.into(),
            indent,
            state,
        }
    }

    pub fn render(&self, indent_unit: &str) -> String {
        format!(
            "{}cond {}{}",
            indent_unit.repeat(self.indent),
            self.text,
            self.state.suffix()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_modifier_order() {
        let mut state = CondState::negated(true);
        state.link = Some(Link::Or);
        state.add_modifier("ext").unwrap();
        state.add_modifier("NC").unwrap();
        assert_eq!(state.suffix(), " [NOT,OR,NOCASE,EXT]");
    }

    #[test]
    fn test_unknown_modifier() {
        let mut state = CondState::default();
        assert_matches!(
            state.add_modifier("SUF"),
            Err(CodegenError::InvalidModifier { modifier }) if modifier == "SUF"
        );
        assert_eq!(state.suffix(), "");
    }

    #[test]
    fn test_render() {
        let line = CondLine::new("%{GROUP}", 1, CondState::default());
        assert_eq!(line.render("    "), "    cond %{GROUP}");
    }
}
