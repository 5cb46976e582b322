//! Reverse compilation (u4wrh): header_rewrite rule text back to hrw4u
//!
//! Rule text is read one line at a time. Hook marker lines open groups; a
//! group whose first line is a condition becomes an `if` chain, any other
//! group becomes plain statements. Consecutive groups of one hook are
//! merged into a single section whenever recompiling the merged section
//! yields the same groups again.
//!
//! State slots have no names in rule text. Every slot read or written gets
//! a placeholder name (`bool_0`, `int8_1`, ...) declared in a leading
//! `VARS` block.

mod error;
mod mapping;
mod rule_line;

pub use error::{ReverseError, ReverseResult};
pub use mapping::VarRegistry;
pub use rule_line::RuleLine;

use crate::diagnostics::ErrorCollector;
use crate::logging::codes;
use crate::tables::Section;
use crate::{log_debug, log_error, log_success};
use mapping::{build_expression, operator_statement, CondMods, CondPiece};

const INDENT: &str = "    ";

/// Result of reverse compiling one rule file
#[derive(Debug)]
pub struct Decompilation {
    pub source: String,
    pub errors: ErrorCollector,
}

impl Decompilation {
    pub fn has_errors(&self) -> bool {
        self.errors.has_errors()
    }
}

/// Reverse compile `text`; diagnostics name `filename`
pub fn decompile(text: &str, filename: &str) -> Decompilation {
    let mut decompiler = Decompiler::new(filename);
    for (idx, line) in text.lines().enumerate() {
        let line_number = u32::try_from(idx + 1).unwrap_or(u32::MAX);
        decompiler.feed(line_number, line);
    }
    decompiler.finish()
}

// === RECONSTRUCTED TREE ===

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Statement(String),
    Conditional(CondBlock),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CondBlock {
    branches: Vec<(String, Vec<Item>)>,
    else_items: Option<Vec<Item>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Group {
    Statements(Vec<String>),
    Conditional(CondBlock),
}

#[derive(Debug)]
struct SectionOut {
    hook: Section,
    groups: Vec<Group>,
}

/// An `if` chain being read
#[derive(Debug)]
struct Frame {
    block: CondBlock,
    pending: Vec<CondPiece>,
    collecting: bool,
    in_else: bool,
    /// Opened by an `if` line, closed by `endif`
    nested: bool,
    start_line: (u32, String),
}

impl Frame {
    fn new(nested: bool, line: u32, text: &str) -> Self {
        Self {
            block: CondBlock::default(),
            pending: Vec::new(),
            collecting: true,
            in_else: false,
            nested,
            start_line: (line, text.to_string()),
        }
    }

    fn close_conditions(&mut self) -> ReverseResult<()> {
        if self.collecting {
            if self.pending.is_empty() {
                return Err(ReverseError::malformed("branch without conditions"));
            }
            let expr = build_expression(&self.pending)?;
            self.block.branches.push((expr, Vec::new()));
            self.pending.clear();
            self.collecting = false;
        }
        Ok(())
    }

    /// Statement list of the branch being filled
    fn items(&mut self) -> ReverseResult<&mut Vec<Item>> {
        self.close_conditions()?;
        if self.in_else {
            return Ok(self.block.else_items.get_or_insert_with(Vec::new));
        }
        self.block
            .branches
            .last_mut()
            .map(|(_, items)| items)
            .ok_or_else(|| ReverseError::malformed("statement before any condition"))
    }

    fn finish(mut self) -> ReverseResult<CondBlock> {
        self.close_conditions()?;
        Ok(self.block)
    }
}

#[derive(Debug)]
struct GroupBuilder {
    hook: Section,
    statements: Vec<String>,
    frames: Vec<Frame>,
}

impl GroupBuilder {
    fn new(hook: Section) -> Self {
        Self {
            hook,
            statements: Vec::new(),
            frames: Vec::new(),
        }
    }
}

// === DECOMPILER ===

struct Decompiler<'a> {
    filename: &'a str,
    vars: VarRegistry,
    errors: ErrorCollector,
    sections: Vec<SectionOut>,
    group: Option<GroupBuilder>,
}

impl<'a> Decompiler<'a> {
    fn new(filename: &'a str) -> Self {
        Self {
            filename,
            vars: VarRegistry::new(),
            errors: ErrorCollector::new(),
            sections: Vec::new(),
            group: None,
        }
    }

    fn record(&mut self, line: u32, text: &str, err: &ReverseError) {
        log_error!(err.error_code(), &err.to_string(), "line" => line);
        self.errors.add(err.at_line(self.filename, line, text));
    }

    fn feed(&mut self, line: u32, text: &str) {
        let result = RuleLine::parse(text).and_then(|parsed| self.apply(parsed, line, text));
        if let Err(e) = result {
            self.record(line, text, &e);
        }
    }

    /// Rules ahead of any hook marker belong to the remap hook
    fn group(&mut self) -> &mut GroupBuilder {
        self.group
            .get_or_insert_with(|| GroupBuilder::new(Section::Remap))
    }

    fn apply(&mut self, parsed: RuleLine, line: u32, text: &str) -> ReverseResult<()> {
        match parsed {
            RuleLine::Blank => Ok(()),
            RuleLine::Hook(section) => {
                self.close_group();
                log_debug!("Rule group", "hook" => section.hook(), "line" => line);
                self.group = Some(GroupBuilder::new(section));
                Ok(())
            }
            RuleLine::Cond { text: cond, mods } => {
                let hook = self.group().hook;
                let mods = CondMods::parse(&mods)?;
                let piece = CondPiece::from_cond(&cond, &mods, hook, &mut self.vars)?;

                let group = self.group();
                match group.frames.last_mut() {
                    None if !group.statements.is_empty() => Err(ReverseError::malformed(
                        "condition after an operator in the same group",
                    )),
                    None => {
                        let mut frame = Frame::new(false, line, text);
                        frame.pending.push(piece);
                        group.frames.push(frame);
                        Ok(())
                    }
                    Some(frame) if frame.collecting => {
                        frame.pending.push(piece);
                        Ok(())
                    }
                    Some(_) => Err(ReverseError::malformed(
                        "condition after an operator; expected 'elif', 'else' or 'if'",
                    )),
                }
            }
            RuleLine::Operator { name, args, mods } => {
                let hook = self.group().hook;
                let statement = operator_statement(&name, &args, &mods, hook, &mut self.vars)?;

                let group = self.group();
                match group.frames.last_mut() {
                    None => group.statements.push(statement),
                    Some(frame) => frame.items()?.push(Item::Statement(statement)),
                }
                Ok(())
            }
            RuleLine::Elif => {
                let frame = self.current_frame("elif")?;
                if frame.in_else {
                    return Err(ReverseError::malformed("'elif' after 'else'"));
                }
                frame.items()?;
                frame.collecting = true;
                Ok(())
            }
            RuleLine::Else => {
                let frame = self.current_frame("else")?;
                if frame.in_else {
                    return Err(ReverseError::malformed("second 'else'"));
                }
                frame.close_conditions()?;
                frame.in_else = true;
                frame.block.else_items = Some(Vec::new());
                Ok(())
            }
            RuleLine::If => {
                let parent = self.current_frame("if")?;
                parent.items()?;
                self.group().frames.push(Frame::new(true, line, text));
                Ok(())
            }
            RuleLine::Endif => {
                let group = self.group();
                match group.frames.last() {
                    Some(frame) if frame.nested => {}
                    _ => return Err(ReverseError::unbalanced("'endif' without 'if'")),
                }
                let Some(frame) = group.frames.pop() else {
                    return Err(ReverseError::unbalanced("'endif' without 'if'"));
                };
                let block = frame.finish()?;
                let parent = self.current_frame("endif")?;
                parent.items()?.push(Item::Conditional(block));
                Ok(())
            }
        }
    }

    fn current_frame(&mut self, keyword: &str) -> ReverseResult<&mut Frame> {
        self.group()
            .frames
            .last_mut()
            .ok_or_else(|| ReverseError::malformed(format!("'{}' outside of a conditional group", keyword)))
    }

    fn close_group(&mut self) {
        let Some(mut group) = self.group.take() else {
            return;
        };

        let mut conditional = None;
        while let Some(frame) = group.frames.pop() {
            let (line, text) = frame.start_line.clone();
            if frame.nested {
                self.record(line, &text, &ReverseError::unbalanced("'if' without 'endif'"));
                continue;
            }
            match frame.finish() {
                Ok(block) => conditional = Some(block),
                Err(e) => self.record(line, &text, &e),
            }
        }

        let built = match conditional {
            Some(block) => Group::Conditional(block),
            None if group.statements.is_empty() => return,
            None => Group::Statements(group.statements),
        };

        let is_conditional = matches!(built, Group::Conditional(_));
        if let Some(last) = self.sections.last_mut() {
            let previous_conditional = matches!(last.groups.last(), Some(Group::Conditional(_)));
            if last.hook == group.hook && (is_conditional || previous_conditional) {
                last.groups.push(built);
                return;
            }
        }

        self.sections.push(SectionOut {
            hook: group.hook,
            groups: vec![built],
        });
    }

    fn finish(mut self) -> Decompilation {
        self.close_group();

        let mut blocks = Vec::new();
        if !self.vars.is_empty() {
            let mut vars = vec!["VARS {".to_string()];
            vars.extend(
                self.vars
                    .declarations()
                    .into_iter()
                    .map(|decl| format!("{}{}", INDENT, decl)),
            );
            vars.push("}".to_string());
            blocks.push(vars.join("\n"));
        }
        blocks.extend(self.sections.iter().map(render_section));

        let mut source = blocks.join("\n\n");
        if !source.is_empty() {
            source.push('\n');
        }

        log_success!(
            codes::success::REVERSE_COMPILATION_COMPLETE,
            "Reverse compilation completed",
            "sections" => self.sections.len(),
            "errors" => self.errors.len()
        );

        Decompilation {
            source,
            errors: self.errors,
        }
    }
}

// === RENDERING ===

fn render_section(section: &SectionOut) -> String {
    let mut lines = vec![format!("{} {{", section.hook.name())];
    for (idx, group) in section.groups.iter().enumerate() {
        if idx > 0 {
            lines.push(String::new());
        }
        match group {
            Group::Statements(statements) => {
                lines.extend(statements.iter().map(|s| format!("{}{}", INDENT, s)));
            }
            Group::Conditional(block) => render_block(block, 1, &mut lines),
        }
    }
    lines.push("}".to_string());
    lines.join("\n")
}

fn render_block(block: &CondBlock, depth: usize, out: &mut Vec<String>) {
    let pad = INDENT.repeat(depth);
    for (idx, (expr, items)) in block.branches.iter().enumerate() {
        if idx == 0 {
            out.push(format!("{}if {} {{", pad, expr));
        } else {
            out.push(format!("{}}} elif {} {{", pad, expr));
        }
        render_items(items, depth + 1, out);
    }
    if let Some(items) = &block.else_items {
        out.push(format!("{}}} else {{", pad));
        render_items(items, depth + 1, out);
    }
    out.push(format!("{}}}", pad));
}

fn render_items(items: &[Item], depth: usize, out: &mut Vec<String>) {
    for item in items {
        match item {
            Item::Statement(statement) => out.push(format!("{}{}", INDENT.repeat(depth), statement)),
            Item::Conditional(block) => render_block(block, depth, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_and_conditional_groups() {
        let rules = "\
cond %{READ_REQUEST_HDR_HOOK} [AND]
    set-state-flag 0 true

cond %{READ_REQUEST_HDR_HOOK} [AND]
cond %{CLIENT-HEADER:X-Foo} =\"bar\" [OR]
cond %{STATE-FLAG:0}
    set-header X-Seen \"yes\"
elif
    cond %{GROUP}
        cond %{METHOD} =\"GET\" [AND]
        cond %{NOW:HOUR} >5
    cond %{GROUP:END} [NOT]
        no-op [L]
else
    rm-header X-Foo
";
        let result = decompile(rules, "rules.conf");
        assert!(!result.has_errors(), "{}", result.errors.summary());
        assert_eq!(
            result.source,
            "\
VARS {
    bool_0: bool;
}

READ_REQUEST {
    bool_0 = true;

    if inbound.req.X-Foo == \"bar\" || bool_0 {
        inbound.req.X-Seen = \"yes\";
    } elif !(inbound.method == \"GET\" && now.hour > 5) {
        break;
    } else {
        inbound.req.X-Foo = \"\";
    }
}
"
        );
    }

    #[test]
    fn test_statement_groups_of_one_hook_stay_apart() {
        let rules = "\
cond %{SEND_RESPONSE_HDR_HOOK} [AND]
    set-header X-A \"1\"

cond %{SEND_RESPONSE_HDR_HOOK} [AND]
    add-header X-B \"2\"
";
        let result = decompile(rules, "rules.conf");
        assert_eq!(
            result.source,
            "\
SEND_RESPONSE {
    inbound.resp.X-A = \"1\";
}

SEND_RESPONSE {
    inbound.resp.X-B += \"2\";
}
"
        );
    }

    #[test]
    fn test_nested_if() {
        let rules = "\
cond %{REMAP_PSEUDO_HOOK} [AND]
cond %{METHOD} =\"GET\"
    if
        cond %{RANDOM:10}
            set-debug
    endif
    counter \"x\"
";
        let result = decompile(rules, "rules.conf");
        assert!(!result.has_errors(), "{}", result.errors.summary());
        assert_eq!(
            result.source,
            "\
REMAP {
    if inbound.method == \"GET\" {
        if random(10) {
            set-debug;
        }
        counter(\"x\");
    }
}
"
        );
    }

    #[test]
    fn test_unknown_state_tag_is_positioned() {
        let rules = "cond %{REMAP_PSEUDO_HOOK} [AND]\ncond %{STATE-FLOAT:0}\n    no-op [L]\n";
        let result = decompile(rules, "rules.conf");
        assert_eq!(result.errors.len(), 1);

        let first = &result.errors.errors()[0];
        assert_eq!((first.line, first.column), (2, 0));
        assert_eq!(first.code, codes::reverse::UNKNOWN_STATE_TAG);
        assert_eq!(first.source_line.as_deref(), Some("cond %{STATE-FLOAT:0}"));
    }

    #[test]
    fn test_unbalanced_structure() {
        let result = decompile("cond %{REMAP_PSEUDO_HOOK}\ncond %{TRUE}\n    if\n", "r");
        assert_eq!(result.errors.count_with_code(codes::reverse::UNBALANCED_GROUP), 1);

        let result = decompile("cond %{REMAP_PSEUDO_HOOK}\n    endif\n", "r");
        assert_eq!(result.errors.count_with_code(codes::reverse::UNBALANCED_GROUP), 1);
    }

    #[test]
    fn test_rules_without_marker_default_to_remap() {
        let result = decompile("set-status 403\n", "r");
        assert_eq!(result.source, "REMAP {\n    http.status = 403;\n}\n");
    }

    #[test]
    fn test_empty_input() {
        let result = decompile("# nothing\n\n", "r");
        assert!(!result.has_errors());
        assert_eq!(result.source, "");
    }
}
