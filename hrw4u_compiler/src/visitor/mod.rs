//! Code generation: AST to header_rewrite rule lines
//!
//! The generator walks every section once, in source order. Each statement,
//! declaration and condition leaf is visited inside its own error boundary:
//! a failure becomes a positioned [`Hrw4uError`] in the [`ErrorCollector`]
//! and the walk moves on to the next sibling. Whether the compilation failed
//! is decided by the caller once the walk is over.

pub mod conditions;
pub mod error;
pub mod interpolation;

pub use conditions::{CondLine, CondState, Link};
pub use error::{CodegenError, CodegenResult};

use crate::config::runtime::CompilerPreferences;
use crate::debug::Dbg;
use crate::diagnostics::{wrap_error, DiagnosticCode, ErrorCollector};
use crate::grammar::{
    AssignOp, BodyItem, Block, CompareOp, Comparison, Conditional, Expr, ExprKind, FunctionCall,
    HookSection, Operand, Pattern, Program, Statement, Value, VarDecl,
};
use crate::logging::codes;
use crate::symbols::{SuffixGroup, Symbol, SymbolTable, VarType};
use crate::tables::{self, OperatorKind, Section};
use crate::utils::{SourceMap, Span, Spanned};
use crate::{log_debug, log_error, log_performance};
use interpolation::Placeholder;
use std::time::Instant;

/// One level of statement or condition nesting
pub const INDENT: &str = "    ";

/// Forward compiler state for one compilation
pub struct CodeGenerator<'a> {
    filename: &'a str,
    source: &'a SourceMap,
    symbols: &'a mut SymbolTable,
    errors: &'a mut ErrorCollector,
    dbg: &'a Dbg,
    prefs: &'a CompilerPreferences,
    output: Vec<String>,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(
        filename: &'a str,
        source: &'a SourceMap,
        symbols: &'a mut SymbolTable,
        errors: &'a mut ErrorCollector,
        dbg: &'a Dbg,
        prefs: &'a CompilerPreferences,
    ) -> Self {
        Self {
            filename,
            source,
            symbols,
            errors,
            dbg,
            prefs,
            output: Vec::new(),
        }
    }

    /// Emit the rule lines for `program`
    ///
    /// Declarations are bound first, then each hook section is emitted.
    /// Sections that produce output are separated by one blank line.
    pub fn generate(mut self, program: &Program) -> Vec<String> {
        let dbg = self.dbg;
        let _scope = dbg.scope("program");
        let started = Instant::now();

        for decl in program.var_declarations() {
            self.declare_variable(decl);
        }

        for hook in program.hook_sections() {
            let outer = std::mem::take(&mut self.output);
            self.visit_section(hook);
            let lines = std::mem::replace(&mut self.output, outer);

            if lines.is_empty() {
                continue;
            }
            if !self.output.is_empty() {
                self.output.push(String::new());
            }
            self.output.extend(lines);
        }

        log_performance!(
            codes::success::CODE_GENERATION_COMPLETE,
            "Code generation completed",
            duration = started.elapsed(),
            "lines" => self.output.len(),
            "errors" => self.errors.len()
        );

        self.output
    }

    // === ERROR BOUNDARY ===

    fn record<E>(&mut self, span: Span, err: &E)
    where
        E: std::error::Error + DiagnosticCode,
    {
        log_error!(err.diagnostic_code(), &err.to_string(), span = span);
        self.errors
            .add(wrap_error(self.filename, span, self.source, err));
    }

    // === DECLARATIONS ===

    fn declare_variable(&mut self, decl: &VarDecl) {
        let dbg = self.dbg;
        let _scope = dbg.scope("variable");

        let result = decl
            .type_name
            .value
            .parse::<VarType>()
            .and_then(|var_type| self.symbols.declare(&decl.name.value, var_type));

        match result {
            Ok(symbol) => dbg.trace(&format!("bind `{}' to {}", decl.name.value, symbol.as_cond())),
            Err(e) => self.record(decl.span, &CodegenError::from(e)),
        }
    }

    // === SECTIONS AND BLOCKS ===

    fn visit_section(&mut self, hook: &HookSection) {
        let dbg = self.dbg;
        let _scope = dbg.scope("section");
        let section = hook.hook;
        dbg.trace(&format!("`{}' -> `{}'", section.name(), section.hook()));

        let mut in_statement_block = false;
        for (idx, item) in hook.body.iter().enumerate() {
            let is_conditional = matches!(item, BodyItem::Conditional(_));
            if is_conditional || !in_statement_block {
                if idx > 0 {
                    self.output.push(String::new());
                }
                self.output.push(format!("cond %{{{}}} [AND]", section.hook()));
            }

            match item {
                BodyItem::Conditional(conditional) => {
                    self.visit_conditional(conditional, section, 0);
                    in_statement_block = false;
                }
                BodyItem::Statement(statement) => {
                    in_statement_block = true;
                    self.visit_statement(statement, section, 1);
                }
            }
        }
    }

    /// Conditions at `level`, guarded statements one level deeper
    fn visit_conditional(&mut self, conditional: &Conditional, section: Section, level: usize) {
        let dbg = self.dbg;
        let _scope = dbg.scope("conditional");

        self.emit_condition(&conditional.if_branch.condition, section, level);
        self.visit_block(&conditional.if_branch.block, section, level + 1);

        for branch in &conditional.elif_branches {
            self.push_line(level, "elif");
            self.emit_condition(&branch.condition, section, level + 1);
            self.visit_block(&branch.block, section, level + 2);
        }

        if let Some(block) = &conditional.else_block {
            self.push_line(level, "else");
            self.visit_block(block, section, level + 1);
        }
    }

    fn visit_block(&mut self, block: &Block, section: Section, level: usize) {
        let dbg = self.dbg;
        let _scope = dbg.scope("block");

        for item in &block.items {
            match item {
                BodyItem::Statement(statement) => self.visit_statement(statement, section, level),
                BodyItem::Conditional(conditional) => {
                    self.push_line(level, "if");
                    self.visit_conditional(conditional, section, level + 1);
                    self.push_line(level, "endif");
                }
            }
        }
    }

    fn push_line(&mut self, level: usize, text: &str) {
        self.output.push(format!("{}{}", INDENT.repeat(level), text));
    }

    // === CONDITIONS ===

    fn emit_condition(&mut self, expr: &Expr, section: Section, indent: usize) {
        let dbg = self.dbg;
        let _scope = dbg.scope("condition");

        let mut lines = Vec::new();
        self.build_expr(expr, section, indent, false, &mut lines);
        self.output
            .extend(lines.iter().map(|line| line.render(INDENT)));
    }

    fn build_expr(
        &mut self,
        expr: &Expr,
        section: Section,
        indent: usize,
        negate: bool,
        out: &mut Vec<CondLine>,
    ) {
        match &expr.kind {
            ExprKind::Or(_) | ExprKind::And(_) if negate => {
                self.build_group(expr, section, indent, true, out)
            }
            ExprKind::Or(parts) => self.build_chain(parts, Link::Or, section, indent, out),
            ExprKind::And(parts) => self.build_chain(parts, Link::And, section, indent, out),
            ExprKind::Not(inner) => self.build_expr(inner, section, indent, !negate, out),
            ExprKind::Group(inner) => self.build_group(inner, section, indent, negate, out),
            ExprKind::Bool(value) => {
                let text = if *value { "%{TRUE}" } else { "%{FALSE}" };
                out.push(CondLine::new(text, indent, CondState::negated(negate)));
            }
            ExprKind::Comparison(comparison) => {
                match self.comparison_line(comparison, section, indent, negate) {
                    Ok(line) => out.push(line),
                    Err(e) => self.record(expr.span, &e),
                }
            }
            ExprKind::Call(call) => match self.function_ref(call, section) {
                Ok(text) => out.push(CondLine::new(text, indent, CondState::negated(negate))),
                Err(e) => self.record(expr.span, &e),
            },
            ExprKind::Ident(name) => match self.ident_line(name, section, indent, negate) {
                Ok(line) => out.push(line),
                Err(e) => self.record(expr.span, &e),
            },
        }
    }

    fn build_chain(
        &mut self,
        parts: &[Expr],
        link: Link,
        section: Section,
        indent: usize,
        out: &mut Vec<CondLine>,
    ) {
        for (idx, part) in parts.iter().enumerate() {
            let before = out.len();
            self.build_expr(part, section, indent, false, out);

            if idx + 1 < parts.len() && out.len() > before {
                if let Some(last) = out.last_mut() {
                    last.state.link = Some(link);
                }
            }
        }
    }

    /// `%{GROUP}`, the inner conditions one level deeper, `%{GROUP:END}`
    fn build_group(
        &mut self,
        inner: &Expr,
        section: Section,
        indent: usize,
        negate: bool,
        out: &mut Vec<CondLine>,
    ) {
        self.dbg.trace("GROUP-START");
        out.push(CondLine::new("%{GROUP}", indent, CondState::default()));
        self.build_expr(inner, section, indent + 1, false, out);
        out.push(CondLine::new("%{GROUP:END}", indent, CondState::negated(negate)));
    }

    fn comparison_line(
        &self,
        comparison: &Comparison,
        section: Section,
        indent: usize,
        negate: bool,
    ) -> CodegenResult<CondLine> {
        let lhs = match &comparison.lhs {
            Operand::Ident(name) => self.condition_ref(&name.value, section)?,
            Operand::Call(call) => self.function_ref(call, section)?,
        };

        let rhs = match (&comparison.op, &comparison.rhs) {
            (_, Pattern::Regex(regex)) => regex.clone(),
            (_, Pattern::Set(values)) => format!("({})", join_values(values)),
            (_, Pattern::Ranges(ranges)) => format!("{{{}}}", ranges.join(",")),
            (CompareOp::Greater, Pattern::Value(value)) => format!(">{}", value.value),
            (CompareOp::Less, Pattern::Value(value)) => format!("<{}", value.value),
            (_, Pattern::Value(value)) => format!("={}", value.value),
        };

        let mut state = CondState::negated(negate ^ comparison.op.is_negated());
        for modifier in &comparison.modifiers {
            state.add_modifier(&modifier.value)?;
        }

        let text = format!("{} {}", lhs, rhs);
        self.dbg.trace(&format!("comparison: {}", text));
        Ok(CondLine::new(text, indent, state))
    }

    /// A bare name: state variable, plain condition or existence test
    fn ident_line(
        &self,
        name: &str,
        section: Section,
        indent: usize,
        negate: bool,
    ) -> CodegenResult<CondLine> {
        if let Some(symbol) = self.symbols.get(name) {
            return Ok(CondLine::new(symbol.as_cond(), indent, CondState::negated(negate)));
        }

        let resolved = tables::resolve_condition(name, section)?;
        if resolved.is_existence_test() {
            Ok(CondLine::new(
                format!("{} =\"\"", resolved.render()),
                indent,
                CondState::negated(!negate),
            ))
        } else {
            Ok(CondLine::new(resolved.render(), indent, CondState::negated(negate)))
        }
    }

    /// `%{STATE-...}` for state variables, the table target otherwise
    fn condition_ref(&self, name: &str, section: Section) -> CodegenResult<String> {
        if let Some(symbol) = self.symbols.get(name) {
            return Ok(symbol.as_cond());
        }
        Ok(tables::resolve_condition(name, section)?.render())
    }

    fn function_ref(&self, call: &FunctionCall, section: Section) -> CodegenResult<String> {
        let args: Vec<String> = call.args.iter().map(|arg| arg.value.text()).collect();
        render_function(&call.name.value, &args, section)
    }

    // === STATEMENTS ===

    fn visit_statement(&mut self, statement: &Statement, section: Section, level: usize) {
        let dbg = self.dbg;
        let _scope = dbg.scope("statement");

        match self.statement_line(statement, section) {
            Ok(line) => {
                dbg.trace(&line);
                self.push_line(level, &line);
            }
            Err(e) => self.record(statement.span(), &e),
        }
    }

    fn statement_line(&mut self, statement: &Statement, section: Section) -> CodegenResult<String> {
        match statement {
            Statement::Break { .. } => Ok("no-op [L]".to_string()),
            Statement::Call(call) => self.function_statement(call, section),
            Statement::Bare { name, .. } => {
                let entry = tables::resolve_statement_function(&name.value, section)
                    .map_err(|e| CodegenError::from_function_lookup(&name.value, e))?;
                if !entry.bare {
                    return Err(CodegenError::MissingArgument {
                        name: name.value.clone(),
                    });
                }
                Ok(entry.operator.to_string())
            }
            Statement::Assign {
                target, op, value, ..
            } => self.assignment(&target.value, *op, &value.value, section),
        }
    }

    fn function_statement(&self, call: &FunctionCall, section: Section) -> CodegenResult<String> {
        let name = call.name.value.as_str();
        let entry = tables::resolve_statement_function(name, section)
            .map_err(|e| CodegenError::from_function_lookup(name, e))?;

        if call.args.is_empty() && !entry.bare {
            return Err(CodegenError::MissingArgument {
                name: name.to_string(),
            });
        }

        let mut parts = vec![entry.operator.to_string()];
        if let Some(fixed) = entry.fixed_arg {
            parts.push(fixed.to_string());
        }
        for arg in &call.args {
            parts.push(match &arg.value {
                Value::String(text) => format!("\"{}\"", self.interpolate(text, section)?),
                other => other.to_string(),
            });
        }

        let mut line = parts.join(" ");
        if let Some(modifier) = entry.modifier {
            line.push_str(&format!(" [{}]", modifier));
        }
        Ok(line)
    }

    fn assignment(
        &mut self,
        target: &str,
        op: AssignOp,
        value: &Value,
        section: Section,
    ) -> CodegenResult<String> {
        if !target.contains('.') {
            return self.state_assignment(target, op, value);
        }

        let resolved = tables::resolve_operator(target, section)?;
        let suffix = resolved.suffix.as_deref().unwrap_or_default();
        let removes = matches!(value, Value::String(s) if s.is_empty());

        match resolved.entry.kind {
            OperatorKind::Header | OperatorKind::Cookie => {
                let noun = match resolved.entry.kind {
                    OperatorKind::Cookie => "cookie",
                    _ => "header",
                };
                if removes && op == AssignOp::Set {
                    return Ok(format!("rm-{} {}", noun, suffix));
                }
                let verb = match op {
                    AssignOp::Set => "set",
                    AssignOp::Append => "add",
                };
                let rhs = self.rhs_text(value, section)?;
                Ok(format!("{}-{} {} {}", verb, noun, suffix, rhs))
            }
            OperatorKind::Destination => {
                if op == AssignOp::Append {
                    return Err(CodegenError::AppendNotSupported {
                        target: target.to_string(),
                    });
                }
                if removes {
                    return Ok(format!("rm-destination {}", suffix));
                }
                let rhs = self.rhs_text(value, section)?;
                Ok(format!("set-destination {} {}", suffix, rhs))
            }
            OperatorKind::HttpCntl => {
                if op == AssignOp::Append {
                    return Err(CodegenError::AppendNotSupported {
                        target: target.to_string(),
                    });
                }
                let text = value.text();
                SuffixGroup::BoolFields
                    .validate(&text)
                    .map_err(|_| CodegenError::InvalidValue {
                        target: target.to_string(),
                        value: value.to_string(),
                    })?;
                Ok(format!("set-http-cntl {} {}", suffix, text))
            }
            OperatorKind::Simple(operator) => {
                if op == AssignOp::Append {
                    return Err(CodegenError::AppendNotSupported {
                        target: target.to_string(),
                    });
                }
                let rhs = self.rhs_text(value, section)?;
                Ok(format!("{} {}", operator, rhs))
            }
        }
    }

    /// Assignment to a dotless name, declaring it on first use
    fn state_assignment(&mut self, name: &str, op: AssignOp, value: &Value) -> CodegenResult<String> {
        if op == AssignOp::Append {
            return Err(CodegenError::AppendToVariable {
                name: name.to_string(),
            });
        }

        let symbol = match self.symbols.get(name) {
            Some(symbol) => symbol,
            None => {
                let inferred = match value {
                    Value::Ident(other) => self.symbols.get(other).map(|s| s.var_type),
                    Value::Number(text) => VarType::infer(text),
                    Value::Bool(b) => VarType::infer(&b.to_string()),
                    Value::String(_) | Value::Ip(_) => None,
                };
                let var_type = inferred.ok_or_else(|| CodegenError::CannotInferType {
                    name: name.to_string(),
                    value: value.to_string(),
                })?;
                log_debug!("Implicit state variable declaration",
                    "name" => name,
                    "type" => var_type
                );
                self.symbols.declare(name, var_type)?
            }
        };

        state_value(name, symbol, value, &*self.symbols).map(|text| symbol.as_operator(&text))
    }

    /// Right-hand side of an operator assignment
    fn rhs_text(&self, value: &Value, section: Section) -> CodegenResult<String> {
        match value {
            Value::String(text) => Ok(format!("\"{}\"", self.interpolate(text, section)?)),
            Value::Ident(name) => self.condition_ref(name, section),
            other => Ok(other.to_string()),
        }
    }

    fn interpolate(&self, text: &str, section: Section) -> CodegenResult<String> {
        if !self.prefs.enable_interpolation {
            return Ok(text.to_string());
        }

        interpolation::substitute(text, |placeholder| match placeholder {
            Placeholder::Name(name) => self.condition_ref(name, section),
            Placeholder::Call { name, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                render_function(name, &args, section)
            }
        })
    }
}

/// Text written into a state slot, checked against its type
fn state_value(
    name: &str,
    symbol: Symbol,
    value: &Value,
    symbols: &SymbolTable,
) -> CodegenResult<String> {
    let mismatch = || {
        CodegenError::from(crate::symbols::SymbolError::type_mismatch(
            name,
            symbol.var_type.type_str(),
            &value.to_string(),
        ))
    };

    let text = match value {
        Value::Ident(other) => match symbols.get(other) {
            Some(source) if source.var_type == symbol.var_type => return Ok(source.as_cond()),
            _ => return Err(mismatch()),
        },
        Value::Number(text) => text.clone(),
        Value::Bool(b) => b.to_string(),
        Value::String(_) | Value::Ip(_) => return Err(mismatch()),
    };

    if symbol.var_type.accepts(&text) {
        Ok(text)
    } else {
        Err(mismatch())
    }
}

/// `%{TARGET}` or `%{TARGET:a,b}`
fn render_function(name: &str, args: &[String], section: Section) -> CodegenResult<String> {
    let entry = tables::resolve_function(name, section)
        .map_err(|e| CodegenError::from_function_lookup(name, e))?;

    if args.is_empty() {
        Ok(format!("%{{{}}}", entry.target))
    } else {
        Ok(format!("%{{{}:{}}}", entry.target, args.join(",")))
    }
}

fn join_values(values: &[Spanned<Value>]) -> String {
    values
        .iter()
        .map(|v| v.value.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::tokenize;
    use crate::syntax::parse_program;

    struct Generated {
        lines: Vec<String>,
        symbols: SymbolTable,
        errors: ErrorCollector,
    }

    fn generate_with(source: &str, prefs: CompilerPreferences) -> Generated {
        let output = parse_program(tokenize(source).stream);
        assert!(!output.has_errors(), "unexpected syntax errors: {:?}", output.errors);

        let source_map = SourceMap::new(source.to_string());
        let mut symbols = SymbolTable::new();
        let mut errors = ErrorCollector::new();
        let dbg = Dbg::disabled();
        let lines = CodeGenerator::new(
            "test.hrw4u",
            &source_map,
            &mut symbols,
            &mut errors,
            &dbg,
            &prefs,
        )
        .generate(&output.program);

        Generated {
            lines,
            symbols,
            errors,
        }
    }

    fn generate(source: &str) -> Generated {
        generate_with(
            source,
            CompilerPreferences {
                debug_tracing: false,
                trace_indent: 0,
                enable_interpolation: true,
            },
        )
    }

    fn assert_lines(generated: &Generated, expected: &[&str]) {
        assert!(
            !generated.errors.has_errors(),
            "unexpected errors: {}",
            generated.errors.summary()
        );
        assert_eq!(generated.lines, expected);
    }

    #[test]
    fn test_declared_flag_assignment() {
        let generated = generate("VARS { f: bool; } READ_REQUEST { f = true; }");
        assert_lines(
            &generated,
            &["cond %{READ_REQUEST_HDR_HOOK} [AND]", "    set-state-flag 0 true"],
        );
        assert!(generated
            .symbols
            .validate()
            .variables
            .contains(&"f: bool".to_string()));
    }

    #[test]
    fn test_undeclared_reads_are_collected() {
        let generated = generate("REMAP {\n    if foo && bar {\n        break;\n    }\n}\n");
        assert_eq!(generated.errors.len(), 2);
        assert_eq!(
            generated
                .errors
                .count_with_code(codes::symbols::SYMBOL_RESOLUTION),
            2
        );
        assert!(generated.errors.summary().starts_with("Found 2 errors:"));
        assert_eq!(generated.errors.errors()[0].line, 2);
        assert_eq!(generated.errors.errors()[0].column, 7);
    }

    #[test]
    fn test_bare_prefix_names_need_a_field() {
        let generated = generate("REMAP {\n    inbound.req. = \"1\";\n}\n");
        assert_eq!(
            generated
                .errors
                .count_with_code(codes::symbols::SYMBOL_RESOLUTION),
            1
        );

        let generated = generate("REMAP {\n    if inbound.url. == \"x\" {\n        break;\n    }\n}\n");
        assert_eq!(
            generated
                .errors
                .count_with_code(codes::symbols::SYMBOL_RESOLUTION),
            1
        );
        assert_eq!(generated.errors.errors()[0].line, 2);
    }

    #[test]
    fn test_conditional_with_elif_and_else() {
        let source = r#"
REMAP {
    if inbound.req.X-Foo == "bar" || inbound.url.path !~ /^api/ with NOCASE {
        inbound.req.X-Seen = "yes";
    } elif (inbound.method == "GET" && now.HOUR > 5) {
        break;
    } else {
        outbound.req.X-Foo = "";
    }
}
"#;
        assert_lines(
            &generate(source),
            &[
                "cond %{REMAP_PSEUDO_HOOK} [AND]",
                "cond %{CLIENT-HEADER:X-Foo} =\"bar\" [OR]",
                "cond %{CLIENT-URL:PATH} /^api/ [NOT,NOCASE]",
                "    set-header X-Seen \"yes\"",
                "elif",
                "    cond %{GROUP}",
                "        cond %{METHOD} =\"GET\" [AND]",
                "        cond %{NOW:HOUR} >5",
                "    cond %{GROUP:END}",
                "        no-op [L]",
                "else",
                "    rm-header X-Foo",
            ],
        );
    }

    #[test]
    fn test_statement_groups_and_sections() {
        let source = r#"
SEND_RESPONSE {
    inbound.resp.X-A = "1";
    if inbound.status == 404 {
        inbound.status = 200;
    }
    inbound.resp.X-B += "2";
}

TXN_CLOSE {
    counter("done");
}
"#;
        assert_lines(
            &generate(source),
            &[
                "cond %{SEND_RESPONSE_HDR_HOOK} [AND]",
                "    set-header X-A \"1\"",
                "",
                "cond %{SEND_RESPONSE_HDR_HOOK} [AND]",
                "cond %{STATUS} =404",
                "    set-status 200",
                "",
                "cond %{SEND_RESPONSE_HDR_HOOK} [AND]",
                "    add-header X-B \"2\"",
                "",
                "cond %{TXN_CLOSE_HOOK} [AND]",
                "    counter \"done\"",
            ],
        );
    }

    #[test]
    fn test_negated_group_and_existence_tests() {
        let source = r#"
READ_REQUEST {
    if !(inbound.req.X-A || inbound.cookie.session) && true {
        keep_query("id");
    }
}
"#;
        assert_lines(
            &generate(source),
            &[
                "cond %{READ_REQUEST_HDR_HOOK} [AND]",
                "cond %{GROUP}",
                "    cond %{CLIENT-HEADER:X-A} =\"\" [NOT,OR]",
                "    cond %{COOKIE:session} =\"\" [NOT]",
                "cond %{GROUP:END} [NOT,AND]",
                "cond %{TRUE}",
                "    rm-destination QUERY \"id\" [I]",
            ],
        );
    }

    #[test]
    fn test_nested_conditional() {
        let source = r#"
REMAP {
    if inbound.method == "GET" {
        if random(10) {
            set-debug;
        }
    }
}
"#;
        assert_lines(
            &generate(source),
            &[
                "cond %{REMAP_PSEUDO_HOOK} [AND]",
                "cond %{METHOD} =\"GET\"",
                "    if",
                "        cond %{RANDOM:10}",
                "            set-debug",
                "    endif",
            ],
        );
    }

    #[test]
    fn test_sets_ranges_and_state_reads() {
        let source = r#"
VARS { hits: int8; seen: bool; }
REMAP {
    if inbound.method in ["GET", "HEAD"] && inbound.ip in {10.0.0.0/8, 192.168.0.0/16} && !seen {
        hits = 3;
        seen = true;
    }
}
"#;
        let generated = generate(source);
        assert_lines(
            &generated,
            &[
                "cond %{REMAP_PSEUDO_HOOK} [AND]",
                "cond %{METHOD} (\"GET\",\"HEAD\") [AND]",
                "cond %{IP:CLIENT} {10.0.0.0/8,192.168.0.0/16} [AND]",
                "cond %{STATE-FLAG:0} [NOT]",
                "    set-state-int8 0 3",
                "    set-state-flag 0 true",
            ],
        );
    }

    #[test]
    fn test_implicit_declaration_and_type_errors() {
        let generated = generate("REMAP {\n    count = 300;\n    count = 70000;\n    count += 1;\n}\n");
        assert_eq!(generated.symbols.get("count").map(|s| s.var_type), Some(VarType::Int16));
        assert_eq!(generated.lines[1], "    set-state-int16 0 300");
        assert_eq!(generated.errors.len(), 2);
        assert_eq!(generated.errors.count_with_code(codes::symbols::TYPE_MISMATCH), 1);
        assert!(generated.errors.errors()[1]
            .message
            .contains("Cannot use += operator with variables"));
    }

    #[test]
    fn test_uninferable_assignment() {
        let generated = generate("REMAP { name = \"text\"; }");
        assert_eq!(generated.errors.count_with_code(codes::symbols::TYPE_MISMATCH), 1);
        assert!(generated.symbols.is_empty());
    }

    #[test]
    fn test_interpolation() {
        let generated = generate(
            "READ_REQUEST { inbound.req.X-Client = \"ip={inbound.ip} r={random(10)}\"; }",
        );
        assert_lines(
            &generated,
            &[
                "cond %{READ_REQUEST_HDR_HOOK} [AND]",
                "    set-header X-Client \"ip=%{IP:CLIENT} r=%{RANDOM:10}\"",
            ],
        );

        let generated = generate("READ_REQUEST { inbound.req.X-Client = \"{nope}\"; }");
        assert_eq!(
            generated
                .errors
                .count_with_code(codes::codegen::INVALID_INTERPOLATION),
            1
        );
    }

    #[test]
    fn test_interpolation_can_be_disabled() {
        let generated = generate_with(
            "READ_REQUEST { inbound.req.X-Raw = \"{inbound.ip}\"; }",
            CompilerPreferences {
                debug_tracing: false,
                trace_indent: 0,
                enable_interpolation: false,
            },
        );
        assert_lines(
            &generated,
            &[
                "cond %{READ_REQUEST_HDR_HOOK} [AND]",
                "    set-header X-Raw \"{inbound.ip}\"",
            ],
        );
    }

    #[test]
    fn test_section_and_argument_errors() {
        let source = "SEND_RESPONSE {\n    skip-remap;\n    run-plugin;\n    inbound.url.path += \"x\";\n    http.cntl.LOGGING = maybe;\n}\n";
        let generated = generate(source);
        assert_eq!(generated.errors.count_with_code(codes::codegen::INVALID_IN_SECTION), 1);
        assert_eq!(generated.errors.count_with_code(codes::codegen::MISSING_ARGUMENT), 1);
        assert_eq!(
            generated
                .errors
                .count_with_code(codes::codegen::UNSUPPORTED_EXPRESSION),
            1
        );
        assert_eq!(generated.errors.count_with_code(codes::symbols::TYPE_MISMATCH), 1);
        assert_eq!(generated.lines, vec!["cond %{SEND_RESPONSE_HDR_HOOK} [AND]"]);
    }

    #[test]
    fn test_invalid_modifier_and_suffix() {
        let source = "REMAP {\n    if inbound.url.fragment == \"x\" || inbound.method == \"GET\" with SUF {\n        break;\n    }\n}\n";
        let generated = generate(source);
        assert_eq!(generated.errors.count_with_code(codes::symbols::INVALID_SUFFIX), 1);
        assert_eq!(generated.errors.count_with_code(codes::codegen::INVALID_MODIFIER), 1);
    }

    #[test]
    fn test_vars_errors_are_positioned() {
        let generated = generate("VARS {\n    a: float;\n}\n");
        assert_eq!(generated.errors.len(), 1);
        assert_eq!(generated.errors.errors()[0].line, 2);
        assert_eq!(generated.errors.errors()[0].code, codes::symbols::UNKNOWN_VAR_TYPE);
        assert!(generated.lines.is_empty());
    }
}
