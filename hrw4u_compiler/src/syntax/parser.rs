//! Recursive-descent parser for hrw4u with statement-level error recovery
//!
//! A failed production records its error and skips to the next `;` or to
//! the `}` closing the current block, so one pass reports every syntax
//! error and still yields a tree for the statements that parsed.

use crate::config::compile_time::syntax::*;
use crate::grammar::ast::nodes::*;
use crate::grammar::keywords::Keyword;
use crate::logging::codes;
use crate::syntax::error::{SyntaxError, SyntaxResult};
use crate::tables::Section;
use crate::tokens::{Token, TokenStream};
use crate::utils::{Span, Spanned};
use crate::{log_debug, log_error, log_success, log_warning};

const VARS_SECTION: &str = "VARS";

/// Tree plus every syntax error met on the way
#[derive(Debug)]
pub struct ParseOutput {
    pub program: Program,
    pub errors: Vec<SyntaxError>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

pub struct Hrw4uParser {
    tokens: TokenStream,
    context_stack: Vec<String>,
    errors: Vec<SyntaxError>,
    parse_depth: usize,
    seen_hook: bool,
}

impl Hrw4uParser {
    pub fn new(tokens: TokenStream) -> Self {
        log_debug!("Creating hrw4u parser", "tokens" => tokens.len());

        Self {
            tokens,
            context_stack: Vec::new(),
            errors: Vec::new(),
            parse_depth: 0,
            seen_hook: false,
        }
    }

    /// program := section*
    pub fn parse_program(mut self) -> ParseOutput {
        self.push_context("program");
        let start = self.tokens.save_position();
        let mut sections = Vec::new();

        while !self.tokens.is_at_end() && !self.error_limit_reached() {
            match self.parse_section() {
                Ok(Some(section)) => sections.push(section),
                Ok(None) => {}
                Err(error) => {
                    self.record_error(error);
                    self.skip_to_section_boundary();
                }
            }
        }

        let program = Program {
            sections,
            span: self.tokens.span_from(start),
        };
        self.pop_context();

        if self.errors.is_empty() {
            log_success!(codes::success::PARSE_COMPLETE, "Parsing completed",
                "sections" => program.sections.len()
            );
        } else {
            log_warning!("Parsing completed with errors",
                "sections" => program.sections.len(),
                "errors" => self.errors.len()
            );
        }

        ParseOutput {
            program,
            errors: self.errors,
        }
    }

    // === SECTIONS ===

    /// section := "VARS" "{" var_decl* "}" | IDENT "{" section_body* "}"
    ///
    /// Returns `None` for a section that was parsed for recovery but is
    /// not part of the tree (unknown name).
    fn parse_section(&mut self) -> SyntaxResult<Option<SectionBlock>> {
        let name = self.expect_identifier("section name")?;
        let open = self.tokens.expect_token(Token::LeftBrace)?;

        if name.value == VARS_SECTION {
            if self.seen_hook {
                self.record_error(SyntaxError::VarsNotFirst { span: name.span });
            }
            self.push_context(VARS_SECTION);
            let declarations = self.parse_var_declarations(&name.value);
            self.pop_context();
            let span = name.span.merge(self.tokens.previous_span().unwrap_or(open.span));
            return Ok(Some(SectionBlock::Vars(VarsSection { declarations, span })));
        }

        self.seen_hook = true;
        let hook = Section::from_name(&name.value);
        if hook.is_none() {
            self.record_error(SyntaxError::invalid_section(&name.value, name.span));
        }

        self.push_context(&name.value);
        let body = self.parse_body_items(&name.value);
        self.pop_context();

        let span = name.span.merge(self.tokens.previous_span().unwrap_or(open.span));
        Ok(hook.map(|hook| {
            log_debug!("Parsed section", "section" => hook, "items" => body.len());
            SectionBlock::Hook(HookSection {
                name,
                hook,
                body,
                span,
            })
        }))
    }

    /// (IDENT ":" IDENT ";")* "}"
    fn parse_var_declarations(&mut self, context: &str) -> Vec<VarDecl> {
        let mut declarations = Vec::new();

        loop {
            match self.tokens.current_token() {
                Some(Token::RightBrace) => {
                    self.tokens.advance();
                    break;
                }
                None | Some(Token::Eof) => {
                    let span = self.tokens.current_or_last_span();
                    self.record_error(SyntaxError::unclosed_block(context, span));
                    break;
                }
                _ => {}
            }

            match self.parse_var_declaration() {
                Ok(decl) => declarations.push(decl),
                Err(error) => {
                    self.record_error(error);
                    self.recover_in_block();
                }
            }

            if self.error_limit_reached() {
                break;
            }
        }

        declarations
    }

    fn parse_var_declaration(&mut self) -> SyntaxResult<VarDecl> {
        let name = self.expect_identifier("variable name")?;
        self.tokens.expect_token(Token::Colon)?;
        let type_name = self.expect_identifier("variable type")?;
        self.tokens.expect_token(Token::Semicolon)?;

        let span = name.span.merge(type_name.span);
        Ok(VarDecl {
            name,
            type_name,
            span,
        })
    }

    // === BLOCKS ===

    /// section_body* "}", the opening brace already consumed
    fn parse_body_items(&mut self, context: &str) -> Vec<BodyItem> {
        let mut items = Vec::new();

        loop {
            match self.tokens.current_token() {
                Some(Token::RightBrace) => {
                    self.tokens.advance();
                    break;
                }
                None | Some(Token::Eof) => {
                    let span = self.tokens.current_or_last_span();
                    self.record_error(SyntaxError::unclosed_block(context, span));
                    break;
                }
                _ => {}
            }

            let depth = self.parse_depth;
            match self.parse_body_item() {
                Ok(item) => items.push(item),
                Err(error) => {
                    // unwinding skipped the matching decrements
                    self.parse_depth = depth;
                    let halt = error.requires_halt();
                    self.record_error(error);
                    if halt {
                        self.skip_to_end();
                        break;
                    }
                    self.recover_in_block();
                }
            }

            if self.error_limit_reached() {
                self.skip_to_end();
                break;
            }
        }

        items
    }

    fn parse_body_item(&mut self) -> SyntaxResult<BodyItem> {
        if matches!(self.tokens.current_token(), Some(Token::Keyword(Keyword::If))) {
            self.parse_conditional().map(BodyItem::Conditional)
        } else {
            self.parse_statement().map(BodyItem::Statement)
        }
    }

    /// block := "{" section_body* "}"
    fn parse_block(&mut self, context: &str) -> SyntaxResult<Block> {
        self.enter_nesting()?;
        let open = self.tokens.expect_token(Token::LeftBrace)?;
        self.push_context(context);
        let items = self.parse_body_items(context);
        self.pop_context();
        self.parse_depth -= 1;

        let span = open.span.merge(self.tokens.previous_span().unwrap_or(open.span));
        Ok(Block { items, span })
    }

    /// conditional := "if" expr block ("elif" expr block)* ("else" block)?
    fn parse_conditional(&mut self) -> SyntaxResult<Conditional> {
        let start = self.tokens.save_position();
        let if_branch = self.parse_branch(Keyword::If)?;

        let mut elif_branches = Vec::new();
        while matches!(self.tokens.current_token(), Some(Token::Keyword(Keyword::Elif))) {
            elif_branches.push(self.parse_branch(Keyword::Elif)?);
        }

        let else_block = if self.consume_keyword(Keyword::Else) {
            Some(self.parse_block("else")?)
        } else {
            None
        };

        Ok(Conditional {
            if_branch,
            elif_branches,
            else_block,
            span: self.tokens.span_from(start),
        })
    }

    fn parse_branch(&mut self, keyword: Keyword) -> SyntaxResult<Branch> {
        let start = self.tokens.save_position();
        self.expect_keyword(keyword)?;
        let condition = self.parse_expr()?;
        let block = self.parse_block(keyword.as_str())?;

        Ok(Branch {
            condition,
            block,
            span: self.tokens.span_from(start),
        })
    }

    // === STATEMENTS ===

    /// statement := "break" ";" | IDENT "(" args ")" ";" | IDENT ("=" | "+=") value ";" | IDENT ";"
    fn parse_statement(&mut self) -> SyntaxResult<Statement> {
        let start = self.tokens.save_position();

        if self.consume_keyword(Keyword::Break) {
            self.tokens.expect_token(Token::Semicolon)?;
            return Ok(Statement::Break {
                span: self.tokens.span_from(start),
            });
        }

        let name = self.expect_identifier("statement")?;

        let statement = match self.tokens.current_token() {
            Some(Token::LeftParen) => {
                let args = self.parse_arguments()?;
                Statement::Call(FunctionCall {
                    name,
                    args,
                    span: self.tokens.span_from(start),
                })
            }
            Some(Token::Assign) | Some(Token::PlusAssign) => {
                let op = if self.tokens.advance_if_matches(&Token::Assign) {
                    AssignOp::Set
                } else {
                    self.tokens.advance();
                    AssignOp::Append
                };
                let value = self.parse_value()?;
                Statement::Assign {
                    target: name,
                    op,
                    value,
                    span: self.tokens.span_from(start),
                }
            }
            Some(Token::Semicolon) => Statement::Bare {
                span: name.span,
                name,
            },
            Some(Token::EqualEqual) => {
                return Err(SyntaxError::invalid_statement(
                    format!("'==' is a comparison; use '=' to assign to '{}'", name.value),
                    self.tokens.current_or_last_span(),
                ));
            }
            Some(other) => {
                return Err(SyntaxError::unexpected_token(
                    "'=', '+=', '(' or ';'",
                    &other.describe(),
                    self.tokens.current_or_last_span(),
                ));
            }
            None => {
                return Err(SyntaxError::unexpected_eof(
                    "statement",
                    self.tokens.current_or_last_span(),
                ))
            }
        };

        self.tokens.expect_token(Token::Semicolon)?;
        Ok(statement)
    }

    /// "(" (value ("," value)*)? ")"
    fn parse_arguments(&mut self) -> SyntaxResult<Vec<Spanned<Value>>> {
        self.tokens.expect_token(Token::LeftParen)?;
        let mut args = Vec::new();

        if self.tokens.advance_if_matches(&Token::RightParen) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_value()?);
            if !self.tokens.advance_if_matches(&Token::Comma) {
                break;
            }
        }

        self.tokens.expect_token(Token::RightParen)?;
        Ok(args)
    }

    /// value := STRING | NUMBER | "true" | "false" | IDENT | IPLIT
    fn parse_value(&mut self) -> SyntaxResult<Spanned<Value>> {
        let span = self.tokens.current_or_last_span();
        let value = match self.tokens.current_token() {
            Some(Token::StringLiteral(s)) => Value::String(s.clone()),
            Some(Token::Number(n)) => Value::Number(n.clone()),
            Some(Token::IpLiteral(ip)) => Value::Ip(ip.clone()),
            Some(Token::Identifier(name)) => Value::Ident(name.clone()),
            Some(Token::Keyword(Keyword::True)) => Value::Bool(true),
            Some(Token::Keyword(Keyword::False)) => Value::Bool(false),
            Some(Token::Eof) | None => return Err(SyntaxError::unexpected_eof("value", span)),
            Some(other) => {
                return Err(SyntaxError::unexpected_token("value", &other.describe(), span))
            }
        };
        self.tokens.advance();
        Ok(Spanned::new(value, span))
    }

    // === EXPRESSIONS ===

    /// expr := term ("||" term)*
    fn parse_expr(&mut self) -> SyntaxResult<Expr> {
        self.enter_nesting()?;
        let start = self.tokens.save_position();
        let mut terms = vec![self.parse_term()?];

        while self.tokens.advance_if_matches(&Token::OrOr) {
            terms.push(self.parse_term()?);
        }
        self.parse_depth -= 1;

        Ok(Self::fold(terms, ExprKind::Or, self.tokens.span_from(start)))
    }

    /// term := factor ("&&" factor)*
    fn parse_term(&mut self) -> SyntaxResult<Expr> {
        let start = self.tokens.save_position();
        let mut factors = vec![self.parse_factor()?];

        while self.tokens.advance_if_matches(&Token::AndAnd) {
            factors.push(self.parse_factor()?);
        }

        Ok(Self::fold(factors, ExprKind::And, self.tokens.span_from(start)))
    }

    fn fold(mut parts: Vec<Expr>, join: fn(Vec<Expr>) -> ExprKind, span: Span) -> Expr {
        if parts.len() == 1 {
            if let Some(single) = parts.pop() {
                return single;
            }
        }
        Expr::new(join(parts), span)
    }

    /// factor := "!" factor | "(" expr ")" | comparison | call | "true" | "false" | IDENT
    fn parse_factor(&mut self) -> SyntaxResult<Expr> {
        let start = self.tokens.save_position();
        let span = self.tokens.current_or_last_span();

        match self.tokens.current_token() {
            Some(Token::Bang) => {
                self.tokens.advance();
                self.enter_nesting()?;
                let inner = self.parse_factor()?;
                self.parse_depth -= 1;
                Ok(Expr::new(
                    ExprKind::Not(Box::new(inner)),
                    self.tokens.span_from(start),
                ))
            }
            Some(Token::LeftParen) => {
                self.tokens.advance();
                let inner = self.parse_expr()?;
                self.tokens.expect_token(Token::RightParen)?;
                Ok(Expr::new(
                    ExprKind::Group(Box::new(inner)),
                    self.tokens.span_from(start),
                ))
            }
            Some(Token::Keyword(Keyword::True)) => {
                self.tokens.advance();
                Ok(Expr::new(ExprKind::Bool(true), span))
            }
            Some(Token::Keyword(Keyword::False)) => {
                self.tokens.advance();
                Ok(Expr::new(ExprKind::Bool(false), span))
            }
            Some(Token::Identifier(_)) => {
                let name = self.expect_identifier("condition")?;
                let operand = if self.tokens.check_token(&Token::LeftParen) {
                    let args = self.parse_arguments()?;
                    Operand::Call(FunctionCall {
                        name,
                        args,
                        span: self.tokens.span_from(start),
                    })
                } else {
                    Operand::Ident(name)
                };

                match self.comparison_operator() {
                    Some(op) => {
                        let comparison = self.parse_comparison(operand, op)?;
                        Ok(Expr::new(
                            ExprKind::Comparison(comparison),
                            self.tokens.span_from(start),
                        ))
                    }
                    None => Ok(match operand {
                        Operand::Call(call) => {
                            let span = call.span;
                            Expr::new(ExprKind::Call(call), span)
                        }
                        Operand::Ident(ident) => Expr::new(ExprKind::Ident(ident.value), ident.span),
                    }),
                }
            }
            Some(Token::Eof) | None => Err(SyntaxError::unexpected_eof("condition", span)),
            Some(other) => Err(SyntaxError::unexpected_token(
                "condition",
                &other.describe(),
                span,
            )),
        }
    }

    fn comparison_operator(&self) -> Option<CompareOp> {
        match self.tokens.current_token()? {
            Token::EqualEqual => Some(CompareOp::Equal),
            Token::NotEqual => Some(CompareOp::NotEqual),
            Token::Greater => Some(CompareOp::Greater),
            Token::Less => Some(CompareOp::Less),
            Token::Tilde => Some(CompareOp::Match),
            Token::NotTilde => Some(CompareOp::NotMatch),
            Token::Keyword(Keyword::In) => Some(CompareOp::In),
            _ => None,
        }
    }

    /// Everything after the operand; the operator is still current
    fn parse_comparison(&mut self, lhs: Operand, op: CompareOp) -> SyntaxResult<Comparison> {
        self.tokens.advance();

        let rhs = match op {
            CompareOp::Match | CompareOp::NotMatch => {
                let span = self.tokens.current_or_last_span();
                match self.tokens.consume_if(|t| matches!(t, Token::Regex(_))) {
                    Some(Spanned {
                        value: Token::Regex(re),
                        ..
                    }) => Pattern::Regex(re),
                    _ => {
                        let found = self
                            .tokens
                            .current_token()
                            .map(Token::describe)
                            .unwrap_or_else(|| "end of file".to_string());
                        return Err(SyntaxError::unexpected_token("regex", &found, span));
                    }
                }
            }
            CompareOp::In => self.parse_in_pattern()?,
            _ => Pattern::Value(self.parse_value()?),
        };

        let modifiers = if self.consume_keyword(Keyword::With) {
            self.parse_modifier_list()?
        } else {
            Vec::new()
        };

        Ok(Comparison {
            lhs,
            op,
            rhs,
            modifiers,
        })
    }

    /// "[" value ("," value)* "]" | "{" RANGE ("," RANGE)* "}"
    fn parse_in_pattern(&mut self) -> SyntaxResult<Pattern> {
        if self.tokens.advance_if_matches(&Token::LeftBracket) {
            let mut values = vec![self.parse_value()?];
            while self.tokens.advance_if_matches(&Token::Comma) {
                values.push(self.parse_value()?);
            }
            self.tokens.expect_token(Token::RightBracket)?;
            return Ok(Pattern::Set(values));
        }

        if self.tokens.advance_if_matches(&Token::LeftBrace) {
            let mut ranges = vec![self.parse_range()?];
            while self.tokens.advance_if_matches(&Token::Comma) {
                ranges.push(self.parse_range()?);
            }
            self.tokens.expect_token(Token::RightBrace)?;
            return Ok(Pattern::Ranges(ranges));
        }

        let span = self.tokens.current_or_last_span();
        let found = self
            .tokens
            .current_token()
            .map(Token::describe)
            .unwrap_or_else(|| "end of file".to_string());
        Err(SyntaxError::unexpected_token("'[' or '{'", &found, span))
    }

    fn parse_range(&mut self) -> SyntaxResult<String> {
        let span = self.tokens.current_or_last_span();
        match self.tokens.current_token() {
            Some(Token::IpLiteral(text)) | Some(Token::Number(text)) => {
                let text = text.clone();
                self.tokens.advance();
                Ok(text)
            }
            Some(Token::Eof) | None => Err(SyntaxError::unexpected_eof("address range", span)),
            Some(other) => Err(SyntaxError::unexpected_token(
                "address range",
                &other.describe(),
                span,
            )),
        }
    }

    /// IDENT ("," IDENT)*, after `with`
    fn parse_modifier_list(&mut self) -> SyntaxResult<Vec<Spanned<Identifier>>> {
        let mut modifiers = vec![self.expect_identifier("modifier")?];
        while self.tokens.advance_if_matches(&Token::Comma) {
            modifiers.push(self.expect_identifier("modifier")?);
        }
        Ok(modifiers)
    }

    // === TOKEN HELPERS ===

    fn expect_identifier(&mut self, what: &str) -> SyntaxResult<Spanned<Identifier>> {
        let span = self.tokens.current_or_last_span();
        match self.tokens.current_token() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.tokens.advance();
                Ok(Spanned::new(name, span))
            }
            Some(Token::Eof) | None => Err(SyntaxError::unexpected_eof(what, span)),
            Some(other) => Err(SyntaxError::unexpected_token(what, &other.describe(), span)),
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> SyntaxResult<()> {
        self.tokens.expect_token(Token::Keyword(keyword))?;
        Ok(())
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        self.tokens
            .consume_if(|token| token.is_keyword(keyword))
            .is_some()
    }

    fn enter_nesting(&mut self) -> SyntaxResult<()> {
        if self.parse_depth >= MAX_PARSE_DEPTH {
            return Err(SyntaxError::MaxDepthExceeded {
                limit: MAX_PARSE_DEPTH,
                span: self.tokens.current_or_last_span(),
            });
        }
        self.parse_depth += 1;
        Ok(())
    }

    // === ERROR RECOVERY ===

    fn record_error(&mut self, error: SyntaxError) {
        log_error!(error.error_code(), "Syntax error",
            span = error.span(),
            "context" => self.current_context(),
            "error" => error.to_string()
        );
        self.errors.push(error);
    }

    fn error_limit_reached(&self) -> bool {
        self.errors.len() >= MAX_ERROR_HISTORY
    }

    /// Skip past the next `;`, or up to the `}` closing the current block
    fn recover_in_block(&mut self) {
        let start = self.tokens.position();
        let mut depth = 0usize;
        let mut scanned = 0usize;

        while !self.tokens.is_at_end() && scanned < MAX_RECOVERY_SCAN_TOKENS {
            match self.tokens.current_token() {
                Some(Token::LeftBrace) => depth += 1,
                Some(Token::RightBrace) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    if depth == 0 {
                        self.tokens.advance();
                        break;
                    }
                }
                Some(Token::Semicolon) if depth == 0 => {
                    self.tokens.advance();
                    break;
                }
                _ => {}
            }
            self.tokens.advance();
            scanned += 1;
        }

        log_debug!("Recovered from syntax error",
            "context" => self.current_context(),
            "tokens_skipped" => self.tokens.position() - start
        );
    }

    /// After a broken section header: skip to just past the matching `}`
    fn skip_to_section_boundary(&mut self) {
        let mut depth = 0usize;
        let mut scanned = 0usize;

        while !self.tokens.is_at_end() && scanned < MAX_RECOVERY_SCAN_TOKENS {
            match self.tokens.current_token() {
                Some(Token::LeftBrace) => depth += 1,
                Some(Token::RightBrace) => {
                    self.tokens.advance();
                    if depth <= 1 {
                        return;
                    }
                    depth -= 1;
                    continue;
                }
                _ => {}
            }
            self.tokens.advance();
            scanned += 1;
        }
    }

    fn skip_to_end(&mut self) {
        while !self.tokens.is_at_end() {
            self.tokens.advance();
        }
    }

    // === CONTEXT TRACKING ===

    fn push_context(&mut self, context: &str) {
        if self.context_stack.len() < MAX_CONTEXT_STACK_DEPTH {
            self.context_stack.push(context.to_string());
        }
    }

    fn pop_context(&mut self) {
        self.context_stack.pop();
    }

    pub fn current_context(&self) -> String {
        if self.context_stack.is_empty() {
            "top-level".to_string()
        } else {
            self.context_stack.join(" -> ")
        }
    }
}

/// Parse a token stream into a program, collecting syntax errors
pub fn parse_tokens(tokens: TokenStream) -> ParseOutput {
    Hrw4uParser::new(tokens).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::tokenize;
    use assert_matches::assert_matches;

    fn parse(source: &str) -> ParseOutput {
        let lexed = tokenize(source);
        assert!(!lexed.has_errors(), "lex errors: {:?}", lexed.errors);
        parse_tokens(lexed.stream)
    }

    fn first_hook(output: &ParseOutput) -> &HookSection {
        output
            .program
            .hook_sections()
            .next()
            .expect("a hook section")
    }

    #[test]
    fn test_vars_and_assignment() {
        let output = parse("VARS { f: bool; } READ_REQUEST { f = true; }");
        assert!(!output.has_errors(), "{:?}", output.errors);

        let decls: Vec<_> = output.program.var_declarations().collect();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name.value, "f");
        assert_eq!(decls[0].type_name.value, "bool");

        let hook = first_hook(&output);
        assert_eq!(hook.hook, Section::ReadRequest);
        assert_matches!(
            &hook.body[0],
            BodyItem::Statement(Statement::Assign { op: AssignOp::Set, value, .. })
                if value.value == Value::Bool(true)
        );
    }

    #[test]
    fn test_precedence() {
        let output = parse("REMAP { if a == \"x\" || b && !c { break; } }");
        assert!(!output.has_errors(), "{:?}", output.errors);

        let BodyItem::Conditional(cond) = &first_hook(&output).body[0] else {
            panic!("expected conditional");
        };
        let ExprKind::Or(terms) = &cond.if_branch.condition.kind else {
            panic!("expected ||");
        };
        assert_eq!(terms.len(), 2);
        assert_matches!(&terms[0].kind, ExprKind::Comparison(c) if c.op == CompareOp::Equal);
        let ExprKind::And(factors) = &terms[1].kind else {
            panic!("expected &&");
        };
        assert_matches!(&factors[1].kind, ExprKind::Not(_));
    }

    #[test]
    fn test_comparison_forms() {
        let output = parse(
            "REMAP {\n\
             if inbound.url.path ~ /^api/ with NOCASE,EXT && inbound.method in [\"GET\", \"HEAD\"] {\n\
                 no-op;\n\
             } elif inbound.ip in {10.0.0.0/8, 192.168.0.0/16} {\n\
                 set-debug;\n\
             } else {\n\
                 inbound.req.X-Foo = \"bar\";\n\
             }\n\
             }",
        );
        assert!(!output.has_errors(), "{:?}", output.errors);

        let BodyItem::Conditional(cond) = &first_hook(&output).body[0] else {
            panic!("expected conditional");
        };
        let ExprKind::And(factors) = &cond.if_branch.condition.kind else {
            panic!("expected &&");
        };
        let ExprKind::Comparison(regex) = &factors[0].kind else {
            panic!("expected comparison");
        };
        assert_eq!(regex.rhs, Pattern::Regex("/^api/".into()));
        assert_eq!(regex.modifiers.len(), 2);
        assert_matches!(&factors[1].kind, ExprKind::Comparison(c) if matches!(c.rhs, Pattern::Set(ref v) if v.len() == 2));

        assert_eq!(cond.elif_branches.len(), 1);
        assert_matches!(
            &cond.elif_branches[0].condition.kind,
            ExprKind::Comparison(c) if c.rhs == Pattern::Ranges(vec!["10.0.0.0/8".into(), "192.168.0.0/16".into()])
        );
        assert!(cond.else_block.is_some());
    }

    #[test]
    fn test_function_calls() {
        let output = parse("SEND_RESPONSE { if cidr(24, 64) { set-redirect(302, \"https://x/\"); } }");
        assert!(!output.has_errors(), "{:?}", output.errors);

        let BodyItem::Conditional(cond) = &first_hook(&output).body[0] else {
            panic!("expected conditional");
        };
        assert_matches!(&cond.if_branch.condition.kind, ExprKind::Call(call) if call.args.len() == 2);
        assert_matches!(
            &cond.if_branch.block.items[0],
            BodyItem::Statement(Statement::Call(call)) if call.name.value == "set-redirect"
        );
    }

    #[test]
    fn test_invalid_section_name() {
        let output = parse("BOGUS { x = 1; } REMAP { no-op; }");
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].to_string(), "Invalid section name: 'BOGUS'");
        assert_eq!(output.program.hook_sections().count(), 1);
    }

    #[test]
    fn test_vars_after_hook() {
        let output = parse("REMAP { no-op; } VARS { f: bool; }");
        assert_matches!(output.errors.as_slice(), [SyntaxError::VarsNotFirst { .. }]);
    }

    #[test]
    fn test_recovery_keeps_later_statements() {
        let output = parse("READ_REQUEST {\n  a = ;\n  b = 1;\n  c = true;\n}");
        assert_eq!(output.errors.len(), 1);
        assert_eq!(first_hook(&output).body.len(), 2);
    }

    #[test]
    fn test_recovery_inside_nested_block() {
        let output = parse("REMAP {\n  if a { b == 1; }\n  c = true;\n}");
        assert_eq!(output.errors.len(), 1);
        assert_matches!(output.errors[0], SyntaxError::InvalidStatement { .. });
        assert_eq!(first_hook(&output).body.len(), 2);
    }

    #[test]
    fn test_unclosed_block() {
        let output = parse("REMAP { no-op;");
        assert_matches!(output.errors.as_slice(), [SyntaxError::UnclosedBlock { .. }]);
    }

    #[test]
    fn test_missing_regex() {
        let output = parse("REMAP { if inbound.method ~ \"GET\" { no-op; } }");
        assert_matches!(output.errors.as_slice(), [SyntaxError::UnexpectedToken { expected, .. }] if expected == "regex");
    }
}
