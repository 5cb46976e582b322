//! AST node definitions for hrw4u source
//!
//! Every node carries the span of the source text it was parsed from so that
//! code generation can position its diagnostics. Literal text is stored as
//! written; conversion to rule syntax happens in the visitor.

use crate::tables::Section;
use crate::utils::{Span, Spanned};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier as written, dots and dashes included
pub type Identifier = String;

// === OPERATORS ===

/// Assignment operators (grammar: "=" | "+=")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignOp {
    Set,    // =
    Append, // +=
}

impl AssignOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "=",
            Self::Append => "+=",
        }
    }
}

/// Comparison operators (grammar: comparison)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Equal,    // ==
    NotEqual, // !=
    Greater,  // >
    Less,     // <
    Match,    // ~
    NotMatch, // !~
    In,       // in
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Greater => ">",
            Self::Less => "<",
            Self::Match => "~",
            Self::NotMatch => "!~",
            Self::In => "in",
        }
    }

    /// Whether the operator itself negates the condition
    pub fn is_negated(&self) -> bool {
        matches!(self, Self::NotEqual | Self::NotMatch)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// === VALUES ===

/// Value (grammar: STRING | NUMBER | "true" | "false" | IDENT | IPLIT)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Quoted string, content without the quotes
    String(String),
    Number(String),
    Bool(bool),
    Ident(Identifier),
    Ip(String),
}

impl Value {
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Text without quotes
    pub fn text(&self) -> String {
        match self {
            Self::String(s) | Self::Number(s) | Self::Ident(s) | Self::Ip(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
        }
    }

    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Self::Number(n) => n.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    /// Source form: strings come back quoted
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "\"{}\"", s),
            other => f.write_str(&other.text()),
        }
    }
}

// === CORE AST NODES ===

/// Root node
/// grammar: program := section*
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub sections: Vec<SectionBlock>,
    #[serde(skip)]
    pub span: Span,
}

impl Program {
    pub fn hook_sections(&self) -> impl Iterator<Item = &HookSection> {
        self.sections.iter().filter_map(|section| match section {
            SectionBlock::Hook(hook) => Some(hook),
            SectionBlock::Vars(_) => None,
        })
    }

    pub fn var_declarations(&self) -> impl Iterator<Item = &VarDecl> {
        self.sections
            .iter()
            .filter_map(|section| match section {
                SectionBlock::Vars(vars) => Some(vars.declarations.iter()),
                SectionBlock::Hook(_) => None,
            })
            .flatten()
    }
}

/// Top-level section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SectionBlock {
    Vars(VarsSection),
    Hook(HookSection),
}

impl SectionBlock {
    pub fn span(&self) -> Span {
        match self {
            Self::Vars(vars) => vars.span,
            Self::Hook(hook) => hook.span,
        }
    }
}

/// grammar: "VARS" "{" (IDENT ":" IDENT ";")* "}"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarsSection {
    pub declarations: Vec<VarDecl>,
    #[serde(skip)]
    pub span: Span,
}

/// grammar: IDENT ":" IDENT ";"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: Spanned<Identifier>,
    pub type_name: Spanned<Identifier>,
    #[serde(skip)]
    pub span: Span,
}

/// grammar: IDENT "{" section_body* "}"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookSection {
    pub name: Spanned<Identifier>,
    pub hook: Section,
    pub body: Vec<BodyItem>,
    #[serde(skip)]
    pub span: Span,
}

/// grammar: section_body := statement | conditional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyItem {
    Statement(Statement),
    Conditional(Conditional),
}

impl BodyItem {
    pub fn span(&self) -> Span {
        match self {
            Self::Statement(statement) => statement.span(),
            Self::Conditional(conditional) => conditional.span,
        }
    }
}

/// grammar: statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// "break" ";"
    Break {
        #[serde(skip)]
        span: Span,
    },
    /// IDENT "(" args ")" ";"
    Call(FunctionCall),
    /// IDENT ("=" | "+=") value ";"
    Assign {
        target: Spanned<Identifier>,
        op: AssignOp,
        value: Spanned<Value>,
        #[serde(skip)]
        span: Span,
    },
    /// IDENT ";"
    Bare {
        name: Spanned<Identifier>,
        #[serde(skip)]
        span: Span,
    },
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Self::Break { span } | Self::Assign { span, .. } | Self::Bare { span, .. } => *span,
            Self::Call(call) => call.span,
        }
    }
}

/// grammar: IDENT "(" (value ("," value)*)? ")"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: Spanned<Identifier>,
    pub args: Vec<Spanned<Value>>,
    #[serde(skip)]
    pub span: Span,
}

/// grammar: "if" expr block ("elif" expr block)* ("else" block)?
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditional {
    pub if_branch: Branch,
    pub elif_branches: Vec<Branch>,
    pub else_block: Option<Block>,
    #[serde(skip)]
    pub span: Span,
}

/// A condition with the block it guards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub condition: Expr,
    pub block: Block,
    #[serde(skip)]
    pub span: Span,
}

/// grammar: "{" section_body* "}"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub items: Vec<BodyItem>,
    #[serde(skip)]
    pub span: Span,
}

// === EXPRESSIONS ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    #[serde(skip)]
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// term ("||" term)+
    Or(Vec<Expr>),
    /// factor ("&&" factor)+
    And(Vec<Expr>),
    /// "!" factor
    Not(Box<Expr>),
    /// "(" expr ")"
    Group(Box<Expr>),
    Comparison(Comparison),
    Call(FunctionCall),
    Bool(bool),
    Ident(Identifier),
}

/// Left-hand side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Ident(Spanned<Identifier>),
    Call(FunctionCall),
}

impl Operand {
    pub fn span(&self) -> Span {
        match self {
            Self::Ident(ident) => ident.span,
            Self::Call(call) => call.span,
        }
    }
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    Value(Spanned<Value>),
    /// `/.../` with slashes
    Regex(String),
    /// "[" value ("," value)* "]"
    Set(Vec<Spanned<Value>>),
    /// "{" RANGE ("," RANGE)* "}"
    Ranges(Vec<String>),
}

/// grammar: comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub lhs: Operand,
    pub op: CompareOp,
    pub rhs: Pattern,
    /// Names after `with`, as written
    pub modifiers: Vec<Spanned<Identifier>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_forms() {
        assert_eq!(Value::String("a b".into()).to_string(), "\"a b\"");
        assert_eq!(Value::String("a b".into()).text(), "a b");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Number("255".into()).as_integer(), Some(255));
        assert_eq!(Value::Ident("x".into()).as_integer(), None);
    }

    #[test]
    fn test_compare_op_negation() {
        assert!(CompareOp::NotEqual.is_negated());
        assert!(CompareOp::NotMatch.is_negated());
        assert!(!CompareOp::In.is_negated());
    }
}
