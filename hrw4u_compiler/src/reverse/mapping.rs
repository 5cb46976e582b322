//! Inverse tables: rule conditions and operators back to hrw4u text

use super::error::{ReverseError, ReverseResult};
use crate::symbols::VarType;
use crate::tables::{
    ConditionEntry, OperatorKind, Section, TableEntry, CONDITIONS, FUNCTIONS, OPERATORS,
    STATEMENT_FUNCTIONS,
};
use crate::visitor::Link;
use std::collections::BTreeMap;

// === STATE VARIABLES ===

/// Placeholder names for every state slot seen in the rules
#[derive(Debug, Clone, Default)]
pub struct VarRegistry {
    highest: BTreeMap<VarType, usize>,
}

impl VarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_for(&mut self, var_type: VarType, index: usize) -> ReverseResult<String> {
        if index >= var_type.limit() {
            return Err(ReverseError::malformed(format!(
                "{} index {} is out of range (limit {})",
                var_type,
                index,
                var_type.limit()
            )));
        }
        let highest = self.highest.entry(var_type).or_insert(index);
        *highest = (*highest).max(index);
        Ok(placeholder_name(var_type, index))
    }

    pub fn is_empty(&self) -> bool {
        self.highest.is_empty()
    }

    /// `name: type;` for every index up to the highest one used, so that
    /// recompiling allocates the same slots
    pub fn declarations(&self) -> Vec<String> {
        self.highest
            .iter()
            .flat_map(|(var_type, highest)| {
                (0..=*highest).map(move |index| {
                    format!("{}: {};", placeholder_name(*var_type, index), var_type)
                })
            })
            .collect()
    }
}

fn placeholder_name(var_type: VarType, index: usize) -> String {
    format!("{}_{}", var_type.type_str(), index)
}

fn state_slot(tag_and_index: &str, vars: &mut VarRegistry) -> ReverseResult<String> {
    let (tag, index) = tag_and_index
        .split_once(':')
        .ok_or_else(|| ReverseError::malformed(format!("missing state index in %{{{}}}", tag_and_index)))?;
    let var_type = tag
        .strip_prefix("STATE-")
        .and_then(VarType::from_cond_tag)
        .ok_or_else(|| ReverseError::UnknownStateTag {
            tag: tag.to_string(),
        })?;
    let index = parse_index(index)?;
    vars.name_for(var_type, index)
}

fn parse_index(text: &str) -> ReverseResult<usize> {
    text.parse()
        .map_err(|_| ReverseError::malformed(format!("invalid state index '{}'", text)))
}

// === CONDITIONS ===

/// Modifiers of one `cond` line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CondMods {
    pub not: bool,
    pub link: Option<Link>,
    /// NOCASE, EXT, PRE in emission order
    pub with: Vec<&'static str>,
}

impl CondMods {
    pub fn parse(mods: &[String]) -> ReverseResult<Self> {
        let mut parsed = Self::default();
        let (mut nocase, mut ext, mut pre) = (false, false, false);

        for modifier in mods {
            match modifier.as_str() {
                "NOT" => parsed.not = true,
                "OR" => parsed.link = Some(Link::Or),
                "AND" => parsed.link = Some(Link::And),
                "L" => {}
                "NOCASE" | "NC" => nocase = true,
                "EXT" => ext = true,
                "PRE" => pre = true,
                other => {
                    return Err(ReverseError::malformed(format!(
                        "unknown condition modifier '{}'",
                        other
                    )))
                }
            }
        }

        for (set, name) in [(nocase, "NOCASE"), (ext, "EXT"), (pre, "PRE")] {
            if set {
                parsed.with.push(name);
            }
        }
        Ok(parsed)
    }
}

/// A condition line, reduced to what expression rebuilding needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CondPiece {
    GroupStart,
    GroupEnd { not: bool, link: Option<Link> },
    Term { expr: String, link: Option<Link> },
}

impl CondPiece {
    pub fn from_cond(
        text: &str,
        mods: &CondMods,
        section: Section,
        vars: &mut VarRegistry,
    ) -> ReverseResult<Self> {
        match text {
            "%{GROUP}" => Ok(CondPiece::GroupStart),
            "%{GROUP:END}" => Ok(CondPiece::GroupEnd {
                not: mods.not,
                link: mods.link,
            }),
            _ => Ok(CondPiece::Term {
                expr: condition_expr(text, mods, section, vars)?,
                link: mods.link,
            }),
        }
    }
}

/// Join the pieces of one condition list into an hrw4u expression
pub fn build_expression(pieces: &[CondPiece]) -> ReverseResult<String> {
    let mut stack: Vec<Vec<(String, Option<Link>)>> = vec![Vec::new()];

    for piece in pieces {
        match piece {
            CondPiece::GroupStart => stack.push(Vec::new()),
            CondPiece::GroupEnd { not, link } => {
                if stack.len() < 2 {
                    return Err(ReverseError::unbalanced("%{GROUP:END} without %{GROUP}"));
                }
                let inner = stack.pop().unwrap_or_default();
                if inner.is_empty() {
                    return Err(ReverseError::malformed("empty condition group"));
                }
                let expr = format!("{}({})", if *not { "!" } else { "" }, join_terms(&inner));
                if let Some(parent) = stack.last_mut() {
                    parent.push((expr, *link));
                }
            }
            CondPiece::Term { expr, link } => {
                if let Some(current) = stack.last_mut() {
                    current.push((expr.clone(), *link));
                }
            }
        }
    }

    if stack.len() != 1 {
        return Err(ReverseError::unbalanced("%{GROUP} without %{GROUP:END}"));
    }
    let terms = stack.pop().unwrap_or_default();
    if terms.is_empty() {
        return Err(ReverseError::malformed("empty condition"));
    }
    Ok(join_terms(&terms))
}

fn join_terms(terms: &[(String, Option<Link>)]) -> String {
    let mut out = String::new();
    for (idx, (expr, link)) in terms.iter().enumerate() {
        out.push_str(expr);
        if idx + 1 < terms.len() {
            out.push_str(match link {
                Some(Link::Or) => " || ",
                _ => " && ",
            });
        }
    }
    out
}

/// What a `%{...}` target names on the hrw4u side
struct TargetName {
    name: String,
    /// `=""` on this target means "exists"
    existence: bool,
}

fn split_target(text: &str) -> ReverseResult<(&str, &str)> {
    let rest = text
        .strip_prefix("%{")
        .ok_or_else(|| ReverseError::malformed(format!("expected %{{...}} in '{}'", text)))?;
    let end = rest
        .find('}')
        .ok_or_else(|| ReverseError::malformed(format!("unclosed %{{ in '{}'", text)))?;
    Ok((&rest[..end], rest[end + 1..].trim()))
}

fn condition_expr(
    text: &str,
    mods: &CondMods,
    section: Section,
    vars: &mut VarRegistry,
) -> ReverseResult<String> {
    let (inner, rest) = split_target(text)?;
    let bang = if mods.not { "!" } else { "" };

    if rest.is_empty() {
        match inner {
            "TRUE" => return Ok(format!("{}true", bang)),
            "FALSE" => return Ok(format!("{}false", bang)),
            _ => {}
        }
    }

    let target = target_name(inner, text, section, vars)?;
    let name = target.name;

    if rest.is_empty() {
        return Ok(format!("{}{}", bang, name));
    }

    let with = if mods.with.is_empty() {
        String::new()
    } else {
        format!(" with {}", mods.with.join(","))
    };

    if rest == "=\"\"" && target.existence {
        let inverted = if mods.not { "" } else { "!" };
        return Ok(format!("{}{}", inverted, name));
    }

    let expr = if let Some(value) = rest.strip_prefix('=') {
        let op = if mods.not { "!=" } else { "==" };
        format!("{} {} {}", name, op, hrw4u_value(value))
    } else if let Some(value) = rest.strip_prefix('>') {
        format!("{}{} > {}", bang, name, hrw4u_value(value))
    } else if let Some(value) = rest.strip_prefix('<') {
        format!("{}{} < {}", bang, name, hrw4u_value(value))
    } else if rest.starts_with('/') {
        let op = if mods.not { "!~" } else { "~" };
        format!("{} {} {}", name, op, rest)
    } else if let Some(inner) = rest.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        let values: Vec<String> = inner.split(',').map(|v| hrw4u_value(v.trim())).collect();
        format!("{}{} in [{}]", bang, name, values.join(", "))
    } else if let Some(inner) = rest.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
        let ranges: Vec<&str> = inner.split(',').map(str::trim).collect();
        format!("{}{} in {{{}}}", bang, name, ranges.join(", "))
    } else {
        return Err(ReverseError::malformed(format!(
            "unrecognized comparison '{}'",
            rest
        )));
    };

    Ok(format!("{}{}", expr, with))
}

fn target_name(
    inner: &str,
    text: &str,
    section: Section,
    vars: &mut VarRegistry,
) -> ReverseResult<TargetName> {
    if inner.starts_with("STATE-") {
        return Ok(TargetName {
            name: state_slot(inner, vars)?,
            existence: false,
        });
    }

    let (head, args) = match inner.split_once(':') {
        Some((head, args)) => (head, Some(args)),
        None => (inner, None),
    };
    if let Some(function) = FUNCTIONS.iter().find(|f| f.target == head) {
        let args: Vec<String> = args
            .map(|a| a.split(',').map(|v| hrw4u_value(v.trim())).collect())
            .unwrap_or_default();
        return Ok(TargetName {
            name: format!("{}({})", function.key, args.join(", ")),
            existence: false,
        });
    }

    let exact = CONDITIONS
        .iter()
        .filter(|e| !e.key.ends_with('.') && e.target == inner);
    if let Some(entry) = pick_for_section(exact, section) {
        return Ok(TargetName {
            name: entry.key.to_string(),
            existence: false,
        });
    }

    let longest = CONDITIONS
        .iter()
        .filter(|e| e.key.ends_with('.') && inner.starts_with(&format!("{}:", e.target)))
        .map(|e| e.target.len())
        .max();

    let Some(target_len) = longest else {
        return Err(ReverseError::UnknownCondition {
            condition: text.to_string(),
        });
    };

    let target = &inner[..target_len];
    let suffix = &inner[target_len + 1..];
    if suffix.is_empty() {
        return Err(ReverseError::UnknownCondition {
            condition: text.to_string(),
        });
    }
    let entry = if target == "HEADER" {
        header_condition_entry(section)
    } else {
        let candidates = CONDITIONS
            .iter()
            .filter(|e| e.key.ends_with('.') && e.target == target);
        pick_for_section(candidates, section)
    };
    let entry = entry.ok_or_else(|| ReverseError::UnknownCondition {
        condition: text.to_string(),
    })?;

    let suffix = if entry.upper {
        suffix.to_ascii_lowercase()
    } else {
        suffix.to_string()
    };

    Ok(TargetName {
        name: format!("{}{}", entry.key, suffix),
        existence: entry.existence,
    })
}

/// First entry valid in `section`, or the first one at all
fn pick_for_section<'e, I>(entries: I, section: Section) -> Option<&'e ConditionEntry>
where
    I: Iterator<Item = &'e ConditionEntry> + Clone,
{
    entries
        .clone()
        .find(|e| e.valid_in(section))
        .or_else(|| entries.clone().next())
}

fn header_condition_entry(section: Section) -> Option<&'static ConditionEntry> {
    let key = match section {
        Section::SendResponse | Section::TxnClose => "inbound.resp.",
        Section::ReadResponse => "outbound.resp.",
        _ => "outbound.req.",
    };
    CONDITIONS.iter().find(|e| e.key == key)
}

/// `10.0.0.1`, `10.0.0.0/8`, `::1`: reads back as a bare address literal
fn is_address(value: &str) -> bool {
    value.starts_with(|c: char| c.is_ascii_digit())
        && value.contains(['.', ':', '/'])
        && value
            .chars()
            .all(|c| c.is_ascii_hexdigit() || matches!(c, '.' | ':' | '/'))
}

/// Rule values that are not numbers, booleans, addresses or quoted strings get quoted
fn hrw4u_value(value: &str) -> String {
    let value = value.trim();
    let is_literal = value.starts_with('"')
        || value == "true"
        || value == "false"
        || (!value.is_empty() && value.chars().all(|c| c.is_ascii_digit()))
        || is_address(value);
    if is_literal {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('"', "\\\""))
    }
}

// === OPERATORS ===

fn header_operator_prefix(section: Section, noun: &str) -> String {
    let side = match section {
        Section::SendRequest => "outbound.req.",
        Section::ReadResponse => "outbound.resp.",
        Section::SendResponse | Section::TxnClose => "inbound.resp.",
        _ => "inbound.req.",
    };
    match noun {
        "cookie" if section.is_request_side() => "inbound.cookie.".to_string(),
        "cookie" => "outbound.cookie.".to_string(),
        _ => side.to_string(),
    }
}

/// Right-hand side of a reconstructed assignment
fn assignment_value(
    value: &str,
    section: Section,
    vars: &mut VarRegistry,
) -> ReverseResult<String> {
    if value.starts_with("%{") && value.ends_with('}') && !value.contains(' ') {
        let (inner, _) = split_target(value)?;
        return Ok(target_name(inner, value, section, vars)?.name);
    }
    Ok(hrw4u_value(value))
}

fn expect_args<'v>(operator: &str, args: &'v [String], count: usize) -> ReverseResult<&'v [String]> {
    if args.len() < count {
        return Err(ReverseError::malformed(format!(
            "'{}' expects {} argument(s), found {}",
            operator,
            count,
            args.len()
        )));
    }
    Ok(args)
}

/// One operator line as an hrw4u statement, `;` included
pub fn operator_statement(
    operator: &str,
    args: &[String],
    mods: &[String],
    section: Section,
    vars: &mut VarRegistry,
) -> ReverseResult<String> {
    if operator == "no-op" && mods.iter().any(|m| m == "L") {
        return Ok("break;".to_string());
    }

    if let Some(var_type) = state_operator(operator)? {
        let args = expect_args(operator, args, 2)?;
        let name = vars.name_for(var_type, parse_index(&args[0])?)?;
        let value = assignment_value(&args[1], section, vars)?;
        return Ok(format!("{} = {};", name, value));
    }

    match operator {
        "set-header" | "add-header" | "set-cookie" | "add-cookie" => {
            let args = expect_args(operator, args, 2)?;
            let (verb, noun) = operator.split_once('-').unwrap_or((operator, "header"));
            let op = if verb == "add" { "+=" } else { "=" };
            let target = format!("{}{}", header_operator_prefix(section, noun), args[0]);
            let value = assignment_value(&args[1..].join(" "), section, vars)?;
            return Ok(format!("{} {} {};", target, op, value));
        }
        "rm-header" | "rm-cookie" => {
            let args = expect_args(operator, args, 1)?;
            let noun = operator.trim_start_matches("rm-");
            return Ok(format!("{}{} = \"\";", header_operator_prefix(section, noun), args[0]));
        }
        "set-destination" => {
            let args = expect_args(operator, args, 2)?;
            let value = assignment_value(&args[1..].join(" "), section, vars)?;
            return Ok(format!("inbound.url.{} = {};", args[0].to_ascii_lowercase(), value));
        }
        "rm-destination" => {
            let args = expect_args(operator, args, 1)?;
            if args.len() > 1 && args[0].eq_ignore_ascii_case("QUERY") {
                let function = if mods.iter().any(|m| m == "I") {
                    "keep_query"
                } else {
                    "remove_query"
                };
                return Ok(format!("{}({});", function, call_args(&args[1..])));
            }
            return Ok(format!("inbound.url.{} = \"\";", args[0].to_ascii_lowercase()));
        }
        "set-http-cntl" => {
            let args = expect_args(operator, args, 2)?;
            return Ok(format!(
                "http.cntl.{} = {};",
                args[0].to_ascii_lowercase(),
                args[1]
            ));
        }
        _ => {}
    }

    let simple: Vec<_> = OPERATORS
        .iter()
        .filter(|e| matches!(e.kind, OperatorKind::Simple(name) if name == operator))
        .collect();
    if !simple.is_empty() {
        let entry = simple
            .iter()
            .find(|e| e.valid_in(section))
            .or_else(|| simple.first())
            .copied();
        if let Some(entry) = entry {
            let args = expect_args(operator, args, 1)?;
            let value = assignment_value(&args.join(" "), section, vars)?;
            return Ok(format!("{} = {};", entry.key, value));
        }
    }

    if let Some(entry) = STATEMENT_FUNCTIONS
        .iter()
        .find(|e| e.operator == operator && e.fixed_arg.is_none() && e.modifier.is_none())
    {
        if args.is_empty() {
            return Ok(format!("{};", entry.key));
        }
        return Ok(format!("{}({});", entry.key, call_args(args)));
    }

    Err(ReverseError::UnknownOperator {
        operator: operator.to_string(),
    })
}

fn state_operator(operator: &str) -> ReverseResult<Option<VarType>> {
    if !operator.starts_with("set-state-") {
        return Ok(None);
    }
    VarType::from_op_prefix(operator)
        .map(Some)
        .ok_or_else(|| ReverseError::UnknownStateTag {
            tag: operator.to_string(),
        })
}

fn call_args(args: &[String]) -> String {
    args.iter()
        .map(|a| hrw4u_value(a))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn cond(text: &str, mods: &[&str], section: Section) -> ReverseResult<String> {
        let mods: Vec<String> = mods.iter().map(|m| m.to_string()).collect();
        let mut vars = VarRegistry::new();
        condition_expr(text, &CondMods::parse(&mods)?, section, &mut vars)
    }

    fn op(line: &[&str], mods: &[&str], section: Section) -> ReverseResult<String> {
        let args: Vec<String> = line[1..].iter().map(|a| a.to_string()).collect();
        let mods: Vec<String> = mods.iter().map(|m| m.to_string()).collect();
        let mut vars = VarRegistry::new();
        operator_statement(line[0], &args, &mods, section, &mut vars)
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            cond("%{CLIENT-HEADER:X-Foo} =\"bar\"", &["NOT"], Section::Remap).unwrap(),
            "inbound.req.X-Foo != \"bar\""
        );
        assert_eq!(
            cond("%{CLIENT-URL:PATH} /^api/", &["NOT", "NOCASE"], Section::Remap).unwrap(),
            "inbound.url.path !~ /^api/ with NOCASE"
        );
        assert_eq!(
            cond("%{NOW:HOUR} >5", &[], Section::Remap).unwrap(),
            "now.hour > 5"
        );
        assert_eq!(
            cond("%{METHOD} (\"GET\",\"HEAD\")", &[], Section::Remap).unwrap(),
            "inbound.method in [\"GET\", \"HEAD\"]"
        );
        assert_eq!(
            cond("%{IP:CLIENT} {10.0.0.0/8,192.168.0.0/16}", &["NOT"], Section::Remap).unwrap(),
            "!inbound.ip in {10.0.0.0/8, 192.168.0.0/16}"
        );
        assert_eq!(
            cond("%{IP:CLIENT} =10.0.0.1", &["NOT"], Section::Remap).unwrap(),
            "inbound.ip != 10.0.0.1"
        );
        assert_eq!(
            cond("%{CLIENT-HEADER:X-Addr} =10.0.0.0/8", &[], Section::Remap).unwrap(),
            "inbound.req.X-Addr == 10.0.0.0/8"
        );
        assert_eq!(
            cond("%{CLIENT-HEADER:X-Ver} =1.2beta", &[], Section::Remap).unwrap(),
            "inbound.req.X-Ver == \"1.2beta\""
        );
    }

    #[test]
    fn test_existence_tests() {
        assert_eq!(
            cond("%{CLIENT-HEADER:X-A} =\"\"", &["NOT"], Section::ReadRequest).unwrap(),
            "inbound.req.X-A"
        );
        assert_eq!(
            cond("%{CLIENT-HEADER:X-A} =\"\"", &[], Section::ReadRequest).unwrap(),
            "!inbound.req.X-A"
        );
    }

    #[test]
    fn test_header_side_follows_section() {
        assert_eq!(
            cond("%{HEADER:X} =\"1\"", &[], Section::SendResponse).unwrap(),
            "inbound.resp.X == \"1\""
        );
        assert_eq!(
            cond("%{HEADER:X} =\"1\"", &[], Section::ReadResponse).unwrap(),
            "outbound.resp.X == \"1\""
        );
        assert_eq!(
            cond("%{HEADER:X} =\"1\"", &[], Section::Remap).unwrap(),
            "outbound.req.X == \"1\""
        );
    }

    #[test]
    fn test_state_functions_and_literals() {
        let mut vars = VarRegistry::new();
        let mods = CondMods::default();
        assert_eq!(
            condition_expr("%{STATE-INT8:2} =7", &mods, Section::Remap, &mut vars).unwrap(),
            "int8_2 == 7"
        );
        assert_eq!(
            vars.declarations(),
            vec!["int8_0: int8;", "int8_1: int8;", "int8_2: int8;"]
        );
        assert_eq!(cond("%{RANDOM:10}", &[], Section::Remap).unwrap(), "random(10)");
        assert_eq!(cond("%{TRUE}", &["NOT"], Section::Remap).unwrap(), "!true");
    }

    #[test]
    fn test_unknown_targets() {
        assert_matches!(
            cond("%{STATE-FLOAT:0}", &[], Section::Remap),
            Err(ReverseError::UnknownStateTag { tag }) if tag == "STATE-FLOAT"
        );
        assert_matches!(
            cond("%{NOPE} =1", &[], Section::Remap),
            Err(ReverseError::UnknownCondition { .. })
        );
        assert_matches!(
            cond("%{STATE-FLAG:16}", &[], Section::Remap),
            Err(ReverseError::MalformedRule { .. })
        );
    }

    #[test]
    fn test_empty_field_after_colon() {
        assert_matches!(
            cond("%{HEADER:} =\"x\"", &[], Section::Remap),
            Err(ReverseError::UnknownCondition { condition }) if condition.contains("HEADER:")
        );
        assert_matches!(
            cond("%{CLIENT-URL:} =\"x\"", &[], Section::Remap),
            Err(ReverseError::UnknownCondition { .. })
        );
    }

    #[test]
    fn test_build_expression_groups() {
        let pieces = vec![
            CondPiece::GroupStart,
            CondPiece::Term {
                expr: "a".into(),
                link: Some(Link::Or),
            },
            CondPiece::Term {
                expr: "b".into(),
                link: None,
            },
            CondPiece::GroupEnd {
                not: true,
                link: Some(Link::And),
            },
            CondPiece::Term {
                expr: "c".into(),
                link: None,
            },
        ];
        assert_eq!(build_expression(&pieces).unwrap(), "!(a || b) && c");

        assert_matches!(
            build_expression(&[CondPiece::GroupStart]),
            Err(ReverseError::UnbalancedGroup { .. })
        );
        assert_matches!(
            build_expression(&[CondPiece::GroupEnd {
                not: false,
                link: None
            }]),
            Err(ReverseError::UnbalancedGroup { .. })
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(op(&["no-op"], &["L"], Section::Remap).unwrap(), "break;");
        assert_eq!(
            op(&["set-state-flag", "0", "true"], &[], Section::Remap).unwrap(),
            "bool_0 = true;"
        );
        assert_eq!(
            op(&["set-header", "X-Seen", "\"yes\""], &[], Section::Remap).unwrap(),
            "inbound.req.X-Seen = \"yes\";"
        );
        assert_eq!(
            op(&["add-header", "X-B", "\"2\""], &[], Section::SendResponse).unwrap(),
            "inbound.resp.X-B += \"2\";"
        );
        assert_eq!(
            op(&["rm-header", "X-Foo"], &[], Section::SendRequest).unwrap(),
            "outbound.req.X-Foo = \"\";"
        );
        assert_eq!(
            op(&["rm-destination", "QUERY", "\"id\""], &["I"], Section::Remap).unwrap(),
            "keep_query(\"id\");"
        );
        assert_eq!(
            op(&["set-status", "200"], &[], Section::SendResponse).unwrap(),
            "http.status = 200;"
        );
        assert_eq!(
            op(&["counter", "\"done\""], &[], Section::TxnClose).unwrap(),
            "counter(\"done\");"
        );
        assert_eq!(op(&["set-debug"], &[], Section::Remap).unwrap(), "set-debug;");
    }

    #[test]
    fn test_unknown_operators() {
        assert_matches!(
            op(&["set-state-float", "0", "1"], &[], Section::Remap),
            Err(ReverseError::UnknownStateTag { .. })
        );
        assert_matches!(
            op(&["frobnicate", "1"], &[], Section::Remap),
            Err(ReverseError::UnknownOperator { operator }) if operator == "frobnicate"
        );
        assert_matches!(
            op(&["set-header", "X"], &[], Section::Remap),
            Err(ReverseError::MalformedRule { .. })
        );
    }
}
