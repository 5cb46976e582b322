//! Hook sections and the resolution tables for conditions, operators and
//! functions
//!
//! Every table is a static slice. Lookup tries an exact key first and then
//! the longest key ending in `.` that prefixes the symbol; the remainder is
//! the suffix, validated against the entry's [`SuffixGroup`] when it has one.

use crate::symbols::{SuffixGroup, SymbolError, SymbolResult};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// SECTIONS
// ============================================================================

/// A hook section of an hrw4u program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    TxnStart,
    PreRemap,
    Remap,
    ReadRequest,
    SendRequest,
    ReadResponse,
    SendResponse,
    TxnClose,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::TxnStart,
        Section::PreRemap,
        Section::Remap,
        Section::ReadRequest,
        Section::SendRequest,
        Section::ReadResponse,
        Section::SendResponse,
        Section::TxnClose,
    ];

    /// Every hook that carries an HTTP transaction
    pub const HTTP: [Section; 6] = [
        Section::PreRemap,
        Section::Remap,
        Section::ReadRequest,
        Section::SendRequest,
        Section::ReadResponse,
        Section::SendResponse,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Section::TxnStart => "TXN_START",
            Section::PreRemap => "PRE_REMAP",
            Section::Remap => "REMAP",
            Section::ReadRequest => "READ_REQUEST",
            Section::SendRequest => "SEND_REQUEST",
            Section::ReadResponse => "READ_RESPONSE",
            Section::SendResponse => "SEND_RESPONSE",
            Section::TxnClose => "TXN_CLOSE",
        }
    }

    /// Hook name used in the `cond %{<HOOK>} [AND]` marker
    pub fn hook(&self) -> &'static str {
        match self {
            Section::TxnStart => "TXN_START_HOOK",
            Section::PreRemap => "READ_REQUEST_PRE_REMAP_HOOK",
            Section::Remap => "REMAP_PSEUDO_HOOK",
            Section::ReadRequest => "READ_REQUEST_HDR_HOOK",
            Section::SendRequest => "SEND_REQUEST_HDR_HOOK",
            Section::ReadResponse => "READ_RESPONSE_HDR_HOOK",
            Section::SendResponse => "SEND_RESPONSE_HDR_HOOK",
            Section::TxnClose => "TXN_CLOSE_HOOK",
        }
    }

    /// Case-insensitive lookup by section name
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        Self::ALL.into_iter().find(|s| s.name() == upper)
    }

    pub fn from_hook(hook: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.hook() == hook)
    }

    /// Sections that see the client request headers
    pub fn is_request_side(&self) -> bool {
        matches!(
            self,
            Section::TxnStart | Section::PreRemap | Section::Remap | Section::ReadRequest
        )
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

use Section::*;

const HTTP: &[Section] = &Section::HTTP;
const ANY: &[Section] = &[];
const REQUEST_ONWARD: &[Section] = &[PreRemap, Remap, ReadRequest, SendRequest];
const RESPONSE_INBOUND: &[Section] = &[ReadResponse, SendResponse, TxnClose];
const REMAP_ONLY: &[Section] = &[PreRemap, Remap, ReadRequest];

// ============================================================================
// ENTRY TYPES
// ============================================================================

/// Fields shared by every table entry
pub trait TableEntry: 'static {
    fn key(&self) -> &'static str;

    /// Allowed sections; empty means every section
    fn sections(&self) -> &'static [Section];

    fn upper(&self) -> bool {
        false
    }

    fn suffix_group(&self) -> Option<SuffixGroup> {
        None
    }

    fn valid_in(&self, section: Section) -> bool {
        self.sections().is_empty() || self.sections().contains(&section)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionEntry {
    pub key: &'static str,
    /// Tag inside `%{...}`, without the suffix
    pub target: &'static str,
    pub sections: &'static [Section],
    pub upper: bool,
    pub suffix_group: Option<SuffixGroup>,
    /// Bare use tests existence: `<target> =""` with inverted negation
    pub existence: bool,
}

/// Shape of the operator an assignment compiles to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    /// `set-header` / `add-header` / `rm-header`
    Header,
    /// `set-cookie` / `add-cookie` / `rm-cookie`
    Cookie,
    /// `set-destination` / `rm-destination`
    Destination,
    /// `set-http-cntl`, value checked against BOOL_FIELDS
    HttpCntl,
    /// Single fixed operator taking only the value
    Simple(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorEntry {
    pub key: &'static str,
    pub sections: &'static [Section],
    pub upper: bool,
    pub suffix_group: Option<SuffixGroup>,
    pub kind: OperatorKind,
}

/// Condition function usable in expressions and interpolations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionEntry {
    pub key: &'static str,
    pub target: &'static str,
}

/// Function called as a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementFunctionEntry {
    pub key: &'static str,
    /// Emitted operator name
    pub operator: &'static str,
    /// Argument inserted before the user's arguments
    pub fixed_arg: Option<&'static str>,
    pub modifier: Option<&'static str>,
    pub sections: &'static [Section],
    /// Whether `name;` without arguments is accepted
    pub bare: bool,
}

impl TableEntry for ConditionEntry {
    fn key(&self) -> &'static str {
        self.key
    }
    fn sections(&self) -> &'static [Section] {
        self.sections
    }
    fn upper(&self) -> bool {
        self.upper
    }
    fn suffix_group(&self) -> Option<SuffixGroup> {
        self.suffix_group
    }
}

impl TableEntry for OperatorEntry {
    fn key(&self) -> &'static str {
        self.key
    }
    fn sections(&self) -> &'static [Section] {
        self.sections
    }
    fn upper(&self) -> bool {
        self.upper
    }
    fn suffix_group(&self) -> Option<SuffixGroup> {
        self.suffix_group
    }
}

impl TableEntry for FunctionEntry {
    fn key(&self) -> &'static str {
        self.key
    }
    fn sections(&self) -> &'static [Section] {
        ANY
    }
}

impl TableEntry for StatementFunctionEntry {
    fn key(&self) -> &'static str {
        self.key
    }
    fn sections(&self) -> &'static [Section] {
        self.sections
    }
}

// ============================================================================
// TABLES
// ============================================================================

const fn cond(key: &'static str, target: &'static str, sections: &'static [Section]) -> ConditionEntry {
    ConditionEntry {
        key,
        target,
        sections,
        upper: false,
        suffix_group: None,
        existence: false,
    }
}

const fn field(
    key: &'static str,
    target: &'static str,
    sections: &'static [Section],
    group: SuffixGroup,
    existence: bool,
) -> ConditionEntry {
    ConditionEntry {
        key,
        target,
        sections,
        upper: true,
        suffix_group: Some(group),
        existence,
    }
}

const fn header(key: &'static str, target: &'static str, sections: &'static [Section]) -> ConditionEntry {
    ConditionEntry {
        key,
        target,
        sections,
        upper: false,
        suffix_group: None,
        existence: true,
    }
}

use SuffixGroup::*;

pub static CONDITIONS: &[ConditionEntry] = &[
    cond("inbound.ip", "IP:CLIENT", ANY),
    cond("inbound.method", "METHOD", HTTP),
    cond("inbound.server", "IP:INBOUND", ANY),
    cond("inbound.status", "STATUS", HTTP),
    cond("now", "NOW", ANY),
    cond("outbound.ip", "IP:SERVER", HTTP),
    cond("outbound.method", "METHOD", REQUEST_ONWARD),
    cond("outbound.server", "IP:OUTBOUND", HTTP),
    cond("outbound.status", "STATUS", HTTP),
    cond("tcp.info", "TCP-INFO", ANY),
    header("capture.", "LAST-CAPTURE", ANY),
    field("from.url.", "FROM-URL", HTTP, UrlFields, true),
    field("geo.", "GEO", ANY, GeoFields, true),
    field("http.cntl.", "HTTP-CNTL", HTTP, HttpCntlFields, false),
    field("id.", "ID", ANY, IdFields, false),
    field("inbound.conn.client-cert.SAN.", "INBOUND:CLIENT-CERT:SAN", ANY, SanFields, true),
    field("inbound.conn.server-cert.SAN.", "INBOUND:SERVER-CERT:SAN", ANY, SanFields, true),
    field("inbound.conn.client-cert.san.", "INBOUND:CLIENT-CERT:SAN", ANY, SanFields, true),
    field("inbound.conn.server-cert.san.", "INBOUND:SERVER-CERT:SAN", ANY, SanFields, true),
    field("inbound.conn.client-cert.", "INBOUND:CLIENT-CERT", ANY, CertFields, true),
    field("inbound.conn.server-cert.", "INBOUND:SERVER-CERT", ANY, CertFields, true),
    field("inbound.conn.", "INBOUND", ANY, ConnFields, true),
    header("inbound.cookie.", "COOKIE", HTTP),
    header("inbound.req.", "CLIENT-HEADER", HTTP),
    header("inbound.resp.", "HEADER", RESPONSE_INBOUND),
    field("inbound.url.", "CLIENT-URL", HTTP, UrlFields, true),
    field("now.", "NOW", ANY, DateFields, false),
    field("outbound.conn.client-cert.SAN.", "OUTBOUND:CLIENT-CERT:SAN", HTTP, SanFields, true),
    field("outbound.conn.server-cert.SAN.", "OUTBOUND:SERVER-CERT:SAN", HTTP, SanFields, true),
    field("outbound.conn.client-cert.san.", "OUTBOUND:CLIENT-CERT:SAN", HTTP, SanFields, true),
    field("outbound.conn.server-cert.san.", "OUTBOUND:SERVER-CERT:SAN", HTTP, SanFields, true),
    field("outbound.conn.client-cert.", "OUTBOUND:CLIENT-CERT", HTTP, CertFields, true),
    field("outbound.conn.server-cert.", "OUTBOUND:SERVER-CERT", HTTP, CertFields, true),
    field("outbound.conn.", "OUTBOUND", HTTP, ConnFields, true),
    header("outbound.cookie.", "COOKIE", HTTP),
    header("outbound.req.", "HEADER", REQUEST_ONWARD),
    header("outbound.resp.", "HEADER", HTTP),
    field("outbound.url.", "NEXT-HOP", REQUEST_ONWARD, UrlFields, true),
    field("to.url.", "TO-URL", ANY, UrlFields, true),
];

const fn op(key: &'static str, sections: &'static [Section], kind: OperatorKind) -> OperatorEntry {
    OperatorEntry {
        key,
        sections,
        upper: false,
        suffix_group: None,
        kind,
    }
}

const fn op_field(
    key: &'static str,
    sections: &'static [Section],
    group: SuffixGroup,
    kind: OperatorKind,
) -> OperatorEntry {
    OperatorEntry {
        key,
        sections,
        upper: true,
        suffix_group: Some(group),
        kind,
    }
}

use OperatorKind::{Cookie, Destination, Header, HttpCntl, Simple};

pub static OPERATORS: &[OperatorEntry] = &[
    op_field("http.cntl.", HTTP, HttpCntlFields, HttpCntl),
    op("http.status.reason", HTTP, Simple("set-status-reason")),
    op("http.status", HTTP, Simple("set-status")),
    op("inbound.conn.dscp", HTTP, Simple("set-conn-dscp")),
    op("inbound.conn.mark", HTTP, Simple("set-conn-mark")),
    op("outbound.conn.dscp", REMAP_ONLY, Simple("set-conn-dscp")),
    op("outbound.conn.mark", REMAP_ONLY, Simple("set-conn-mark")),
    op("inbound.cookie.", HTTP, Cookie),
    op("inbound.req.", HTTP, Header),
    op("inbound.resp.body", HTTP, Simple("set-body")),
    op("inbound.resp.", RESPONSE_INBOUND, Header),
    op("inbound.status.reason", HTTP, Simple("set-status-reason")),
    op("inbound.status", HTTP, Simple("set-status")),
    op_field("inbound.url.", HTTP, UrlFields, Destination),
    op("outbound.cookie.", HTTP, Cookie),
    op("outbound.req.", REQUEST_ONWARD, Header),
    op("outbound.resp.", HTTP, Header),
    op("outbound.status.reason", HTTP, Simple("set-status-reason")),
    op("outbound.status", HTTP, Simple("set-status")),
    op_field("outbound.url.", REQUEST_ONWARD, UrlFields, Destination),
];

pub static FUNCTIONS: &[FunctionEntry] = &[
    FunctionEntry { key: "access", target: "ACCESS" },
    FunctionEntry { key: "cache", target: "CACHE" },
    FunctionEntry { key: "cidr", target: "CIDR" },
    FunctionEntry { key: "internal", target: "INTERNAL-TRANSACTION" },
    FunctionEntry { key: "random", target: "RANDOM" },
    FunctionEntry { key: "ssn-txn-count", target: "SSN-TXN-COUNT" },
    FunctionEntry { key: "txn-count", target: "TXN-COUNT" },
];

const fn stmt(key: &'static str, sections: &'static [Section], bare: bool) -> StatementFunctionEntry {
    StatementFunctionEntry {
        key,
        operator: key,
        fixed_arg: None,
        modifier: None,
        sections,
        bare,
    }
}

pub static STATEMENT_FUNCTIONS: &[StatementFunctionEntry] = &[
    stmt("add-header", HTTP, false),
    stmt("counter", ANY, false),
    stmt("set-debug", ANY, true),
    stmt("no-op", ANY, true),
    StatementFunctionEntry {
        key: "remove_query",
        operator: "rm-destination",
        fixed_arg: Some("QUERY"),
        modifier: None,
        sections: HTTP,
        bare: false,
    },
    StatementFunctionEntry {
        key: "keep_query",
        operator: "rm-destination",
        fixed_arg: Some("QUERY"),
        modifier: Some("I"),
        sections: HTTP,
        bare: false,
    },
    stmt("run-plugin", HTTP, false),
    stmt("set-body-from", HTTP, false),
    stmt("set-cc-alg", HTTP, false),
    stmt("set-config", HTTP, false),
    stmt("set-effective-address", HTTP, false),
    stmt("set-redirect", HTTP, false),
    stmt("skip-remap", &[PreRemap, ReadRequest], true),
    stmt("set-plugin-cntl", HTTP, false),
];

// ============================================================================
// RESOLUTION
// ============================================================================

/// A table hit, with the normalized suffix for prefix matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<E: 'static> {
    pub entry: &'static E,
    pub suffix: Option<String>,
}

impl Resolved<ConditionEntry> {
    /// `%{TARGET}` or `%{TARGET:SUFFIX}`
    pub fn render(&self) -> String {
        match &self.suffix {
            Some(suffix) => format!("%{{{}:{}}}", self.entry.target, suffix),
            None => format!("%{{{}}}", self.entry.target),
        }
    }

    /// Bare use of this condition compiles to an existence test
    pub fn is_existence_test(&self) -> bool {
        self.entry.existence && self.suffix.is_some()
    }
}

pub fn resolve_in_table<E: TableEntry>(
    table: &'static [E],
    symbol: &str,
    section: Section,
) -> SymbolResult<Resolved<E>> {
    // Prefix keys (`inbound.req.`) never match exactly; they need a suffix
    if let Some(entry) = table
        .iter()
        .find(|e| !e.key().ends_with('.') && e.key() == symbol)
    {
        if !entry.valid_in(section) {
            return Err(SymbolError::invalid_in_section(symbol, section.name()));
        }
        return Ok(Resolved {
            entry,
            suffix: None,
        });
    }

    let longest = table
        .iter()
        .filter(|e| e.key().ends_with('.') && symbol.starts_with(e.key()))
        .max_by_key(|e| e.key().len());

    let Some(entry) = longest else {
        return Err(SymbolError::resolution(symbol));
    };

    if !entry.valid_in(section) {
        return Err(SymbolError::invalid_in_section(symbol, section.name()));
    }

    let raw_suffix = &symbol[entry.key().len()..];
    if raw_suffix.is_empty() {
        return Err(SymbolError::resolution(symbol));
    }
    if let Some(group) = entry.suffix_group() {
        group.validate(raw_suffix)?;
    }

    let suffix = if entry.upper() {
        raw_suffix.to_ascii_uppercase()
    } else {
        raw_suffix.to_string()
    };

    Ok(Resolved {
        entry,
        suffix: Some(suffix),
    })
}

pub fn resolve_condition(symbol: &str, section: Section) -> SymbolResult<Resolved<ConditionEntry>> {
    resolve_in_table(CONDITIONS, symbol, section)
}

pub fn resolve_operator(symbol: &str, section: Section) -> SymbolResult<Resolved<OperatorEntry>> {
    resolve_in_table(OPERATORS, symbol, section)
}

pub fn resolve_function(name: &str, section: Section) -> SymbolResult<&'static FunctionEntry> {
    let resolved = resolve_in_table(FUNCTIONS, name, section)?;
    match resolved.suffix {
        None => Ok(resolved.entry),
        Some(_) => Err(SymbolError::resolution(name)),
    }
}

pub fn resolve_statement_function(
    name: &str,
    section: Section,
) -> SymbolResult<&'static StatementFunctionEntry> {
    let resolved = resolve_in_table(STATEMENT_FUNCTIONS, name, section)?;
    match resolved.suffix {
        None => Ok(resolved.entry),
        Some(_) => Err(SymbolError::resolution(name)),
    }
}

// ============================================================================
// INTROSPECTION
// ============================================================================

fn sorted_keys<E: TableEntry>(table: &'static [E]) -> Vec<String> {
    let mut keys: Vec<String> = table.iter().map(|e| e.key().to_string()).collect();
    keys.sort();
    keys.dedup();
    keys
}

pub fn condition_keys() -> Vec<String> {
    sorted_keys(CONDITIONS)
}

pub fn operator_keys() -> Vec<String> {
    sorted_keys(OPERATORS)
}

/// Condition functions and statement functions together
pub fn function_keys() -> Vec<String> {
    let mut keys = sorted_keys(FUNCTIONS);
    keys.extend(sorted_keys(STATEMENT_FUNCTIONS));
    keys.sort();
    keys.dedup();
    keys
}

pub fn section_names() -> Vec<String> {
    let mut names: Vec<String> = Section::ALL.iter().map(|s| s.name().to_string()).collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_section_lookup() {
        assert_eq!(Section::from_name("read_request"), Some(Section::ReadRequest));
        assert_eq!(Section::from_name("REMAP"), Some(Section::Remap));
        assert_eq!(Section::from_name("VARS"), None);
        assert_eq!(Section::ReadRequest.hook(), "READ_REQUEST_HDR_HOOK");
        assert_eq!(
            Section::from_hook("READ_REQUEST_PRE_REMAP_HOOK"),
            Some(Section::PreRemap)
        );
        assert!(!Section::HTTP.contains(&Section::TxnStart));
        assert!(!Section::HTTP.contains(&Section::TxnClose));
    }

    #[test]
    fn test_exact_match_wins_over_prefix() {
        let resolved = resolve_operator("inbound.resp.body", Section::SendResponse).unwrap();
        assert_eq!(resolved.entry.kind, OperatorKind::Simple("set-body"));
        assert_eq!(resolved.suffix, None);

        let resolved = resolve_operator("inbound.resp.X-Foo", Section::SendResponse).unwrap();
        assert_eq!(resolved.entry.kind, OperatorKind::Header);
        assert_eq!(resolved.suffix.as_deref(), Some("X-Foo"));
    }

    #[test]
    fn test_prefix_key_without_suffix_is_rejected() {
        assert_matches!(
            resolve_operator("inbound.req.", Section::Remap),
            Err(SymbolError::SymbolResolution { .. })
        );
        assert_matches!(
            resolve_condition("inbound.url.", Section::Remap),
            Err(SymbolError::SymbolResolution { .. })
        );
        assert_matches!(
            resolve_condition("now.", Section::Remap),
            Err(SymbolError::SymbolResolution { .. })
        );
    }

    #[test]
    fn test_longest_prefix_and_upper_casing() {
        let resolved =
            resolve_condition("inbound.conn.client-cert.san.dns", Section::ReadRequest).unwrap();
        assert_eq!(resolved.render(), "%{INBOUND:CLIENT-CERT:SAN:DNS}");

        let resolved = resolve_condition("inbound.url.path", Section::Remap).unwrap();
        assert_eq!(resolved.render(), "%{CLIENT-URL:PATH}");
        assert!(resolved.is_existence_test());

        let resolved = resolve_condition("inbound.req.X-Foo", Section::Remap).unwrap();
        assert_eq!(resolved.render(), "%{CLIENT-HEADER:X-Foo}");
    }

    #[test]
    fn test_section_restrictions() {
        let err = resolve_condition("inbound.method", Section::TxnStart).unwrap_err();
        assert_eq!(err.to_string(), "symbol 'inbound.method' not valid in section TXN_START");

        assert!(resolve_condition("inbound.ip", Section::TxnClose).is_ok());
        assert!(resolve_statement_function("skip-remap", Section::Remap).is_err());
        assert!(resolve_statement_function("skip-remap", Section::PreRemap).is_ok());
    }

    #[test]
    fn test_invalid_suffix_and_unknown_symbol() {
        let err = resolve_condition("geo.city", Section::Remap).unwrap_err();
        assert_matches!(err, SymbolError::InvalidSuffix { .. });

        let err = resolve_condition("bogus.thing", Section::Remap).unwrap_err();
        assert_matches!(err, SymbolError::SymbolResolution { ref name } if name == "bogus.thing");
    }

    #[test]
    fn test_introspection_is_sorted() {
        let keys = condition_keys();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert!(function_keys().contains(&"keep_query".to_string()));
        assert!(function_keys().contains(&"cidr".to_string()));
        assert_eq!(section_names().len(), 8);
    }
}
