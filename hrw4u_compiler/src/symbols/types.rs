//! Closed type model: suffix groups, state variable types and symbols

use super::error::{SymbolError, SymbolResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named set of upper-case suffixes accepted after a table prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SuffixGroup {
    UrlFields,
    GeoFields,
    ConnFields,
    HttpCntlFields,
    IdFields,
    DateFields,
    BoolFields,
    CertFields,
    SanFields,
}

impl SuffixGroup {
    pub const ALL: [SuffixGroup; 9] = [
        SuffixGroup::UrlFields,
        SuffixGroup::GeoFields,
        SuffixGroup::ConnFields,
        SuffixGroup::HttpCntlFields,
        SuffixGroup::IdFields,
        SuffixGroup::DateFields,
        SuffixGroup::BoolFields,
        SuffixGroup::CertFields,
        SuffixGroup::SanFields,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SuffixGroup::UrlFields => "URL_FIELDS",
            SuffixGroup::GeoFields => "GEO_FIELDS",
            SuffixGroup::ConnFields => "CONN_FIELDS",
            SuffixGroup::HttpCntlFields => "HTTP_CNTL_FIELDS",
            SuffixGroup::IdFields => "ID_FIELDS",
            SuffixGroup::DateFields => "DATE_FIELDS",
            SuffixGroup::BoolFields => "BOOL_FIELDS",
            SuffixGroup::CertFields => "CERT_FIELDS",
            SuffixGroup::SanFields => "SAN_FIELDS",
        }
    }

    pub fn members(&self) -> &'static [&'static str] {
        match self {
            SuffixGroup::UrlFields => &["SCHEME", "HOST", "PORT", "PATH", "QUERY", "URL"],
            SuffixGroup::GeoFields => &["COUNTRY", "COUNTRY-ISO", "ASN", "ASN-NAME"],
            SuffixGroup::ConnFields => &[
                "LOCAL-ADDR",
                "LOCAL-PORT",
                "REMOTE-ADDR",
                "REMOTE-PORT",
                "TLS",
                "H2",
                "IPV4",
                "IPV6",
                "IP-FAMILY",
                "STACK",
            ],
            SuffixGroup::HttpCntlFields => &[
                "LOGGING",
                "INTERCEPT_RETRY",
                "RESP_CACHEABLE",
                "REQ_CACHEABLE",
                "SERVER_NO_STORE",
                "TXN_DEBUG",
                "SKIP_REMAP",
            ],
            SuffixGroup::IdFields => &["REQUEST", "PROCESS", "UNIQUE"],
            SuffixGroup::DateFields => &[
                "YEAR", "MONTH", "DAY", "HOUR", "MINUTE", "WEEKDAY", "YEARDAY",
            ],
            SuffixGroup::BoolFields => &["TRUE", "FALSE", "YES", "NO", "ON", "OFF", "0", "1"],
            SuffixGroup::CertFields => &[
                "PEM",
                "SIG",
                "SUBJECT",
                "ISSUER",
                "SERIAL",
                "NOT_BEFORE",
                "NOT_AFTER",
                "VERSION",
            ],
            SuffixGroup::SanFields => &["DNS", "IP", "EMAIL", "URI"],
        }
    }

    pub fn sorted_members(&self) -> Vec<&'static str> {
        let mut members = self.members().to_vec();
        members.sort_unstable();
        members
    }

    /// Case-insensitive membership check
    pub fn validate(&self, suffix: &str) -> SymbolResult<()> {
        let upper = suffix.to_ascii_uppercase();
        if self.members().contains(&upper.as_str()) {
            Ok(())
        } else {
            Err(SymbolError::InvalidSuffix {
                suffix: suffix.to_string(),
                allowed: self.sorted_members().join(", "),
            })
        }
    }
}

impl fmt::Display for SuffixGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State variable type, carrying its rule-language encoding and slot count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VarType {
    Bool,
    Int8,
    Int16,
}

impl VarType {
    pub const ALL: [VarType; 3] = [VarType::Bool, VarType::Int8, VarType::Int16];

    pub fn type_str(&self) -> &'static str {
        match self {
            VarType::Bool => "bool",
            VarType::Int8 => "int8",
            VarType::Int16 => "int16",
        }
    }

    /// Tag used in `%{STATE-<TAG>:<index>}`
    pub fn cond_tag(&self) -> &'static str {
        match self {
            VarType::Bool => "FLAG",
            VarType::Int8 => "INT8",
            VarType::Int16 => "INT16",
        }
    }

    pub fn op_prefix(&self) -> &'static str {
        match self {
            VarType::Bool => "set-state-flag",
            VarType::Int8 => "set-state-int8",
            VarType::Int16 => "set-state-int16",
        }
    }

    pub fn limit(&self) -> usize {
        match self {
            VarType::Bool => 16,
            VarType::Int8 => 4,
            VarType::Int16 => 1,
        }
    }


    pub fn from_cond_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.cond_tag() == tag)
    }

    pub fn from_op_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.op_prefix() == prefix)
    }

    /// Whether `value` is a literal that fits this type
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            VarType::Bool => matches!(value, "true" | "false"),
            VarType::Int8 => value.parse::<u8>().is_ok(),
            VarType::Int16 => value.parse::<u16>().is_ok(),
        }
    }

    /// Narrowest type holding `value`, for implicit declarations
    pub fn infer(value: &str) -> Option<Self> {
        if matches!(value, "true" | "false") {
            return Some(VarType::Bool);
        }
        match value.parse::<u32>() {
            Ok(n) if n <= u8::MAX as u32 => Some(VarType::Int8),
            Ok(n) if n <= u16::MAX as u32 => Some(VarType::Int16),
            _ => None,
        }
    }
}

/// Case-insensitive lookup by type string; `boolean` is accepted for `bool`
impl FromStr for VarType {
    type Err = SymbolError;

    fn from_str(s: &str) -> SymbolResult<Self> {
        let lower = s.to_ascii_lowercase();
        if lower == "boolean" {
            return Ok(VarType::Bool);
        }
        Self::ALL
            .into_iter()
            .find(|v| v.type_str() == lower)
            .ok_or_else(|| SymbolError::UnknownVarType {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_str())
    }
}

/// A state slot: one index of one variable type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub var_type: VarType,
    pub index: usize,
}

impl Symbol {
    pub fn new(var_type: VarType, index: usize) -> Self {
        debug_assert!(index < var_type.limit(), "state index out of range");
        Self { var_type, index }
    }

    pub fn as_cond(&self) -> String {
        format!("%{{STATE-{}:{}}}", self.var_type.cond_tag(), self.index)
    }

    pub fn as_operator(&self, value: &str) -> String {
        format!("{} {} {}", self.var_type.op_prefix(), self.index, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_var_type_from_str_round_trip() {
        for var_type in VarType::ALL {
            assert_eq!(var_type.type_str().parse::<VarType>().unwrap(), var_type);
            assert_eq!(
                VarType::from_str(&var_type.type_str().to_uppercase()).unwrap(),
                var_type
            );
        }
        assert_eq!("Boolean".parse::<VarType>().unwrap(), VarType::Bool);
    }

    #[test]
    fn test_var_type_unknown() {
        let err = "float".parse::<VarType>().unwrap_err();
        assert_matches!(err, SymbolError::UnknownVarType { .. });
        assert_eq!(err.to_string(), "Unknown VarType string: float");
    }

    #[test]
    fn test_var_type_constants() {
        assert_eq!(
            (VarType::Bool.cond_tag(), VarType::Bool.op_prefix(), VarType::Bool.limit()),
            ("FLAG", "set-state-flag", 16)
        );
        assert_eq!(
            (VarType::Int8.cond_tag(), VarType::Int8.op_prefix(), VarType::Int8.limit()),
            ("INT8", "set-state-int8", 4)
        );
        assert_eq!(
            (VarType::Int16.cond_tag(), VarType::Int16.op_prefix(), VarType::Int16.limit()),
            ("INT16", "set-state-int16", 1)
        );
        assert_eq!(VarType::from_cond_tag("INT8"), Some(VarType::Int8));
        assert_eq!(VarType::from_op_prefix("set-state-flag"), Some(VarType::Bool));
        assert_eq!(VarType::from_cond_tag("FLOAT"), None);
    }

    #[test]
    fn test_infer_and_accepts() {
        assert_eq!(VarType::infer("true"), Some(VarType::Bool));
        assert_eq!(VarType::infer("255"), Some(VarType::Int8));
        assert_eq!(VarType::infer("256"), Some(VarType::Int16));
        assert_eq!(VarType::infer("65536"), None);
        assert_eq!(VarType::infer("\"x\""), None);

        assert!(VarType::Int8.accepts("0"));
        assert!(!VarType::Int8.accepts("300"));
        assert!(!VarType::Bool.accepts("1"));
    }

    #[test]
    fn test_every_suffix_validates_in_any_case() {
        for group in SuffixGroup::ALL {
            for member in group.members() {
                assert!(group.validate(member).is_ok());
                assert!(group.validate(&member.to_lowercase()).is_ok());
            }
        }
    }

    #[test]
    fn test_invalid_suffix_lists_sorted_members() {
        let err = SuffixGroup::UrlFields.validate("fragment").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid suffix 'fragment'. Must be one of: HOST, PATH, PORT, QUERY, SCHEME, URL"
        );
    }

    #[test]
    fn test_symbol_formatting() {
        let symbol = Symbol::new(VarType::Int8, 2);
        assert_eq!(symbol.as_cond(), "%{STATE-INT8:2}");
        assert_eq!(symbol.as_operator("17"), "set-state-int8 2 17");
        assert_eq!(Symbol::new(VarType::Bool, 0).as_operator("true"), "set-state-flag 0 true");
    }
}
