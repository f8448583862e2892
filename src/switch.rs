//! Detection of the multiple-estimation keywords `sw`, `sw0`, `csw`, `csw0` and `i`.
//!
//! Because `csw(` textually contains `sw(` (and `csw0(` contains `sw0(`), the
//! keywords are tried through an ordered table, most specific first, and the
//! first structural match wins.

use std::fmt;
use std::str::FromStr;

use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{FormulaError, Result};

/// Keyword of a switch call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchKind {
    /// Independent switch: one model per argument.
    Sw,
    /// Independent switch preceded by a model without the switched variables.
    Sw0,
    /// Cumulative switch: each model adds the next argument.
    Csw,
    /// Cumulative switch preceded by a model without the switched variables.
    Csw0,
    /// Interaction group.
    I,
}

impl SwitchKind {
    /// The switch families in the order they are matched.
    pub const MATCH_ORDER: [SwitchKind; 5] = [
        SwitchKind::Csw0,
        SwitchKind::Csw,
        SwitchKind::Sw0,
        SwitchKind::Sw,
        SwitchKind::I,
    ];

    /// The keyword as written in formulas.
    pub fn keyword(self) -> &'static str {
        match self {
            SwitchKind::Sw => "sw",
            SwitchKind::Sw0 => "sw0",
            SwitchKind::Csw => "csw",
            SwitchKind::Csw0 => "csw0",
            SwitchKind::I => "i",
        }
    }

    /// Whether successive variants accumulate the switched arguments.
    pub fn is_cumulative(self) -> bool {
        matches!(self, SwitchKind::Csw | SwitchKind::Csw0)
    }

    /// Whether a leading "no switched variables" variant is emitted.
    pub fn has_zero_variant(self) -> bool {
        matches!(self, SwitchKind::Sw0 | SwitchKind::Csw0)
    }

    /// Whether this is `i()` rather than a switch family.
    pub fn is_interaction(self) -> bool {
        self == SwitchKind::I
    }
}

impl fmt::Display for SwitchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for SwitchKind {
    type Err = FormulaError;

    fn from_str(keyword: &str) -> Result<Self> {
        Self::MATCH_ORDER
            .into_iter()
            .find(|kind| kind.keyword() == keyword)
            .ok_or_else(|| FormulaError::UnsupportedSwitchType {
                keyword: keyword.to_string(),
                context: None,
            })
    }
}

/// A switch keyword together with its ordered arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwitchCall {
    /// Matched keyword.
    pub kind: SwitchKind,
    /// Comma-separated arguments, trimmed.
    pub args: Vec<String>,
}

static KEYWORD_TABLE: Lazy<Vec<(SwitchKind, Regex)>> = Lazy::new(|| {
    SwitchKind::MATCH_ORDER
        .into_iter()
        .map(|kind| {
            let pattern = format!(r"{}\((.*?)\)", regex::escape(kind.keyword()));
            let regex = Regex::new(&pattern).unwrap_or_else(|err| {
                unreachable!("keyword pattern `{pattern}` must compile: {err}")
            });
            (kind, regex)
        })
        .collect()
});

/// Searches `token` for a switch call.
///
/// Returns `None` when the token is a plain variable name. The match is not
/// anchored, so `log(csw(a,b))`-like wrappers are still recognized by their
/// innermost keyword.
pub fn find_switch(token: &str) -> Option<SwitchCall> {
    KEYWORD_TABLE.iter().find_map(|(kind, regex)| {
        let captures = regex.captures(token)?;
        let args = captures
            .get(1)
            .map(|inner| split_args(inner.as_str()))
            .unwrap_or_default();
        trace!("token `{token}` matched `{kind}` with {} argument(s)", args.len());
        Some(SwitchCall { kind: *kind, args })
    })
}

fn split_args(inner: &str) -> Vec<String> {
    inner.split(',').map(|arg| arg.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn call(kind: SwitchKind, args: &[&str]) -> Option<SwitchCall> {
        Some(SwitchCall {
            kind,
            args: args.iter().map(|a| a.to_string()).collect(),
        })
    }

    #[test]
    fn plain_names_have_no_switch() {
        assert_eq!(find_switch("X1"), None);
        assert_eq!(find_switch("switch"), None);
    }

    #[test]
    fn prefers_the_most_specific_keyword() {
        assert_eq!(find_switch("sw(a,b)"), call(SwitchKind::Sw, &["a", "b"]));
        assert_eq!(find_switch("csw(a,b)"), call(SwitchKind::Csw, &["a", "b"]));
        assert_eq!(find_switch("sw0(a,b)"), call(SwitchKind::Sw0, &["a", "b"]));
        assert_eq!(find_switch("csw0(a,b)"), call(SwitchKind::Csw0, &["a", "b"]));
    }

    #[test]
    fn detects_interactions_and_trims_arguments() {
        assert_eq!(
            find_switch("i(X1, X2=a)"),
            call(SwitchKind::I, &["X1", "X2=a"])
        );
    }

    #[test]
    fn keyword_round_trips_through_from_str() {
        for kind in SwitchKind::MATCH_ORDER {
            assert_eq!(kind.keyword().parse::<SwitchKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_keyword_is_unsupported() {
        let err = "mvsw".parse::<SwitchKind>().unwrap_err();
        assert!(matches!(err, FormulaError::UnsupportedSwitchType { .. }));
    }

    #[test]
    fn switch_semantics_flags() {
        assert!(SwitchKind::Csw0.is_cumulative());
        assert!(SwitchKind::Csw0.has_zero_variant());
        assert!(!SwitchKind::Sw.is_cumulative());
        assert!(SwitchKind::Sw0.has_zero_variant());
        assert!(SwitchKind::I.is_interaction());
    }
}
