//! Top-level splitting of a raw formula into its `~`/`|` delimited parts.

use log::trace;

use crate::error::{FormulaError, Result};

/// Fixed-effect group used when the formula does not name any.
pub const NO_FIXED_EFFECTS: &str = "0";

/// The raw `endogenous ~ instrument` block of an IV formula.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IvBlock {
    /// Left of `~`: the endogenous covariate(s).
    pub endogenous: String,
    /// Right of `~`: the instrument(s).
    pub instruments: String,
}

/// A formula split into its parts, still in compact syntax.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormulaParts {
    /// The whole formula with whitespace removed.
    pub cleaned: String,
    /// Left of the main `~`.
    pub depvars: String,
    /// Right of the main `~`.
    pub covars: String,
    /// Fixed-effect group, `"0"` when absent.
    pub fevars: String,
    /// The IV block, when present.
    pub iv: Option<IvBlock>,
}

/// Removes every whitespace character from `formula`.
pub fn strip_whitespace(formula: &str) -> String {
    formula.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Splits a formula of the form `Y1 + Y2 ~ X1 + X2 | FE1 + FE2 | X1 ~ Z1`.
pub fn split_formula(formula: &str) -> Result<FormulaParts> {
    let cleaned = strip_whitespace(formula);
    let segments: Vec<&str> = cleaned.split('|').collect();

    let (main, fevars, iv) = match segments.as_slice() {
        [main] => (*main, NO_FIXED_EFFECTS, None),
        [main, second] if second.contains('~') => {
            (*main, NO_FIXED_EFFECTS, Some(split_iv_block(&cleaned, second)?))
        }
        [main, fevars] => (*main, *fevars, None),
        [main, fevars, iv] => (*main, *fevars, Some(split_iv_block(&cleaned, iv)?)),
        _ => {
            return Err(FormulaError::syntax(
                &cleaned,
                format!(
                    "expected 1 to 3 `|`-separated parts, found {}",
                    segments.len()
                ),
            ))
        }
    };

    let (depvars, covars) = split_two_sided(&cleaned, main, "the main formula")?;
    if fevars.is_empty() {
        return Err(FormulaError::syntax(&cleaned, "empty fixed-effects part"));
    }

    trace!(
        "split `{cleaned}` into depvars `{depvars}`, covars `{covars}`, fevars `{fevars}`"
    );

    Ok(FormulaParts {
        depvars: depvars.to_string(),
        covars: covars.to_string(),
        fevars: fevars.to_string(),
        iv,
        cleaned,
    })
}

/// Splits the dependent variables on `+`, rejecting empty names.
pub fn split_depvars(cleaned: &str, depvars: &str) -> Result<Vec<String>> {
    depvars
        .split('+')
        .map(|name| {
            if name.is_empty() {
                Err(FormulaError::syntax(cleaned, "empty dependent variable name"))
            } else {
                Ok(name.to_string())
            }
        })
        .collect()
}

fn split_iv_block(cleaned: &str, block: &str) -> Result<IvBlock> {
    let (endogenous, instruments) = split_two_sided(cleaned, block, "the IV block")?;
    Ok(IvBlock {
        endogenous: endogenous.to_string(),
        instruments: instruments.to_string(),
    })
}

fn split_two_sided<'a>(cleaned: &str, part: &'a str, what: &str) -> Result<(&'a str, &'a str)> {
    let mut sides = part.split('~');
    match (sides.next(), sides.next(), sides.next()) {
        (Some(lhs), Some(rhs), None) if !lhs.is_empty() && !rhs.is_empty() => Ok((lhs, rhs)),
        (_, Some(_), None) => Err(FormulaError::syntax(
            cleaned,
            format!("both sides of `~` in {what} must be non-empty"),
        )),
        _ => Err(FormulaError::syntax(
            cleaned,
            format!("{what} must contain exactly one `~`"),
        )),
    }
}
