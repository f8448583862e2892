//! Expansion of an unpacked group into the concrete variable lists to estimate.
//!
//! Given constants `x` and a switch over `[a, b]`:
//!
//! | switch      | variants                 |
//! |-------------|--------------------------|
//! | `sw(a,b)`   | `x+a`, `x+b`             |
//! | `sw0(a,b)`  | `x`, `x+a`, `x+b`        |
//! | `csw(a,b)`  | `x+a`, `x+a+b`           |
//! | `csw0(a,b)` | `x`, `x+a`, `x+a+b`      |
//!
//! An interaction group is never expanded; it contributes a single
//! colon-joined token to the constant part.

use crate::error::{FormulaError, Result};
use crate::unpack::UnpackedGroup;

/// Variant emitted for "no switched variables" when the group has no constants.
pub const ZERO_VARIANT: &str = "0";

/// Expands `group` into its ordered, non-empty list of variants.
pub fn expand_group(group: &UnpackedGroup) -> Result<Vec<String>> {
    let mut constants: Vec<String> = group.constants().map(str::to_string).collect();
    if let Some(interaction) = group.interaction() {
        constants.push(interaction.term());
    }
    let constant_part = constants.join("+");

    let Some((kind, args)) = group.switch() else {
        if constant_part.is_empty() {
            return Err(FormulaError::syntax(
                "",
                "a group needs at least one variable or switch to estimate",
            ));
        }
        return Ok(vec![constant_part]);
    };

    let switched = args.iter().enumerate().map(|(k, arg)| {
        if kind.is_cumulative() {
            args[..=k].join("+")
        } else {
            arg.clone()
        }
    });

    let mut variants = Vec::with_capacity(args.len() + 1);
    if kind.has_zero_variant() {
        variants.push(if constant_part.is_empty() {
            ZERO_VARIANT.to_string()
        } else {
            constant_part.clone()
        });
    }
    variants.extend(switched.map(|variable| {
        if constant_part.is_empty() {
            variable
        } else {
            format!("{constant_part}+{variable}")
        }
    }));

    Ok(variants)
}
