//! Parsed fixest-style formulas.
//!
//! A [`Formulation`] is built once from a formula such as
//! `"Y1 + Y2 ~ X1 + csw0(X2, X3) | sw0(f1, f2) | X1 ~ Z1"` and keeps the
//! expanded variants of every part. It is immutable afterwards; the
//! [`dicts`](crate::dicts) functions derive estimation plans from it.

use std::str::FromStr;

use log::{debug, trace, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{FormulaError, Result};
use crate::expand::expand_group;
use crate::options::{DeterminacyCheck, ParseOptions};
use crate::switch::find_switch;
use crate::tokenizer::{split_depvars, split_formula, IvBlock};
use crate::unpack::{unpack_group, Interaction, UnpackedGroup};

/// An unpacked variable group together with its expanded variants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExpandedGroup {
    source: String,
    unpacked: UnpackedGroup,
    variants: Vec<String>,
}

impl ExpandedGroup {
    fn parse(source: &str) -> Result<Self> {
        let unpacked = unpack_group(source)?;
        let variants = expand_group(&unpacked).map_err(|err| match err {
            FormulaError::InvalidFormulaSyntax { reason, .. } => {
                FormulaError::syntax(source, reason)
            }
            other => other,
        })?;
        Ok(Self {
            source: source.to_string(),
            unpacked,
            variants,
        })
    }

    /// The group in compact syntax, whitespace removed.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The group's tagged terms.
    pub fn unpacked(&self) -> &UnpackedGroup {
        &self.unpacked
    }

    /// Concrete `+`-joined variable lists in estimation order.
    pub fn variants(&self) -> &[String] {
        &self.variants
    }
}

/// The instrumental-variable part of a formula.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InstrumentalVariables {
    endogenous: String,
    instrument: String,
    first_stage: ExpandedGroup,
}

impl InstrumentalVariables {
    /// The endogenous covariate.
    pub fn endogenous(&self) -> &str {
        &self.endogenous
    }

    /// The instrument that replaces it in the first stage.
    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// Covariates of the first stage: the endogenous variable replaced by the instrument.
    pub fn first_stage(&self) -> &ExpandedGroup {
        &self.first_stage
    }
}

/// A parsed multiple-estimation formula.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Formulation {
    expression: String,
    depvars: Vec<String>,
    covars: ExpandedGroup,
    fevars: ExpandedGroup,
    iv: Option<InstrumentalVariables>,
}

impl Formulation {
    /// Parses `formula` with the default [`ParseOptions`].
    pub fn parse(formula: &str) -> Result<Self> {
        Self::parse_with(formula, &ParseOptions::default())
    }

    /// Parses `formula`, validating it according to `options`.
    pub fn parse_with(formula: &str, options: &ParseOptions) -> Result<Self> {
        let parts = split_formula(formula)?;
        let depvars = split_depvars(&parts.cleaned, &parts.depvars)?;

        if options.validate_interactions {
            check_interaction_syntax(&parts.covars, &parts.fevars)?;
        }

        let covars = ExpandedGroup::parse(&parts.covars)?;
        let fevars = ExpandedGroup::parse(&parts.fevars)?;
        let iv = parts
            .iv
            .map(|block| instrumental_variables(block, &parts.covars, options))
            .transpose()?;

        let formulation = Self {
            expression: parts.cleaned,
            depvars,
            covars,
            fevars,
            iv,
        };
        debug!(
            "parsed `{}`: {} depvar(s), {} covariate variant(s), {} fixed-effect variant(s){}",
            formulation.expression,
            formulation.depvars.len(),
            formulation.covars.variants.len(),
            formulation.fevars.variants.len(),
            if formulation.is_iv() { ", IV" } else { "" }
        );
        Ok(formulation)
    }

    /// Returns the formula with whitespace removed.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Dependent variables in formula order.
    pub fn depvars(&self) -> &[String] {
        &self.depvars
    }

    /// Second-stage (or OLS) covariates.
    pub fn covars(&self) -> &ExpandedGroup {
        &self.covars
    }

    /// Fixed-effect variants; `"0"` stands for "no fixed effects".
    pub fn fevars(&self) -> &ExpandedGroup {
        &self.fevars
    }

    /// The IV block, if the formula has one.
    pub fn iv(&self) -> Option<&InstrumentalVariables> {
        self.iv.as_ref()
    }

    /// Whether the formula describes an IV regression.
    pub fn is_iv(&self) -> bool {
        self.iv.is_some()
    }

    /// Dependent variable of the first stage, i.e. the endogenous variable.
    pub fn first_stage_depvar(&self) -> Option<&str> {
        self.iv.as_ref().map(InstrumentalVariables::endogenous)
    }

    /// The `i()` interaction among the covariates, if any.
    pub fn interaction(&self) -> Option<&Interaction> {
        self.covars.unpacked.interaction()
    }

    /// Number of models the formula describes (per stage).
    pub fn model_count(&self) -> usize {
        self.depvars.len() * self.covars.variants.len() * self.fevars.variants.len()
    }
}

impl FromStr for Formulation {
    type Err = FormulaError;

    fn from_str(formula: &str) -> Result<Self> {
        Self::parse(formula)
    }
}

impl TryFrom<&str> for Formulation {
    type Error = FormulaError;

    fn try_from(formula: &str) -> Result<Self> {
        Self::parse(formula)
    }
}

/// Parses independent formulas in parallel, returning results in input order.
pub fn parse_batch<S>(formulas: &[S], options: &ParseOptions) -> Vec<Result<Formulation>>
where
    S: AsRef<str> + Sync,
{
    formulas
        .par_iter()
        .map(|formula| Formulation::parse_with(formula.as_ref(), options))
        .collect()
}

fn instrumental_variables(
    block: IvBlock,
    covars: &str,
    options: &ParseOptions,
) -> Result<InstrumentalVariables> {
    check_determinacy(&block, options.iv_determinacy)?;

    if block.endogenous.contains('+') || block.instruments.contains('+') {
        return Err(FormulaError::syntax(
            format!("{}~{}", block.endogenous, block.instruments),
            "the IV block supports one endogenous variable and one instrument",
        ));
    }

    for side in [&block.endogenous, &block.instruments] {
        if let Some(call) = find_switch(side) {
            return Err(FormulaError::UnsupportedSwitchType {
                keyword: call.kind.keyword().to_string(),
                context: Some("the IV block"),
            });
        }
    }

    let substituted = substitute_endogenous(covars, &block.endogenous, &block.instruments)?;
    trace!("first-stage covariates `{substituted}`");
    let first_stage = ExpandedGroup::parse(&substituted)?;

    Ok(InstrumentalVariables {
        endogenous: block.endogenous,
        instrument: block.instruments,
        first_stage,
    })
}

fn check_determinacy(block: &IvBlock, check: DeterminacyCheck) -> Result<()> {
    let token_counts = (
        block.endogenous.split('+').count(),
        block.instruments.split('+').count(),
    );
    let (endogenous, instruments) = match check {
        DeterminacyCheck::TokenCount => token_counts,
        DeterminacyCheck::CharacterLength => {
            let lengths = (
                block.endogenous.chars().count(),
                block.instruments.chars().count(),
            );
            if lengths.0.cmp(&lengths.1) != token_counts.0.cmp(&token_counts.1) {
                warn!(
                    "character-length IV check on `{}~{}` disagrees with the number of named variables",
                    block.endogenous, block.instruments
                );
            }
            lengths
        }
    };

    if endogenous > instruments {
        Err(FormulaError::IVUnderdeterminedError {
            endogenous,
            instruments,
        })
    } else if endogenous < instruments {
        Err(FormulaError::IVOverdeterminedError {
            endogenous,
            instruments,
        })
    } else {
        Ok(())
    }
}

/// Replaces the whole `+`-token `endogenous` in `covars` by `instrument`.
fn substitute_endogenous(covars: &str, endogenous: &str, instrument: &str) -> Result<String> {
    let mut tokens: Vec<&str> = covars.split('+').collect();
    let position = tokens
        .iter()
        .position(|token| *token == endogenous)
        .ok_or_else(|| FormulaError::VariableNotFoundError {
            variable: endogenous.to_string(),
            covariates: covars.to_string(),
        })?;
    tokens[position] = instrument;
    Ok(tokens.join("+"))
}

fn check_interaction_syntax(covars: &str, fevars: &str) -> Result<()> {
    if covars.contains('^') {
        return Err(FormulaError::CovariateInteractionError {
            covariates: covars.to_string(),
        });
    }
    let interacted = fevars
        .split('+')
        .any(|token| find_switch(token).is_some_and(|call| call.kind.is_interaction()));
    if interacted {
        return Err(FormulaError::FixedEffectInteractionError { syntax: "i()" });
    }
    if fevars.contains(':') {
        return Err(FormulaError::FixedEffectInteractionError { syntax: ":" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn stores_expression_without_whitespace() {
        let f = Formulation::parse("Y ~ X1 + X2 | f1 + f2").unwrap();
        assert_eq!(f.expression(), "Y~X1+X2|f1+f2");
        assert_eq!(f.covars().source(), "X1+X2");
        assert_eq!(f.fevars().source(), "f1+f2");
    }

    #[test]
    fn cumulative_covariates() {
        let f = Formulation::parse("Y~X1+csw(X2,X3)").unwrap();
        assert_eq!(f.depvars(), ["Y".to_string()]);
        assert_eq!(f.fevars().variants(), ["0".to_string()]);
        assert_eq!(
            f.covars().variants(),
            ["X1+X2".to_string(), "X1+X2+X3".to_string()]
        );
        assert!(!f.is_iv());
        assert_eq!(f.model_count(), 2);
    }

    #[test]
    fn switched_fixed_effects() {
        let f = Formulation::parse("Y~X1|sw0(X2,X3)").unwrap();
        assert_eq!(
            f.fevars().variants(),
            ["0".to_string(), "X2".to_string(), "X3".to_string()]
        );
        assert_eq!(f.covars().variants(), ["X1".to_string()]);
    }

    #[test]
    fn iv_first_stage_substitutes_instrument() {
        let f = Formulation::parse("Y~X1+X2|X3|X2~Z").unwrap();
        let iv = f.iv().unwrap();
        assert_eq!(f.fevars().variants(), ["X3".to_string()]);
        assert_eq!(iv.endogenous(), "X2");
        assert_eq!(iv.instrument(), "Z");
        assert_eq!(iv.first_stage().variants(), ["X1+Z".to_string()]);
        assert_eq!(f.first_stage_depvar(), Some("X2"));
    }

    #[test]
    fn iv_first_stage_keeps_switches() {
        let f = Formulation::parse("Y~X2+csw0(a,b)|X2~Z").unwrap();
        assert_eq!(
            f.iv().unwrap().first_stage().variants(),
            ["Z".to_string(), "Z+a".to_string(), "Z+a+b".to_string()]
        );
    }

    #[test]
    fn iv_determinacy_counts_names() {
        assert!(Formulation::parse("Y~X1+X22|X22~Z").is_ok());
        assert_eq!(
            Formulation::parse("Y~X1+X2|X2~Z1+Z2").unwrap_err(),
            FormulaError::IVOverdeterminedError {
                endogenous: 1,
                instruments: 2
            }
        );
        assert_eq!(
            Formulation::parse("Y~X1+X2|X2+X3~Z").unwrap_err(),
            FormulaError::IVUnderdeterminedError {
                endogenous: 2,
                instruments: 1
            }
        );
    }

    #[test]
    fn iv_block_names_one_variable_per_side() {
        let err = Formulation::parse("Y~X2+X3|X2+X3~Z1+Z2").unwrap_err();
        assert_eq!(
            err,
            FormulaError::syntax(
                "X2+X3~Z1+Z2",
                "the IV block supports one endogenous variable and one instrument"
            )
        );
    }

    #[test]
    fn legacy_character_length_counts_characters() {
        let options = ParseOptions::default().with_determinacy(DeterminacyCheck::CharacterLength);
        let f = Formulation::parse_with("Y~X1+é|é~Z", &options).unwrap();
        assert_eq!(f.iv().unwrap().first_stage().variants(), ["X1+Z".to_string()]);
    }

    #[test]
    fn legacy_character_length_check() {
        let options = ParseOptions::default().with_determinacy(DeterminacyCheck::CharacterLength);
        assert!(matches!(
            Formulation::parse_with("Y~X1+X22|X22~Z", &options),
            Err(FormulaError::IVUnderdeterminedError { .. })
        ));
        assert!(Formulation::parse_with("Y~X1+X2|X2~Z1", &options).is_ok());
    }

    #[test]
    fn iv_endogenous_must_be_a_covariate() {
        let err = Formulation::parse("Y~X1+X2|X3~Z").unwrap_err();
        assert_eq!(
            err,
            FormulaError::VariableNotFoundError {
                variable: "X3".to_string(),
                covariates: "X1+X2".to_string(),
            }
        );
        // Substring matches do not count.
        assert!(Formulation::parse("Y~X1+X22|X2~Z").is_err());
    }

    #[test]
    fn iv_block_rejects_switches() {
        let err = Formulation::parse("Y~X1+X2|X2~sw(Z)").unwrap_err();
        assert!(matches!(err, FormulaError::UnsupportedSwitchType { .. }));
    }

    #[test]
    fn interaction_reference_is_exposed() {
        let f = Formulation::parse("Y~X1+i(f,X2=b)").unwrap();
        let interaction = f.interaction().unwrap();
        assert_eq!(interaction.reference.as_deref(), Some("b"));
        assert_eq!(f.covars().variants(), ["X1+f:X2".to_string()]);
    }

    #[test]
    fn interaction_validation_is_opt_in() {
        assert!(Formulation::parse("Y~X1^X2|f1:f2").is_ok());

        let options = ParseOptions::default().with_interaction_validation(true);
        assert!(matches!(
            Formulation::parse_with("Y~X1^X2", &options),
            Err(FormulaError::CovariateInteractionError { .. })
        ));
        assert_eq!(
            Formulation::parse_with("Y~X1|f1:f2", &options).unwrap_err(),
            FormulaError::FixedEffectInteractionError { syntax: ":" }
        );
        assert_eq!(
            Formulation::parse_with("Y~X1|i(f1,f2)", &options).unwrap_err(),
            FormulaError::FixedEffectInteractionError { syntax: "i()" }
        );
    }

    #[test]
    fn parses_through_from_str() {
        let f: Formulation = "Y1+Y2~X1".parse().unwrap();
        assert_eq!(f.depvars(), ["Y1".to_string(), "Y2".to_string()]);
        assert!(Formulation::try_from("Y1").is_err());
    }

    #[test]
    fn batch_keeps_input_order() {
        let formulas = ["Y~X1", "Y~X1|a|b|c", "Y~sw(a,b)"];
        let results = parse_batch(&formulas, &ParseOptions::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().expression(), "Y~X1");
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().covars().variants().len(), 2);
    }
}
