//! Estimation plans derived from a [`Formulation`].
//!
//! All functions here are pure: they borrow the parsed formula and return new
//! maps keyed by fixed-effect variant. Map order is estimation order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{FormulaError, Result};
use crate::formulation::{ExpandedGroup, Formulation};

/// Fixed-effect variant → ordered `depvar~covariates` formulas.
pub type FormulaList = IndexMap<String, Vec<String>>;

/// Fixed-effect variant → depvar → ordered covariate variants.
pub type FormulaDict = IndexMap<String, IndexMap<String, Vec<String>>>;

/// Fixed-effect variant → every variable the regressions in that group use.
pub type VarDict = IndexMap<String, Vec<String>>;

/// Which set of covariates a plan is built for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// OLS, or the second stage of an IV regression.
    #[default]
    Second,
    /// First stage of an IV regression: the instrument replaces the endogenous variable.
    First,
}

fn stage_covars(formulation: &Formulation, stage: Stage) -> Result<&ExpandedGroup> {
    match stage {
        Stage::Second => Ok(formulation.covars()),
        Stage::First => formulation
            .iv()
            .map(|iv| iv.first_stage())
            .ok_or_else(|| FormulaError::missing_component("an instrumental-variable block")),
    }
}

/// Builds the `depvar~covariates` formulas for every fixed-effect variant.
///
/// Depvars form the outer loop and covariate variants the inner one.
pub fn fml_list(formulation: &Formulation, stage: Stage) -> Result<FormulaList> {
    let covars = stage_covars(formulation, stage)?;
    let formulas: Vec<String> = formulation
        .depvars()
        .iter()
        .flat_map(|depvar| {
            covars
                .variants()
                .iter()
                .map(move |covar| format!("{depvar}~{covar}"))
        })
        .collect();

    Ok(formulation
        .fevars()
        .variants()
        .iter()
        .map(|fevar| (fevar.clone(), formulas.clone()))
        .collect())
}

/// Groups each fixed effect's formulas by dependent variable, keeping first-seen order.
///
/// Fails with [`FormulaError::InvalidFormulaSyntax`] on an entry that is not
/// of the form `depvar~covariates`.
pub fn regroup(list: &FormulaList) -> Result<FormulaDict> {
    let mut dict = FormulaDict::with_capacity(list.len());
    for (fevar, formulas) in list {
        let by_depvar = dict.entry(fevar.clone()).or_default();
        for formula in formulas {
            let (depvar, covars) = formula
                .split_once('~')
                .ok_or_else(|| FormulaError::syntax(formula, "expected `depvar~covariates`"))?;
            by_depvar
                .entry(depvar.to_string())
                .or_default()
                .push(covars.to_string());
        }
    }
    Ok(dict)
}

/// [`fml_list`] followed by [`regroup`].
pub fn fml_dict(formulation: &Formulation, stage: Stage) -> Result<FormulaDict> {
    fml_list(formulation, stage).and_then(|list| regroup(&list))
}

/// Lists the depvars and every covariate name for each fixed-effect variant.
pub fn var_dict(formulation: &Formulation, stage: Stage) -> Result<VarDict> {
    let covars = stage_covars(formulation, stage)?;
    let variables: Vec<String> = formulation
        .depvars()
        .iter()
        .map(String::as_str)
        .chain(covars.unpacked().flatten())
        .map(str::to_string)
        .collect();

    Ok(formulation
        .fevars()
        .variants()
        .iter()
        .map(|fevar| (fevar.clone(), variables.clone()))
        .collect())
}
