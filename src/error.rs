use thiserror::Error;

/// Unified error type for formula parsing and expansion.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Raised when the formula does not follow the `depvars ~ covars | fevars | iv` grammar.
    #[error("invalid formula syntax in `{formula}`: {reason}")]
    InvalidFormulaSyntax {
        /// The formula or group that failed to parse (whitespace removed).
        formula: String,
        /// Human-readable description of the violated rule.
        reason: String,
    },

    /// Raised when a group uses more than one switch family or more than one `i()` group.
    #[error(
        "duplicate key found: `{key}`; {} can only be used once per formula part",
        duplicated_syntax(.key)
    )]
    DuplicateSwitchKeyError {
        /// Keyword of the second, conflicting group.
        key: String,
    },

    /// Raised when a switch keyword is not recognized or appears where none is allowed.
    #[error("unsupported switch type `{keyword}`{}", rejected_in(.context))]
    UnsupportedSwitchType {
        /// The offending keyword.
        keyword: String,
        /// Formula part in which the keyword was rejected, if any.
        context: Option<&'static str>,
    },

    /// Raised when fewer instruments than endogenous variables are supplied.
    #[error(
        "the IV system is underdetermined ({endogenous} endogenous, {instruments} instruments); \
         please provide as many instruments as endogenous variables"
    )]
    IVUnderdeterminedError { endogenous: usize, instruments: usize },

    /// Raised when more instruments than endogenous variables are supplied.
    #[error(
        "the IV system is overdetermined ({endogenous} endogenous, {instruments} instruments); \
         please provide as many instruments as endogenous variables"
    )]
    IVOverdeterminedError { endogenous: usize, instruments: usize },

    /// Raised when the endogenous variable is not one of the covariates.
    #[error("variable `{variable}` not found among covariates `{covariates}`")]
    VariableNotFoundError { variable: String, covariates: String },

    /// Raised when fixed effects are interacted with `i()` or `:` instead of `^`.
    #[error("interacting fixed effects via `{syntax}` is not allowed; use `^` to interact fixed effects")]
    FixedEffectInteractionError { syntax: &'static str },

    /// Raised when covariates are interacted with `^` instead of `i()` or `:`.
    #[error("use `i()` or `:` syntax to interact covariates, found `^` in `{covariates}`")]
    CovariateInteractionError { covariates: String },

    /// Raised when a derivation needs a component the formula does not carry.
    #[error("{component} must be present in the formula")]
    MissingComponent { component: &'static str },
}

impl FormulaError {
    /// Helper to format an [`InvalidFormulaSyntax`](FormulaError::InvalidFormulaSyntax) error.
    pub fn syntax(formula: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFormulaSyntax {
            formula: formula.into(),
            reason: reason.into(),
        }
    }

    /// Helper for duplicated switch or interaction groups.
    pub fn duplicate_key(key: impl Into<String>) -> Self {
        Self::DuplicateSwitchKeyError { key: key.into() }
    }

    /// Helper for bubbling up missing component errors from the dictionary builders.
    pub fn missing_component(component: &'static str) -> Self {
        Self::MissingComponent { component }
    }
}

fn duplicated_syntax(key: &str) -> &'static str {
    if key == "i" {
        "interaction syntax i()"
    } else {
        "multiple estimation syntax"
    }
}

fn rejected_in(context: &Option<&'static str>) -> String {
    context.map(|c| format!(" in {c}")).unwrap_or_default()
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, FormulaError>;
