//! Configuration structures that control how formulas are validated while parsing.

use serde::{Deserialize, Serialize};

/// How the number of endogenous variables is compared with the number of instruments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeterminacyCheck {
    /// Count the `+`-delimited names on each side of the IV block.
    #[default]
    TokenCount,
    /// Compare the character lengths of the two sides, as early fixest ports did.
    ///
    /// Only agrees with [`DeterminacyCheck::TokenCount`] when every name is a single
    /// character. Kept for reproducing legacy results.
    CharacterLength,
}

/// Options accepted by [`Formulation::parse_with`](crate::Formulation::parse_with).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Strategy used for the IV determinacy check.
    pub iv_determinacy: DeterminacyCheck,
    /// Reject `^` among covariates and `i()`/`:` among fixed effects.
    pub validate_interactions: bool,
}

impl ParseOptions {
    /// Override the IV determinacy strategy while preserving other defaults.
    pub fn with_determinacy(mut self, check: DeterminacyCheck) -> Self {
        self.iv_determinacy = check;
        self
    }

    /// Enable or disable interaction syntax validation.
    pub fn with_interaction_validation(mut self, validate: bool) -> Self {
        self.validate_interactions = validate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_count_tokens_without_interaction_checks() {
        let options = ParseOptions::default();
        assert_eq!(options.iv_determinacy, DeterminacyCheck::TokenCount);
        assert!(!options.validate_interactions);
    }

    #[test]
    fn builder_overrides_fields() {
        let options = ParseOptions::default()
            .with_determinacy(DeterminacyCheck::CharacterLength)
            .with_interaction_validation(true);
        assert_eq!(options.iv_determinacy, DeterminacyCheck::CharacterLength);
        assert!(options.validate_interactions);
    }
}
