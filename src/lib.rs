//! Parser and expander for fixest-style multiple-estimation regression formulas.
//!
//! A single formula string can describe many related regressions:
//!
//! ```text
//! Y1 + Y2 ~ X1 + csw0(X2, X3) | sw0(f1, f2) | X1 ~ Z1
//! ```
//!
//! This crate turns such a string into the concrete list of models an
//! estimation engine has to run. It offers tools to
//!
//! - split a formula into dependent variables, covariates, fixed effects and an
//!   optional IV block (`tokenizer` module),
//! - recognize the `sw`, `sw0`, `csw`, `csw0` and `i` keywords (`switch` module),
//! - unpack and expand variable groups into ordered variants (`unpack` and
//!   `expand` modules),
//! - validate IV determinacy and derive first-stage covariates
//!   (`formulation` module), and
//! - build per-fixed-effect estimation plans and column lists (`dicts` module).
//!
//! Estimation itself, data loading and output formatting are left to callers.
//!
//! # Quick start
//!
//! ```
//! use fixest_formula::{fml_dict, var_dict, Formulation, Stage};
//!
//! let formulation = Formulation::parse("Y ~ X1 + csw(X2, X3) | sw0(f1, f2)")
//!     .expect("well-formed formula");
//!
//! assert_eq!(formulation.fevars().variants(), ["0", "f1", "f2"]);
//!
//! let plan = fml_dict(&formulation, Stage::Second).expect("OLS plan");
//! assert_eq!(plan["f1"]["Y"], ["X1+X2", "X1+X2+X3"]);
//!
//! let columns = var_dict(&formulation, Stage::Second).expect("column lists");
//! assert_eq!(columns["0"], ["Y", "X1", "X2", "X3"]);
//! ```
//!
//! Errors are reported through [`FormulaError`]; a failed parse never yields a
//! partially built [`Formulation`].

pub mod dicts;
pub mod error;
pub mod expand;
pub mod formulation;
pub mod options;
pub mod switch;
pub mod tokenizer;
pub mod unpack;

pub use dicts::{fml_dict, fml_list, regroup, var_dict, FormulaDict, FormulaList, Stage, VarDict};
pub use error::{FormulaError, Result};
pub use formulation::{parse_batch, ExpandedGroup, Formulation, InstrumentalVariables};
pub use options::{DeterminacyCheck, ParseOptions};
pub use switch::SwitchKind;
