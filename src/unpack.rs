//! Structural unpacking of a `+`-joined variable group.

use serde::Serialize;

use crate::error::{FormulaError, Result};
use crate::switch::{find_switch, SwitchKind};

/// An `i()` interaction group with its optional reference category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Interaction {
    /// Interacted variables, reference marker removed.
    pub names: Vec<String>,
    /// Base category; `None` leaves the choice to the estimator.
    pub reference: Option<String>,
}

impl Interaction {
    /// The single colon-joined token the interaction contributes to every variant.
    pub fn term(&self) -> String {
        self.names.join(":")
    }
}

/// One token of a variable group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupTerm {
    /// A plain variable name.
    Constant(String),
    /// A `sw`/`sw0`/`csw`/`csw0` call and its ordered arguments.
    Switch { kind: SwitchKind, names: Vec<String> },
    /// An `i()` call.
    Interaction(Interaction),
}

/// A variable group with its switch syntax resolved.
///
/// Holds at most one switch family and at most one interaction group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UnpackedGroup {
    terms: Vec<GroupTerm>,
}

impl UnpackedGroup {
    /// All terms in token order.
    pub fn terms(&self) -> &[GroupTerm] {
        &self.terms
    }

    /// Plain variable names in their original order.
    pub fn constants(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().filter_map(|term| match term {
            GroupTerm::Constant(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// The switch family and its arguments, if the group has one.
    pub fn switch(&self) -> Option<(SwitchKind, &[String])> {
        self.terms.iter().find_map(|term| match term {
            GroupTerm::Switch { kind, names } => Some((*kind, names.as_slice())),
            _ => None,
        })
    }

    /// The `i()` group, if the group has one.
    pub fn interaction(&self) -> Option<&Interaction> {
        self.terms.iter().find_map(|term| match term {
            GroupTerm::Interaction(interaction) => Some(interaction),
            _ => None,
        })
    }

    /// Every variable name referenced by the group.
    ///
    /// Constants come first, followed by the arguments of the switch and
    /// interaction groups in order of appearance.
    pub fn flatten(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constants().collect();
        for term in &self.terms {
            match term {
                GroupTerm::Constant(_) => {}
                GroupTerm::Switch { names: args, .. }
                | GroupTerm::Interaction(Interaction { names: args, .. }) => {
                    names.extend(args.iter().map(String::as_str));
                }
            }
        }
        names
    }
}

/// Unpacks a group such as `X1+csw(X2,X3)+i(f,X4=b)`.
pub fn unpack_group(group: &str) -> Result<UnpackedGroup> {
    let mut terms = Vec::new();
    let mut has_switch = false;
    let mut has_interaction = false;

    for token in group.split('+') {
        if token.is_empty() {
            return Err(FormulaError::syntax(group, "empty variable name"));
        }

        let Some(call) = find_switch(token) else {
            terms.push(GroupTerm::Constant(token.to_string()));
            continue;
        };

        if call.args.iter().any(String::is_empty) {
            return Err(FormulaError::syntax(
                group,
                format!("`{}()` has an empty argument", call.kind),
            ));
        }

        if call.kind.is_interaction() {
            if has_interaction {
                return Err(FormulaError::duplicate_key(call.kind.keyword()));
            }
            has_interaction = true;
            terms.push(GroupTerm::Interaction(split_reference(group, call.args)?));
        } else {
            if has_switch {
                return Err(FormulaError::duplicate_key(call.kind.keyword()));
            }
            has_switch = true;
            terms.push(GroupTerm::Switch {
                kind: call.kind,
                names: call.args,
            });
        }
    }

    Ok(UnpackedGroup { terms })
}

fn split_reference(group: &str, mut names: Vec<String>) -> Result<Interaction> {
    let mut reference = None;
    if let Some(last) = names.last_mut() {
        if let Some((name, value)) = last.split_once('=') {
            if name.is_empty() || value.is_empty() {
                return Err(FormulaError::syntax(
                    group,
                    "`i()` reference must be written as `name=value`",
                ));
            }
            reference = Some(value.to_string());
            *last = name.to_string();
        }
    }
    Ok(Interaction { names, reference })
}
