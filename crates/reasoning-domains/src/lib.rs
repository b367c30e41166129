//! Domain rule-sets for reasoning-core
//!
//! Provides the built-in medical, business and meeting domains and
//! user-defined domains loaded from JSON. All of them are table-driven
//! [`TerminologyDomain`]s:
//!
//! - whole-word, case-insensitive term matching (concept text is the
//!   canonical term, context ±30 characters)
//! - pairwise relation rules keyed by concept type, with an optional default
//! - chain templates taking the first concept of each listed type
//! - question templates keyed by concept type
//!
//! [`DomainKind`] picks one by name (or file) and hands back the
//! `Arc<dyn Domain>` the core expects; [`DomainKind::None`] means generic
//! heuristics only.

use reasoning_core::{DomainInfo, DomainRef};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

pub mod business;
pub mod custom;
pub mod medical;
pub mod meeting;
pub mod terminology;

pub use custom::{CustomDomain, CustomDomainError};
pub use terminology::{
    ChainTemplate, Confidence, DomainDefinition, QuestionTemplate, RelationRule, StepTemplate,
    TerminologyDomain,
};

/// Names accepted by [`builtin`].
pub const BUILTIN_DOMAINS: &[&str] = &[medical::NAME, business::NAME, meeting::NAME];

/// Construct a built-in domain by name.
pub fn builtin(name: &str) -> Result<DomainRef, CustomDomainError> {
    let domain = match name.trim().to_ascii_lowercase().as_str() {
        medical::NAME => medical::domain()?,
        business::NAME => business::domain()?,
        meeting::NAME => meeting::domain()?,
        _ => return Err(CustomDomainError::Unknown(name.to_string())),
    };
    Ok(Arc::new(domain))
}

/// Info for every built-in domain, in [`BUILTIN_DOMAINS`] order.
pub fn builtin_info() -> Result<Vec<DomainInfo>, CustomDomainError> {
    BUILTIN_DOMAINS
        .iter()
        .map(|name| builtin(name).map(|domain| DomainInfo::of(domain.as_ref())))
        .collect()
}

// ============================================================================
// Domain selection
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DomainKind {
    Medical,
    Business,
    Meeting,
    /// JSON definition on disk
    Custom(PathBuf),
    /// No plugin; generic heuristics only
    #[default]
    None,
}

impl DomainKind {
    pub fn resolve(&self) -> Result<Option<DomainRef>, CustomDomainError> {
        Ok(match self {
            DomainKind::Medical => Some(Arc::new(medical::domain()?)),
            DomainKind::Business => Some(Arc::new(business::domain()?)),
            DomainKind::Meeting => Some(Arc::new(meeting::domain()?)),
            DomainKind::Custom(path) => Some(Arc::new(CustomDomain::from_json_file(path)?)),
            DomainKind::None => None,
        })
    }
}

impl FromStr for DomainKind {
    type Err = CustomDomainError;

    /// Built-in names, `none`/`generic`, or `custom:<path>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(path) = s.strip_prefix("custom:") {
            return Ok(DomainKind::Custom(PathBuf::from(path)));
        }
        match s.to_ascii_lowercase().as_str() {
            medical::NAME => Ok(DomainKind::Medical),
            business::NAME => Ok(DomainKind::Business),
            meeting::NAME => Ok(DomainKind::Meeting),
            "none" | "generic" | "" => Ok(DomainKind::None),
            _ => Err(CustomDomainError::Unknown(s.to_string())),
        }
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainKind::Medical => f.write_str(medical::NAME),
            DomainKind::Business => f.write_str(business::NAME),
            DomainKind::Meeting => f.write_str(meeting::NAME),
            DomainKind::Custom(path) => write!(f, "custom:{}", path.display()),
            DomainKind::None => f.write_str("none"),
        }
    }
}
