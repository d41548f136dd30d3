//! Plugin manifest declaration and validation.

use crate::extension::contribution::{parse_contribution, Contribution, ContributionError};
use serde::Serialize;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Declarative plugin identity and the extension point kinds it may register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginManifest {
    /// Stable plugin identifier, e.g. `builtin.reports.fuel`.
    pub id: String,
    /// Semantic version string (`major.minor.patch`).
    pub version: String,
    /// Declared contributions (`menu_item|tab|content`).
    pub contributions: Vec<String>,
}

impl PluginManifest {
    pub fn new(id: impl Into<String>, version: impl Into<String>, contributions: &[Contribution]) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            contributions: contributions
                .iter()
                .map(|contribution| contribution.as_str().to_string())
                .collect(),
        }
    }

    /// Validates declaration-level manifest invariants.
    pub fn validate(&self) -> Result<(), ManifestValidationError> {
        if self.id.trim().is_empty() {
            return Err(ManifestValidationError::EmptyId);
        }
        if !is_valid_plugin_id(self.id.trim()) {
            return Err(ManifestValidationError::InvalidId(self.id.clone()));
        }
        if !is_semver_triplet(self.version.trim()) {
            return Err(ManifestValidationError::InvalidVersion(
                self.version.clone(),
            ));
        }
        if self.contributions.is_empty() {
            return Err(ManifestValidationError::MissingContributions);
        }

        let mut dedup = BTreeSet::new();
        for value in &self.contributions {
            let contribution =
                parse_contribution(value).map_err(ManifestValidationError::Contribution)?;
            if !dedup.insert(contribution) {
                return Err(ManifestValidationError::DuplicateContribution(
                    contribution.as_str(),
                ));
            }
        }
        Ok(())
    }

    /// Parsed contribution set; unparseable declarations are skipped.
    pub fn declared_contributions(&self) -> BTreeSet<Contribution> {
        self.contributions
            .iter()
            .filter_map(|value| parse_contribution(value).ok())
            .collect()
    }

    pub fn declares(&self, contribution: Contribution) -> bool {
        self.declared_contributions().contains(&contribution)
    }
}

fn is_valid_plugin_id(value: &str) -> bool {
    let mut chars = value.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return false;
    }

    let mut prev_separator = false;
    for c in chars {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            prev_separator = false;
        } else if matches!(c, '.' | '_' | '-') && !prev_separator {
            prev_separator = true;
        } else {
            return false;
        }
    }
    !prev_separator
}

fn is_semver_triplet(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestValidationError {
    EmptyId,
    InvalidId(String),
    InvalidVersion(String),
    MissingContributions,
    Contribution(ContributionError),
    DuplicateContribution(&'static str),
}

impl Display for ManifestValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "manifest id must not be empty"),
            Self::InvalidId(value) => write!(f, "manifest id is invalid: {value}"),
            Self::InvalidVersion(value) => write!(
                f,
                "manifest version is invalid: {value} (expected major.minor.patch)"
            ),
            Self::MissingContributions => write!(f, "manifest contributions must not be empty"),
            Self::Contribution(err) => write!(f, "{err}"),
            Self::DuplicateContribution(value) => {
                write!(f, "manifest contribution is duplicated: {value}")
            }
        }
    }
}

impl Error for ManifestValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Contribution(err) => Some(err),
            _ => None,
        }
    }
}
