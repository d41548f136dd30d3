//! Extension point kinds a plugin may contribute.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// UI contribution kind declared in a plugin manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Contribution {
    MenuItem,
    Tab,
    Content,
}

/// Manifest string value for menu item contributions.
pub const CONTRIBUTION_MENU_ITEM: &str = "menu_item";
/// Manifest string value for tab contributions.
pub const CONTRIBUTION_TAB: &str = "tab";
/// Manifest string value for primary content contributions.
pub const CONTRIBUTION_CONTENT: &str = "content";

const SUPPORTED_CONTRIBUTION_STRINGS: &[&str] = &[
    CONTRIBUTION_MENU_ITEM,
    CONTRIBUTION_TAB,
    CONTRIBUTION_CONTENT,
];

impl Contribution {
    /// Stable string id used in manifest declarations.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MenuItem => CONTRIBUTION_MENU_ITEM,
            Self::Tab => CONTRIBUTION_TAB,
            Self::Content => CONTRIBUTION_CONTENT,
        }
    }

    /// User-facing short description.
    pub fn description(self) -> &'static str {
        match self {
            Self::MenuItem => "Adds entries to shared menu groups.",
            Self::Tab => "Opens tabs next to the existing ones.",
            Self::Content => "Replaces the primary content panel.",
        }
    }
}

/// Returns supported contribution declaration strings.
pub fn supported_contribution_strings() -> &'static [&'static str] {
    SUPPORTED_CONTRIBUTION_STRINGS
}

/// Parses one contribution from a manifest string value.
pub fn parse_contribution(value: &str) -> Result<Contribution, ContributionError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(ContributionError::EmptyContribution);
    }

    match normalized {
        CONTRIBUTION_MENU_ITEM => Ok(Contribution::MenuItem),
        CONTRIBUTION_TAB => Ok(Contribution::Tab),
        CONTRIBUTION_CONTENT => Ok(Contribution::Content),
        other => Err(ContributionError::UnsupportedContribution(
            other.to_string(),
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContributionError {
    EmptyContribution,
    UnsupportedContribution(String),
}

impl Display for ContributionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContribution => write!(f, "contribution value must not be empty"),
            Self::UnsupportedContribution(value) => {
                write!(f, "contribution is unsupported: {value}")
            }
        }
    }
}

impl Error for ContributionError {}
