//! Moderation category taxonomy.
//!
//! The taxonomy is a closed set of category codes, fixed at compile time.
//! Codes are grouped by theme for listing purposes only; the grouping has
//! no effect on validation or scoring.
//!
//! | Theme                | Codes                                                      |
//! |----------------------|------------------------------------------------------------|
//! | Content type         | `PROFANITY`, `HATE_SPEECH`, `HARASSMENT`, `VIOLENCE`, ...  |
//! | Additional safety    | `SELF_HARM`, `SUICIDE`, `GROOMING`, `EXTREMISM`, ...       |
//! | Platform integrity   | `MISINFORMATION`, `IMPERSONATION`, ...                     |
//! | Personal information | `PERSONAL_INFO`, `DOXXING`, `PRIVACY_VIOLATION`            |
//! | Community standards  | `BULLYING`, `TROLLING`, `INFLAMMATORY`, `GRAPHIC_CONTENT`  |
//! | Financial            | `GAMBLING`, `SCAM`, `UNAUTHORIZED_MARKETING`               |
//! | Other                | `COPYRIGHT_VIOLATION`, `CHILD_SAFETY`, ...                 |
//!
//! [`DEFAULT_CATEGORIES`] is the fallback used when a request selects
//! nothing valid.

use std::fmt;
use std::str::FromStr;

use phf::phf_set;
use serde::{Deserialize, Serialize};

use crate::error::ModerationError;

/// Hate speech (continuous, index-1 probability).
pub const HATE_SPEECH: &str = "HATE_SPEECH";
/// Profanity (derived binary feature).
pub const PROFANITY: &str = "PROFANITY";
/// Harassment (derived binary feature).
pub const HARASSMENT: &str = "HARASSMENT";

/// Fallback category list.
pub const DEFAULT_CATEGORIES: [&str; 3] = [PROFANITY, HATE_SPEECH, HARASSMENT];

/// Every recognized category code.
pub static VALID_CATEGORIES: phf::Set<&'static str> = phf_set! {
    "PROFANITY",
    "HATE_SPEECH",
    "HARASSMENT",
    "VIOLENCE",
    "SEXUAL_CONTENT",
    "DISCRIMINATION",
    "THREAT",
    "SPAM",
    "SELF_HARM",
    "SUICIDE",
    "EATING_DISORDERS",
    "SUBSTANCE_ABUSE",
    "GROOMING",
    "EXTREMISM",
    "MISINFORMATION",
    "DISINFORMATION",
    "IMPERSONATION",
    "FRAUDULENT_ACTIVITY",
    "COUNTERFEIT_GOODS",
    "PERSONAL_INFO",
    "DOXXING",
    "PRIVACY_VIOLATION",
    "BULLYING",
    "TROLLING",
    "INFLAMMATORY",
    "GRAPHIC_CONTENT",
    "GAMBLING",
    "SCAM",
    "UNAUTHORIZED_MARKETING",
    "COPYRIGHT_VIOLATION",
    "TRADEMARK_VIOLATION",
    "AGE_INAPPROPRIATE",
    "CHILD_SAFETY",
    "COORDINATED_HARM",
};

/// Theme a category belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryTheme {
    /// Content type categories
    ContentType,
    /// Additional safety categories
    Safety,
    /// Platform integrity categories
    PlatformIntegrity,
    /// Personal information
    PersonalInfo,
    /// Community standards
    Community,
    /// Financial content
    Financial,
    /// Other categories
    Other,
}

impl fmt::Display for CategoryTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryTheme::ContentType => write!(f, "content type"),
            CategoryTheme::Safety => write!(f, "additional safety"),
            CategoryTheme::PlatformIntegrity => write!(f, "platform integrity"),
            CategoryTheme::PersonalInfo => write!(f, "personal information"),
            CategoryTheme::Community => write!(f, "community standards"),
            CategoryTheme::Financial => write!(f, "financial content"),
            CategoryTheme::Other => write!(f, "other"),
        }
    }
}

/// Taxonomy listing in display order.
pub static CATEGORY_THEMES: &[(CategoryTheme, &[&str])] = &[
    (
        CategoryTheme::ContentType,
        &[
            "PROFANITY",
            "HATE_SPEECH",
            "HARASSMENT",
            "VIOLENCE",
            "SEXUAL_CONTENT",
            "DISCRIMINATION",
            "THREAT",
            "SPAM",
        ],
    ),
    (
        CategoryTheme::Safety,
        &[
            "SELF_HARM",
            "SUICIDE",
            "EATING_DISORDERS",
            "SUBSTANCE_ABUSE",
            "GROOMING",
            "EXTREMISM",
        ],
    ),
    (
        CategoryTheme::PlatformIntegrity,
        &[
            "MISINFORMATION",
            "DISINFORMATION",
            "IMPERSONATION",
            "FRAUDULENT_ACTIVITY",
            "COUNTERFEIT_GOODS",
        ],
    ),
    (
        CategoryTheme::PersonalInfo,
        &["PERSONAL_INFO", "DOXXING", "PRIVACY_VIOLATION"],
    ),
    (
        CategoryTheme::Community,
        &["BULLYING", "TROLLING", "INFLAMMATORY", "GRAPHIC_CONTENT"],
    ),
    (
        CategoryTheme::Financial,
        &["GAMBLING", "SCAM", "UNAUTHORIZED_MARKETING"],
    ),
    (
        CategoryTheme::Other,
        &[
            "COPYRIGHT_VIOLATION",
            "TRADEMARK_VIOLATION",
            "AGE_INAPPROPRIATE",
            "CHILD_SAFETY",
            "COORDINATED_HARM",
        ],
    ),
];

/// Check if a code belongs to the taxonomy
pub fn is_valid_category(code: &str) -> bool {
    VALID_CATEGORIES.contains(code)
}

/// Resolve a code to its `'static` taxonomy entry.
pub fn lookup(code: &str) -> Option<&'static str> {
    VALID_CATEGORIES.get_key(code).copied()
}

/// Theme for a taxonomy code.
pub fn theme_of(code: &str) -> Option<CategoryTheme> {
    CATEGORY_THEMES
        .iter()
        .find(|(_, codes)| codes.contains(&code))
        .map(|(theme, _)| *theme)
}

/// Requested strictness.
///
/// Validated on every request but not consulted by the decision rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SensitivityLevel {
    /// Low sensitivity
    Low,
    /// Medium sensitivity
    Medium,
    /// High sensitivity
    High,
}

impl SensitivityLevel {
    /// All levels, in ascending order
    pub const ALL: [SensitivityLevel; 3] = [
        SensitivityLevel::Low,
        SensitivityLevel::Medium,
        SensitivityLevel::High,
    ];

    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            SensitivityLevel::Low => "LOW",
            SensitivityLevel::Medium => "MEDIUM",
            SensitivityLevel::High => "HIGH",
        }
    }

    /// Comma-separated list of valid wire names, for error messages.
    pub fn valid_set() -> String {
        Self::ALL
            .iter()
            .map(|level| level.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SensitivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensitivityLevel {
    type Err = ModerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(SensitivityLevel::Low),
            "MEDIUM" => Ok(SensitivityLevel::Medium),
            "HIGH" => Ok(SensitivityLevel::High),
            _ => Err(ModerationError::validation(format!(
                "Invalid sensitivity level. Must be one of {}",
                Self::valid_set()
            ))),
        }
    }
}
