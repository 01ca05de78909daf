use serde::{Deserialize, Serialize};

use super::TokenTrait;

/// Trait names used by the card collection's on-chain metadata.
pub const CERT_ID_TRAIT: &str = "Grading ID";
pub const GRADE_TRAIT: &str = "The Grade";
pub const GRADING_COMPANY_TRAIT: &str = "Grading Company";
pub const GRADE_NUMBER_TRAIT: &str = "GradeNum";
pub const CATEGORY_TRAIT: &str = "Category";

/// Grading details pulled out of a token's attribute list.
///
/// Values are kept as the strings the marketplace reported; blank values are
/// treated as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grading_company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl GradingAttributes {
    /// Build from a raw attribute list. The first non-blank occurrence of a
    /// trait wins.
    pub fn from_traits<'a>(traits: impl IntoIterator<Item = &'a TokenTrait>) -> Self {
        let mut attrs = Self::default();
        for t in traits {
            let slot = match t.trait_type.as_str() {
                CERT_ID_TRAIT => &mut attrs.cert_id,
                GRADE_TRAIT => &mut attrs.grade,
                GRADING_COMPANY_TRAIT => &mut attrs.grading_company,
                GRADE_NUMBER_TRAIT => &mut attrs.grade_number,
                CATEGORY_TRAIT => &mut attrs.category,
                _ => continue,
            };
            if slot.is_none() {
                *slot = t.value_string();
            }
        }
        attrs
    }

    /// The identifying triple needed to look a card up with the valuation
    /// service, or `None` when any part of it is missing.
    pub fn graded_asset(&self) -> Option<GradedAsset> {
        Some(GradedAsset {
            cert_id: self.cert_id.clone()?,
            grade: self.grade.clone()?,
            grading_company: self.grading_company.clone()?,
        })
    }
}

/// Certificate id, grade and grading company of one physical card.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GradedAsset {
    pub cert_id: String,
    pub grade: String,
    pub grading_company: String,
}

impl GradedAsset {
    pub fn new(
        cert_id: impl Into<String>,
        grade: impl Into<String>,
        grading_company: impl Into<String>,
    ) -> Self {
        Self {
            cert_id: cert_id.into(),
            grade: grade.into(),
            grading_company: grading_company.into(),
        }
    }
}

/// Format a grade the way the valuation service keys its populations: a
/// number with exactly one decimal place (`"9"` -> `"9.0"`, `"8.5"` -> `"8.5"`).
///
/// Returns `None` for grades that are not finite numbers.
pub fn format_grade(raw: &str) -> Option<String> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(format!("{value:.1}"))
}
