use serde::{Deserialize, Serialize};

use super::GradingAttributes;

/// One entry of a token's metadata attribute list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenTrait {
    pub trait_type: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl TokenTrait {
    pub fn new(trait_type: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }

    /// The trait value as a trimmed string. Numbers and booleans are rendered
    /// as text; null and blank values yield `None`.
    pub fn value_string(&self) -> Option<String> {
        let s = match &self.value {
            serde_json::Value::String(s) => s.trim().to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    }
}

/// A tokenized graded card held by a wallet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// On-chain mint address. Some marketplace entries carry none; those
    /// stay in the page but can never be valued.
    pub mint: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub grading: GradingAttributes,
}

impl Token {
    pub fn new(mint: impl Into<String>) -> Self {
        Self {
            mint: Some(mint.into()),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_grading(mut self, grading: GradingAttributes) -> Self {
        self.grading = grading;
        self
    }
}

/// A `(trait name, trait value)` condition on inventory queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitPredicate {
    pub trait_type: String,
    pub value: String,
}

impl TraitPredicate {
    pub fn new(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

/// Conjunction of OR-groups: a token matches when, for every group, at least
/// one predicate in that group holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraitFilter {
    groups: Vec<Vec<TraitPredicate>>,
}

impl TraitFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require any one of `predicates`. Empty groups are ignored.
    pub fn any_of(mut self, predicates: impl IntoIterator<Item = TraitPredicate>) -> Self {
        let group: Vec<_> = predicates.into_iter().collect();
        if !group.is_empty() {
            self.groups.push(group);
        }
        self
    }

    /// Require `trait_type` to be one of `values`.
    pub fn one_of<I, S>(self, trait_type: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.any_of(
            values
                .into_iter()
                .map(|v| TraitPredicate::new(trait_type, v)),
        )
    }

    pub fn groups(&self) -> &[Vec<TraitPredicate>] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
