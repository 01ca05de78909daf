mod grading;
mod holdings;
mod listing;
mod token;
mod valuation;

pub use grading::{
    format_grade, GradedAsset, GradingAttributes, CATEGORY_TRAIT, CERT_ID_TRAIT,
    GRADE_NUMBER_TRAIT, GRADE_TRAIT, GRADING_COMPANY_TRAIT,
};
pub use holdings::{EnrichedToken, RenderOptions, Reported, WalletHoldings, UNAVAILABLE};
pub use listing::{ListingRecord, ListingsPage, PageWindow, Pagination};
pub use token::{Token, TokenTrait, TraitFilter, TraitPredicate};
pub use valuation::{CachedValuation, DisplayOverrides, FetchedValuation, ValuationRecord};
