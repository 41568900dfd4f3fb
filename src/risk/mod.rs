//! Risk classification and scoring
//!
//! Turns a raw market record into a 0-100 composite risk number with
//! explainable sub-scores: event spike risk, time-proximity risk, and
//! adverse-selection risk.

mod classifier;
mod scorer;

pub use classifier::{classify, EventCategory, EventClassification};
pub use scorer::{
    adverse_selection_risk, risk_label, score, score_at, time_proximity_risk, RiskBreakdown,
};
