//! Weighted lead qualification.
//!
//! Each enabled criterion scores a lead in `0..=100`; the overall score is
//! the weighted mean over enabled criteria, normalised by the sum of their
//! weights. Leads below the minimum score are dropped from the working set.

mod config;
mod scorer;

pub use config::{Criterion, CriterionWeight, QualificationConfig};
pub use scorer::{LeadScore, WeightedQualifier};
