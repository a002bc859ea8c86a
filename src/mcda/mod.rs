//! Multi-criteria decision analysis (MCDA).
//!
//! Scores and orders a finite set of alternatives (candidate sites or
//! configurations) against weighted, possibly conflicting criteria.
//!
//! # Methods
//!
//! - **Weighted sum**: `score = Σ w_c · v_c` over normalized weights.
//! - **TOPSIS**: relative closeness to the column-wise ideal and anti-ideal
//!   after vector normalization.
//! - **AHP**: accepted by name and scored as a weighted sum; the supplied
//!   weights stand in for the priority vector.
//!
//! Criterion values are assumed "higher is better". Rankings are stable:
//! equal scores keep their input order, so results are reproducible.
//!
//! # References
//!
//! - Triantaphyllou (2000), *Multi-Criteria Decision Making Methods*
//! - Hwang & Yoon (1981), *Multiple Attribute Decision Making*

mod engine;
mod types;

pub use engine::{rank, RankingEngine};
pub use types::{Alternative, CriterionWeights, RankedResult, RankingMethod};
