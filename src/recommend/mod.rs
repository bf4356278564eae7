//! Recommendation fallback engine.
//!
//! Turns seed tracks and an optional energy/valence target into candidate
//! tracks, degrading through progressively cruder tiers when the catalog's
//! native recommendations are unavailable.
//!
//! # Architecture
//!
//! - **Engine** (`engine.rs`) - Tier ordering, deadline and logging
//! - **AI** (`ai.rs`) - Prompt construction and suggestion parsing
//! - **Search mix** (`search_mix.rs`) - Weighted search-based assembly
//! - **Heuristics** (`heuristics.rs`) - Pure quota, genre and mood helpers

pub mod ai;
pub mod engine;
pub mod heuristics;
pub mod search_mix;

pub use engine::{
    DEFAULT_DEADLINE, RecommendationEngine, RecommendationOutcome, Tier, TierError,
};
