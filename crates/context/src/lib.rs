//! # finctx Context
//!
//! Turns a list of financial records plus a natural-language query into a
//! token-bounded, diversity-optimized [`ContextCard`](finctx_core::ContextCard).
//!
//! # Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | 1. Normalize | [`normalize`] | one snippet per record |
//! | 2. Score | [`score`] | relevance attached, order kept |
//! | 3. Synthesize | [`aggregate`] | summary snippets (optional) |
//! | 4. Pack | [`pack`] | greedy diversity selection under budget − reserve |
//! | 5. Trim | [`trim`] | summaries + packed, cut at the hard budget |
//!
//! Every stage is a pure function of its inputs plus the clock read used
//! for recency, so concurrent calls need no coordination.

pub mod aggregate;
pub mod engine;
pub mod money;
pub mod normalize;
pub mod pack;
pub mod score;
pub mod token;
pub mod trim;

pub use engine::{
    ContextEngine, ContextRequest, ERROR_STRATEGY, STRATEGY_NAME, pack_context, try_pack_context,
};
pub use normalize::{normalize, normalize_all};
pub use token::estimate_tokens;
