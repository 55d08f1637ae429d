//! Search orchestration layer.
//!
//! - **[`normalize`]**: query canonicalization, minimum-length and
//!   natural-language heuristics, record match keys.
//! - **[`cache`]**: bounded per-session result cache (FIFO eviction).
//! - **[`local`]**: synchronous substring filter over the in-memory catalog.
//! - **[`merge`]**: pinned/local/remote reconciliation and ranking.
//! - **[`session`]**: the debounced orchestrator actor.

pub mod cache;
pub mod local;
pub mod merge;
pub mod normalize;
pub mod session;
