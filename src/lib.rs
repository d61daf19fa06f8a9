//! Saga Engine: content-driven events for choice-based narrative games.
//!
//! Authors write events, items and map nodes as RON files. The engine
//! compiles them into typed runtime objects, checks that every cross-file
//! reference resolves, and evaluates option visibility, affordability and
//! resolution against the player's live state.

pub mod core;
pub mod schema;
