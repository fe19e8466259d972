//! Workspace umbrella crate.
//!
//! Holds no logic of its own — the bridge is implemented across the
//! `crates/*` and `services/*` workspace members. This crate exists so the
//! integration test suites under `tests/integration/` have a place to live
//! and a single `[dev-dependencies]` table to draw on.
