//! Integration test suite for drift
//!
//! End-to-end tests through the public API and the `drift` binary.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **graph_rules**: the built-in dependency validators on realistic projects
//! - **plugins**: plugin providers resolved through the registry and dispatcher
//! - **cli**: the `drift` binary

mod cli;
mod graph_rules;
mod plugins;
