//! drift - a document validation engine for declaratively-linked resources
//!
//! Skills, commands and agents are Markdown files whose YAML frontmatter lists the skills they
//! depend on. drift checks a project of such files against configurable rules and reports, per
//! document bundle, which rules passed, which failed (with a rendered message and structured
//! details), and which could not be evaluated.
//!
//! # Core Modules
//!
//! ## Analysis
//! - [`graph`] - dependency graph builder plus cycle, redundancy and depth analyses
//! - [`validators`] - built-in `core:*` validators
//! - [`rules`] - rule definitions, failure records and the [`rules::Validator`] trait
//!
//! ## Execution
//! - [`registry`] - `namespace:type` lookup, plugin catalog and instance cache
//! - [`dispatch`] - sequential/parallel rule execution with per-rule failure isolation
//! - [`cache`] - content-hash keyed response cache with TTL
//!
//! ## Input
//! - [`bundle`] - document bundles and their discovery
//! - [`markdown`] - frontmatter parsing
//! - [`config`] - `.drift.toml`
//!
//! ## Supporting Modules
//! - [`core`] - error types and resource types
//! - [`cli`] - the `drift` command line
//! - [`utils`] - atomic file writes
//!
//! # Configuration (.drift.toml)
//!
//! ```toml
//! [parallel_execution]
//! enabled = true
//!
//! [[rules]]
//! description = "No circular skill dependencies"
//! type = "core:circular_dependencies"
//! [rules.params]
//! resource_dirs = [".claude/skills", ".claude/commands", ".claude/agents"]
//!
//! [[rules]]
//! type = "core:max_dependency_depth"
//! [rules.params]
//! resource_dirs = [".claude/skills"]
//! max_depth = 3
//! ```
//!
//! # Resource Format
//!
//! ```markdown
//! ---
//! name: code-review
//! skills:
//!   - testing
//!   - linting
//! ---
//! # Code review
//! ```

// Analysis
pub mod graph;
pub mod rules;
pub mod validators;

// Execution
pub mod cache;
pub mod dispatch;
pub mod registry;

// Input
pub mod bundle;
pub mod config;
pub mod markdown;

// Supporting modules
pub mod cli;
pub mod constants;
pub mod core;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
