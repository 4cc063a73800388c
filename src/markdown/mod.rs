//! Markdown resource file handling.

pub mod frontmatter;

pub use frontmatter::{ResourceHeader, parse_resource_header};
