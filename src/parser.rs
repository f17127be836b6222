//! Reading and writing tree documents.
//!
//! A document is YAML holding the root node with its subtree and, next to it,
//! every unparented node with its own subtree. Action parameters are stored as
//! text and decoded by their declared type.

mod literal;
mod loader;
mod yaml_parser;

pub(crate) use self::literal::parse_literal;
pub use self::{
    loader::{deserialize, LoadOptions},
    yaml_parser::serialize,
};
