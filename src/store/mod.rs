// src/store/mod.rs

//! Parameter-store collaborator.
//!
//! Values are addressed by a project (the stack name) and a parameter name.
//! The trait is the seam; [`FileParameterStore`] is used by the binary and
//! [`MemoryParameterStore`] by tests.

pub mod file;
pub mod memory;

use crate::errors::Result;

pub use file::FileParameterStore;
pub use memory::MemoryParameterStore;

pub trait ParameterStore: Send + Sync {
    fn get(&self, project: &str, key: &str) -> Result<String>;
    fn put(&self, project: &str, key: &str, value: &str) -> Result<()>;
    fn list_keys(&self, project: &str) -> Result<Vec<String>>;
}

/// Fully qualified parameter name, as used in error messages.
pub fn qualified_name(project: &str, key: &str) -> String {
    format!("{project}_{key}")
}
