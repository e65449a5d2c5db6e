// src/store/memory.rs

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::{qualified_name, ParameterStore};
use crate::errors::{Result, TaplineError};

#[derive(Debug, Clone, Default)]
pub struct MemoryParameterStore {
    values: Arc<Mutex<BTreeMap<(String, String), String>>>,
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, project: &str, key: &str, value: &str) -> Self {
        self.insert(project, key, value);
        self
    }

    fn insert(&self, project: &str, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert((project.to_string(), key.to_string()), value.to_string());
        }
    }

    fn poisoned() -> TaplineError {
        TaplineError::StoreError("in-memory store lock poisoned".to_string())
    }
}

impl ParameterStore for MemoryParameterStore {
    fn get(&self, project: &str, key: &str) -> Result<String> {
        let values = self.values.lock().map_err(|_| Self::poisoned())?;
        values
            .get(&(project.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| {
                TaplineError::StoreError(format!(
                    "parameter {} not found",
                    qualified_name(project, key)
                ))
            })
    }

    fn put(&self, project: &str, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| Self::poisoned())?;
        values.insert((project.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn list_keys(&self, project: &str) -> Result<Vec<String>> {
        let values = self.values.lock().map_err(|_| Self::poisoned())?;
        Ok(values
            .keys()
            .filter(|(p, _)| p == project)
            .map(|(_, k)| k.clone())
            .collect())
    }
}
