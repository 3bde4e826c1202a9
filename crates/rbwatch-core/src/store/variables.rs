// ── Script environment and script registries ──

use indexmap::IndexMap;
use rbwatch_api::Record;
use tracing::debug;

use crate::model::{Script, Variable};

/// Global script variables, name → value.
#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    values: IndexMap<String, String>,
}

impl VariableRegistry {
    pub fn from_records(rows: &[Record]) -> Self {
        let values = rows
            .iter()
            .filter_map(|row| Variable::try_from(row).ok())
            .map(|v| (v.name, v.value))
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Scripts known at startup, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ScriptRegistry {
    scripts: IndexMap<String, Script>,
}

impl ScriptRegistry {
    pub fn from_records(rows: &[Record]) -> Self {
        let scripts = rows
            .iter()
            .filter_map(|row| match Script::try_from(row) {
                Ok(script) => Some((script.name.clone(), script)),
                Err(e) => {
                    debug!(error = %e, "skipping script row");
                    None
                }
            })
            .collect();
        Self { scripts }
    }

    pub fn get(&self, name: &str) -> Option<&Script> {
        self.scripts.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Script> {
        self.scripts.values()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}
