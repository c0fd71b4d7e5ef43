use super::{OverrideFamily, ScoreOverride};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Which program codes a definition applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeMatch {
    Exact(String),
    Prefix(String),
}

/// One entry of an override definition file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideDefinition {
    #[serde(rename = "match")]
    pub matcher: CodeMatch,
    pub formula: OverrideFamily,
}

/// Exact codes first, then prefixes from longest to shortest. Prefixes of
/// equal length keep registration order. Registering a code or prefix again
/// replaces the earlier override.
#[derive(Clone, Default)]
pub struct OverrideRegistry {
    exact: HashMap<String, Arc<dyn ScoreOverride>>,
    prefixes: Vec<(String, Arc<dyn ScoreOverride>)>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(definitions: impl IntoIterator<Item = OverrideDefinition>) -> Self {
        let mut registry = Self::new();
        for def in definitions {
            match def.matcher {
                CodeMatch::Exact(code) => registry.register_exact(code, def.formula),
                CodeMatch::Prefix(prefix) => registry.register_prefix(prefix, def.formula),
            };
        }
        registry
    }

    pub fn register_exact(
        &mut self,
        code: impl Into<String>,
        ov: impl ScoreOverride + 'static,
    ) -> &mut Self {
        self.exact.insert(code.into(), Arc::new(ov));
        self
    }

    pub fn register_prefix(
        &mut self,
        prefix: impl Into<String>,
        ov: impl ScoreOverride + 'static,
    ) -> &mut Self {
        let prefix = prefix.into();
        let ov: Arc<dyn ScoreOverride> = Arc::new(ov);
        match self.prefixes.iter_mut().find(|(p, _)| *p == prefix) {
            Some(slot) => slot.1 = ov,
            None => {
                self.prefixes.push((prefix, ov));
                self.prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
            }
        }
        self
    }

    pub fn find(&self, program: &str) -> Option<&dyn ScoreOverride> {
        if let Some(ov) = self.exact.get(program) {
            return Some(ov.as_ref());
        }
        self.prefixes
            .iter()
            .find(|(prefix, _)| program.starts_with(prefix.as_str()))
            .map(|(_, ov)| ov.as_ref())
    }

    pub fn exact_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.exact.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for OverrideRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefixes: Vec<&str> = self.prefixes.iter().map(|(p, _)| p.as_str()).collect();
        f.debug_struct("OverrideRegistry")
            .field("exact", &self.exact_codes())
            .field("prefixes", &prefixes)
            .finish()
    }
}
