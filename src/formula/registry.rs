use super::spec::ProgramFormulaSpec;
use std::collections::HashMap;
use tracing::warn;

/// Program code -> formula spec.
#[derive(Debug, Clone, Default)]
pub struct SpecRegistry {
    specs: HashMap<String, ProgramFormulaSpec>,
}

impl SpecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the formula for its program code. Structural issues are
    /// logged, not rejected.
    pub fn insert(&mut self, spec: ProgramFormulaSpec) -> Option<ProgramFormulaSpec> {
        for issue in spec.issues() {
            warn!("Spec '{}': {}", spec.program, issue);
        }
        self.specs.insert(spec.program.clone(), spec)
    }

    pub fn get(&self, program: &str) -> Option<&ProgramFormulaSpec> {
        self.specs.get(program)
    }

    pub fn contains(&self, program: &str) -> bool {
        self.specs.contains_key(program)
    }

    /// Program codes in sorted order.
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.specs.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// `(program, issue)` for every spec with a structural problem.
    pub fn issues(&self) -> Vec<(String, String)> {
        let mut all: Vec<(String, String)> = self
            .specs
            .values()
            .flat_map(|s| s.issues().into_iter().map(|i| (s.program.clone(), i)))
            .collect();
        all.sort();
        all
    }
}

impl FromIterator<ProgramFormulaSpec> for SpecRegistry {
    fn from_iter<I: IntoIterator<Item = ProgramFormulaSpec>>(iter: I) -> Self {
        let mut registry = SpecRegistry::new();
        for spec in iter {
            registry.insert(spec);
        }
        registry
    }
}
