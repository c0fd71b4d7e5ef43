//! Declarative program formulas and the generic evaluator that runs them.

pub mod evaluator;
pub mod registry;
pub(crate) mod resolve;
pub mod spec;

pub use evaluator::evaluate;
pub use registry::SpecRegistry;
pub use spec::{
    BonusCondition, BonusRule, BonusTerm, Component, Correction, HistoryPolicy,
    ProgramFormulaSpec, SelectionGroup, SourceKind, SubjectRequirement,
};
