pub mod classifier;
pub mod config;
pub mod engine;
pub mod store;

pub use classifier::{Classifier, ClassifyResponse, RulesResponse};
pub use config::{
    ActionKind, Category, Clause, ConditionTree, MatchMode, Operator, Priority, Rule,
    RulesDocument,
};
pub use engine::{classify, Account, Email, Importance, Verdict};
pub use store::RuleStore;
