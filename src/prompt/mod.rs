mod builder;
mod engine;

pub use builder::{
    DEFAULT_DECISION_TEMPLATE, DEFAULT_JUDGMENT_TEMPLATE, DEFAULT_SUMMARY_TEMPLATE, PromptBuilder,
};
pub use engine::TeraEngine;
