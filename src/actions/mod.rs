pub mod factory;
pub mod fetch;
pub mod page;
pub mod registry;
pub mod search;
pub mod traits;

pub use factory::default_actions;
pub use fetch::FetchAndSummarizeAction;
pub use registry::{ActionRegistry, SUBMIT_ACTION, submit_spec};
pub use search::{SearchAction, SearchHit};
pub use traits::{Action, ActionSpec, RunContext};
