//! Socialgraph driver: the stock generation script and the loader contract.

pub mod loader;
pub mod script;

pub use loader::{BatchLoader, JsonLinesSink, LoadReport, OperationSink};
pub use script::{run, RunConfig, ScriptConfig, ScriptOutput};
