pub mod console;
pub mod summary;

pub use summary::{PolicyReport, PolicySummary, RunReport, RunSummary};
