mod runner;
mod summary;

pub use runner::Pipeline;
pub use summary::{FileError, RunSummary};
