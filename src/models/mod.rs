mod metric;
mod observation;

pub use metric::{Metric, MetricValues};
pub use observation::{Candidate, Observation};
