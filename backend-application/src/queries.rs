// Read-side use cases
pub mod anomaly_queries;
pub mod health_queries;

pub use anomaly_queries::*;
pub use health_queries::*;
