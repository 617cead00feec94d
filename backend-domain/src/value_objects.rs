// Domain value objects
pub mod anomaly_type;
pub mod geo_point;
pub mod severity;

pub use anomaly_type::*;
pub use geo_point::*;
pub use severity::*;
