// Domain entities
pub mod anomaly;
pub mod attendance;
pub mod detection_rules;
pub mod device_fingerprint;
pub mod model;

pub use anomaly::*;
pub use attendance::*;
pub use detection_rules::*;
pub use device_fingerprint::*;
pub use model::*;
