// Write-side use cases
pub mod anomaly_commands;
pub mod check_in_commands;
pub mod detection_commands;

pub use anomaly_commands::*;
pub use check_in_commands::*;
pub use detection_commands::*;
