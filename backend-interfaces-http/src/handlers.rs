pub mod check_in_handlers;
pub mod detect_handlers;
pub mod ops_handlers;

pub use check_in_handlers::*;
pub use detect_handlers::*;
pub use ops_handlers::*;
