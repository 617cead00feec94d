pub mod scan_scheduler;

pub use scan_scheduler::*;
