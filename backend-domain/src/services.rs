// Pure detection services; all store access happens in the application layer
pub mod buddy_punching;
pub mod geo;
pub mod impossible_travel;
pub mod shared_device;

pub use buddy_punching::*;
pub use geo::*;
pub use impossible_travel::*;
pub use shared_device::*;

#[cfg(test)]
pub(crate) mod fixtures;
