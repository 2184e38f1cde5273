pub mod aggregate;
pub mod map;
pub mod stats;
