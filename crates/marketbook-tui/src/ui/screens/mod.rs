//! Screen-specific content rendering.

pub mod forms;
pub mod products;
pub mod profile;
