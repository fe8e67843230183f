//! Lifecycle management

pub mod shutdown;
pub mod startup;
