//! Adapter implementations for registry ports.

pub mod memory;

pub use memory::InMemoryServiceRegistry;
