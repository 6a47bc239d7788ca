#![warn(clippy::pedantic)]

pub mod cached;
pub mod memory;

pub use cached::Cached;
pub use memory::InMemory;
