//! Hardware snapshot engine
//!
//! Probes CPU, RAM, GPU, storage and OS identity through three handles (the
//! device inventory, native graphics adapter descriptors and sysinfo host
//! counters) and reconciles them into one [`SystemSpecs`].

pub mod adapter;
pub mod cpu;
pub mod gpu;
pub mod heuristics;
pub mod host;
pub mod inventory;
pub mod os;
pub mod ram;
pub mod reading;
pub mod resolver;
pub mod storage;
mod system;
pub mod units;

#[cfg(test)]
pub(crate) mod fixtures;

pub use system::SystemSpecs;
