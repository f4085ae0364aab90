//! Storage primitives for the configuration file.

pub mod atomic_toml;

pub use atomic_toml::AtomicTomlFile;
