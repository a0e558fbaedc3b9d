// Library surface: the binary and the in-crate integration tests build on these.

pub mod config;
pub mod metrics;
pub mod proxy;
