//! Adapters for parameter transformation and Kubernetes resource building

pub mod config_map_builder;
pub mod parameters;
