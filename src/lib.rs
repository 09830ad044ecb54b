//! PodReloader Kubernetes Operator
//!
//! Declares the PodReloader custom resource and turns its typed spec into the
//! parameter tree consumed by the manifest rendering step.

pub mod adapters;
pub mod config;
pub mod controllers;
pub mod crd;
pub mod error;
pub mod reconcilers;

pub use error::{Error, Result};
