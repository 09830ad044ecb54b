//! Reconciliation logic for managed resources

pub mod pod_reloader;
