//! Controller implementations for watching and reconciling resources

pub mod pod_reloader_controller;

use kube::Client;
use std::sync::Arc;

use crate::adapters::parameters::PodReloaderTransformer;
use crate::config::OperatorConfig;

/// Shared context for controllers
pub struct Context {
    /// Kubernetes client
    pub client: Client,
    /// Operator configuration
    pub config: OperatorConfig,
    /// Parameter transformer, shared across reconciliations
    pub transformer: PodReloaderTransformer,
}

impl Context {
    /// Create a new context
    pub fn new(client: Client, config: OperatorConfig) -> Arc<Self> {
        Arc::new(Self {
            client,
            config,
            transformer: PodReloaderTransformer::new(),
        })
    }
}
