//! PodReloader Custom Resource Definition

use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::component::{
    to_parameters, Component, ComponentSpec, ComponentStatus, ImageSpec, KubernetesProperties,
    Parameters, Unstructurable,
};
use crate::Result;

/// API group of the PodReloader resource
pub const API_GROUP: &str = "operator.podreloader.io";

/// PodReloader resource specification
#[derive(CustomResource, Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "operator.podreloader.io",
    version = "v1alpha1",
    kind = "PodReloader",
    plural = "podreloaders",
    singular = "podreloader",
    namespaced,
    status = "PodReloaderStatus",
    printcolumn = r#"{"name": "State", "type": "string", "jsonPath": ".status.state"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PodReloaderSpec {
    /// Deployment target coordinates
    #[serde(flatten)]
    pub component: ComponentSpec,

    /// Number of reloader replicas
    #[serde(default = "default_replica_count")]
    #[schemars(range(min = 1))]
    pub replica_count: i32,

    /// Reloader image
    #[serde(default)]
    pub image: ImageSpec,

    /// Scheduling and placement properties
    #[serde(flatten)]
    pub kubernetes: KubernetesProperties,

    /// Selects the pods to watch and reload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_selector: Option<LabelSelector>,

    /// Selects the namespaces to watch and reload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_selector: Option<LabelSelector>,
}

fn default_replica_count() -> i32 {
    1
}

impl Default for PodReloaderSpec {
    fn default() -> Self {
        Self {
            component: ComponentSpec::default(),
            replica_count: default_replica_count(),
            image: ImageSpec::default(),
            kubernetes: KubernetesProperties::default(),
            object_selector: None,
            namespace_selector: None,
        }
    }
}

impl Unstructurable for PodReloaderSpec {
    fn to_unstructured(&self) -> Result<Parameters> {
        to_parameters(self)
    }
}

/// PodReloader status
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodReloaderStatus {
    #[serde(flatten)]
    pub component: ComponentStatus,
}

impl Component for PodReloader {
    type Spec = PodReloaderSpec;

    fn spec(&self) -> &PodReloaderSpec {
        &self.spec
    }

    fn component_spec(&self) -> &ComponentSpec {
        &self.spec.component
    }

    fn component_status(&self) -> Option<&ComponentStatus> {
        self.status.as_ref().map(|s| &s.component)
    }

    fn component_status_mut(&mut self) -> &mut ComponentStatus {
        &mut self.status.get_or_insert_with(Default::default).component
    }
}
