//! Kubernetes ConfigMap builder publishing rendering parameters

use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::crd::{Component, PodReloader, API_GROUP};

/// Key holding the parameter document in the ConfigMap
pub const VALUES_KEY: &str = "values.yaml";

/// Name of the ConfigMap carrying the parameters of a deployment
pub fn config_map_name(deployment_name: &str) -> String {
    format!("{}-parameters", deployment_name)
}

/// Build the parameters ConfigMap for a PodReloader
///
/// The ConfigMap lives in the effective deployment namespace, which may differ
/// from the namespace of the resource, so ownership is expressed with labels
/// instead of owner references.
pub fn build_config_map(pod_reloader: &PodReloader, values_yaml: &str) -> ConfigMap {
    let namespace = pod_reloader.deployment_namespace();
    let deployment_name = pod_reloader.deployment_name();

    let mut annotations = BTreeMap::new();
    annotations.insert(
        "checksum/values".to_string(),
        calculate_checksum(values_yaml),
    );

    let mut data = BTreeMap::new();
    data.insert(VALUES_KEY.to_string(), values_yaml.to_string());

    ConfigMap {
        metadata: ObjectMeta {
            name: Some(config_map_name(&deployment_name)),
            namespace: Some(namespace),
            labels: Some(build_labels(pod_reloader, &deployment_name)),
            annotations: Some(annotations),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    }
}

fn build_labels(pod_reloader: &PodReloader, deployment_name: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("app.kubernetes.io/name".to_string(), "pod-reloader".to_string());
    labels.insert(
        "app.kubernetes.io/instance".to_string(),
        deployment_name.to_string(),
    );
    labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        "pod-reloader-operator".to_string(),
    );
    labels.insert(
        format!("{}/owner-namespace", API_GROUP),
        pod_reloader.namespace().unwrap_or_default(),
    );
    labels.insert(format!("{}/owner-name", API_GROUP), pod_reloader.name_any());
    labels
}

/// Short sha256 checksum of the values document
fn calculate_checksum(values_yaml: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(values_yaml.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}
