//! Custom Resource Definitions for the PodReloader Operator

mod component;
mod pod_reloader;

pub use component::*;
pub use pod_reloader::*;

use kube::CustomResourceExt;

use crate::Result;

/// Generate CRD YAML manifests for all custom resources
pub fn generate_crds() -> Result<Vec<String>> {
    Ok(vec![serde_yaml::to_string(&PodReloader::crd())?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crd_carries_replica_count_constraints() {
        let crds = generate_crds().unwrap();
        assert_eq!(crds.len(), 1);

        let crd = &crds[0];
        assert!(crd.contains("name: podreloaders.operator.podreloader.io"));
        assert!(crd.contains("replicaCount"));
        assert!(crd.contains("minimum: 1"));
        assert!(crd.contains("objectSelector"));
        assert!(crd.contains("namespaceSelector"));
        assert!(crd.contains("default: IfNotPresent"));
        assert!(crd.contains("minLength: 1"));
        assert!(crd.contains("parametersRef"));
    }
}
