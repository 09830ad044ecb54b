//! Reconciliation logic for PodReloader resources

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{DeleteParams, Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use tracing::{debug, info, warn};

use crate::adapters::config_map_builder::{build_config_map, config_map_name};
use crate::adapters::parameters::{to_values_yaml, ParameterTransformer};
use crate::crd::{Component, ComponentStatus, ObjectRef, PodReloader, PodReloaderSpec, State};
use crate::{Error, Result};

const VALID_PULL_POLICIES: [&str; 3] = ["Always", "Never", "IfNotPresent"];

/// Validate a PodReloader spec
pub fn validate(pod_reloader: &PodReloader) -> Result<()> {
    let spec = &pod_reloader.spec;

    if spec.replica_count < 1 {
        return Err(Error::ValidationError(format!(
            "replicaCount must be >= 1, got {}",
            spec.replica_count
        )));
    }

    if !spec.image.pull_policy.is_empty()
        && !VALID_PULL_POLICIES.contains(&spec.image.pull_policy.as_str())
    {
        return Err(Error::ValidationError(format!(
            "image.pullPolicy must be one of: {:?}",
            VALID_PULL_POLICIES
        )));
    }

    Ok(())
}

/// Transform a PodReloader into the values document for its effective identity
pub fn render_parameters<T>(pod_reloader: &PodReloader, transformer: &T) -> Result<String>
where
    T: ParameterTransformer<PodReloaderSpec>,
{
    let namespace = pod_reloader.deployment_namespace();
    let name = pod_reloader.deployment_name();

    let parameters = transformer.transform_parameters(&namespace, &name, &pod_reloader.spec)?;
    to_values_yaml(&parameters)
}

/// Location of the parameters ConfigMap for the current effective identity
pub fn parameters_ref(pod_reloader: &PodReloader) -> ObjectRef {
    ObjectRef {
        namespace: pod_reloader.deployment_namespace(),
        name: config_map_name(&pod_reloader.deployment_name()),
    }
}

/// Previously published parameters that no longer match the effective identity
pub fn stale_parameters(pod_reloader: &PodReloader) -> Option<ObjectRef> {
    let published = pod_reloader.component_status()?.parameters_ref.clone()?;
    (published != parameters_ref(pod_reloader)).then_some(published)
}

/// Reconcile the ConfigMap publishing the rendering parameters
pub async fn reconcile_parameters(
    pod_reloader: &PodReloader,
    client: &Client,
    field_manager: &str,
    values_yaml: &str,
) -> Result<ObjectRef> {
    let target = parameters_ref(pod_reloader);
    let config_map = build_config_map(pod_reloader, values_yaml);

    let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), &target.namespace);
    let patch_params = PatchParams::apply(field_manager).force();

    config_maps
        .patch(&target.name, &patch_params, &Patch::Apply(&config_map))
        .await
        .map_err(|e| Error::KubeError(format!("Failed to create/update ConfigMap: {}", e)))?;

    info!("Reconciled parameters ConfigMap {}", target);

    Ok(target)
}

/// Delete a parameters ConfigMap
pub async fn delete_parameters(client: &Client, target: &ObjectRef) -> Result<()> {
    let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), &target.namespace);

    match config_maps.delete(&target.name, &DeleteParams::default()).await {
        Ok(_) => {
            info!("Deleted parameters ConfigMap {}", target);
            Ok(())
        }
        Err(kube::Error::Api(resp)) if resp.code == 404 => {
            warn!("Parameters ConfigMap {} already gone", target);
            Ok(())
        }
        Err(e) => Err(Error::KubeError(format!(
            "Failed to delete ConfigMap {}: {}",
            target, e
        ))),
    }
}

/// Compute the next status of a PodReloader
pub fn next_status(
    pod_reloader: &PodReloader,
    state: State,
    reason: &str,
    message: &str,
    now: DateTime<Utc>,
) -> ComponentStatus {
    let generation = pod_reloader.metadata.generation.unwrap_or(-1);
    let mut status = pod_reloader.component_status().cloned().unwrap_or_default();

    status.observed_generation = generation;
    status.last_observed_at = Some(now);

    if state == State::Ready {
        status.applied_generation = generation;
        status.last_applied_at = Some(now);
        status.parameters_ref = Some(parameters_ref(pod_reloader));
    }

    status.set_state(state, reason, message, now);
    status
}

/// Update the status of a PodReloader
pub async fn update_status(
    pod_reloader: &PodReloader,
    client: &Client,
    state: State,
    reason: &str,
    message: &str,
) -> Result<()> {
    let ns = pod_reloader.namespace().unwrap_or_default();
    let name = pod_reloader.name_any();

    let status = next_status(pod_reloader, state, reason, message, Utc::now());

    // Writing timestamps alone would trigger another watch event
    if let Some(current) = pod_reloader.component_status() {
        if current.same_outcome(&status) {
            debug!("Status of {}/{} unchanged, skipping update", ns, name);
            return Ok(());
        }
    }

    let pod_reloaders: Api<PodReloader> = Api::namespaced(client.clone(), &ns);
    let patch = serde_json::json!({
        "status": status
    });

    pod_reloaders
        .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .map_err(|e| Error::KubeError(format!("Failed to update status: {}", e)))?;

    info!("Updated status for {}/{}: state={}", ns, name, state);

    Ok(())
}
