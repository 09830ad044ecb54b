//! CRD spec to rendering parameter transformation

use serde_json::{json, Value};
use tracing::debug;

use crate::crd::{Parameters, PodReloaderSpec, Unstructurable};
use crate::Result;

/// Rewrites a typed spec into the parameter tree consumed by rendering
pub trait ParameterTransformer<S> {
    fn transform_parameters(&self, namespace: &str, name: &str, spec: &S) -> Result<Parameters>;
}

/// Parameter transformer for PodReloader
#[derive(Clone, Copy, Debug, Default)]
pub struct PodReloaderTransformer;

impl PodReloaderTransformer {
    pub fn new() -> Self {
        Self
    }
}

impl ParameterTransformer<PodReloaderSpec> for PodReloaderTransformer {
    fn transform_parameters(
        &self,
        namespace: &str,
        name: &str,
        spec: &PodReloaderSpec,
    ) -> Result<Parameters> {
        let values = build_parameters(spec, name, &spec.image.pull_secret)?;

        debug!(
            namespace,
            name,
            keys = values.len(),
            "Transformed PodReloader parameters"
        );

        Ok(values)
    }
}

/// Convert a spec and apply the component parameter conventions
///
/// Sets `fullnameOverride`, externalizes a non-empty pull secret into
/// `imagePullSecrets` and strips the top-level `namespace`/`name` keys.
pub fn build_parameters<S: Unstructurable>(
    spec: &S,
    name: &str,
    pull_secret: &str,
) -> Result<Parameters> {
    let mut values = spec.to_unstructured()?;

    values.insert("fullnameOverride".to_string(), Value::String(name.to_string()));

    if !pull_secret.is_empty() {
        values.insert(
            "imagePullSecrets".to_string(),
            json!([{ "name": pull_secret }]),
        );
    }
    // pullSecret never stays inline, set or not
    if let Some(Value::Object(image)) = values.get_mut("image") {
        image.remove("pullSecret");
    }

    values.remove("namespace");
    values.remove("name");

    Ok(values)
}

/// Render a parameter tree as a values YAML document
pub fn to_values_yaml(parameters: &Parameters) -> Result<String> {
    Ok(serde_yaml::to_string(parameters)?)
}
