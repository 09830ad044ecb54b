//! Generic component types shared by component custom resources
//!
//! These are the building blocks a component resource embeds in its spec
//! and status: deployment target coordinates, image reference, common pod
//! placement properties and the observed component status.

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{
    Affinity, PodSecurityContext, ResourceRequirements, SecurityContext, Toleration,
    TopologySpreadConstraint,
};
use kube::{Resource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Error, Result};

/// Untyped parameter tree handed to the rendering step
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// Deployment target coordinates of a component
///
/// Empty values fall back to the custom resource's own namespace and name.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    /// Target namespace (defaults to the namespace of the resource)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    /// Target name (defaults to the name of the resource)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl ComponentSpec {
    /// Namespace the component is deployed to, falling back to `fallback`
    pub fn effective_namespace(&self, fallback: &str) -> String {
        if self.namespace.is_empty() {
            fallback.to_string()
        } else {
            self.namespace.clone()
        }
    }

    /// Name the component is deployed as, falling back to `fallback`
    pub fn effective_name(&self, fallback: &str) -> String {
        if self.name.is_empty() {
            fallback.to_string()
        } else {
            self.name.clone()
        }
    }
}

/// Container image reference
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    /// Image repository
    #[serde(skip_serializing_if = "String::is_empty")]
    #[schemars(length(min = 1))]
    pub repository: String,

    /// Image tag
    #[serde(skip_serializing_if = "String::is_empty")]
    #[schemars(length(min = 1))]
    pub tag: String,

    /// Image pull policy (Always, Never, IfNotPresent)
    #[serde(default = "default_pull_policy", skip_serializing_if = "String::is_empty")]
    pub pull_policy: String,

    /// Name of a secret holding registry credentials
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pull_secret: String,
}

fn default_pull_policy() -> String {
    "IfNotPresent".to_string()
}

/// Common pod scheduling and placement properties
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesProperties {
    /// Node selector
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,

    /// Affinity rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affinity: Option<Affinity>,

    /// Topology spread constraints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topology_spread_constraints: Vec<TopologySpreadConstraint>,

    /// Tolerations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tolerations: Vec<Toleration>,

    /// Priority class name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_class_name: Option<String>,

    /// Pod security context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_security_context: Option<PodSecurityContext>,

    /// Additional pod annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pod_annotations: BTreeMap<String, String>,

    /// Additional pod labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pod_labels: BTreeMap<String, String>,

    /// Container security context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContext>,

    /// Container resource requirements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

/// Lifecycle state of a component
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum State {
    Ready,
    Pending,
    Processing,
    DeletionPending,
    Deleting,
    Error,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            State::Ready => "Ready",
            State::Pending => "Pending",
            State::Processing => "Processing",
            State::DeletionPending => "DeletionPending",
            State::Deleting => "Deleting",
            State::Error => "Error",
        };
        f.write_str(s)
    }
}

/// Status condition
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type (Ready)
    #[serde(rename = "type")]
    pub type_: String,

    /// Status (True, False, Unknown)
    pub status: String,

    /// Last transition time
    pub last_transition_time: DateTime<Utc>,

    /// Reason for the condition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Location of an object published for a component
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Condition type reporting overall readiness
pub const CONDITION_READY: &str = "Ready";

/// Observed state of a component
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    /// Generation last seen by the controller (-1 = not yet observed)
    #[serde(default = "default_generation")]
    pub observed_generation: i64,

    /// Generation last successfully applied (-1 = never applied)
    #[serde(default = "default_generation")]
    pub applied_generation: i64,

    /// Time of the last reconciliation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_observed_at: Option<DateTime<Utc>>,

    /// Time of the last successful apply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_applied_at: Option<DateTime<Utc>>,

    /// Status conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Component state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,

    /// Where the rendering parameters were last published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters_ref: Option<ObjectRef>,
}

fn default_generation() -> i64 {
    -1
}

impl Default for ComponentStatus {
    fn default() -> Self {
        Self {
            observed_generation: default_generation(),
            applied_generation: default_generation(),
            last_observed_at: None,
            last_applied_at: None,
            conditions: Vec::new(),
            state: None,
            parameters_ref: None,
        }
    }
}

impl ComponentStatus {
    /// Get a condition by type
    pub fn condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    /// Whether two statuses report the same outcome, ignoring observation
    /// and apply timestamps
    pub fn same_outcome(&self, other: &ComponentStatus) -> bool {
        let strip = |s: &ComponentStatus| ComponentStatus {
            last_observed_at: None,
            last_applied_at: None,
            ..s.clone()
        };
        strip(self) == strip(other)
    }

    /// Set the state together with the matching Ready condition
    ///
    /// The transition time of the condition is only moved when its status
    /// actually changes.
    pub fn set_state(&mut self, state: State, reason: &str, message: &str, now: DateTime<Utc>) {
        let status = if state == State::Ready { "True" } else { "False" };

        match self.conditions.iter_mut().find(|c| c.type_ == CONDITION_READY) {
            Some(condition) => {
                if condition.status != status {
                    condition.status = status.to_string();
                    condition.last_transition_time = now;
                }
                condition.reason = Some(reason.to_string());
                condition.message = Some(message.to_string());
            }
            None => self.conditions.push(Condition {
                type_: CONDITION_READY.to_string(),
                status: status.to_string(),
                last_transition_time: now,
                reason: Some(reason.to_string()),
                message: Some(message.to_string()),
            }),
        }

        self.state = Some(state);
    }
}

/// Conversion of a typed spec into its untyped parameter tree
pub trait Unstructurable {
    fn to_unstructured(&self) -> Result<Parameters>;
}

/// Serialize a typed value into a JSON object using its serde field names
pub fn to_parameters<T: Serialize>(value: &T) -> Result<Parameters> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(Error::ConversionError(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(Error::ConversionError(e.to_string())),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// A custom resource managed as a component
pub trait Component: Resource + Sized {
    type Spec: Unstructurable;

    /// Typed desired state
    fn spec(&self) -> &Self::Spec;

    /// Deployment target coordinates embedded in the spec
    fn component_spec(&self) -> &ComponentSpec;

    /// Observed state, if any has been recorded
    fn component_status(&self) -> Option<&ComponentStatus>;

    /// Mutable observed state, initialized to defaults when missing
    fn component_status_mut(&mut self) -> &mut ComponentStatus;

    /// Effective namespace of the managed workload
    fn deployment_namespace(&self) -> String {
        self.component_spec()
            .effective_namespace(&self.namespace().unwrap_or_default())
    }

    /// Effective name of the managed workload
    fn deployment_name(&self) -> String {
        self.component_spec().effective_name(&self.name_any())
    }
}
