//! Integration tests for reconciler validation and status logic
//!
//! These tests verify that PodReloader specs are validated before any
//! transformation, that parameters are rendered for the effective identity,
//! and that status transitions follow the component lifecycle.

use chrono::{TimeZone, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use pod_reloader_operator::adapters::parameters::PodReloaderTransformer;
use pod_reloader_operator::crd::{
    ComponentSpec, ComponentStatus, ImageSpec, ObjectRef, PodReloader, PodReloaderSpec,
    PodReloaderStatus, State, CONDITION_READY,
};
use pod_reloader_operator::reconcilers::pod_reloader;
use pod_reloader_operator::Error;

// ============================================================================
// Test Helpers
// ============================================================================

fn default_metadata(name: &str, generation: Option<i64>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some("default".to_string()),
        generation,
        ..Default::default()
    }
}

fn valid_spec() -> PodReloaderSpec {
    PodReloaderSpec {
        replica_count: 2,
        image: ImageSpec {
            repository: "example/reloader".to_string(),
            tag: "v2".to_string(),
            pull_policy: "IfNotPresent".to_string(),
            pull_secret: "regcred".to_string(),
        },
        ..Default::default()
    }
}

fn create_pod_reloader(spec: PodReloaderSpec) -> PodReloader {
    PodReloader {
        metadata: default_metadata("test-reloader", Some(4)),
        spec,
        status: None,
    }
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn valid_spec_passes_validation() {
    let pr = create_pod_reloader(valid_spec());
    let result = pod_reloader::validate(&pr);
    if let Err(e) = &result {
        panic!("Validation failed unexpectedly: {:?}", e);
    }
}

#[test]
fn default_spec_passes_validation() {
    let pr = create_pod_reloader(PodReloaderSpec::default());
    assert!(pod_reloader::validate(&pr).is_ok());
}

#[test]
fn zero_replicas_fails_validation() {
    let mut spec = valid_spec();
    spec.replica_count = 0;

    let result = pod_reloader::validate(&create_pod_reloader(spec));

    assert!(matches!(result, Err(Error::ValidationError(_))));
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("replicaCount"));
}

#[test]
fn negative_replicas_fails_validation() {
    let mut spec = valid_spec();
    spec.replica_count = -3;

    let result = pod_reloader::validate(&create_pod_reloader(spec));
    assert!(matches!(result, Err(Error::ValidationError(_))));
}

#[test]
fn unknown_pull_policy_fails_validation() {
    let mut spec = valid_spec();
    spec.image.pull_policy = "Sometimes".to_string();

    let result = pod_reloader::validate(&create_pod_reloader(spec));

    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("pullPolicy"));
}

// ============================================================================
// Parameter Rendering Tests
// ============================================================================

#[test]
fn rendering_uses_metadata_identity_by_default() {
    let pr = create_pod_reloader(valid_spec());
    let yaml = pod_reloader::render_parameters(&pr, &PodReloaderTransformer::new()).unwrap();

    assert!(yaml.contains("fullnameOverride: test-reloader"));
    assert!(yaml.contains("imagePullSecrets"));
    assert!(!yaml.contains("pullSecret:"));
}

#[test]
fn rendering_uses_spec_name_override() {
    let mut spec = valid_spec();
    spec.component = ComponentSpec {
        namespace: "other-ns".to_string(),
        name: "custom-reloader".to_string(),
    };

    let pr = create_pod_reloader(spec);
    let yaml = pod_reloader::render_parameters(&pr, &PodReloaderTransformer::new()).unwrap();

    assert!(yaml.contains("fullnameOverride: custom-reloader"));
    assert!(!yaml.contains("other-ns"));
}

// ============================================================================
// Status Tests
// ============================================================================

#[test]
fn ready_status_records_generations() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let pr = create_pod_reloader(valid_spec());

    let status = pod_reloader::next_status(&pr, State::Ready, "Ready", "published", now);

    assert_eq!(status.state, Some(State::Ready));
    assert_eq!(status.observed_generation, 4);
    assert_eq!(status.applied_generation, 4);
    assert_eq!(status.last_observed_at, Some(now));
    assert_eq!(status.last_applied_at, Some(now));
    assert_eq!(status.condition(CONDITION_READY).unwrap().status, "True");
}

#[test]
fn error_status_keeps_last_applied_generation() {
    let earlier = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();

    let mut pr = create_pod_reloader(valid_spec());
    pr.status = Some(PodReloaderStatus {
        component: ComponentStatus {
            observed_generation: 3,
            applied_generation: 3,
            last_applied_at: Some(earlier),
            ..Default::default()
        },
    });

    let status = pod_reloader::next_status(
        &pr,
        State::Error,
        "ConversionFailed",
        "Conversion error: boom",
        now,
    );

    assert_eq!(status.state, Some(State::Error));
    assert_eq!(status.observed_generation, 4);
    assert_eq!(status.applied_generation, 3);
    assert_eq!(status.last_applied_at, Some(earlier));

    let ready = status.condition(CONDITION_READY).unwrap();
    assert_eq!(ready.status, "False");
    assert_eq!(ready.reason.as_deref(), Some("ConversionFailed"));
    assert_eq!(ready.message.as_deref(), Some("Conversion error: boom"));
}

#[test]
fn missing_generation_is_reported_as_unobserved() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let pr = PodReloader {
        metadata: default_metadata("test-reloader", None),
        spec: valid_spec(),
        status: None,
    };

    let status = pod_reloader::next_status(&pr, State::Deleting, "Deleting", "bye", now);
    assert_eq!(status.observed_generation, -1);
    assert_eq!(status.applied_generation, -1);
    assert_eq!(status.state, Some(State::Deleting));
}

#[test]
fn error_reasons_are_stable() {
    assert_eq!(
        Error::ConversionError("x".to_string()).reason(),
        "ConversionFailed"
    );
    assert_eq!(
        Error::ValidationError("x".to_string()).reason(),
        "ValidationFailed"
    );
}

#[test]
fn repeated_outcome_yields_equivalent_status() {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap();

    let mut pr = create_pod_reloader(valid_spec());
    let first = pod_reloader::next_status(&pr, State::Ready, "Ready", "published", t0);
    pr.status = Some(PodReloaderStatus {
        component: first.clone(),
    });

    let second = pod_reloader::next_status(&pr, State::Ready, "Ready", "published", t1);

    assert_ne!(first.last_observed_at, second.last_observed_at);
    assert!(first.same_outcome(&second));
}

#[test]
fn new_generation_is_not_an_equivalent_status() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let mut pr = create_pod_reloader(valid_spec());
    let first = pod_reloader::next_status(&pr, State::Ready, "Ready", "published", now);
    pr.status = Some(PodReloaderStatus {
        component: first.clone(),
    });
    pr.metadata.generation = Some(5);

    let second = pod_reloader::next_status(&pr, State::Ready, "Ready", "published", now);
    assert!(!first.same_outcome(&second));
}

// ============================================================================
// Published Parameters Tracking Tests
// ============================================================================

#[test]
fn ready_status_records_published_parameters() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let pr = create_pod_reloader(valid_spec());

    let status = pod_reloader::next_status(&pr, State::Ready, "Ready", "published", now);

    assert_eq!(
        status.parameters_ref,
        Some(ObjectRef {
            namespace: "default".to_string(),
            name: "test-reloader-parameters".to_string(),
        })
    );
    assert!(pod_reloader::stale_parameters(&pr).is_none());
}

#[test]
fn identity_change_marks_previous_parameters_stale() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let mut pr = create_pod_reloader(valid_spec());
    let published = pod_reloader::next_status(&pr, State::Ready, "Ready", "published", now);
    pr.status = Some(PodReloaderStatus {
        component: published,
    });
    assert!(pod_reloader::stale_parameters(&pr).is_none());

    pr.spec.component.namespace = "shared".to_string();
    let stale = pod_reloader::stale_parameters(&pr).expect("previous parameters are stale");
    assert_eq!(stale.namespace, "default");
    assert_eq!(stale.name, "test-reloader-parameters");
    assert_eq!(pod_reloader::parameters_ref(&pr).namespace, "shared");

    // An error keeps pointing at what was actually published
    let failed = pod_reloader::next_status(&pr, State::Error, "KubernetesApiError", "x", now);
    assert_eq!(failed.parameters_ref, Some(stale.clone()));

    let republished = pod_reloader::next_status(&pr, State::Ready, "Ready", "published", now);
    pr.status = Some(PodReloaderStatus {
        component: republished,
    });
    assert!(pod_reloader::stale_parameters(&pr).is_none());
}

#[test]
fn stale_parameters_need_a_recorded_publication() {
    let mut pr = create_pod_reloader(valid_spec());
    pr.spec.component.name = "renamed".to_string();
    assert!(pod_reloader::stale_parameters(&pr).is_none());
}
