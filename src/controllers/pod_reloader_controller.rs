//! Controller for PodReloader resources

use futures::StreamExt;
use kube::{
    runtime::{
        controller::{Action, Controller},
        finalizer::{finalizer, Event},
        watcher::Config,
    },
    Api, ResourceExt,
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::controllers::Context;
use crate::crd::{ObjectRef, PodReloader, State};
use crate::reconcilers::pod_reloader;
use crate::Error;

/// Finalizer name for cleanup
pub const FINALIZER: &str = "operator.podreloader.io/finalizer";

/// Run the PodReloader controller
pub async fn run(ctx: Arc<Context>) {
    let client = ctx.client.clone();
    let pod_reloaders: Api<PodReloader> = match &ctx.config.watch_namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    };

    info!(
        "Starting PodReloader controller (namespace: {})",
        ctx.config.watch_namespace.as_deref().unwrap_or("all namespaces")
    );

    Controller::new(pod_reloaders, Config::default().any_semantic())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok(o) => info!("Reconciled {:?}", o),
                Err(e) => error!("Reconcile failed: {:?}", e),
            }
        })
        .await;

    info!("PodReloader controller stopped");
}

/// Reconcile a PodReloader resource
#[instrument(skip(pod_reloader, ctx), fields(name = %pod_reloader.name_any(), namespace = pod_reloader.namespace().unwrap_or_default()))]
async fn reconcile(pod_reloader: Arc<PodReloader>, ctx: Arc<Context>) -> Result<Action, Error> {
    let start = std::time::Instant::now();
    let ns = pod_reloader.namespace().unwrap_or_default();
    let name = pod_reloader.name_any();

    let pod_reloaders: Api<PodReloader> = Api::namespaced(ctx.client.clone(), &ns);

    let result = finalizer(&pod_reloaders, FINALIZER, pod_reloader, |event| async {
        match event {
            Event::Apply(pod_reloader) => apply(&pod_reloader, &ctx).await,
            Event::Cleanup(pod_reloader) => cleanup(&pod_reloader, &ctx).await,
        }
    })
    .await;

    let duration = start.elapsed().as_secs_f64();
    match &result {
        Ok(_) => info!(
            "Successfully reconciled {}/{} in {:.2}s",
            ns, name, duration
        ),
        Err(e) => error!("Failed to reconcile {}/{}: {:?}", ns, name, e),
    }

    Ok(result?)
}

/// Apply changes for a PodReloader
async fn apply(pod_reloader: &PodReloader, ctx: &Context) -> Result<Action, Error> {
    let ns = pod_reloader.namespace().unwrap_or_default();
    let name = pod_reloader.name_any();

    info!("Applying PodReloader {}/{}", ns, name);

    match publish(pod_reloader, ctx).await {
        Ok(published) => {
            pod_reloader::update_status(
                pod_reloader,
                &ctx.client,
                State::Ready,
                "Ready",
                &format!("Parameters published to ConfigMap {}", published),
            )
            .await?;
            Ok(Action::requeue(ctx.config.reconcile_interval))
        }
        Err(e) => {
            if let Err(status_err) = pod_reloader::update_status(
                pod_reloader,
                &ctx.client,
                State::Error,
                e.reason(),
                &e.to_string(),
            )
            .await
            {
                warn!(
                    "Failed to record error status for {}/{}: {}",
                    ns, name, status_err
                );
            }
            Err(e)
        }
    }
}

/// Validate, transform and publish the parameters of a PodReloader
///
/// Parameters published under a previous effective identity are removed once
/// the new ones are in place.
async fn publish(pod_reloader: &PodReloader, ctx: &Context) -> Result<ObjectRef, Error> {
    pod_reloader::validate(pod_reloader)?;

    let values_yaml = pod_reloader::render_parameters(pod_reloader, &ctx.transformer)?;

    let published = pod_reloader::reconcile_parameters(
        pod_reloader,
        &ctx.client,
        &ctx.config.field_manager,
        &values_yaml,
    )
    .await?;

    if let Some(stale) = pod_reloader::stale_parameters(pod_reloader) {
        info!("Effective identity changed, removing stale parameters {}", stale);
        pod_reloader::delete_parameters(&ctx.client, &stale).await?;
    }

    Ok(published)
}

/// Cleanup resources when a PodReloader is deleted
async fn cleanup(pod_reloader: &PodReloader, ctx: &Context) -> Result<Action, Error> {
    let ns = pod_reloader.namespace().unwrap_or_default();
    let name = pod_reloader.name_any();

    info!("Cleaning up PodReloader {}/{}", ns, name);

    if let Err(e) = pod_reloader::update_status(
        pod_reloader,
        &ctx.client,
        State::Deleting,
        "Deleting",
        "Removing published parameters",
    )
    .await
    {
        warn!("Failed to record deleting status for {}/{}: {}", ns, name, e);
    }

    // The parameters may live in another namespace, so owner references
    // cannot garbage-collect them.
    pod_reloader::delete_parameters(&ctx.client, &pod_reloader::parameters_ref(pod_reloader))
        .await?;
    if let Some(stale) = pod_reloader::stale_parameters(pod_reloader) {
        pod_reloader::delete_parameters(&ctx.client, &stale).await?;
    }

    Ok(Action::await_change())
}

/// Error policy for the controller
fn error_policy(pod_reloader: Arc<PodReloader>, err: &Error, ctx: Arc<Context>) -> Action {
    let ns = pod_reloader.namespace().unwrap_or_default();
    let name = pod_reloader.name_any();

    error!("Reconciliation error for {}/{}: {:?}", ns, name, err);

    match err {
        // Spec problems only clear when the resource changes
        Error::ValidationError(_) | Error::ConversionError(_) => {
            Action::requeue(ctx.config.reconcile_interval)
        }
        _ => Action::requeue(ctx.config.error_requeue),
    }
}
