//! CRD YAML Generator
//!
//! Prints the Kubernetes CRD manifest of the PodReloader resource.
//!
//! Usage: cargo run --bin crdgen > deploy/crds/podreloaders.yaml

use pod_reloader_operator::crd::generate_crds;

fn main() -> anyhow::Result<()> {
    for crd in generate_crds()? {
        println!("---");
        print!("{}", crd);
    }
    Ok(())
}
