//! # CRD Generator
//!
//! Generates the `Application` CustomResourceDefinition YAML from the Rust
//! type definitions.
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/application.yaml
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use app_secrets_controller::crd::Application;
use kube::core::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&Application::crd())?);
    Ok(())
}
