//! # Projection Emitter
//!
//! Publishes each resolved secret into the target namespace under the
//! descriptor's own name and removes projections that are no longer wanted.

use crate::constants::{ANNOTATION_APP_GENERATION, ANNOTATION_SECRET_SOURCE_NAME};
use crate::observability::metrics;
use crate::secrets::{labels, AppIdentity, ResolveError, ResolvedSecret};
use crate::store::ObjectStore;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Consumer-facing copy of a resolved secret
#[derive(Clone, PartialEq, Eq)]
pub struct Projection {
    /// Equals the descriptor name
    pub name: String,
    pub namespace: String,
    pub secret_type: String,
    pub data: BTreeMap<String, Vec<u8>>,
    /// Storage secret the data was copied from
    pub source_name: String,
}

impl std::fmt::Debug for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projection")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("secret_type", &self.secret_type)
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .field("source_name", &self.source_name)
            .finish()
    }
}

impl Projection {
    pub fn new(app: &AppIdentity, descriptor: &str, resolved: &ResolvedSecret) -> Self {
        Self {
            name: descriptor.to_string(),
            namespace: app.target_namespace.clone(),
            secret_type: resolved.secret_type.clone(),
            data: resolved.data.clone(),
            source_name: resolved.source_name.clone(),
        }
    }

    /// Secret object to apply
    ///
    /// Carries fresh application labels, never the storage secret's labels.
    pub fn to_secret(&self, app: &AppIdentity) -> Secret {
        let mut annotations = BTreeMap::from([(
            ANNOTATION_SECRET_SOURCE_NAME.to_string(),
            self.source_name.clone(),
        )]);
        if let Some(generation) = app.generation {
            annotations.insert(ANNOTATION_APP_GENERATION.to_string(), generation.to_string());
        }
        let owner_references = app
            .owns_target_namespace()
            .then(|| vec![app.owner_reference()]);

        Secret {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                namespace: Some(self.namespace.clone()),
                labels: Some(labels::projection_labels(app)),
                annotations: Some(annotations),
                owner_references,
                ..ObjectMeta::default()
            },
            data: Some(
                self.data
                    .iter()
                    .map(|(k, v)| (k.clone(), ByteString(v.clone())))
                    .collect(),
            ),
            type_: Some(self.secret_type.clone()),
            ..Secret::default()
        }
    }
}

/// What `emit_projections` changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitSummary {
    pub applied: usize,
    pub pruned: Vec<String>,
}

/// Apply every projection, then delete stale projections of the application
///
/// Any store failure is fatal for the pass.
pub async fn emit_projections(
    store: &dyn ObjectStore,
    app: &AppIdentity,
    projections: &[Projection],
) -> Result<EmitSummary, ResolveError> {
    let mut summary = EmitSummary::default();

    for projection in projections {
        store
            .apply_secret(projection.to_secret(app))
            .await
            .map_err(ResolveError::Store)?;
        debug!(
            "Applied projection {}/{} from {}",
            projection.namespace, projection.name, projection.source_name
        );
        summary.applied += 1;
    }
    metrics::increment_projections_applied(summary.applied);

    let wanted: BTreeSet<&str> = projections.iter().map(|p| p.name.as_str()).collect();
    let existing = store
        .list_secrets(&app.target_namespace, &labels::projection_selector(app))
        .await
        .map_err(ResolveError::Store)?;

    for secret in existing {
        let Some(name) = secret.metadata.name else {
            continue;
        };
        if wanted.contains(name.as_str()) {
            continue;
        }
        match store.delete_secret(&app.target_namespace, &name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(ResolveError::Store(e)),
        }
        info!(
            "Pruned stale projection {}/{}",
            app.target_namespace, name
        );
        summary.pruned.push(name);
    }
    metrics::increment_projections_pruned(summary.pruned.len());

    Ok(summary)
}
