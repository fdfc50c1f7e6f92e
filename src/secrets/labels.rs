//! # Secret Labels
//!
//! Storage secrets are labeled with the full application identity plus the
//! descriptor name; projections carry only the application labels and a
//! projection marker.

use crate::constants::{
    LABEL_APP_NAME, LABEL_APP_NAMESPACE, LABEL_APP_UID, LABEL_MANAGED, LABEL_PROJECTION,
    LABEL_SECRET_NAME,
};
use crate::secrets::AppIdentity;
use crate::store::{Expression, Selector};
use std::collections::BTreeMap;

fn application_labels(app: &AppIdentity) -> BTreeMap<String, String> {
    BTreeMap::from([
        (LABEL_APP_NAME.to_string(), app.name.clone()),
        (LABEL_APP_NAMESPACE.to_string(), app.namespace.clone()),
        (LABEL_MANAGED.to_string(), "true".to_string()),
    ])
}

/// Labels of the storage secret generated for a descriptor
pub fn storage_labels(app: &AppIdentity, descriptor: &str) -> BTreeMap<String, String> {
    let mut labels = application_labels(app);
    labels.insert(LABEL_APP_UID.to_string(), app.uid.clone());
    labels.insert(LABEL_SECRET_NAME.to_string(), descriptor.to_string());
    labels
}

/// Selector matching the storage secrets of a descriptor
pub fn storage_selector(app: &AppIdentity, descriptor: &str) -> Selector {
    storage_labels(app, descriptor).into_iter().collect()
}

/// Labels of a projection
pub fn projection_labels(app: &AppIdentity) -> BTreeMap<String, String> {
    let mut labels = application_labels(app);
    labels.insert(LABEL_PROJECTION.to_string(), "true".to_string());
    labels
}

/// Selector matching every projection of the application
///
/// Storage secrets never carry the projection marker, so they are excluded
/// even when they share the namespace.
pub fn projection_selector(app: &AppIdentity) -> Selector {
    application_labels(app)
        .into_iter()
        .map(|(k, v)| Expression::Equal(k, v))
        .chain(std::iter::once(Expression::Exists(LABEL_PROJECTION.to_string())))
        .collect()
}
