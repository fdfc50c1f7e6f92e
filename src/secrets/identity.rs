//! # Application Identity
//!
//! The identity every object created for an Application is labeled with.

use crate::crd::Application;
use crate::secrets::ResolveError;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;

/// Identity of the Application a pass runs for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity {
    pub name: String,
    pub namespace: String,
    /// Projections, bindings and jobs live here
    pub target_namespace: String,
    pub generation: Option<i64>,
    pub uid: String,
}

impl AppIdentity {
    pub fn from_application(app: &Application) -> Result<Self, ResolveError> {
        let name = app
            .metadata
            .name
            .clone()
            .ok_or_else(|| ResolveError::InvalidApplication("metadata.name is not set".into()))?;
        let namespace = app.metadata.namespace.clone().ok_or_else(|| {
            ResolveError::InvalidApplication(format!("{name} has no namespace"))
        })?;
        let uid = app
            .metadata
            .uid
            .clone()
            .ok_or_else(|| ResolveError::InvalidApplication(format!("{name} has no UID")))?;
        let target_namespace = app
            .spec
            .target_namespace
            .clone()
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| namespace.clone());

        Ok(Self {
            name,
            namespace,
            target_namespace,
            generation: app.metadata.generation,
            uid,
        })
    }

    /// Controller owner reference to the Application
    pub fn owner_reference(&self) -> OwnerReference {
        OwnerReference {
            api_version: Application::api_version(&()).to_string(),
            kind: Application::kind(&()).to_string(),
            name: self.name.clone(),
            uid: self.uid.clone(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }

    /// Whether objects in the target namespace can carry an owner reference
    pub fn owns_target_namespace(&self) -> bool {
        self.namespace == self.target_namespace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::ApplicationSpec;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn application(target: Option<&str>, uid: Option<&str>) -> Application {
        let mut app = Application::new("storefront", ApplicationSpec::default());
        app.metadata = ObjectMeta {
            name: Some("storefront".to_string()),
            namespace: Some("team-a".to_string()),
            uid: uid.map(str::to_string),
            generation: Some(3),
            ..ObjectMeta::default()
        };
        app.spec.target_namespace = target.map(str::to_string);
        app
    }

    #[test]
    fn test_target_namespace_defaults_to_own_namespace() {
        let id = AppIdentity::from_application(&application(None, Some("u-1"))).unwrap();
        assert_eq!(id.target_namespace, "team-a");
        assert!(id.owns_target_namespace());

        let id = AppIdentity::from_application(&application(Some("prod"), Some("u-1"))).unwrap();
        assert_eq!(id.target_namespace, "prod");
        assert!(!id.owns_target_namespace());
        assert_eq!(id.generation, Some(3));
    }

    #[test]
    fn test_missing_uid_is_invalid() {
        let err = AppIdentity::from_application(&application(None, None)).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidApplication(_)));
    }

    #[test]
    fn test_owner_reference() {
        let id = AppIdentity::from_application(&application(None, Some("u-1"))).unwrap();
        let owner = id.owner_reference();
        assert_eq!(owner.api_version, "apps.octopilot.io/v1beta1");
        assert_eq!(owner.kind, "Application");
        assert_eq!(owner.uid, "u-1");
        assert_eq!(owner.controller, Some(true));
    }
}
