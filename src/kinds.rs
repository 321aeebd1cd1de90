//! Resource kind table for term-dx
//!
//! Defines the built-in Kubernetes resource kinds scanned for terminating
//! state, their cluster-vs-namespace scoping, and the singular/plural CLI
//! aliases that resolve to them.

/// Resource kinds term-dx scans for terminating state.
///
/// `as_str()` yields the kubectl plural form (must match `kubectl get <kind>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Namespaces,
    CustomResourceDefinitions,
    Pods,
    Services,
    PersistentVolumeClaims,
    ConfigMaps,
    Secrets,
}

/// All built-in kinds in scan order.
pub const SCAN_ORDER: [ResourceKind; 7] = [
    ResourceKind::Namespaces,
    ResourceKind::CustomResourceDefinitions,
    ResourceKind::Pods,
    ResourceKind::Services,
    ResourceKind::PersistentVolumeClaims,
    ResourceKind::ConfigMaps,
    ResourceKind::Secrets,
];

impl ResourceKind {
    /// The kubectl plural kind name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Namespaces => "namespaces",
            Self::CustomResourceDefinitions => "customresourcedefinitions",
            Self::Pods => "pods",
            Self::Services => "services",
            Self::PersistentVolumeClaims => "persistentvolumeclaims",
            Self::ConfigMaps => "configmaps",
            Self::Secrets => "secrets",
        }
    }

    /// Cluster-scoped kinds take neither `-n` nor `-A` when fetching.
    pub fn is_cluster_scoped(&self) -> bool {
        matches!(self, Self::Namespaces | Self::CustomResourceDefinitions)
    }

    /// Parse a CLI alias (case-insensitive, singular or plural).
    pub fn from_alias(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "namespace" | "namespaces" | "ns" => Some(Self::Namespaces),
            "crd" | "crds" | "customresourcedefinition" | "customresourcedefinitions" => {
                Some(Self::CustomResourceDefinitions)
            }
            "pod" | "pods" => Some(Self::Pods),
            "service" | "services" | "svc" => Some(Self::Services),
            "pvc" | "pvcs" | "persistentvolumeclaim" | "persistentvolumeclaims" => {
                Some(Self::PersistentVolumeClaims)
            }
            "configmap" | "configmaps" | "cm" => Some(Self::ConfigMaps),
            "secret" | "secrets" => Some(Self::Secrets),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clap value parser for the positional resource-type argument.
pub fn parse_kind(s: &str) -> Result<ResourceKind, String> {
    ResourceKind::from_alias(s).ok_or_else(|| {
        format!(
            "unknown resource type '{}' (expected one of: namespace, crd, pod, service, pvc, configmap, secret)",
            s
        )
    })
}
