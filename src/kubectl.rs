//! Kubectl invocation gateway and resource JSON helpers
//!
//! All cluster access goes through subprocess kubectl calls; term-dx never
//! talks to the API server directly. This module wraps those calls, bounds
//! each one with a fixed timeout, and folds every failure mode (spawn error,
//! timeout, non-zero exit, empty output, malformed JSON) into an absent
//! result. The typed failure detail is logged at debug level before being
//! discarded.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::error::QueryError;
use crate::kinds::ResourceKind;

/// Fixed upper bound on a single kubectl call.
const QUERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Resolve the kubectl binary path.
///
/// Checks the `KUBECTL_BIN` environment variable (explicit tool paths for
/// hermetic environments), falling back to `kubectl` on PATH.
pub fn kubectl_path() -> String {
    std::env::var("KUBECTL_BIN").unwrap_or_else(|_| "kubectl".to_string())
}

/// A back-reference from a resource to the resource that owns it.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerRef {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
}

/// Metadata subset of a queried resource.
#[derive(Debug, Clone, Default)]
pub struct ResourceRecord {
    pub name: String,
    pub namespace: Option<String>,
    pub deletion_timestamp: Option<String>,
    pub finalizers: Vec<String>,
    pub owner_references: Vec<OwnerRef>,
}

impl ResourceRecord {
    /// Extract the metadata subset from a single resource object.
    pub fn from_value(obj: &Value) -> Self {
        let meta = obj.get("metadata").unwrap_or(&Value::Null);

        Self {
            name: meta
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or("")
                .to_string(),
            namespace: meta
                .get("namespace")
                .and_then(|n| n.as_str())
                .filter(|s| !s.is_empty())
                .map(String::from),
            deletion_timestamp: meta
                .get("deletionTimestamp")
                .and_then(|t| t.as_str())
                .filter(|s| !s.is_empty())
                .map(String::from),
            finalizers: meta
                .get("finalizers")
                .and_then(|f| f.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            owner_references: meta
                .get("ownerReferences")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default(),
        }
    }

    /// A resource is terminating iff its deletion timestamp is set and non-empty.
    pub fn is_terminating(&self) -> bool {
        self.deletion_timestamp.is_some()
    }
}

/// Return only the records with a deletion timestamp (stuck terminating).
///
/// Handles both a list response (`{"items": [...]}`) and a single-object
/// response, preserving item order. An absent query result yields an empty
/// list, never an error.
pub fn filter_terminating(obj: Option<&Value>) -> Vec<ResourceRecord> {
    let Some(obj) = obj else {
        return Vec::new();
    };
    if obj.get("items").is_some() {
        return obj
            .get("items")
            .and_then(|i| i.as_array())
            .map(|items| {
                items
                    .iter()
                    .map(ResourceRecord::from_value)
                    .filter(ResourceRecord::is_terminating)
                    .collect()
            })
            .unwrap_or_default();
    }
    let record = ResourceRecord::from_value(obj);
    if record.is_terminating() {
        vec![record]
    } else {
        Vec::new()
    }
}

/// Build the argument list for `kubectl get <kind> -o json`.
///
/// Cluster-scoped kinds (namespaces, CRDs) use neither `-n` nor `-A`;
/// namespaced kinds take `-n NS` when a namespace is given, `-A` otherwise.
/// The resource name, when present, goes last.
fn build_get_args(kind: ResourceKind, name: Option<&str>, namespace: Option<&str>) -> Vec<String> {
    let mut args = vec![
        "get".to_string(),
        kind.as_str().to_string(),
        "-o".to_string(),
        "json".to_string(),
    ];
    if kind.is_cluster_scoped() {
        // neither -n nor -A
    } else if let Some(ns) = namespace {
        args.push("-n".to_string());
        args.push(ns.to_string());
    } else {
        args.push("-A".to_string());
    }
    if let Some(name) = name {
        args.push(name.to_string());
    }
    args
}

/// Ordered argument lists for fetching a qualified "kind/name" resource.
///
/// The compound form goes first; some kinds (e.g. Ingress) reject it and
/// expect type and name as separate arguments, so a fallback split on the
/// first `/` follows.
fn qualified_attempts(qualified: &str, namespace: &str) -> Vec<Vec<String>> {
    let mut attempts = vec![vec![
        "get".to_string(),
        qualified.to_string(),
        "-n".to_string(),
        namespace.to_string(),
        "-o".to_string(),
        "json".to_string(),
    ]];
    if let Some((kind, name)) = qualified.split_once('/') {
        attempts.push(vec![
            "get".to_string(),
            kind.to_string(),
            name.to_string(),
            "-n".to_string(),
            namespace.to_string(),
            "-o".to_string(),
            "json".to_string(),
        ]);
    }
    attempts
}

/// Gateway for read-only kubectl queries.
///
/// Every query is attempted exactly once and bounded by the fixed timeout;
/// a timeout on one call never stops subsequent queries.
pub struct Kubectl {
    binary: String,
    timeout: Duration,
}

impl Kubectl {
    pub fn new() -> Self {
        Self {
            binary: kubectl_path(),
            timeout: QUERY_TIMEOUT,
        }
    }

    /// Create a gateway driving a specific binary.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            timeout: QUERY_TIMEOUT,
        }
    }

    /// Builder: override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Get one or more resources as JSON.
    ///
    /// Returns `None` on any failure (missing resource, unknown kind,
    /// unreachable cluster, timeout, bad JSON).
    pub async fn get_json(
        &self,
        kind: ResourceKind,
        name: Option<&str>,
        namespace: Option<&str>,
    ) -> Option<Value> {
        let args = build_get_args(kind, name, namespace);
        match self.json_query(&args).await {
            Ok(value) => Some(value),
            Err(err) => {
                debug!("kubectl {} failed: {}", args.join(" "), err);
                None
            }
        }
    }

    /// Get a single namespaced resource by qualified name ("kind/name" or
    /// "kind.api/name") as JSON. `None` only if every attempt fails.
    pub async fn get_qualified_json(&self, qualified: &str, namespace: &str) -> Option<Value> {
        for args in qualified_attempts(qualified, namespace) {
            match self.json_query(&args).await {
                Ok(value) => return Some(value),
                Err(err) => debug!("kubectl {} failed: {}", args.join(" "), err),
            }
        }
        None
    }

    /// Run a non-JSON query, returning trimmed non-empty stdout lines.
    pub async fn run_lines(&self, args: &[&str]) -> Option<Vec<String>> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        match self.exec(&args).await {
            Ok(stdout) => {
                let lines: Vec<String> = String::from_utf8_lossy(&stdout)
                    .lines()
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect();
                if lines.is_empty() {
                    None
                } else {
                    Some(lines)
                }
            }
            Err(err) => {
                debug!("kubectl {} failed: {}", args.join(" "), err);
                None
            }
        }
    }

    async fn json_query(&self, args: &[String]) -> Result<Value, QueryError> {
        let stdout = self.exec(args).await?;
        Ok(serde_json::from_slice(&stdout)?)
    }

    async fn exec(&self, args: &[String]) -> Result<Vec<u8>, QueryError> {
        let output = Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, output).await {
            Err(_) => {
                return Err(QueryError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                })
            }
            Ok(Err(source)) => {
                return Err(QueryError::Spawn {
                    binary: self.binary.clone(),
                    source,
                })
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(QueryError::NonZeroExit {
                code: output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if output.stdout.is_empty() {
            return Err(QueryError::EmptyOutput);
        }
        Ok(output.stdout)
    }
}

impl Default for Kubectl {
    fn default() -> Self {
        Self::new()
    }
}
