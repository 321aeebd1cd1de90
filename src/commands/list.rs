//! Listing-only mode
//!
//! Prints a one-line-per-resource summary of everything stuck in
//! Terminating, without running the full diagnosis.

use anyhow::Result;

use crate::kinds::ResourceKind;
use crate::kubectl::{filter_terminating, Kubectl, ResourceRecord};
use crate::report;

/// Print a simple list of resources stuck in Terminating.
///
/// Scans the given kinds in order; output ordering follows the kind order,
/// then item order within each kind's response.
pub async fn execute(
    kubectl: &Kubectl,
    kinds: &[ResourceKind],
    namespace: Option<&str>,
    name: Option<&str>,
) -> Result<()> {
    report::section_header("Resources stuck in Terminating");
    let mut count = 0;
    for kind in kinds {
        let obj = kubectl.get_json(*kind, name, namespace).await;
        for record in filter_terminating(obj.as_ref()) {
            println!("{}", listing_line(*kind, &record));
            count += 1;
        }
    }
    if count == 0 {
        println!("  (none found)");
    }
    println!();
    Ok(())
}

fn listing_line(kind: ResourceKind, record: &ResourceRecord) -> String {
    let name = if record.name.is_empty() {
        "?"
    } else {
        record.name.as_str()
    };
    match &record.namespace {
        Some(ns) => format!("  {}/{} (ns: {})", kind, name, ns),
        None => format!("  {}/{}", kind, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_line_with_namespace() {
        let record = ResourceRecord {
            name: "my-pod".to_string(),
            namespace: Some("app".to_string()),
            ..Default::default()
        };
        assert_eq!(
            listing_line(ResourceKind::Pods, &record),
            "  pods/my-pod (ns: app)"
        );
    }

    #[test]
    fn test_listing_line_cluster_scoped() {
        let record = ResourceRecord {
            name: "stuck-ns".to_string(),
            ..Default::default()
        };
        assert_eq!(
            listing_line(ResourceKind::Namespaces, &record),
            "  namespaces/stuck-ns"
        );
    }

    #[test]
    fn test_listing_line_nameless_record() {
        let record = ResourceRecord::default();
        assert_eq!(listing_line(ResourceKind::Secrets, &record), "  secrets/?");
    }

    #[test]
    fn test_one_line_per_terminating_pod() {
        // 3 pods, 1 terminating: exactly one line comes out of the response
        let response = json!({
            "items": [
                {"metadata": {"name": "a", "namespace": "app"}},
                {"metadata": {"name": "b", "namespace": "app",
                              "deletionTimestamp": "2024-01-01T00:00:00Z"}},
                {"metadata": {"name": "c", "namespace": "app"}},
            ]
        });
        let lines: Vec<String> = filter_terminating(Some(&response))
            .iter()
            .map(|r| listing_line(ResourceKind::Pods, r))
            .collect();
        assert_eq!(lines, vec!["  pods/b (ns: app)"]);
    }
}
