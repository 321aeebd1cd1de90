//! Full diagnosis of terminating resources
//!
//! For every resource stuck in Terminating: deletion timestamp, blocking
//! finalizers, owner references, dependent resources still present in a
//! terminating namespace, optional recent events, and ready-to-run
//! remediation commands.

use anyhow::Result;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};

use crate::kinds::ResourceKind;
use crate::kubectl::{filter_terminating, Kubectl, OwnerRef, ResourceRecord};
use crate::report::{self, Table};

/// Cap on displayed remaining resources per namespace diagnosis.
const MAX_REMAINING: usize = 50;

/// Number of event lines shown with --verbose.
const EVENT_TAIL: usize = 10;

const LAST_RESORT_ACTION: &str = "Remove finalizers (last resort)";

/// Find all terminating resources of the given kinds and diagnose each.
///
/// A single resource's failed diagnosis never stops the run; kinds are
/// scanned strictly in order.
pub async fn execute(
    kubectl: &Kubectl,
    kinds: &[ResourceKind],
    namespace: Option<&str>,
    name: Option<&str>,
    verbose: bool,
    long_output: bool,
) -> Result<()> {
    let mut found = 0;
    for kind in kinds {
        let obj = kubectl.get_json(*kind, name, namespace).await;
        for record in filter_terminating(obj.as_ref()) {
            if record.name.is_empty() {
                // nameless records cannot be addressed for remediation
                continue;
            }
            found += 1;
            if *kind == ResourceKind::Namespaces {
                diagnose_namespace(kubectl, &record.name, verbose, long_output).await;
            } else {
                diagnose_resource(
                    kubectl,
                    *kind,
                    &record.name,
                    record.namespace.as_deref(),
                    verbose,
                )
                .await;
            }
        }
    }
    if found == 0 {
        println!("No resources in Terminating state found for the given type/namespace/name.");
    }
    Ok(())
}

/// Full diagnosis for a namespace stuck terminating.
///
/// Prints deletion timestamp, finalizers, remaining resources in the
/// namespace, unavailable API services (only with --long), recent events
/// (with --verbose), and remediation commands.
async fn diagnose_namespace(kubectl: &Kubectl, name: &str, verbose: bool, long_output: bool) {
    report::section_header(&format!("Namespace: {}", name));
    let Some(obj) = kubectl
        .get_json(ResourceKind::Namespaces, Some(name), None)
        .await
    else {
        println!("  (could not get namespace)");
        return;
    };
    let record = ResourceRecord::from_value(&obj);
    print_deletion_requested(record.deletion_timestamp.as_deref());
    print_finalizers(&record.finalizers);

    // Remaining resources are the usual reason a namespace hangs. The live
    // api-resources catalog covers every namespaced kind the cluster knows,
    // and -o name yields kind/name forms usable in remediation commands.
    let catalog = kubectl
        .run_lines(&["api-resources", "--verbs=list", "--namespaced", "-o", "name"])
        .await;
    if let Some(resource_types) = catalog {
        let spinner = scan_spinner();
        let mut remaining_by_kind: Vec<(String, Vec<String>)> = Vec::new();
        for res in &resource_types {
            spinner.set_message(format!("Scanning {} in {}", res, name));
            let items = kubectl
                .run_lines(&[
                    "get",
                    res.as_str(),
                    "-n",
                    name,
                    "--ignore-not-found",
                    "-o",
                    "name",
                    "--no-headers",
                ])
                .await;
            if let Some(items) = items {
                remaining_by_kind.push((res.clone(), items));
            }
        }
        spinner.finish_and_clear();

        if !remaining_by_kind.is_empty() {
            let total_remaining: usize =
                remaining_by_kind.iter().map(|(_, items)| items.len()).sum();
            let rows = capped_rows(&remaining_by_kind, MAX_REMAINING);
            let listed: Vec<String> = rows.iter().map(|(_, item)| item.clone()).collect();

            println!("  Remaining resources in namespace:");
            let mut table = Table::new(&["RESOURCE TYPE", "RESOURCE"]);
            for (kind, item) in &rows {
                table.add_row(vec![kind.clone(), item.clone()]);
            }
            table.print();
            if total_remaining > MAX_REMAINING {
                println!(
                    "    ... ({} more; run delete commands below then re-run term-dx)",
                    total_remaining - MAX_REMAINING
                );
            }

            // A remaining resource carrying its own finalizers blocks
            // namespace deletion independently (e.g. Ingress with an
            // ALB-controller group finalizer).
            let mut stuck = Table::new(&["RESOURCE", "FINALIZERS", "COMMAND"]);
            for qualified in &listed {
                let Some(obj) = kubectl.get_qualified_json(qualified, name).await else {
                    continue;
                };
                let rec = ResourceRecord::from_value(&obj);
                if !rec.finalizers.is_empty() {
                    stuck.add_row(vec![
                        qualified.clone(),
                        rec.finalizers.join(", "),
                        patch_finalizers_cmd(qualified, Some(name)),
                    ]);
                }
            }
            if !stuck.is_empty() {
                println!("  Remaining resources that are stuck or have finalizers (blocking deletion):");
                stuck.print();
            }

            println!("  Remediation (delete remaining resources):");
            let mut deletes = Table::new(&["RESOURCE", "COMMAND"]);
            for qualified in &listed {
                deletes.add_row(vec![qualified.clone(), delete_cmd(qualified, name)]);
            }
            deletes.print();
            if total_remaining > MAX_REMAINING {
                println!("    ... (more resources may remain; re-run term-dx after deleting above)");
            }
        }
    }

    // Unavailable API services only with --long; a genuinely blocking
    // aggregated API is rare and the listing is noisy.
    if long_output {
        if let Some(lines) = kubectl.run_lines(&["get", "apiservices", "--no-headers"]).await {
            let bad = unavailable_api_services(&lines);
            if !bad.is_empty() {
                println!("  Unavailable API services:");
                for service in &bad {
                    println!("    {}", service);
                }
            }
        }
    }

    if verbose {
        println!("  Recent namespace events:");
        let events = kubectl
            .run_lines(&[
                "get",
                "events",
                "-n",
                name,
                "--sort-by=.lastTimestamp",
                "--no-headers",
            ])
            .await;
        match events {
            Some(lines) => {
                for line in tail(&lines, EVENT_TAIL) {
                    println!("    {}", line);
                }
            }
            None => println!("    (none)"),
        }
    }

    println!("  Remediation (namespace finalizers):");
    let mut table = Table::new(&["ACTION", "COMMAND"]);
    table.add_row(vec![
        LAST_RESORT_ACTION.to_string(),
        patch_finalizers_cmd(&format!("namespace {}", name), None),
    ]);
    table.print();
    println!();
}

/// Full diagnosis for a namespaced resource (pod, service, pvc, etc.)
/// stuck terminating.
async fn diagnose_resource(
    kubectl: &Kubectl,
    kind: ResourceKind,
    name: &str,
    namespace: Option<&str>,
    verbose: bool,
) {
    let title = match namespace {
        Some(ns) => format!("{}/{} (namespace: {})", kind, name, ns),
        None => format!("{}/{}", kind, name),
    };
    report::section_header(&title);
    let Some(obj) = kubectl.get_json(kind, Some(name), namespace).await else {
        println!("  (could not get resource)");
        return;
    };
    let record = ResourceRecord::from_value(&obj);
    print_deletion_requested(record.deletion_timestamp.as_deref());
    print_finalizers(&record.finalizers);

    // Owner refs (e.g. a Deployment) may explain why the resource exists
    // or is stuck.
    if !record.owner_references.is_empty() {
        println!("  Owner(s): {}", owners_line(&record.owner_references));
    }

    if verbose {
        println!("  Recent events:");
        let selector = format!("involvedObject.name={}", name);
        let mut args = vec!["get", "events"];
        if let Some(ns) = namespace {
            args.extend(["-n", ns]);
        }
        args.extend([
            "--field-selector",
            selector.as_str(),
            "--sort-by=.lastTimestamp",
            "--no-headers",
        ]);
        match kubectl.run_lines(&args).await {
            Some(lines) => {
                for line in tail(&lines, EVENT_TAIL) {
                    println!("    {}", line);
                }
            }
            None => println!("    (none)"),
        }
    }

    println!("  Remediation (finalizers):");
    let mut table = Table::new(&["ACTION", "COMMAND"]);
    table.add_row(vec![
        LAST_RESORT_ACTION.to_string(),
        patch_finalizers_cmd(&format!("{} {}", kind, name), namespace),
    ]);
    table.print();
    println!();
}

fn print_deletion_requested(timestamp: Option<&str>) {
    let ts = timestamp.unwrap_or("?");
    match timestamp.and_then(deletion_age) {
        Some(age) => println!("  Deletion requested: {} ({} ago)", ts, age),
        None => println!("  Deletion requested: {}", ts),
    }
}

/// Print finalizers; when present they are the actual reason deletion is
/// blocked, so guidance follows.
fn print_finalizers(finalizers: &[String]) {
    if finalizers.is_empty() {
        println!("  Finalizers: none");
    } else {
        println!("  Finalizers: {}", finalizers.join(", "));
        println!("    -> A controller must complete and remove these before the resource can be removed.");
        println!("    -> Investigate which controller owns each finalizer before removing manually.");
    }
}

fn owners_line(owners: &[OwnerRef]) -> String {
    owners
        .iter()
        .map(|o| format!("{}/{}", o.kind, o.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn patch_finalizers_cmd(resource: &str, namespace: Option<&str>) -> String {
    let ns_part = namespace
        .map(|ns| format!(" -n {}", ns))
        .unwrap_or_default();
    format!(
        "kubectl patch {}{} -p '{{\"metadata\":{{\"finalizers\":null}}}}' --type=merge",
        resource, ns_part
    )
}

fn delete_cmd(qualified: &str, namespace: &str) -> String {
    format!("kubectl delete {} -n {}", qualified, namespace)
}

/// Flatten per-kind listings into (kind, qualified-name) rows, stopping at
/// the cap while preserving kind grouping and item order.
fn capped_rows(remaining: &[(String, Vec<String>)], cap: usize) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    for (kind, items) in remaining {
        for item in items {
            if rows.len() >= cap {
                return rows;
            }
            rows.push((kind.clone(), item.clone()));
        }
    }
    rows
}

/// Names from `kubectl get apiservices --no-headers` whose AVAILABLE column
/// is not True. Short lines are tolerated.
fn unavailable_api_services(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let available = fields.next()?;
            (available != "True").then(|| name.to_string())
        })
        .collect()
}

fn tail(lines: &[String], n: usize) -> &[String] {
    &lines[lines.len().saturating_sub(n)..]
}

/// Age of a deletion request, or None when the timestamp does not parse
/// (or sits in the future, e.g. clock skew).
fn deletion_age(timestamp: &str) -> Option<String> {
    let requested = DateTime::parse_from_rfc3339(timestamp).ok()?;
    let duration = Utc::now().signed_duration_since(requested);
    if duration.num_seconds() < 0 {
        return None;
    }
    Some(if duration.num_days() > 0 {
        format!("{}d{}h", duration.num_days(), duration.num_hours() % 24)
    } else if duration.num_hours() > 0 {
        format!("{}h{}m", duration.num_hours(), duration.num_minutes() % 60)
    } else if duration.num_minutes() > 0 {
        format!("{}m{}s", duration.num_minutes(), duration.num_seconds() % 60)
    } else {
        format!("{}s", duration.num_seconds())
    })
}

fn scan_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_patch_cmd_for_namespace() {
        assert_eq!(
            patch_finalizers_cmd("namespace stuck-ns", None),
            "kubectl patch namespace stuck-ns -p '{\"metadata\":{\"finalizers\":null}}' --type=merge"
        );
    }

    #[test]
    fn test_patch_cmd_for_namespaced_resource() {
        assert_eq!(
            patch_finalizers_cmd("pods my-pod", Some("app")),
            "kubectl patch pods my-pod -n app -p '{\"metadata\":{\"finalizers\":null}}' --type=merge"
        );
    }

    #[test]
    fn test_patch_cmd_for_qualified_name() {
        let cmd = patch_finalizers_cmd("ingress.networking.k8s.io/web", Some("app"));
        assert!(cmd.starts_with("kubectl patch ingress.networking.k8s.io/web -n app"));
    }

    #[test]
    fn test_delete_cmd() {
        assert_eq!(
            delete_cmd("pod/web-0", "stuck-ns"),
            "kubectl delete pod/web-0 -n stuck-ns"
        );
    }

    #[test]
    fn test_owners_line_joins_pairs() {
        let owners = vec![
            OwnerRef {
                kind: "ReplicaSet".to_string(),
                name: "web-abc".to_string(),
            },
            OwnerRef {
                kind: "Deployment".to_string(),
                name: "web".to_string(),
            },
        ];
        assert_eq!(owners_line(&owners), "ReplicaSet/web-abc, Deployment/web");
    }

    #[test]
    fn test_unavailable_api_services() {
        let lines = vec![
            "v1.apps Local True 10d".to_string(),
            "v1beta1.metrics.k8s.io kube-system/metrics-server False (MissingEndpoints) 10d"
                .to_string(),
            "short".to_string(),
        ];
        assert_eq!(
            unavailable_api_services(&lines),
            vec!["v1beta1.metrics.k8s.io"]
        );
    }

    #[test]
    fn test_capped_rows_stops_at_cap() {
        let remaining = vec![
            ("pods".to_string(), vec!["pod/a".to_string(), "pod/b".to_string()]),
            ("secrets".to_string(), vec!["secret/c".to_string()]),
        ];
        let rows = capped_rows(&remaining, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ("pods".to_string(), "pod/a".to_string()));
        assert_eq!(rows[1], ("pods".to_string(), "pod/b".to_string()));
    }

    #[test]
    fn test_capped_rows_under_cap_keeps_grouping() {
        let remaining = vec![
            ("pods".to_string(), vec!["pod/a".to_string()]),
            ("secrets".to_string(), vec!["secret/b".to_string()]),
        ];
        let rows = capped_rows(&remaining, MAX_REMAINING);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].0, "secrets");
    }

    #[test]
    fn test_tail_keeps_last_lines_in_order() {
        let lines: Vec<String> = (0..15).map(|i| format!("line{}", i)).collect();
        let tailed = tail(&lines, EVENT_TAIL);
        assert_eq!(tailed.len(), 10);
        assert_eq!(tailed.first().map(String::as_str), Some("line5"));
        assert_eq!(tailed.last().map(String::as_str), Some("line14"));
    }

    #[test]
    fn test_tail_shorter_than_limit() {
        let lines = vec!["only".to_string()];
        assert_eq!(tail(&lines, EVENT_TAIL).len(), 1);
    }

    #[test]
    fn test_deletion_age_recent() {
        let ts = (Utc::now() - Duration::minutes(5)).to_rfc3339();
        let age = deletion_age(&ts).expect("recent timestamp should have an age");
        assert!(age.starts_with("5m"));
    }

    #[test]
    fn test_deletion_age_days() {
        let ts = (Utc::now() - Duration::days(2) - Duration::hours(3)).to_rfc3339();
        let age = deletion_age(&ts).unwrap();
        assert_eq!(age, "2d3h");
    }

    #[test]
    fn test_deletion_age_unparseable() {
        assert!(deletion_age("not-a-timestamp").is_none());
        assert!(deletion_age("?").is_none());
    }

    #[test]
    fn test_deletion_age_future_timestamp() {
        let ts = (Utc::now() + Duration::minutes(10)).to_rfc3339();
        assert!(deletion_age(&ts).is_none());
    }
}
