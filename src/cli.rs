//! CLI definitions for term-dx
//!
//! This module contains the CLI argument parsing structure using clap.

use clap::Parser;

use crate::kinds::{self, ResourceKind};

const EXAMPLES: &str = "\
Examples:

  term-dx                        Find and diagnose all terminating resources (all types)
  term-dx namespace              Only namespaces stuck terminating
  term-dx crd                    Only CRDs stuck terminating
  term-dx pod -n app             Only pods in namespace app
  term-dx namespace my-stuck-ns  Diagnose why namespace my-stuck-ns is stuck
  term-dx pod my-pod -n app      Diagnose why pod my-pod in app is stuck
  term-dx -l                     List only (no diagnosis)
  term-dx --long                 Include all info (e.g. unavailable API services)

Run with the intended cluster context already selected (kubectl config use-context ...).";

#[derive(Parser)]
#[command(
    name = "term-dx",
    version,
    about = "List and diagnose Kubernetes resources stuck in Terminating state",
    after_help = EXAMPLES
)]
pub struct Cli {
    /// Resource type to scan (singular or plural; all types when omitted)
    #[arg(value_parser = kinds::parse_kind)]
    pub resource_type: Option<ResourceKind>,

    /// Restrict the scan to one resource name
    pub name: Option<String>,

    /// Limit pod/service/pvc/etc. to namespace NS
    #[arg(short = 'n', long, value_name = "NS")]
    pub namespace: Option<String>,

    /// Only list terminating resources; do not run full diagnosis
    #[arg(short = 'l', long = "list")]
    pub list_only: bool,

    /// Include events and extra detail
    #[arg(short, long)]
    pub verbose: bool,

    /// Include all diagnostic info (e.g. unavailable API services for namespaces)
    #[arg(long = "long")]
    pub long_output: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_positional_kind_accepts_aliases() {
        let cli = Cli::parse_from(["term-dx", "crd"]);
        assert_eq!(
            cli.resource_type,
            Some(ResourceKind::CustomResourceDefinitions)
        );

        let cli = Cli::parse_from(["term-dx", "pod", "my-pod", "-n", "app"]);
        assert_eq!(cli.resource_type, Some(ResourceKind::Pods));
        assert_eq!(cli.name.as_deref(), Some("my-pod"));
        assert_eq!(cli.namespace.as_deref(), Some("app"));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(Cli::try_parse_from(["term-dx", "deployment"]).is_err());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from(["term-dx", "-l", "-v", "--long"]);
        assert!(cli.list_only);
        assert!(cli.verbose);
        assert!(cli.long_output);
    }
}
