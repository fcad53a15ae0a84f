//! Arguments for the 'get' command

use clap::{Args, Parser};

use super::common::OutputFormat;
use crate::vipr::ResourceKind;

/// Names of the enclosing levels of a resource
#[derive(Args, Debug, Clone, Default)]
pub struct ScopeArgs {
    /// Tenant name or id (default: your home tenant)
    #[arg(long)]
    pub tenant: Option<String>,

    /// Project name or id
    #[arg(long)]
    pub project: Option<String>,

    /// Volume name or id (scope for snapshots)
    #[arg(long)]
    pub volume: Option<String>,

    /// Storage system name or id (scope for pools and ports)
    #[arg(long = "storage-system")]
    pub storage_system: Option<String>,
}

impl ScopeArgs {
    /// Name given for an enclosing level, if any
    pub fn name_for(&self, kind: ResourceKind) -> Option<&str> {
        match kind {
            ResourceKind::Tenant => self.tenant.as_deref(),
            ResourceKind::Project => self.project.as_deref(),
            ResourceKind::Volume => self.volume.as_deref(),
            ResourceKind::StorageSystem => self.storage_system.as_deref(),
            _ => None,
        }
    }
}

/// Arguments for 'get'
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Resource kind
    #[arg(value_enum)]
    pub kind: ResourceKind,

    /// Names or ids to show (lists the whole scope when omitted)
    pub names: Vec<String>,

    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}
