//! Arguments for the 'delete' command

use clap::Parser;

use super::get::ScopeArgs;
use crate::vipr::ResourceKind;

/// Arguments for 'delete'
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Resource kind
    #[arg(value_enum)]
    pub kind: ResourceKind,

    /// Name or id of the resource to deactivate
    pub name: String,

    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Skip confirmation prompt
    #[arg(short = 'y', long, default_value_t = false)]
    pub yes: bool,
}
