//! Resource catalogue
//!
//! Each resource noun the CLI understands is a [`ResourceKind`]. A kind knows
//! where it lives in the hierarchy, how to list its members within a parent
//! scope, and where its own representation is.

use clap::ValueEnum;
use std::fmt;

use crate::config::api;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ResourceKind {
    Tenant,
    Project,
    Volume,
    Filesystem,
    Snapshot,
    Host,
    Cluster,
    StorageSystem,
    StoragePool,
    StoragePort,
    Varray,
    Vpool,
    ComputeSystem,
    ComputeImage,
    CatalogCategory,
}

impl ResourceKind {
    /// Command-line name
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Tenant => "tenant",
            ResourceKind::Project => "project",
            ResourceKind::Volume => "volume",
            ResourceKind::Filesystem => "filesystem",
            ResourceKind::Snapshot => "snapshot",
            ResourceKind::Host => "host",
            ResourceKind::Cluster => "cluster",
            ResourceKind::StorageSystem => "storage-system",
            ResourceKind::StoragePool => "storage-pool",
            ResourceKind::StoragePort => "storage-port",
            ResourceKind::Varray => "varray",
            ResourceKind::Vpool => "vpool",
            ResourceKind::ComputeSystem => "compute-system",
            ResourceKind::ComputeImage => "compute-image",
            ResourceKind::CatalogCategory => "catalog-category",
        }
    }

    /// Level directly above this one, `None` for root-level kinds
    pub fn parent(&self) -> Option<ResourceKind> {
        match self {
            ResourceKind::Project | ResourceKind::Host | ResourceKind::Cluster => {
                Some(ResourceKind::Tenant)
            }
            ResourceKind::Volume | ResourceKind::Filesystem => Some(ResourceKind::Project),
            ResourceKind::Snapshot => Some(ResourceKind::Volume),
            ResourceKind::StoragePool | ResourceKind::StoragePort => {
                Some(ResourceKind::StorageSystem)
            }
            _ => None,
        }
    }

    /// Every level above this one, outermost first
    pub fn ancestors(&self) -> Vec<ResourceKind> {
        let mut chain = Vec::new();
        let mut current = self.parent();
        while let Some(kind) = current {
            chain.push(kind);
            current = kind.parent();
        }
        chain.reverse();
        chain
    }

    /// List endpoint within the parent scope.
    ///
    /// For tenants the "parent" is the home tenant whose subtenants are listed.
    /// Returns `None` when a parent id is required but missing.
    pub fn list_path(&self, parent_id: Option<&str>) -> Option<String> {
        let scoped = |template: &str| parent_id.map(|id| template.replace("{id}", id));
        match self {
            ResourceKind::Tenant => scoped("/tenants/{id}/subtenants"),
            ResourceKind::Project => scoped("/tenants/{id}/projects"),
            ResourceKind::Volume | ResourceKind::Filesystem => scoped("/projects/{id}/resources"),
            ResourceKind::Snapshot => scoped("/block/volumes/{id}/protection/snapshots"),
            ResourceKind::Host => scoped("/tenants/{id}/hosts"),
            ResourceKind::Cluster => scoped("/tenants/{id}/clusters"),
            ResourceKind::StoragePool => scoped("/vdc/storage-systems/{id}/storage-pools"),
            ResourceKind::StoragePort => scoped("/vdc/storage-systems/{id}/storage-ports"),
            ResourceKind::StorageSystem => Some("/vdc/storage-systems".to_string()),
            ResourceKind::Varray => Some("/vdc/varrays".to_string()),
            ResourceKind::Vpool => Some("/block/vpools".to_string()),
            ResourceKind::ComputeSystem => Some("/vdc/compute-systems".to_string()),
            ResourceKind::ComputeImage => Some("/compute/images".to_string()),
            ResourceKind::CatalogCategory => Some("/catalog/categories".to_string()),
        }
    }

    /// Key of the member array in the list response
    pub fn list_key(&self) -> &'static str {
        match self {
            ResourceKind::Tenant => "subtenant",
            ResourceKind::Project => "project",
            ResourceKind::Volume | ResourceKind::Filesystem => "project_resource",
            ResourceKind::Snapshot => "snapshot",
            ResourceKind::Host => "host",
            ResourceKind::Cluster => "cluster",
            ResourceKind::StorageSystem => "storage_system",
            ResourceKind::StoragePool => "storage_pool",
            ResourceKind::StoragePort => "storage_port",
            ResourceKind::Varray => "varray",
            ResourceKind::Vpool => "virtualpool",
            ResourceKind::ComputeSystem => "compute_system",
            ResourceKind::ComputeImage => "compute_image",
            ResourceKind::CatalogCategory => "catalog_category",
        }
    }

    /// Filter for mixed listings (project resources)
    pub fn resource_type(&self) -> Option<&'static str> {
        match self {
            ResourceKind::Volume => Some("volume"),
            ResourceKind::Filesystem => Some("fileshare"),
            _ => None,
        }
    }

    /// Path of a single resource's representation
    pub fn self_path(&self, id: &str) -> String {
        let base = match self {
            ResourceKind::Tenant => api::TENANTS,
            ResourceKind::Project => "/projects",
            ResourceKind::Volume => "/block/volumes",
            ResourceKind::Filesystem => "/file/filesystems",
            ResourceKind::Snapshot => "/block/snapshots",
            ResourceKind::Host => "/compute/hosts",
            ResourceKind::Cluster => "/compute/clusters",
            ResourceKind::StorageSystem => "/vdc/storage-systems",
            ResourceKind::StoragePool => "/vdc/storage-pools",
            ResourceKind::StoragePort => "/vdc/storage-ports",
            ResourceKind::Varray => "/vdc/varrays",
            ResourceKind::Vpool => "/block/vpools",
            ResourceKind::ComputeSystem => "/vdc/compute-systems",
            ResourceKind::ComputeImage => "/compute/images",
            ResourceKind::CatalogCategory => "/catalog/categories",
        };
        format!("{}/{}", base, id)
    }

    /// Deactivation (delete) endpoint
    pub fn deactivate_path(&self, id: &str) -> String {
        format!("{}/deactivate", self.self_path(id))
    }

    /// Type segment of this kind's opaque ids
    pub fn urn_type(&self) -> &'static str {
        match self {
            ResourceKind::Tenant => "TenantOrg",
            ResourceKind::Project => "Project",
            ResourceKind::Volume => "Volume",
            ResourceKind::Filesystem => "FileShare",
            ResourceKind::Snapshot => "BlockSnapshot",
            ResourceKind::Host => "Host",
            ResourceKind::Cluster => "Cluster",
            ResourceKind::StorageSystem => "StorageSystem",
            ResourceKind::StoragePool => "StoragePool",
            ResourceKind::StoragePort => "StoragePort",
            ResourceKind::Varray => "VirtualArray",
            ResourceKind::Vpool => "VirtualPool",
            ResourceKind::ComputeSystem => "ComputeSystem",
            ResourceKind::ComputeImage => "ComputeImage",
            ResourceKind::CatalogCategory => "CatalogCategory",
        }
    }

    /// Whether an opaque id names a resource of this kind
    pub fn accepts_id(&self, id: &str) -> bool {
        id.split(':').nth(2) == Some(self.urn_type())
    }

    /// Fields shown when rendering a single resource as a table
    pub fn detail_fields(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Tenant => &["name", "id", "description", "parent_tenant"],
            ResourceKind::Project => &["name", "id", "owner", "tenant", "quota_enabled"],
            ResourceKind::Volume => &[
                "name",
                "id",
                "provisioned_capacity_gb",
                "allocated_capacity_gb",
                "protocols",
                "wwn",
                "varray",
                "vpool",
            ],
            ResourceKind::Filesystem => &[
                "name",
                "id",
                "capacity",
                "protocols",
                "mount_path",
                "varray",
                "vpool",
            ],
            ResourceKind::Snapshot => &["name", "id", "parent", "creation_time", "wwn"],
            ResourceKind::Host => &["name", "id", "type", "host_name", "os_version", "cluster"],
            ResourceKind::Cluster => &["name", "id", "tenant", "project"],
            ResourceKind::StorageSystem => &[
                "name",
                "id",
                "system_type",
                "ip_address",
                "serial_number",
                "registration_status",
            ],
            ResourceKind::StoragePool => &[
                "name",
                "id",
                "pool_name",
                "free_gb",
                "usable_gb",
                "supported_resource_types",
            ],
            ResourceKind::StoragePort => &[
                "name",
                "id",
                "port_network_id",
                "transport_type",
                "operational_status",
            ],
            ResourceKind::Varray => &["name", "id", "auto_san_zoning"],
            ResourceKind::Vpool => &["name", "id", "type", "protocols", "provisioning_type"],
            ResourceKind::ComputeSystem => &["name", "id", "ip_address", "os_install_network"],
            ResourceKind::ComputeImage => &["name", "id", "image_type", "image_url"],
            ResourceKind::CatalogCategory => &["name", "id", "title", "description"],
        }
    }

    /// Global flag that scopes this kind when it appears as a parent
    pub fn scope_flag(&self) -> Option<&'static str> {
        match self {
            ResourceKind::Tenant => Some("--tenant"),
            ResourceKind::Project => Some("--project"),
            ResourceKind::Volume => Some("--volume"),
            ResourceKind::StorageSystem => Some("--storage-system"),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Whether a path segment is already an opaque id (`urn:storageos:Type:uuid:vdc`)
pub fn is_opaque_id(segment: &str) -> bool {
    segment.starts_with(api::URN_PREFIX)
        && segment.split(':').count() == 5
        && segment.split(':').all(|part| !part.is_empty())
        && !segment.chars().any(char::is_whitespace)
}
