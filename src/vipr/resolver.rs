//! Name-to-id resolution across the resource hierarchy
//!
//! A [`ResourcePath`] such as `tenant 'T1' / project 'P1' / volume 'vol-a'`
//! is resolved level by level, each name matched exactly within the scope
//! of the level above it. Resolved ids are cached for the lifetime of the
//! resolver (one invocation) and never persisted.

use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use tokio::sync::OnceCell;

use crate::config::api;
use crate::error::{Result, ViprError};
use crate::vipr::client::ViprClient;
use crate::vipr::models::NamedRelatedResource;
use crate::vipr::resources::{is_opaque_id, ResourceKind};
use crate::vipr::traits::ApiResource;

/// Human identifier of one level
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentName {
    Named(String),
    /// The authenticated user's home tenant
    Home,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub kind: ResourceKind,
    pub name: SegmentName,
}

impl PathSegment {
    /// The segment's name if it is already an opaque id
    fn opaque_id(&self) -> Option<&str> {
        match &self.name {
            SegmentName::Named(name) if is_opaque_id(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            SegmentName::Named(name) => write!(f, "{} '{}'", self.kind, name),
            SegmentName::Home => write!(f, "home tenant"),
        }
    }
}

/// Ordered chain of (level, name) pairs, outermost first.
///
/// Each level must be the direct child of the previous one. The first level
/// is either a root-level kind or an opaque id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePath {
    segments: Vec<PathSegment>,
}

impl ResourcePath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path starting at the caller's home tenant
    pub fn home_tenant() -> Self {
        Self {
            segments: vec![PathSegment {
                kind: ResourceKind::Tenant,
                name: SegmentName::Home,
            }],
        }
    }

    /// Append a named level
    pub fn push(mut self, kind: ResourceKind, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ViprError::Config(format!("Empty {} name", kind)));
        }
        let segment = PathSegment {
            kind,
            name: SegmentName::Named(name),
        };
        if let Some(id) = segment.opaque_id() {
            if !kind.accepts_id(id) {
                return Err(ViprError::Config(format!("'{}' is not a {} id", id, kind)));
            }
        }

        match self.segments.last() {
            Some(previous) if kind.parent() != Some(previous.kind) => {
                return Err(ViprError::Config(format!(
                    "A {} cannot be scoped by a {}",
                    kind, previous.kind
                )));
            }
            None if kind.parent().is_some() && segment.opaque_id().is_none() => {
                return Err(ViprError::Config(format!(
                    "{} needs an enclosing {}",
                    segment,
                    kind.parent().map(|p| p.name()).unwrap_or("scope")
                )));
            }
            _ => {}
        }

        self.segments.push(segment);
        Ok(self)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn leaf(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Path without its leaf
    pub fn parent(&self) -> ResourcePath {
        let mut segments = self.segments.clone();
        segments.pop();
        ResourcePath { segments }
    }

    /// Human description of the first `len` levels, used as an error scope
    fn scope_of(&self, len: usize) -> String {
        if len == 0 {
            return "the appliance".to_string();
        }
        self.segments[..len]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scope_of(self.segments.len()))
    }
}

/// Canonical location of a resolved resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUri {
    pub kind: ResourceKind,
    pub id: String,
    /// Resolved enclosing levels, outermost first
    pub ancestors: Vec<(ResourceKind, String)>,
}

impl ResolvedUri {
    /// API path of the resource
    pub fn path(&self) -> String {
        self.kind.self_path(&self.id)
    }

    /// Absolute URL against an appliance base URL
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }

    pub fn deactivate_path(&self) -> String {
        self.kind.deactivate_path(&self.id)
    }

    pub fn ancestor_id(&self, kind: ResourceKind) -> Option<&str> {
        self.ancestors
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, id)| id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    parent: Option<String>,
    kind: ResourceKind,
    name: SegmentName,
}

/// Resolves resource paths through list lookups, caching per invocation
pub struct UriResolver<'a> {
    client: &'a ViprClient,
    cache: Mutex<HashMap<CacheKey, String>>,
    home: OnceCell<NamedRelatedResource>,
}

impl<'a> UriResolver<'a> {
    pub fn new(client: &'a ViprClient) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
            home: OnceCell::new(),
        }
    }

    /// Resolve every level of `path` to an id
    pub async fn resolve(&self, path: &ResourcePath) -> Result<ResolvedUri> {
        let segments = path.segments();
        let Some(leaf) = path.leaf() else {
            return Err(ViprError::Config("Nothing to resolve".to_string()));
        };

        let mut parent: Option<String> = None;
        let mut ancestors = Vec::with_capacity(segments.len().saturating_sub(1));
        for (depth, segment) in segments.iter().enumerate() {
            let id = self
                .resolve_segment(segment, parent.as_deref(), &path.scope_of(depth))
                .await?;
            if depth + 1 < segments.len() {
                ancestors.push((segment.kind, id.clone()));
            }
            parent = Some(id);
        }

        let id = parent.unwrap_or_default();
        debug!("Resolved {} to {}", path, id);
        Ok(ResolvedUri {
            kind: leaf.kind,
            id,
            ancestors,
        })
    }

    /// Forget every cached name-to-id mapping
    pub fn invalidate_cache(&self) {
        self.lock_cache().clear();
    }

    /// Members of `kind` within a parent scope.
    ///
    /// Tenants are listed as the home tenant followed by its subtenants.
    pub async fn list_children(
        &self,
        kind: ResourceKind,
        parent_id: Option<&str>,
    ) -> Result<Vec<NamedRelatedResource>> {
        if kind == ResourceKind::Tenant {
            let home = self.home_tenant().await?.clone();
            let mut tenants = self.list_members(kind, Some(&home.id)).await?;
            tenants.insert(0, home);
            return Ok(tenants);
        }
        self.list_members(kind, parent_id).await
    }

    async fn resolve_segment(
        &self,
        segment: &PathSegment,
        parent: Option<&str>,
        scope: &str,
    ) -> Result<String> {
        if let Some(id) = segment.opaque_id() {
            return Ok(id.to_string());
        }

        let key = CacheKey {
            parent: parent.map(str::to_string),
            kind: segment.kind,
            name: segment.name.clone(),
        };
        if let Some(id) = self.lock_cache().get(&key).cloned() {
            debug!("Cache hit for {} in {}", segment, scope);
            return Ok(id);
        }

        let id = match &segment.name {
            SegmentName::Home => self.home_tenant().await?.id.clone(),
            SegmentName::Named(name) => {
                let candidates = self.list_children(segment.kind, parent).await?;
                pick_unique(segment.kind, name, scope, candidates)?
            }
        };

        self.lock_cache().insert(key, id.clone());
        Ok(id)
    }

    async fn home_tenant(&self) -> Result<&NamedRelatedResource> {
        self.home
            .get_or_try_init(|| async {
                let tenant: NamedRelatedResource = self.client.get_json(api::HOME_TENANT).await?;
                debug!("Home tenant is '{}' ({})", tenant.name, tenant.id);
                Ok::<_, ViprError>(tenant)
            })
            .await
    }

    async fn list_members(
        &self,
        kind: ResourceKind,
        parent_id: Option<&str>,
    ) -> Result<Vec<NamedRelatedResource>> {
        let path = kind.list_path(parent_id).ok_or_else(|| {
            ViprError::Config(format!(
                "Listing {}s requires a {} scope",
                kind,
                kind.parent().map(|p| p.name()).unwrap_or("parent")
            ))
        })?;

        let body: serde_json::Value = self.client.get_json(&path).await?;
        let members = match body.get(kind.list_key()) {
            Some(serde_json::Value::Array(items)) => items.clone(),
            // Single-member lists sometimes arrive as a bare object
            Some(item @ serde_json::Value::Object(_)) => vec![item.clone()],
            Some(serde_json::Value::Null) | None if body.is_object() || body.is_null() => Vec::new(),
            _ => {
                return Err(ViprError::Protocol(format!(
                    "{} did not return a '{}' list",
                    path,
                    kind.list_key()
                )))
            }
        };

        let mut resources = Vec::with_capacity(members.len());
        for member in members {
            let resource: NamedRelatedResource = serde_json::from_value(member)?;
            let wanted = kind
                .resource_type()
                .is_none_or(|t| resource.resource_type.as_deref() == Some(t));
            if wanted {
                resources.push(resource);
            }
        }
        debug!("{} lists {} {}(s)", path, resources.len(), kind);
        Ok(resources)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, String>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Exactly one case-sensitive name match, or the matching error
fn pick_unique(
    kind: ResourceKind,
    name: &str,
    scope: &str,
    candidates: Vec<NamedRelatedResource>,
) -> Result<String> {
    let mut matches: Vec<String> = candidates
        .into_iter()
        .filter(|c| c.has_name(name))
        .map(|c| c.id)
        .collect();

    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(ViprError::ResourceNotFound {
            kind: kind.to_string(),
            name: name.to_string(),
            scope: scope.to_string(),
        }),
        _ => Err(ViprError::AmbiguousResource {
            kind: kind.to_string(),
            name: name.to_string(),
            scope: scope.to_string(),
            ids: matches,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::api as api_config;
    use crate::vipr::client::test_client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ROOT_TENANT: &str = "urn:storageos:TenantOrg:root:global";
    const T1: &str = "urn:storageos:TenantOrg:t1:global";
    const P1: &str = "urn:storageos:Project:p1:global";
    const VOL_A: &str = "urn:storageos:Volume:a1:vdc1";
    const VOL_A2: &str = "urn:storageos:Volume:a2:vdc1";

    async fn mount_login(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).insert_header(api_config::AUTH_TOKEN_HEADER, "tok"))
            .mount(server)
            .await;
    }

    async fn mount_list(server: &MockServer, list_path: String, body: serde_json::Value, calls: u64) {
        Mock::given(method("GET"))
            .and(path(list_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(calls)
            .mount(server)
            .await;
    }

    /// Home tenant "Provider Tenant" with subtenant T1 holding project P1
    async fn mount_tenants(server: &MockServer, calls: u64) {
        mount_list(
            server,
            "/tenant".to_string(),
            serde_json::json!({"name": "Provider Tenant", "id": ROOT_TENANT}),
            calls,
        )
        .await;
        mount_list(
            server,
            format!("/tenants/{}/subtenants", ROOT_TENANT),
            serde_json::json!({"subtenant": [{"name": "T1", "id": T1}]}),
            calls,
        )
        .await;
        mount_list(
            server,
            format!("/tenants/{}/projects", T1),
            serde_json::json!({"project": [{"name": "P1", "id": P1}, {"name": "p1", "id": "urn:storageos:Project:other:global"}]}),
            calls,
        )
        .await;
    }

    fn volume_path(volume: &str) -> ResourcePath {
        ResourcePath::new()
            .push(ResourceKind::Tenant, "T1")
            .unwrap()
            .push(ResourceKind::Project, "P1")
            .unwrap()
            .push(ResourceKind::Volume, volume)
            .unwrap()
    }

    #[test]
    fn test_path_rejects_wrong_parent() {
        let err = ResourcePath::home_tenant()
            .push(ResourceKind::Volume, "vol-a")
            .unwrap_err();
        assert!(matches!(err, ViprError::Config(_)));
    }

    #[test]
    fn test_path_requires_scope_for_named_child() {
        assert!(ResourcePath::new().push(ResourceKind::Project, "P1").is_err());
        assert!(ResourcePath::new().push(ResourceKind::Project, P1).is_ok());
        assert!(ResourcePath::new().push(ResourceKind::Varray, "va1").is_ok());
        assert!(ResourcePath::new().push(ResourceKind::Varray, "  ").is_err());
    }

    #[test]
    fn test_path_rejects_id_of_wrong_kind() {
        let err = ResourcePath::new()
            .push(ResourceKind::Project, VOL_A)
            .unwrap_err();
        assert!(matches!(err, ViprError::Config(_)));
        assert!(err.to_string().contains("is not a project id"));

        let err = ResourcePath::new()
            .push(ResourceKind::Project, P1)
            .unwrap()
            .push(ResourceKind::Volume, P1)
            .unwrap_err();
        assert!(matches!(err, ViprError::Config(_)));
    }

    #[test]
    fn test_path_display() {
        let path = ResourcePath::home_tenant()
            .push(ResourceKind::Project, "P1")
            .unwrap();
        assert_eq!(path.to_string(), "home tenant / project 'P1'");
        assert_eq!(path.parent().to_string(), "home tenant");
    }

    #[test]
    fn test_resolved_uri_paths() {
        let uri = ResolvedUri {
            kind: ResourceKind::Volume,
            id: VOL_A.to_string(),
            ancestors: vec![(ResourceKind::Project, P1.to_string())],
        };
        assert_eq!(uri.path(), format!("/block/volumes/{}", VOL_A));
        assert_eq!(
            uri.url("https://vipr:4443/"),
            format!("https://vipr:4443/block/volumes/{}", VOL_A)
        );
        assert_eq!(uri.ancestor_id(ResourceKind::Project), Some(P1));
        assert_eq!(uri.ancestor_id(ResourceKind::Tenant), None);
    }

    #[tokio::test]
    async fn test_resolves_volume_through_hierarchy() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        mount_tenants(&server, 1).await;
        mount_list(
            &server,
            format!("/projects/{}/resources", P1),
            serde_json::json!({"project_resource": [
                {"name": "vol-a", "id": VOL_A, "resource_type": "volume"},
                {"name": "vol-a", "id": "urn:storageos:FileShare:f1:vdc1", "resource_type": "fileshare"},
                {"name": "vol-b", "id": VOL_A2, "resource_type": "volume"}
            ]}),
            1,
        )
        .await;

        let client = test_client(&server.uri());
        let resolver = UriResolver::new(&client);
        let uri = resolver.resolve(&volume_path("vol-a")).await.unwrap();

        assert_eq!(uri.kind, ResourceKind::Volume);
        assert_eq!(uri.id, VOL_A);
        assert_eq!(uri.ancestor_id(ResourceKind::Tenant), Some(T1));
        assert_eq!(uri.ancestor_id(ResourceKind::Project), Some(P1));
    }

    #[tokio::test]
    async fn test_second_resolution_hits_cache() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        mount_tenants(&server, 1).await;
        mount_list(
            &server,
            format!("/projects/{}/resources", P1),
            serde_json::json!({"project_resource": [{"name": "vol-a", "id": VOL_A, "resource_type": "volume"}]}),
            1,
        )
        .await;

        let client = test_client(&server.uri());
        let resolver = UriResolver::new(&client);
        let first = resolver.resolve(&volume_path("vol-a")).await.unwrap();
        let second = resolver.resolve(&volume_path("vol-a")).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_invalidate_cache_forces_lookup() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        mount_list(
            &server,
            "/vdc/varrays".to_string(),
            serde_json::json!({"varray": [{"name": "va1", "id": "urn:storageos:VirtualArray:1:vdc1"}]}),
            2,
        )
        .await;

        let client = test_client(&server.uri());
        let resolver = UriResolver::new(&client);
        let path = ResourcePath::new().push(ResourceKind::Varray, "va1").unwrap();
        resolver.resolve(&path).await.unwrap();
        resolver.invalidate_cache();
        resolver.resolve(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_names_are_ambiguous() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        mount_tenants(&server, 1).await;
        mount_list(
            &server,
            format!("/projects/{}/resources", P1),
            serde_json::json!({"project_resource": [
                {"name": "vol-a", "id": VOL_A, "resource_type": "volume"},
                {"name": "vol-a", "id": VOL_A2, "resource_type": "volume"}
            ]}),
            1,
        )
        .await;

        let client = test_client(&server.uri());
        let resolver = UriResolver::new(&client);
        let err = resolver.resolve(&volume_path("vol-a")).await.unwrap_err();
        match err {
            ViprError::AmbiguousResource { kind, name, scope, ids } => {
                assert_eq!(kind, "volume");
                assert_eq!(name, "vol-a");
                assert_eq!(scope, "tenant 'T1' / project 'P1'");
                assert_eq!(ids, vec![VOL_A.to_string(), VOL_A2.to_string()]);
            }
            other => panic!("Expected AmbiguousResource, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_intermediate_is_not_found() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        mount_tenants(&server, 1).await;

        let client = test_client(&server.uri());
        let resolver = UriResolver::new(&client);
        let path = ResourcePath::new()
            .push(ResourceKind::Tenant, "T1")
            .unwrap()
            .push(ResourceKind::Project, "P2")
            .unwrap()
            .push(ResourceKind::Volume, "vol-a")
            .unwrap();
        let err = resolver.resolve(&path).await.unwrap_err();
        match err {
            ViprError::ResourceNotFound { kind, name, scope } => {
                assert_eq!(kind, "project");
                assert_eq!(name, "P2");
                assert_eq!(scope, "tenant 'T1'");
            }
            other => panic!("Expected ResourceNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_name_match_is_case_sensitive() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        mount_tenants(&server, 1).await;

        let client = test_client(&server.uri());
        let resolver = UriResolver::new(&client);
        let path = ResourcePath::new()
            .push(ResourceKind::Tenant, "T1")
            .unwrap()
            .push(ResourceKind::Project, "p1")
            .unwrap();
        let uri = resolver.resolve(&path).await.unwrap();
        assert_eq!(uri.id, "urn:storageos:Project:other:global");
    }

    #[tokio::test]
    async fn test_opaque_ids_skip_lookup() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        mount_list(
            &server,
            format!("/projects/{}/resources", P1),
            serde_json::json!({"project_resource": [{"name": "vol-a", "id": VOL_A, "resource_type": "volume"}]}),
            1,
        )
        .await;

        let client = test_client(&server.uri());
        let resolver = UriResolver::new(&client);
        let path = ResourcePath::new()
            .push(ResourceKind::Project, P1)
            .unwrap()
            .push(ResourceKind::Volume, "vol-a")
            .unwrap();
        let uri = resolver.resolve(&path).await.unwrap();
        assert_eq!(uri.id, VOL_A);

        // A fully opaque path needs no requests at all
        let direct = ResourcePath::new().push(ResourceKind::Volume, VOL_A2).unwrap();
        assert_eq!(resolver.resolve(&direct).await.unwrap().id, VOL_A2);
    }

    #[tokio::test]
    async fn test_home_tenant_and_tenant_listing() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        mount_list(
            &server,
            "/tenant".to_string(),
            serde_json::json!({"name": "Provider Tenant", "id": ROOT_TENANT}),
            1,
        )
        .await;
        mount_list(
            &server,
            format!("/tenants/{}/subtenants", ROOT_TENANT),
            serde_json::json!({"subtenant": [{"name": "T1", "id": T1}]}),
            2,
        )
        .await;

        let client = test_client(&server.uri());
        let resolver = UriResolver::new(&client);

        let home = resolver.resolve(&ResourcePath::home_tenant()).await.unwrap();
        assert_eq!(home.id, ROOT_TENANT);

        let by_name = ResourcePath::new()
            .push(ResourceKind::Tenant, "Provider Tenant")
            .unwrap();
        assert_eq!(resolver.resolve(&by_name).await.unwrap().id, ROOT_TENANT);

        let tenants = resolver.list_children(ResourceKind::Tenant, None).await.unwrap();
        let names: Vec<&str> = tenants.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Provider Tenant", "T1"]);
    }

    #[tokio::test]
    async fn test_empty_list_response() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        mount_list(&server, "/block/vpools".to_string(), serde_json::json!({}), 1).await;

        let client = test_client(&server.uri());
        let resolver = UriResolver::new(&client);
        let vpools = resolver.list_children(ResourceKind::Vpool, None).await.unwrap();
        assert!(vpools.is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_list_shape_is_protocol_error() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        mount_list(
            &server,
            "/block/vpools".to_string(),
            serde_json::json!({"virtualpool": "oops"}),
            1,
        )
        .await;

        let client = test_client(&server.uri());
        let resolver = UriResolver::new(&client);
        let err = resolver.list_children(ResourceKind::Vpool, None).await.unwrap_err();
        assert!(matches!(err, ViprError::Protocol(_)));
    }
}
