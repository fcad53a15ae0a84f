//! Command dispatcher
//!
//! Thin call sites over the core: each command resolves names through the
//! [`UriResolver`] and issues requests through the [`ViprClient`].

use futures::future::join_all;
use log::{debug, info, warn};
use reqwest::Method;
use serde_json::Value;

use crate::cli::{ApiArgs, Cli, Command, DeleteArgs, GetArgs, OutputFormat, ScopeArgs};
use crate::config::api;
use crate::error::{Result, ViprError};
use crate::output::{render_listing, render_record, render_resources, render_value};
use crate::session::{CredentialSource, CredentialStore, Credentials, Secret};
use crate::ui::{clear_spinner, confirm_action, create_spinner, prompt_password, prompt_username};
use crate::vipr::client::ViprClient;
use crate::vipr::credentials::{CredentialArgs, CredentialResolver};
use crate::vipr::host::{process_env, HostResolver};
use crate::vipr::models::{TaskResource, UserInfo};
use crate::vipr::resolver::{ResourcePath, UriResolver};
use crate::vipr::resources::{is_opaque_id, ResourceKind};

const WHOAMI_FIELDS: &[&str] = &["common_name", "tenant_name", "vdc_roles", "home_tenant_roles"];

/// Run the selected command
pub async fn run_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Login => {
            let client = connect(cli, true)?;
            let session = client.ensure_session().await?;
            let user: UserInfo = client.get_json(api::WHOAMI).await?;
            if cli.no_cache {
                warn!("--no-cache given; the session will not be reused by later commands");
            }
            println!(
                "Logged in to {} as {} (token {})",
                client.endpoint(),
                user.common_name
                    .or(session.username.clone())
                    .unwrap_or_else(|| "<unknown>".to_string()),
                session.masked_token()
            );
            Ok(())
        }
        Command::Logout => {
            let client = connect(cli, false)?;
            if client.logout().await? {
                println!("Logged out of {}", client.endpoint());
            } else {
                println!("No active session for {}", client.endpoint());
            }
            Ok(())
        }
        Command::Whoami { output } => {
            let client = connect(cli, false)?;
            println!("{}", whoami(&client, *output).await?);
            Ok(())
        }
        Command::Get(args) => {
            let client = connect(cli, false)?;
            let spinner = create_spinner(&format!("Fetching {}s...", args.kind), cli.batch);
            let result = get_resources(&client, args).await;
            clear_spinner(spinner);
            println!("{}", result?);
            Ok(())
        }
        Command::Delete(args) => {
            let client = connect(cli, false)?;
            delete_resource(&client, args).await
        }
        Command::Api(args) => {
            let client = connect(cli, false)?;
            println!("{}", raw_request(&client, args).await?);
            Ok(())
        }
    }
}

/// Build a client from the global flags, the environment, and the cached session.
///
/// `interactive_login` prompts for whatever credentials are missing.
fn connect(cli: &Cli, interactive_login: bool) -> Result<ViprClient> {
    let store = if cli.no_cache {
        None
    } else {
        Some(
            cli.session_file
                .clone()
                .map(CredentialStore::with_path)
                .unwrap_or_default(),
        )
    };
    let cached = store.as_ref().and_then(|s| s.load());

    let endpoint = HostResolver::new(&process_env).resolve(
        cli.host.as_deref(),
        cli.port,
        cached.as_ref(),
    )?;
    let credentials = CredentialResolver::new(&process_env).resolve(
        endpoint,
        CredentialArgs {
            username: cli.username.as_deref(),
            password: cli.password.as_deref(),
            token: cli.token.as_deref(),
        },
    )?;
    let credentials = complete_credentials(credentials, interactive_login, cli.batch)?;

    debug!(
        "Connecting to {} ({:?} credentials)",
        credentials.endpoint, credentials.source
    );
    let mut client = ViprClient::new(credentials, store, cli.retry_policy(), cli.insecure)?;
    client.set_batch_mode(cli.batch);
    Ok(client)
}

/// Prompt for a missing secret, but only when logging in.
///
/// A username on its own is not a credential: other commands keep
/// `secret: None` and run on the cached session.
fn complete_credentials(
    credentials: Credentials,
    interactive_login: bool,
    batch_mode: bool,
) -> Result<Credentials> {
    if credentials.secret.is_some() || !interactive_login {
        return Ok(credentials);
    }
    let username = match credentials.username {
        Some(username) => username,
        None => prompt_username(batch_mode)?,
    };
    let password = prompt_password(&username, batch_mode)?;
    Ok(Credentials {
        endpoint: credentials.endpoint,
        username: Some(username),
        secret: Some(Secret::Password(password)),
        source: CredentialSource::Prompt,
    })
}

/// Render the authenticated user
pub async fn whoami(client: &ViprClient, output: OutputFormat) -> Result<String> {
    let response = client.execute(Method::GET, api::WHOAMI, None, None).await?;
    // Validate the shape before rendering
    response.json::<UserInfo>()?;
    match output {
        OutputFormat::Table | OutputFormat::Csv => render_record(WHOAMI_FIELDS, &response.body, output),
        _ => render_value(&response.body, output),
    }
}

/// Path of the enclosing levels of `kind`, from the scope flags.
///
/// A missing tenant means the home tenant; any other missing level is an
/// error. An opaque id restarts the path, since nothing above it is needed.
pub fn scope_path(kind: ResourceKind, scope: &ScopeArgs) -> Result<ResourcePath> {
    let ancestors = kind.ancestors();
    for candidate in [
        ResourceKind::Tenant,
        ResourceKind::Project,
        ResourceKind::Volume,
        ResourceKind::StorageSystem,
    ] {
        if scope.name_for(candidate).is_some() && !ancestors.contains(&candidate) {
            warn!(
                "{} is ignored for {}s",
                candidate.scope_flag().unwrap_or_default(),
                kind
            );
        }
    }

    let mut path = ResourcePath::new();
    for ancestor in ancestors {
        path = match scope.name_for(ancestor) {
            Some(name) if is_opaque_id(name) => ResourcePath::new().push(ancestor, name)?,
            Some(name) => path.push(ancestor, name)?,
            None if ancestor == ResourceKind::Tenant => ResourcePath::home_tenant(),
            None => {
                return Err(ViprError::Config(format!(
                    "{}s are scoped by a {}; pass {} <NAME>",
                    kind,
                    ancestor,
                    ancestor.scope_flag().unwrap_or_default()
                )))
            }
        };
    }
    Ok(path)
}

/// Path of one named resource; opaque ids need no scope
fn leaf_path(kind: ResourceKind, scope: &ResourcePath, name: &str) -> Result<ResourcePath> {
    if is_opaque_id(name) {
        ResourcePath::new().push(kind, name)
    } else {
        scope.clone().push(kind, name)
    }
}

/// List a scope, or fetch the named resources concurrently
pub async fn get_resources(client: &ViprClient, args: &GetArgs) -> Result<String> {
    let resolver = UriResolver::new(client);
    let all_ids = !args.names.is_empty() && args.names.iter().all(|n| is_opaque_id(n));
    let scope = if all_ids {
        ResourcePath::new()
    } else {
        scope_path(args.kind, &args.scope)?
    };

    // Resolve the shared scope once; every lookup below hits the cache
    let parent = if scope.is_empty() {
        None
    } else {
        Some(resolver.resolve(&scope).await?)
    };

    if args.names.is_empty() {
        let members = resolver
            .list_children(args.kind, parent.as_ref().map(|p| p.id.as_str()))
            .await?;
        let rows = members
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        info!("Found {} {}(s)", rows.len(), args.kind);
        return render_listing(&rows, args.output);
    }

    let fetches = args.names.iter().map(|name| {
        let resolver = &resolver;
        let scope = &scope;
        async move {
            let uri = resolver.resolve(&leaf_path(args.kind, scope, name)?).await?;
            client.get_json::<Value>(&uri.path()).await
        }
    });
    let resources = join_all(fetches)
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;
    render_resources(args.kind, &resources, args.output)
}

/// Resolve, confirm, and deactivate one resource
pub async fn delete_resource(client: &ViprClient, args: &DeleteArgs) -> Result<()> {
    let resolver = UriResolver::new(client);
    let path = if is_opaque_id(&args.name) {
        ResourcePath::new().push(args.kind, &args.name)?
    } else {
        scope_path(args.kind, &args.scope)?.push(args.kind, &args.name)?
    };
    let uri = resolver.resolve(&path).await?;

    let prompt = format!("Deactivate {} '{}' ({})?", args.kind, args.name, uri.id);
    if !confirm_action(&prompt, args.yes, client.is_batch_mode())? {
        println!("Aborted");
        return Ok(());
    }

    let response = client
        .execute(Method::POST, &uri.deactivate_path(), None, None)
        .await?;
    match response.json::<TaskResource>() {
        Ok(task) if task.op_id.is_some() || task.state.is_some() => println!(
            "Deactivation of {} '{}' submitted (task {}, state {})",
            args.kind,
            args.name,
            task.op_id.as_deref().unwrap_or("-"),
            task.state.as_deref().unwrap_or("unknown")
        ),
        _ => println!("Deactivated {} '{}'", args.kind, args.name),
    }
    Ok(())
}

/// Raw request through the executor
pub async fn raw_request(client: &ViprClient, args: &ApiArgs) -> Result<String> {
    let body = args
        .data
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .map_err(|e| ViprError::Config(format!("--data is not valid JSON: {}", e)))?;

    let path = request_path(&args.path, &args.params);
    let response = client
        .execute(args.method.clone(), &path, body.as_ref(), None)
        .await?;
    render_value(&response.body, args.output)
}

/// Normalize a user-supplied path and append query parameters
fn request_path(path: &str, params: &[(String, String)]) -> String {
    let mut path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    if !params.is_empty() {
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        path.push(if path.contains('?') { '&' } else { '?' });
        path.push_str(&query);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::api as api_config;
    use crate::vipr::client::test_client;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate, Times};

    const ROOT_TENANT: &str = "urn:storageos:TenantOrg:root:global";
    const P1: &str = "urn:storageos:Project:p1:global";
    const VOL_A: &str = "urn:storageos:Volume:a1:vdc1";
    const VOL_B: &str = "urn:storageos:Volume:b1:vdc1";

    async fn mount_get(server: &MockServer, at: &str, body: Value, calls: impl Into<Times>) {
        Mock::given(method("GET"))
            .and(path(at.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(calls)
            .mount(server)
            .await;
    }

    /// Login, home tenant, project P1 with volumes vol-a and vol-b
    async fn mount_project(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).insert_header(api_config::AUTH_TOKEN_HEADER, "tok"))
            .mount(server)
            .await;
        mount_get(
            server,
            "/tenant",
            serde_json::json!({"name": "Provider Tenant", "id": ROOT_TENANT}),
            1,
        )
        .await;
        mount_get(
            server,
            &format!("/tenants/{}/projects", ROOT_TENANT),
            serde_json::json!({"project": [{"name": "P1", "id": P1}]}),
            1,
        )
        .await;
        mount_get(
            server,
            &format!("/projects/{}/resources", P1),
            serde_json::json!({"project_resource": [
                {"name": "vol-a", "id": VOL_A, "resource_type": "volume"},
                {"name": "vol-b", "id": VOL_B, "resource_type": "volume"}
            ]}),
            // Concurrent leaf lookups may each list the project
            1..,
        )
        .await;
    }

    fn scope(project: Option<&str>) -> ScopeArgs {
        ScopeArgs {
            project: project.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_scope_path_defaults_to_home_tenant() {
        let path = scope_path(ResourceKind::Volume, &scope(Some("P1"))).unwrap();
        assert_eq!(path.to_string(), "home tenant / project 'P1'");
    }

    #[test]
    fn test_scope_path_requires_project() {
        let err = scope_path(ResourceKind::Volume, &scope(None)).unwrap_err();
        assert!(matches!(err, ViprError::Config(_)));
        assert!(err.to_string().contains("--project"));
    }

    #[test]
    fn test_scope_path_restarts_at_opaque_id() {
        let path = scope_path(ResourceKind::Volume, &scope(Some(P1))).unwrap();
        assert_eq!(path.segments().len(), 1);
    }

    #[test]
    fn test_scope_path_rejects_volume_id_as_project() {
        let err = scope_path(ResourceKind::Volume, &scope(Some(VOL_A))).unwrap_err();
        assert!(matches!(err, ViprError::Config(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_scope_path_root_kind_is_empty() {
        assert!(scope_path(ResourceKind::Varray, &ScopeArgs::default())
            .unwrap()
            .is_empty());
    }

    fn username_only() -> Credentials {
        Credentials {
            username: Some("root".to_string()),
            ..Credentials::cached_only(crate::session::Endpoint::new("vipr.example.com", 4443))
        }
    }

    #[test]
    fn test_username_alone_falls_back_to_cache() {
        let credentials = complete_credentials(username_only(), false, true).unwrap();
        assert!(credentials.secret.is_none());
        assert_eq!(credentials.username.as_deref(), Some("root"));
    }

    #[test]
    fn test_login_in_batch_mode_needs_password() {
        let err = complete_credentials(username_only(), true, true).unwrap_err();
        assert!(matches!(err, ViprError::Config(_)));
        assert!(err.to_string().contains("password is required"));
    }

    #[test]
    fn test_explicit_secret_is_kept_for_login() {
        let credentials = Credentials::password(
            crate::session::Endpoint::new("vipr.example.com", 4443),
            "root",
            "secret",
        );
        let completed = complete_credentials(credentials.clone(), true, true).unwrap();
        assert_eq!(completed, credentials);
    }

    #[test]
    fn test_request_path() {
        assert_eq!(request_path("block/volumes", &[]), "/block/volumes");
        assert_eq!(
            request_path(
                "/block/volumes/search",
                &[("name".to_string(), "vol a".to_string())]
            ),
            "/block/volumes/search?name=vol%20a"
        );
        assert_eq!(
            request_path("/x?a=1", &[("b".to_string(), "2".to_string())]),
            "/x?a=1&b=2"
        );
    }

    #[tokio::test]
    async fn test_get_lists_scope() {
        let server = MockServer::start().await;
        mount_project(&server).await;

        let client = test_client(&server.uri());
        let args = GetArgs {
            kind: ResourceKind::Volume,
            names: vec![],
            scope: scope(Some("P1")),
            output: OutputFormat::Csv,
        };
        let out = get_resources(&client, &args).await.unwrap();
        assert_eq!(
            out,
            format!("name,id\nvol-a,{}\nvol-b,{}", VOL_A, VOL_B)
        );
    }

    #[tokio::test]
    async fn test_get_fetches_names_concurrently_after_resolving_scope_once() {
        let server = MockServer::start().await;
        mount_project(&server).await;
        mount_get(
            &server,
            &format!("/block/volumes/{}", VOL_A),
            serde_json::json!({"name": "vol-a", "id": VOL_A, "provisioned_capacity_gb": "1.00"}),
            1,
        )
        .await;
        mount_get(
            &server,
            &format!("/block/volumes/{}", VOL_B),
            serde_json::json!({"name": "vol-b", "id": VOL_B, "provisioned_capacity_gb": "2.00"}),
            1,
        )
        .await;

        let client = test_client(&server.uri());
        let args = GetArgs {
            kind: ResourceKind::Volume,
            names: vec!["vol-a".to_string(), "vol-b".to_string()],
            scope: scope(Some("P1")),
            output: OutputFormat::Json,
        };
        let out = get_resources(&client, &args).await.unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["name"], "vol-a");
        assert_eq!(parsed[1]["provisioned_capacity_gb"], "2.00");
    }

    #[tokio::test]
    async fn test_get_fails_when_any_name_is_missing() {
        let server = MockServer::start().await;
        mount_project(&server).await;
        mount_get(
            &server,
            &format!("/block/volumes/{}", VOL_A),
            serde_json::json!({"name": "vol-a", "id": VOL_A}),
            1,
        )
        .await;

        let client = test_client(&server.uri());
        let args = GetArgs {
            kind: ResourceKind::Volume,
            names: vec!["vol-a".to_string(), "vol-z".to_string()],
            scope: scope(Some("P1")),
            output: OutputFormat::Table,
        };
        let err = get_resources(&client, &args).await.unwrap_err();
        assert!(matches!(err, ViprError::ResourceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_by_id_needs_no_scope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).insert_header(api_config::AUTH_TOKEN_HEADER, "tok"))
            .mount(&server)
            .await;
        mount_get(
            &server,
            &format!("/block/volumes/{}", VOL_A),
            serde_json::json!({"name": "vol-a", "id": VOL_A}),
            1,
        )
        .await;

        let client = test_client(&server.uri());
        let args = GetArgs {
            kind: ResourceKind::Volume,
            names: vec![VOL_A.to_string()],
            scope: ScopeArgs::default(),
            output: OutputFormat::Json,
        };
        let out = get_resources(&client, &args).await.unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["id"], VOL_A);
    }

    #[tokio::test]
    async fn test_delete_resolved_volume_server_error_not_retried() {
        let server = MockServer::start().await;
        mount_project(&server).await;
        Mock::given(method("POST"))
            .and(path(format!("/block/volumes/{}/deactivate", VOL_A)))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "code": 999,
                "description": "An unexpected error occurred"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let args = DeleteArgs {
            kind: ResourceKind::Volume,
            name: "vol-a".to_string(),
            scope: scope(Some("P1")),
            yes: true,
        };
        let err = delete_resource(&client, &args).await.unwrap_err();
        assert!(matches!(err, ViprError::Server(_)));
        assert_eq!(err.exit_code(), 7);
    }

    #[tokio::test]
    async fn test_delete_submits_deactivation() {
        let server = MockServer::start().await;
        mount_project(&server).await;
        Mock::given(method("POST"))
            .and(path(format!("/block/volumes/{}/deactivate", VOL_B)))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({
                "op_id": "op-1",
                "state": "pending"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let args = DeleteArgs {
            kind: ResourceKind::Volume,
            name: "vol-b".to_string(),
            scope: scope(Some("P1")),
            yes: true,
        };
        delete_resource(&client, &args).await.unwrap();
    }

    #[tokio::test]
    async fn test_raw_request_with_params_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).insert_header(api_config::AUTH_TOKEN_HEADER, "tok"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/block/volumes/bulk"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"volume": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let args = ApiArgs {
            method: Method::POST,
            path: "block/volumes/bulk".to_string(),
            data: Some(r#"{"id": []}"#.to_string()),
            params: vec![("limit".to_string(), "10".to_string())],
            output: OutputFormat::Json,
        };
        let out = raw_request(&client, &args).await.unwrap();
        assert!(out.contains("\"volume\""));
    }

    #[tokio::test]
    async fn test_raw_request_rejects_invalid_data() {
        let server = MockServer::start().await;
        let client = test_client(&server.uri());
        let args = ApiArgs {
            method: Method::POST,
            path: "/block/volumes".to_string(),
            data: Some("{not json".to_string()),
            params: vec![],
            output: OutputFormat::Json,
        };
        let err = raw_request(&client, &args).await.unwrap_err();
        assert!(matches!(err, ViprError::Config(_)));
    }

    #[tokio::test]
    async fn test_whoami_table() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).insert_header(api_config::AUTH_TOKEN_HEADER, "tok"))
            .mount(&server)
            .await;
        mount_get(
            &server,
            "/user/whoami",
            serde_json::json!({"common_name": "root", "tenant_name": "Provider Tenant", "vdc_roles": ["SYSTEM_ADMIN"]}),
            1,
        )
        .await;

        let client = test_client(&server.uri());
        let out = whoami(&client, OutputFormat::Table).await.unwrap();
        assert!(out.contains("root"));
        assert!(out.contains("Provider Tenant"));
        assert!(out.contains("SYSTEM_ADMIN"));
    }
}
