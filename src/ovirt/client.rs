//! oVirt Engine API client
//!
//! Opens one authenticated, TLS-verified session against the engine and
//! implements [`InventorySource`] over the REST API.

use super::auth::{request_token, AccessToken};
use super::dto::{decode_collection, DiskAttachmentDto, DiskDto, VmDto};
use super::tls::TrustAnchors;
use crate::config::CollectorConfig;
use crate::domain::ports::{Disk, DiskAttachment, InventorySource, VirtualMachine};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// API version requested from the engine
const API_VERSION: &str = "4";

/// Authenticated engine session
#[derive(Debug)]
pub struct OvirtClient {
    http: reqwest::Client,
    api_url: String,
    token: AccessToken,
}

impl OvirtClient {
    /// Validate the config, build the HTTP client and authenticate
    pub async fn connect(config: &CollectorConfig) -> Result<Self> {
        config.validate()?;
        let password = config.password_source.resolve()?;
        let http = build_http_client(config)?;
        let token = request_token(&http, config, &password).await?;

        info!(
            "Connected to {} (token expires {})",
            config.api_url(),
            token
                .expires_at()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string())
        );
        Ok(Self::with_token(http, config, token))
    }

    /// Wrap an existing HTTP client and token
    pub fn with_token(http: reqwest::Client, config: &CollectorConfig, token: AccessToken) -> Self {
        Self {
            http,
            api_url: config.api_url(),
            token,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// GET a collection and convert its elements into core types
    async fn get_collection<D, T>(&self, path: &str, key: &str, what: &str) -> Result<Vec<T>>
    where
        D: DeserializeOwned + Into<T>,
    {
        let url = format!("{}/{}", self.api_url, path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.token.secret())
            .header(ACCEPT, "application/json")
            .header("Version", API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::auth(format!("HTTP {} from {}", status.as_u16(), url)));
        }
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let items: Vec<D> = decode_collection(&body, key, what)?;
        debug!("Decoded {} {}", items.len(), what);

        Ok(items.into_iter().map(Into::into).collect())
    }
}

/// Build the HTTP client with the configured timeout and trust anchors.
///
/// When a trust anchor directory is configured it replaces the built-in
/// root store entirely.
pub fn build_http_client(config: &CollectorConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(config.timeout())
        .user_agent(config.user_agent.as_str());

    if let Some(dir) = &config.trust_anchor_dir {
        let anchors = TrustAnchors::load_dir(dir)?;
        debug!("Trusting {} anchors instead of the built-in roots", anchors.len());
        builder = builder.tls_built_in_root_certs(false);
        for cert in anchors.into_certificates() {
            builder = builder.add_root_certificate(cert);
        }
    }

    builder
        .build()
        .map_err(|e| Error::Tls(format!("Failed to build HTTP client: {}", e)))
}

#[async_trait]
impl InventorySource for OvirtClient {
    async fn list_vms(&self) -> Result<Vec<VirtualMachine>> {
        self.get_collection::<VmDto, _>("vms", "vm", "virtual machines")
            .await
    }

    async fn list_disks(&self) -> Result<Vec<Disk>> {
        self.get_collection::<DiskDto, _>("disks", "disk", "disks")
            .await
    }

    async fn list_disk_attachments(&self, vm_id: &str) -> Result<Vec<DiskAttachment>> {
        let path = format!("vms/{}/diskattachments", urlencoding::encode(vm_id));
        let what = format!("disk attachments of VM {}", vm_id);
        self.get_collection::<DiskAttachmentDto, _>(&path, "disk_attachment", &what)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PasswordSource;
    use crate::inventory::collect;
    use crate::ovirt::tls::tests::{CORRUPT_CA, TEST_CA};
    use assert_matches::assert_matches;
    use axum::extract::{Form, Path};
    use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode as AxumStatus};
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tempfile::TempDir;

    const TOKEN: &str = "tok-1";

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config(host: String, password: &str) -> CollectorConfig {
        CollectorConfig {
            host,
            password_source: PasswordSource::Literal {
                value: password.to_string(),
            },
            timeout_secs: 5,
            ..Default::default()
        }
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some("Bearer tok-1")
    }

    async fn token(Form(form): Form<HashMap<String, String>>) -> Response {
        let ok = form.get("grant_type").map(String::as_str) == Some("password")
            && form.get("scope").map(String::as_str) == Some("ovirt-app-api")
            && form.get("username").map(String::as_str) == Some("admin@internal")
            && form.get("password").map(String::as_str) == Some("s3cret");
        if ok {
            Json(json!({
                "access_token": TOKEN,
                "token_type": "bearer",
                "scope": "ovirt-app-api",
                "exp": "4102444800000"
            }))
            .into_response()
        } else {
            (
                AxumStatus::UNAUTHORIZED,
                Json(json!({
                    "error_code": "access_denied",
                    "error": "Cannot authenticate user 'admin@internal': The username or password is incorrect."
                })),
            )
                .into_response()
        }
    }

    fn guarded(headers: &HeaderMap, body: Value) -> Response {
        if !authorized(headers) {
            return AxumStatus::UNAUTHORIZED.into_response();
        }
        if headers.get("Version").and_then(|v| v.to_str().ok()) != Some("4") {
            return AxumStatus::BAD_REQUEST.into_response();
        }
        Json(body).into_response()
    }

    async fn vms(headers: HeaderMap) -> Response {
        guarded(
            &headers,
            json!({"vm": [
                {"id": "vm-1", "name": "db01", "memory": "4294967296", "status": "up",
                 "serial_number": {"value": "SN-1"}, "status_detail": "ok"},
                {"id": "vm-2", "name": "web01", "memory": "0", "status": "down"},
                {"id": "vm-3", "name": "idle", "status": "suspended"}
            ]}),
        )
    }

    async fn disks(headers: HeaderMap) -> Response {
        guarded(
            &headers,
            json!({"disk": [
                {"id": "d-1", "initial_size": "10737418240", "lun_storage": {"description": "Local SSD pool"}},
                {"id": "d-2", "initial_size": "5368709120", "lun_storage": {"description": "NFS spinning array"}}
            ]}),
        )
    }

    async fn attachments(headers: HeaderMap, Path(vm_id): Path<String>) -> Response {
        let body = match vm_id.as_str() {
            "vm-1" => json!({"disk_attachment": [
                {"id": "d-1", "bootable": "true", "disk": {"id": "d-1"}},
                {"id": "d-2", "bootable": "false", "disk": {"id": "d-2"}}
            ]}),
            "vm-2" => json!({"disk_attachment": [
                {"id": "a-9", "disk": {"id": "d-gone"}}
            ]}),
            _ => json!({}),
        };
        guarded(&headers, body)
    }

    fn engine() -> Router {
        Router::new()
            .route("/ovirt-engine/sso/oauth/token", post(token))
            .route("/ovirt-engine/api/vms", get(vms))
            .route("/ovirt-engine/api/disks", get(disks))
            .route("/ovirt-engine/api/vms/:id/diskattachments", get(attachments))
    }

    #[tokio::test]
    async fn test_collect_against_fake_engine() {
        let host = spawn(engine()).await;
        let client = OvirtClient::connect(&config(host, "s3cret")).await.unwrap();
        assert_eq!(
            client.token.expires_at().map(|t| t.timestamp_millis()),
            Some(4_102_444_800_000)
        );

        let records = collect(&client).await.unwrap();

        assert_eq!(records.len(), 3);

        assert_eq!(records[0].id, "vm-1");
        assert_eq!(records[0].ssd_disk_size, 10_737_418_240);
        assert_eq!(records[0].hdd_disk_size, 5_368_709_120);
        assert_eq!(records[0].disk_count, 2);
        assert_eq!(records[0].serial_number.as_deref(), Some("SN-1"));

        assert_eq!(records[1].id, "vm-2");
        assert_eq!(records[1].memory, Some(0));
        assert_eq!(records[1].ssd_disk_size, 0);
        assert_eq!(records[1].hdd_disk_size, 0);
        assert_eq!(records[1].disk_count, 1);

        assert_eq!(records[2].id, "vm-3");
        assert_eq!(records[2].disk_count, 0);
    }

    #[tokio::test]
    async fn test_wrong_password_is_auth_error() {
        let host = spawn(engine()).await;
        let result = OvirtClient::connect(&config(host, "wrong")).await;

        let Err(Error::Auth { reason }) = result else {
            panic!("expected auth error");
        };
        assert!(reason.contains("access_denied"));
    }

    #[tokio::test]
    async fn test_rejected_token_is_auth_error() {
        let host = spawn(engine()).await;
        let cfg = config(host, "s3cret");
        let http = build_http_client(&cfg).unwrap();
        let client = OvirtClient::with_token(http, &cfg, AccessToken::new("stale"));

        assert_matches!(client.list_vms().await, Err(Error::Auth { .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_http_status() {
        let app = Router::new()
            .route("/ovirt-engine/sso/oauth/token", post(token))
            .route(
                "/ovirt-engine/api/vms",
                get(|| async { AxumStatus::BAD_GATEWAY }),
            );
        let host = spawn(app).await;
        let client = OvirtClient::connect(&config(host, "s3cret")).await.unwrap();

        assert_matches!(
            client.list_vms().await,
            Err(Error::HttpStatus { status: 502, .. })
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let app = Router::new()
            .route("/ovirt-engine/sso/oauth/token", post(token))
            .route(
                "/ovirt-engine/api/disks",
                get(|| async { "<html>maintenance</html>" }),
            );
        let host = spawn(app).await;
        let client = OvirtClient::connect(&config(host, "s3cret")).await.unwrap();

        let Err(Error::Decode { what, .. }) = client.list_disks().await else {
            panic!("expected decode error");
        };
        assert_eq!(what, "disks");
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_transport_error() {
        // Bind and drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = OvirtClient::connect(&config(format!("http://{}", addr), "s3cret")).await;
        assert_matches!(result, Err(Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_network() {
        let result = OvirtClient::connect(&config(String::new(), "s3cret")).await;
        assert_matches!(result, Err(Error::Configuration(_)));
    }

    #[test]
    fn test_http_client_with_trust_anchor_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("engine-ca.pem"), TEST_CA).unwrap();

        let cfg = CollectorConfig {
            host: "engine.lab".into(),
            trust_anchor_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        build_http_client(&cfg).unwrap();
    }

    #[test]
    fn test_http_client_rejects_corrupt_trust_anchor() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("engine-ca.pem"), TEST_CA).unwrap();
        std::fs::write(dir.path().join("broken.pem"), CORRUPT_CA).unwrap();

        let cfg = CollectorConfig {
            host: "engine.lab".into(),
            trust_anchor_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        assert_matches!(
            build_http_client(&cfg),
            Err(Error::Tls(msg)) if msg.contains("broken.pem")
        );
    }

    #[tokio::test]
    async fn test_collect_with_trust_anchors_configured() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("engine-ca.pem"), TEST_CA).unwrap();

        let host = spawn(engine()).await;
        let cfg = CollectorConfig {
            trust_anchor_dir: Some(dir.path().to_path_buf()),
            ..config(host, "s3cret")
        };
        let client = OvirtClient::connect(&cfg).await.unwrap();

        assert_eq!(collect(&client).await.unwrap().len(), 3);
    }
}
