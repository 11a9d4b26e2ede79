//! HMC Web Services REST client
//!
//! Implements [`ConsoleClient`] over the HMC REST API.
//!
//! # Protocol
//!
//! - **Session**: `POST /api/sessions` with userid and password; the returned
//!   token is sent as `X-API-Session` on every further request
//! - **Listing**: one `GET` per class and parent (`/api/cpcs/{id}/adapters`,
//!   `/api/storage-groups`, ...); nics and ports are read through their
//!   parent's uri-list property because they are element objects
//! - **Properties**: `GET {uri}?properties=a,b` where selection is supported
//!
//! # Live updates
//!
//! Subscribed resources are kept in a registry that a background task
//! refreshes on an interval (see [`RestConsoleClient::spawn_auto_update`]).
//! The task installs fresh property snapshots on the shared [`Resource`]
//! objects; it never touches the cache indexes. Resources it finds deleted
//! are queued and handed to the cache through
//! [`ConsoleClient::take_removed`].

use crate::cache::{Properties, Resource, ResourceClass};
use crate::config::ConsoleConfig;
use crate::console::types::{ApiErrorBody, LogonRequest, LogonResponse, RawResource};
use crate::console::ConsoleClient;
use crate::error::{ExporterError, Result};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const SESSION_HEADER: &str = "X-API-Session";

/// Client for the HMC Web Services API
///
/// The session token is obtained lazily on first use and dropped when the
/// console reports it as expired, so the following request logs on again.
pub struct RestConsoleClient {
    http: reqwest::Client,
    base_url: String,
    config: Arc<ConsoleConfig>,
    session: Mutex<Option<String>>,
    subscriptions: parking_lot::Mutex<HashMap<String, Weak<Resource>>>,
    removed: parking_lot::Mutex<Vec<String>>,
}

impl RestConsoleClient {
    pub fn new(config: ConsoleConfig) -> Result<Self> {
        let base_url = format!("https://{}:{}", config.host, config.port);
        Self::with_base_url(config, base_url)
    }

    /// Creates a client talking to an explicit base URL (scheme, host, port).
    pub fn with_base_url(config: ConsoleConfig, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_ssl)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            config: Arc::new(config),
            session: Mutex::new(None),
            subscriptions: parking_lot::Mutex::new(HashMap::new()),
            removed: parking_lot::Mutex::new(Vec::new()),
        })
    }

    /// Number of resources currently registered for live updates.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    async fn ensure_session(&self) -> Result<String> {
        let mut session = self.session.lock().await;
        if let Some(token) = session.as_ref() {
            return Ok(token.clone());
        }

        info!("Logging on to HMC {}", self.config.host);
        let request = LogonRequest {
            userid: &self.config.userid,
            password: self.config.password.expose_secret(),
        };
        let response = self
            .http
            .post(format!("{}/api/sessions", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body: ApiErrorBody = response.json().await.unwrap_or_default();
            return Err(ExporterError::Auth(format!(
                "HMC logon rejected with HTTP {}: {}",
                status.as_u16(),
                body.message
            )));
        }

        let logon: LogonResponse = response.json().await?;
        *session = Some(logon.api_session.clone());
        info!("Successfully logged on to HMC");
        Ok(logon.api_session)
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let token = self.ensure_session().await?;
        debug!("GET {}", path);

        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header(SESSION_HEADER, token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body: ApiErrorBody = response.json().await.unwrap_or_default();
        let error = ExporterError::ConsoleApi {
            status: body.http_status.unwrap_or(status.as_u16()),
            reason: body.reason,
            message: body.message,
        };

        if error.is_session_expired() {
            warn!("HMC session expired, will log on again on next request");
            *self.session.lock().await = None;
        }

        Err(error)
    }

    async fn get_properties(&self, uri: &str, selected: Option<&[&str]>) -> Result<Properties> {
        let path = match selected {
            Some(names) if !names.is_empty() => format!("{}?properties={}", uri, names.join(",")),
            _ => uri.to_string(),
        };
        match self.get_json(&path).await? {
            Value::Object(map) => Ok(map),
            other => Err(ExporterError::ConsoleApi {
                status: 200,
                reason: 0,
                message: format!("expected a JSON object for {}, got {}", uri, other),
            }),
        }
    }

    /// Lists objects returned under `key` by `GET path`.
    async fn list_objects(&self, path: &str, key: &str) -> Result<Vec<RawResource>> {
        let body = self.get_json(path).await?;
        let entries = body
            .get(key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::Object(props) => RawResource::from_listing(props),
                _ => None,
            })
            .collect())
    }

    /// Lists element objects referenced by the uri-list properties of `parent`.
    async fn list_elements(&self, parent: &str, uri_lists: &[&str]) -> Result<Vec<RawResource>> {
        let parent_props = self.get_properties(parent, Some(uri_lists)).await?;
        let uris: Vec<String> = uri_lists
            .iter()
            .filter_map(|name| parent_props.get(*name).and_then(Value::as_array))
            .flatten()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();

        let mut elements = Vec::with_capacity(uris.len());
        for uri in uris {
            let props = self.get_properties(&uri, None).await?;
            elements.push(RawResource::new(uri, props));
        }
        Ok(elements)
    }

    /// Starts the background task that keeps subscribed resources current.
    ///
    /// Resources dropped by the cache are pruned from the registry on the
    /// next round. Refresh failures are logged and retried on the next tick.
    pub fn spawn_auto_update(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                client.refresh_subscriptions().await;
            }
        })
    }

    /// Runs one refresh round over all live subscriptions.
    pub async fn refresh_subscriptions(&self) {
        let live: Vec<Arc<Resource>> = {
            let mut subscriptions = self.subscriptions.lock();
            subscriptions.retain(|_, weak| weak.strong_count() > 0);
            subscriptions.values().filter_map(Weak::upgrade).collect()
        };

        for resource in live {
            match self.get_properties(resource.uri(), None).await {
                Ok(props) => resource.replace_properties(props),
                Err(e) if e.is_inaccessible() => {
                    info!("Subscribed resource {} is gone: {}", resource.uri(), e);
                    self.subscriptions.lock().remove(resource.uri());
                    self.removed.lock().push(resource.uri().to_string());
                }
                Err(e) => warn!("Failed to refresh {}: {}", resource.uri(), e),
            }
        }
    }
}

fn require_parent(class: ResourceClass, parent: Option<&str>) -> Result<&str> {
    parent.ok_or_else(|| {
        ExporterError::Config(format!("listing {} resources requires a parent URI", class))
    })
}

#[async_trait]
impl ConsoleClient for RestConsoleClient {
    async fn list_resources(
        &self,
        class: ResourceClass,
        parent: Option<&str>,
    ) -> Result<Vec<RawResource>> {
        match class {
            ResourceClass::Cpc => self.list_objects("/api/cpcs", "cpcs").await,
            ResourceClass::Adapter => {
                let cpc = require_parent(class, parent)?;
                self.list_objects(&format!("{}/adapters", cpc), "adapters")
                    .await
            }
            ResourceClass::LogicalPartition => {
                let cpc = require_parent(class, parent)?;
                self.list_objects(
                    &format!("{}/logical-partitions", cpc),
                    "logical-partitions",
                )
                .await
            }
            ResourceClass::Partition => match parent {
                Some(cpc) => {
                    self.list_objects(&format!("{}/partitions", cpc), "partitions")
                        .await
                }
                None => {
                    self.list_objects(
                        "/api/console/operations/list-permitted-partitions",
                        "partitions",
                    )
                    .await
                }
            },
            ResourceClass::VirtualSwitch => {
                let cpc = require_parent(class, parent)?;
                self.list_objects(&format!("{}/virtual-switches", cpc), "virtual-switches")
                    .await
            }
            ResourceClass::StorageGroup => {
                self.list_objects("/api/storage-groups", "storage-groups")
                    .await
            }
            ResourceClass::StorageVolume => {
                let group = require_parent(class, parent)?;
                self.list_objects(&format!("{}/storage-volumes", group), "storage-volumes")
                    .await
            }
            ResourceClass::Nic => {
                let partition = require_parent(class, parent)?;
                self.list_elements(partition, &["nic-uris"]).await
            }
            ResourceClass::Port => {
                let adapter = require_parent(class, parent)?;
                self.list_elements(adapter, &["network-port-uris", "storage-port-uris"])
                    .await
            }
        }
    }

    async fn fetch_properties(&self, uri: &str, selected: Option<&[&str]>) -> Result<Properties> {
        self.get_properties(uri, selected).await
    }

    async fn enable_auto_update(&self, resource: &Arc<Resource>) -> Result<()> {
        self.subscriptions
            .lock()
            .insert(resource.uri().to_string(), Arc::downgrade(resource));
        Ok(())
    }

    async fn disable_auto_update(&self, uri: &str) {
        self.subscriptions.lock().remove(uri);
    }

    fn take_removed(&self) -> Vec<String> {
        std::mem::take(&mut *self.removed.lock())
    }
}
