use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use serde_json::json;
use tracing::{debug, trace};

use crate::config::{AuthMode, ConnectionConfig, FieldIndexMap, LoginMethod};
use crate::diff::snapshot_events;
use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::{
    ACCUEIL_PATH, Body, LIGHT_PATH, REG_GET_PATH, REG_SET_PATH, SUPER_PATH, TOGGLE_POWER_PATH,
    light_body, set_mode_form, set_setpoint_form,
};
use crate::snapshot::Snapshot;
use crate::transport::Transport;
use crate::types::*;
use crate::Result;

type EventCallback = Box<dyn Fn(&Event) + Send + Sync>;
type SnapshotCallback = Box<dyn Fn(&Snapshot) + Send + Sync>;

pub struct PoolPilotClientBuilder {
    config: ConnectionConfig,
    indices: FieldIndexMap,
    event_callbacks: Vec<EventCallback>,
    snapshot_callbacks: Vec<SnapshotCallback>,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl PoolPilotClientBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self::from_config(ConnectionConfig::new(host))
    }

    pub fn from_config(config: ConnectionConfig) -> Self {
        Self {
            config,
            indices: FieldIndexMap::default(),
            event_callbacks: Vec::new(),
            snapshot_callbacks: Vec::new(),
            log_mode: None,
            log_path: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn auth(mut self, mode: AuthMode) -> Self {
        self.config.auth = mode;
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self.config.password = Some(password.into());
        self
    }

    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.config.login_path = path.into();
        self
    }

    pub fn login_method(mut self, method: LoginMethod) -> Self {
        self.config.login_method = method;
        self
    }

    pub fn login_fields(mut self, user_field: impl Into<String>, pass_field: impl Into<String>) -> Self {
        self.config.user_field = user_field.into();
        self.config.pass_field = pass_field.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn field_indices(mut self, indices: FieldIndexMap) -> Self {
        self.indices = indices;
        self
    }

    pub fn on_event(mut self, f: impl Fn(&Event) + Send + Sync + 'static) -> Self {
        self.event_callbacks.push(Box::new(f));
        self
    }

    pub fn on_snapshot(mut self, f: impl Fn(&Snapshot) + Send + Sync + 'static) -> Self {
        self.snapshot_callbacks.push(Box::new(f));
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<PoolPilotClient> {
        let transport = Transport::new(&self.config)?;

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(Mutex::new(MessageLogger::new(mode, &path)?)),
            _ => None,
        };

        Ok(PoolPilotClient {
            transport,
            host: self.config.host,
            port: self.config.port,
            indices: RwLock::new(Arc::new(self.indices)),
            latest: RwLock::new(None),
            event_callbacks: self.event_callbacks,
            snapshot_callbacks: self.snapshot_callbacks,
            logger,
        })
    }
}

/// Client for one PoolPilot controller.
///
/// All methods take `&self`; share it behind an `Arc`. Refreshes are expected
/// not to overlap, writes may run alongside them.
pub struct PoolPilotClient {
    transport: Transport,
    host: String,
    port: u16,
    indices: RwLock<Arc<FieldIndexMap>>,
    latest: RwLock<Option<Arc<Snapshot>>>,
    event_callbacks: Vec<EventCallback>,
    snapshot_callbacks: Vec<SnapshotCallback>,
    logger: Option<Mutex<MessageLogger>>,
}

impl PoolPilotClient {
    pub fn builder(host: impl Into<String>) -> PoolPilotClientBuilder {
        PoolPilotClientBuilder::new(host)
    }

    pub fn from_config(config: ConnectionConfig) -> PoolPilotClientBuilder {
        PoolPilotClientBuilder::from_config(config)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Last successfully assembled snapshot.
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn field_indices(&self) -> Arc<FieldIndexMap> {
        self.indices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the index map. Takes effect from the next refresh.
    pub fn set_field_indices(&self, indices: FieldIndexMap) {
        *self.indices.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(indices);
    }

    // -- Reads --

    pub async fn read_super(&self) -> Result<String> {
        self.transport.get(SUPER_PATH, &[]).await
    }

    pub async fn read_accueil(&self) -> Result<String> {
        self.transport.get(ACCUEIL_PATH, &[]).await
    }

    pub async fn read_reg(&self) -> Result<String> {
        self.transport.get(REG_GET_PATH, &[]).await
    }

    /// Liveness probe. Never fails; any error reads as `false`.
    pub async fn check_connection(&self) -> bool {
        match self.read_super().await {
            Ok(_) => true,
            Err(e) => {
                debug!(host = %self.host, error = %e, "connection check failed");
                false
            }
        }
    }

    /// Poll all three endpoints and publish a new snapshot.
    ///
    /// On any read failure nothing is published and the previous snapshot
    /// stays current.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>> {
        let super_raw = self.read_super().await?;
        let accueil_raw = self.read_accueil().await?;
        let reg_raw = self.read_reg().await?;
        debug!(host = %self.host, %super_raw, %accueil_raw, %reg_raw, "raw responses");

        let indices = FieldIndexMap::clone(&self.field_indices());
        let snapshot = Arc::new(Snapshot::assemble(super_raw, accueil_raw, reg_raw, indices));

        let previous = self
            .latest
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(snapshot.clone());

        let events = match previous.as_deref() {
            Some(prev) => snapshot_events(prev, &snapshot),
            None => snapshot_events(&Snapshot::empty(snapshot.indices.clone()), &snapshot),
        };
        for event in &events {
            for cb in &self.event_callbacks {
                cb(event);
            }
        }
        for cb in &self.snapshot_callbacks {
            cb(&snapshot);
        }
        if !events.is_empty() {
            debug!(count = events.len(), "processed events from poll");
        }

        if let Some(logger) = &self.logger {
            logger
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .log_poll(&snapshot);
        }

        Ok(snapshot)
    }

    // -- Command methods --

    /// Set the regulation mode.
    pub async fn set_mode(&self, mode: RegMode) -> Result<()> {
        self.log_command("set_mode", json!({ "mode": mode.as_device_str() }));
        self.transport
            .post(REG_SET_PATH, Body::Form(set_mode_form(mode)))
            .await?;
        Ok(())
    }

    /// Set the target water temperature (rounded to one decimal).
    pub async fn set_setpoint(&self, temp: f64) -> Result<()> {
        self.log_command("set_setpoint", json!({ "temperature": temp }));
        self.transport
            .post(REG_SET_PATH, Body::Form(set_setpoint_form(temp)))
            .await?;
        Ok(())
    }

    /// Flip the power state. The resulting state is only known after a refresh.
    pub async fn toggle_power(&self) -> Result<()> {
        self.log_command("toggle_power", json!(null));
        self.transport.get(TOGGLE_POWER_PATH, &[]).await?;
        Ok(())
    }

    pub async fn set_light(&self, on: bool) -> Result<()> {
        self.log_command("set_light", json!({ "on": on }));
        self.transport
            .post(LIGHT_PATH, Body::Raw(light_body(on).to_string()))
            .await?;
        Ok(())
    }

    /// Toggle power only if the latest snapshot disagrees with `on`. Polls
    /// first when nothing has been polled yet.
    pub async fn set_power(&self, on: bool) -> Result<()> {
        let snapshot = match self.latest() {
            Some(s) => s,
            None => self.refresh().await?,
        };
        if snapshot.power_on() == on {
            trace!(on, "power already in requested state");
            return Ok(());
        }
        self.toggle_power().await
    }

    pub async fn set_hvac_mode(&self, mode: HvacMode) -> Result<()> {
        match mode.reg_mode() {
            None => self.set_power(false).await,
            Some(reg_mode) => {
                self.set_power(true).await?;
                self.set_mode(reg_mode).await
            }
        }
    }

    // -- Helpers --

    fn log_command(&self, action: &str, body: serde_json::Value) {
        if let Some(logger) = &self.logger {
            logger
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .log_command(action, &body);
        }
    }
}
