use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_LOGIN_PATH: &str = "/login.cgi";

/// Suggested poll interval for host schedulers. The crate never schedules
/// anything itself.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    None,
    /// HTTP Basic credentials on every request.
    Basic,
    /// Credentials sent as query parameters and POST form fields.
    Query,
    /// Session cookie obtained from the login endpoint.
    Cookie,
}

impl FromStr for AuthMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(AuthMode::None),
            "basic" => Ok(AuthMode::Basic),
            "query" => Ok(AuthMode::Query),
            "cookie" => Ok(AuthMode::Cookie),
            other => Err(Error::InvalidConfig(format!("unknown auth mode: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum LoginMethod {
    Get,
    #[default]
    Post,
}

impl FromStr for LoginMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("get") {
            Ok(LoginMethod::Get)
        } else if s.eq_ignore_ascii_case("post") {
            Ok(LoginMethod::Post)
        } else {
            Err(Error::InvalidConfig(format!("unsupported login method: {s}")))
        }
    }
}

impl TryFrom<String> for LoginMethod {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<LoginMethod> for String {
    fn from(m: LoginMethod) -> Self {
        m.to_string()
    }
}

impl fmt::Display for LoginMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginMethod::Get => f.write_str("GET"),
            LoginMethod::Post => f.write_str("POST"),
        }
    }
}

/// Everything needed to reach one physical controller.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default, rename = "auth_mode")]
    pub auth: AuthMode,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default)]
    pub login_method: LoginMethod,
    #[serde(default = "default_user_field")]
    pub user_field: String,
    #[serde(default = "default_pass_field")]
    pub pass_field: String,
    #[serde(
        default = "default_timeout",
        rename = "timeout_secs",
        deserialize_with = "duration_from_secs"
    )]
    pub timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            auth: AuthMode::None,
            username: None,
            password: None,
            login_path: default_login_path(),
            login_method: LoginMethod::Post,
            user_field: default_user_field(),
            pass_field: default_pass_field(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

fn default_user_field() -> String {
    "user".to_string()
}

fn default_pass_field() -> String {
    "pass".to_string()
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn duration_from_secs<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Duration, D::Error> {
    u64::deserialize(d).map(Duration::from_secs)
}

/// Logical sensor names whose DONNEE position depends on firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKey {
    WaterIn,
    WaterOut,
    Air,
    Voltage,
    Internal,
    Pump,
    Heating,
    Light,
    Power,
}

impl IndexKey {
    pub const ALL: [IndexKey; 9] = [
        IndexKey::WaterIn,
        IndexKey::WaterOut,
        IndexKey::Air,
        IndexKey::Voltage,
        IndexKey::Internal,
        IndexKey::Pump,
        IndexKey::Heating,
        IndexKey::Light,
        IndexKey::Power,
    ];

    pub fn option_name(&self) -> &'static str {
        match self {
            IndexKey::WaterIn => "water_in_idx",
            IndexKey::WaterOut => "water_out_idx",
            IndexKey::Air => "air_idx",
            IndexKey::Voltage => "voltage_idx",
            IndexKey::Internal => "internal_idx",
            IndexKey::Pump => "pump_idx",
            IndexKey::Heating => "heating_idx",
            IndexKey::Light => "light_idx",
            IndexKey::Power => "power_idx",
        }
    }
}

/// Maps logical sensors to DONNEE indices. `None` disables the sensor.
///
/// Keys missing from deserialized input keep their default; an explicit
/// `null` disables that entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FieldIndexMap {
    pub water_in_idx: Option<u32>,
    pub water_out_idx: Option<u32>,
    pub air_idx: Option<u32>,
    pub voltage_idx: Option<u32>,
    pub internal_idx: Option<u32>,
    pub pump_idx: Option<u32>,
    pub heating_idx: Option<u32>,
    /// Usually found in the accueil table rather than super.
    pub light_idx: Option<u32>,
    pub power_idx: Option<u32>,
}

impl Default for FieldIndexMap {
    fn default() -> Self {
        Self {
            water_in_idx: Some(5),
            water_out_idx: Some(6),
            air_idx: Some(7),
            voltage_idx: Some(8),
            internal_idx: Some(9),
            pump_idx: Some(10),
            heating_idx: Some(11),
            light_idx: Some(16),
            power_idx: Some(24),
        }
    }
}

impl FieldIndexMap {
    /// A map with every entry disabled.
    pub fn empty() -> Self {
        Self {
            water_in_idx: None,
            water_out_idx: None,
            air_idx: None,
            voltage_idx: None,
            internal_idx: None,
            pump_idx: None,
            heating_idx: None,
            light_idx: None,
            power_idx: None,
        }
    }

    pub fn get(&self, key: IndexKey) -> Option<u32> {
        match key {
            IndexKey::WaterIn => self.water_in_idx,
            IndexKey::WaterOut => self.water_out_idx,
            IndexKey::Air => self.air_idx,
            IndexKey::Voltage => self.voltage_idx,
            IndexKey::Internal => self.internal_idx,
            IndexKey::Pump => self.pump_idx,
            IndexKey::Heating => self.heating_idx,
            IndexKey::Light => self.light_idx,
            IndexKey::Power => self.power_idx,
        }
    }

    pub fn with(mut self, key: IndexKey, index: Option<u32>) -> Self {
        let slot = match key {
            IndexKey::WaterIn => &mut self.water_in_idx,
            IndexKey::WaterOut => &mut self.water_out_idx,
            IndexKey::Air => &mut self.air_idx,
            IndexKey::Voltage => &mut self.voltage_idx,
            IndexKey::Internal => &mut self.internal_idx,
            IndexKey::Pump => &mut self.pump_idx,
            IndexKey::Heating => &mut self.heating_idx,
            IndexKey::Light => &mut self.light_idx,
            IndexKey::Power => &mut self.power_idx,
        };
        *slot = index;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_config_defaults() {
        let cfg: ConnectionConfig = serde_json::from_str(r#"{"host": "192.168.1.50"}"#).unwrap();
        assert_eq!(cfg.port, 80);
        assert_eq!(cfg.auth, AuthMode::None);
        assert_eq!(cfg.login_path, "/login.cgi");
        assert_eq!(cfg.login_method, LoginMethod::Post);
        assert_eq!(cfg.user_field, "user");
        assert_eq!(cfg.pass_field, "pass");
        assert_eq!(cfg.timeout, Duration::from_secs(10));
        assert_eq!(cfg.base_url(), "http://192.168.1.50:80");
    }

    #[test]
    fn connection_config_full() {
        let cfg: ConnectionConfig = serde_json::from_str(
            r#"{
                "host": "pac.local",
                "port": 8080,
                "auth_mode": "cookie",
                "username": "admin",
                "password": "secret",
                "login_path": "/auth.cgi",
                "login_method": "get",
                "user_field": "login",
                "pass_field": "pwd",
                "timeout_secs": 3
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.auth, AuthMode::Cookie);
        assert_eq!(cfg.login_method, LoginMethod::Get);
        assert_eq!(cfg.username.as_deref(), Some("admin"));
        assert_eq!(cfg.user_field, "login");
        assert_eq!(cfg.timeout, Duration::from_secs(3));
    }

    #[test]
    fn unknown_login_method_rejected() {
        let res: std::result::Result<ConnectionConfig, _> =
            serde_json::from_str(r#"{"host": "h", "login_method": "PUT"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn auth_mode_from_str() {
        assert_eq!("Basic".parse::<AuthMode>().unwrap(), AuthMode::Basic);
        assert!("digest".parse::<AuthMode>().is_err());
    }

    #[test]
    fn field_index_defaults_match_common_firmware() {
        let map = FieldIndexMap::default();
        assert_eq!(map.get(IndexKey::WaterIn), Some(5));
        assert_eq!(map.get(IndexKey::Light), Some(16));
        assert_eq!(map.get(IndexKey::Power), Some(24));
    }

    #[test]
    fn field_index_missing_keeps_default_null_disables() {
        let map: FieldIndexMap =
            serde_json::from_str(r#"{"water_in_idx": 12, "pump_idx": null}"#).unwrap();
        assert_eq!(map.water_in_idx, Some(12));
        assert_eq!(map.pump_idx, None);
        assert_eq!(map.air_idx, Some(7));
    }

    #[test]
    fn field_index_with_replaces_single_entry() {
        let map = FieldIndexMap::empty().with(IndexKey::Heating, Some(3));
        assert_eq!(map.get(IndexKey::Heating), Some(3));
        for key in IndexKey::ALL {
            if key != IndexKey::Heating {
                assert_eq!(map.get(key), None, "{}", key.option_name());
            }
        }
    }
}
