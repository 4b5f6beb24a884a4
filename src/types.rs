use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// DONNEE index to value. Indices the device did not report are absent.
pub type DonneeTable = BTreeMap<u32, f64>;

/// Regulation mode as the controller names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RegMode {
    Chaud,
    Froid,
    #[default]
    Auto,
}

impl RegMode {
    pub fn as_device_str(&self) -> &'static str {
        match self {
            RegMode::Chaud => "CHAUD",
            RegMode::Froid => "FROID",
            RegMode::Auto => "AUTO",
        }
    }

    pub fn from_device_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CHAUD" => Some(RegMode::Chaud),
            "FROID" => Some(RegMode::Froid),
            "AUTO" => Some(RegMode::Auto),
            _ => None,
        }
    }
}

impl fmt::Display for RegMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_device_str())
    }
}

/// Climate-style view combining power state and regulation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HvacMode {
    Off,
    Heat,
    Cool,
    Auto,
}

impl HvacMode {
    /// Regulation mode to request for this HVAC mode. `Off` has none.
    pub fn reg_mode(&self) -> Option<RegMode> {
        match self {
            HvacMode::Off => None,
            HvacMode::Heat => Some(RegMode::Chaud),
            HvacMode::Cool => Some(RegMode::Froid),
            HvacMode::Auto => Some(RegMode::Auto),
        }
    }
}

impl From<RegMode> for HvacMode {
    fn from(mode: RegMode) -> Self {
        match mode {
            RegMode::Chaud => HvacMode::Heat,
            RegMode::Froid => HvacMode::Cool,
            RegMode::Auto => HvacMode::Auto,
        }
    }
}

/// Parsed `getReg.cgi` line.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegulatorState {
    pub setpoint: Option<f64>,
    pub mode: RegMode,
    pub regulation: Option<String>,
    pub next_action: Option<String>,
    pub status: Option<String>,
    pub raw: String,
}

/// Fields scraped from the accueil status page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccueilFields {
    pub mode: Option<String>,
    pub reg_mode: Option<String>,
    pub pump: Option<String>,
    pub heat: Option<String>,
    pub next_action: Option<String>,
    pub general_state: Option<String>,
    pub delta_setpoint: Option<f64>,
    pub air_temp: Option<f64>,
    pub voltage: Option<f64>,
    pub internal_temp: Option<f64>,
    pub clock: Option<String>,
    /// From the "Chaud X°C (Y°C)" banner.
    pub water_in: Option<f64>,
    pub setpoint: Option<f64>,
}

impl AccueilFields {
    pub fn is_empty(&self) -> bool {
        *self == AccueilFields::default()
    }

    pub fn text_fields(&self) -> [(&'static str, Option<&str>); 7] {
        [
            ("mode", self.mode.as_deref()),
            ("reg_mode", self.reg_mode.as_deref()),
            ("pump", self.pump.as_deref()),
            ("heat", self.heat.as_deref()),
            ("next_action", self.next_action.as_deref()),
            ("general_state", self.general_state.as_deref()),
            ("clock", self.clock.as_deref()),
        ]
    }
}

/// Which DONNEE table a value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Super,
    Accueil,
}

/// Change notifications computed between consecutive snapshots.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    DonneeChanged { table: Table, index: u32, value: Option<f64> },
    RegulatorModeChanged { mode: RegMode },
    SetpointChanged { setpoint: Option<f64> },
    PowerChanged { on: bool },
    AccueilTextChanged { field: &'static str, value: Option<String> },
}
