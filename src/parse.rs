use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::types::{AccueilFields, DonneeTable, RegMode, RegulatorState};

static DONNEE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"DONNEE([0-9]+)=([0-9.]+)").expect("valid DONNEE regex"));

static WATER_BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Chaud\s+([0-9.,]+)°C.*?\(([0-9.,]+)°C\)").expect("valid banner regex")
});

#[derive(Debug, Clone, Copy)]
enum Label {
    Mode,
    RegMode,
    Pump,
    Heat,
    NextAction,
    GeneralState,
    DeltaSetpoint,
    AirTemp,
    Voltage,
    InternalTemp,
    Clock,
}

impl Label {
    fn is_numeric(&self) -> bool {
        matches!(
            self,
            Label::DeltaSetpoint | Label::AirTemp | Label::Voltage | Label::InternalTemp
        )
    }
}

const LABELS: &[(Label, &str)] = &[
    (Label::Mode, "Mode"),
    (Label::RegMode, "Mode de régulation"),
    (Label::Pump, "Pompe"),
    (Label::Heat, "Chauffage"),
    (Label::NextAction, "Prochaine action"),
    (Label::GeneralState, "État général"),
    (Label::DeltaSetpoint, "Écart consigne"),
    (Label::AirTemp, "Température air"),
    (Label::Voltage, "Tension"),
    (Label::InternalTemp, "Température interne"),
    (Label::Clock, "Horloge"),
];

static LABEL_PATTERNS: LazyLock<Vec<(Label, Regex)>> = LazyLock::new(|| {
    LABELS
        .iter()
        .map(|(label, text)| {
            let value = if label.is_numeric() { "([0-9.,]+)" } else { "([^<]+)" };
            let pattern = format!(r"(?i){}\s*:\s*{value}", regex::escape(text));
            (*label, Regex::new(&pattern).expect("valid label regex"))
        })
        .collect()
});

/// Extract `DONNEE<n>=<value>` tokens. Everything else is ignored.
pub fn parse_donnees(raw: &str) -> DonneeTable {
    let mut out = DonneeTable::new();
    for caps in DONNEE.captures_iter(raw) {
        match (caps[1].parse::<u32>(), caps[2].parse::<f64>()) {
            (Ok(index), Ok(value)) => {
                out.insert(index, value);
            }
            _ => debug!(token = &caps[0], "skipping unparsable DONNEE entry"),
        }
    }
    if out.is_empty() {
        debug!(raw, "no DONNEE entries parsed");
    }
    out
}

/// Parse the regulator line: `<setpoint>,<...>,<regulation>,<next action>,<status>`.
///
/// Only the setpoint position and the mode keyword are reliable; the later
/// positions are captured when present.
pub fn parse_reg(raw: &str) -> RegulatorState {
    let line = raw.lines().next().unwrap_or("");
    let tokens: Vec<&str> = line.split(',').map(str::trim).collect();

    let setpoint = tokens
        .first()
        .and_then(|t| t.parse::<f64>().ok())
        .filter(|v| v.is_finite());
    if setpoint.is_none() {
        debug!(raw, "failed to parse setpoint from reg");
    }

    let upper = line.to_uppercase();
    let mode = if upper.contains("CHAUD") {
        RegMode::Chaud
    } else if upper.contains("FROID") {
        RegMode::Froid
    } else {
        debug!(raw, "no mode keyword in reg, assuming AUTO");
        RegMode::Auto
    };

    let token = |i: usize| {
        tokens
            .get(i)
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
    };

    RegulatorState {
        setpoint,
        mode,
        regulation: token(2),
        next_action: token(3),
        status: token(4),
        raw: raw.to_string(),
    }
}

/// Scrape the accueil status page. Labels that do not match are left empty.
pub fn parse_accueil(raw: &str) -> AccueilFields {
    let text = html_escape::decode_html_entities(raw);
    let mut out = AccueilFields::default();

    for (label, re) in LABEL_PATTERNS.iter() {
        let Some(caps) = re.captures(&text) else {
            continue;
        };
        let value = caps[1].trim();
        if label.is_numeric() {
            let Some(number) = parse_decimal(value) else {
                debug!(?label, value, "unparsable number in accueil");
                continue;
            };
            match label {
                Label::DeltaSetpoint => out.delta_setpoint = Some(number),
                Label::AirTemp => out.air_temp = Some(number),
                Label::Voltage => out.voltage = Some(number),
                Label::InternalTemp => out.internal_temp = Some(number),
                _ => {}
            }
        } else {
            if value.is_empty() {
                continue;
            }
            let value = Some(value.to_string());
            match label {
                Label::Mode => out.mode = value,
                Label::RegMode => out.reg_mode = value,
                Label::Pump => out.pump = value,
                Label::Heat => out.heat = value,
                Label::NextAction => out.next_action = value,
                Label::GeneralState => out.general_state = value,
                Label::Clock => out.clock = value,
                _ => {}
            }
        }
    }

    if let Some(caps) = WATER_BANNER.captures(&text) {
        match (parse_decimal(&caps[1]), parse_decimal(&caps[2])) {
            (Some(water_in), Some(setpoint)) => {
                out.water_in = Some(water_in);
                out.setpoint = Some(setpoint);
            }
            _ => debug!(banner = &caps[0], "unparsable water temperatures in accueil"),
        }
    }

    if out.is_empty() {
        debug!(raw, "failed to parse accueil page");
    }
    out
}

/// Decimal with either `,` or `.` as separator.
fn parse_decimal(s: &str) -> Option<f64> {
    s.replace(',', ".").parse().ok()
}
