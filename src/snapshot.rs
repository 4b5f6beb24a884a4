use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{FieldIndexMap, IndexKey};
use crate::parse::{parse_accueil, parse_donnees, parse_reg};
use crate::types::{AccueilFields, DonneeTable, HvacMode, RegulatorState, Table};

/// Accueil-derived value used when the configured index yields nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    WaterIn,
    AirTemp,
    Voltage,
    InternalTemp,
}

/// One readable value: a DONNEE index looked up in a table, with an optional
/// textual fallback from the accueil page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub index: IndexKey,
    pub table: Table,
    pub fallback: Option<Fallback>,
}

impl Field {
    pub const WATER_IN: Field = Field::super_table(IndexKey::WaterIn, Some(Fallback::WaterIn));
    pub const WATER_OUT: Field = Field::super_table(IndexKey::WaterOut, None);
    pub const AIR: Field = Field::super_table(IndexKey::Air, Some(Fallback::AirTemp));
    pub const VOLTAGE: Field = Field::super_table(IndexKey::Voltage, Some(Fallback::Voltage));
    pub const INTERNAL: Field =
        Field::super_table(IndexKey::Internal, Some(Fallback::InternalTemp));
    pub const PUMP: Field = Field::super_table(IndexKey::Pump, None);
    pub const HEATING: Field = Field::super_table(IndexKey::Heating, None);
    pub const POWER: Field = Field::super_table(IndexKey::Power, None);
    pub const LIGHT: Field = Field {
        index: IndexKey::Light,
        table: Table::Accueil,
        fallback: None,
    };

    const fn super_table(index: IndexKey, fallback: Option<Fallback>) -> Field {
        Field {
            index,
            table: Table::Super,
            fallback,
        }
    }
}

/// State of the controller at one poll. Never modified once published.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub super_raw: String,
    pub accueil_raw: String,
    pub reg_raw: String,
    pub super_table: DonneeTable,
    pub accueil_table: DonneeTable,
    pub regulator: RegulatorState,
    pub accueil: AccueilFields,
    pub water_in: Option<f64>,
    pub setpoint: Option<f64>,
    pub indices: FieldIndexMap,
}

impl Snapshot {
    /// Parse the three raw responses of one cycle into a snapshot.
    pub fn assemble(
        super_raw: String,
        accueil_raw: String,
        reg_raw: String,
        indices: FieldIndexMap,
    ) -> Self {
        let super_table = parse_donnees(&super_raw);
        let accueil_table = parse_donnees(&accueil_raw);
        let regulator = parse_reg(&reg_raw);
        let accueil = parse_accueil(&accueil_raw);

        Self {
            taken_at: Utc::now(),
            water_in: accueil.water_in,
            setpoint: accueil.setpoint,
            super_raw,
            accueil_raw,
            reg_raw,
            super_table,
            accueil_table,
            regulator,
            accueil,
            indices,
        }
    }

    pub fn table(&self, table: Table) -> &DonneeTable {
        match table {
            Table::Super => &self.super_table,
            Table::Accueil => &self.accueil_table,
        }
    }

    /// Raw DONNEE value for a logical key, without fallback.
    pub fn donnee(&self, table: Table, key: IndexKey) -> Option<f64> {
        let index = self.indices.get(key)?;
        self.table(table).get(&index).copied()
    }

    pub fn value(&self, field: Field) -> Option<f64> {
        self.donnee(field.table, field.index)
            .or_else(|| field.fallback.and_then(|f| self.fallback(f)))
    }

    fn fallback(&self, fallback: Fallback) -> Option<f64> {
        match fallback {
            Fallback::WaterIn => self.water_in,
            Fallback::AirTemp => self.accueil.air_temp,
            Fallback::Voltage => self.accueil.voltage,
            Fallback::InternalTemp => self.accueil.internal_temp,
        }
    }

    /// Positive value means on. Unknown counts as off.
    pub fn is_active(&self, field: Field) -> bool {
        self.value(field).is_some_and(|v| v > 0.0)
    }

    /// Without a usable power index the unit is assumed on.
    pub fn power_on(&self) -> bool {
        self.value(Field::POWER).is_none_or(|v| v > 0.0)
    }

    pub fn light_on(&self) -> bool {
        self.value(Field::LIGHT) == Some(1.0)
    }

    pub fn pump_running(&self) -> bool {
        self.is_active(Field::PUMP)
    }

    pub fn heating(&self) -> bool {
        self.is_active(Field::HEATING)
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.value(Field::WATER_IN)
    }

    pub fn target_temperature(&self) -> Option<f64> {
        self.regulator.setpoint.or(self.setpoint)
    }

    pub fn hvac_mode(&self) -> HvacMode {
        if !self.power_on() {
            return HvacMode::Off;
        }
        self.regulator.mode.into()
    }

    /// Snapshot with nothing in it, used as the baseline for the first diff.
    pub(crate) fn empty(indices: FieldIndexMap) -> Self {
        Self {
            taken_at: Utc::now(),
            super_raw: String::new(),
            accueil_raw: String::new(),
            reg_raw: String::new(),
            super_table: DonneeTable::new(),
            accueil_table: DonneeTable::new(),
            regulator: RegulatorState::default(),
            accueil: AccueilFields::default(),
            water_in: None,
            setpoint: None,
            indices,
        }
    }
}
