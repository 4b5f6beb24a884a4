use std::collections::BTreeSet;

use crate::snapshot::Snapshot;
use crate::types::{DonneeTable, Event, Table};

/// `(index, old, new)` for every index whose value differs, in index order.
pub(crate) fn diff_tables(
    previous: &DonneeTable,
    current: &DonneeTable,
) -> Vec<(u32, Option<f64>, Option<f64>)> {
    let keys: BTreeSet<u32> = previous.keys().chain(current.keys()).copied().collect();
    keys.into_iter()
        .filter_map(|index| {
            let old = previous.get(&index).copied();
            let new = current.get(&index).copied();
            (old != new).then_some((index, old, new))
        })
        .collect()
}

pub(crate) fn snapshot_events(previous: &Snapshot, current: &Snapshot) -> Vec<Event> {
    let mut events = Vec::new();

    for table in [Table::Super, Table::Accueil] {
        for (index, _old, value) in diff_tables(previous.table(table), current.table(table)) {
            events.push(Event::DonneeChanged {
                table,
                index,
                value,
            });
        }
    }

    if previous.regulator.mode != current.regulator.mode {
        events.push(Event::RegulatorModeChanged {
            mode: current.regulator.mode,
        });
    }

    if previous.target_temperature() != current.target_temperature() {
        events.push(Event::SetpointChanged {
            setpoint: current.target_temperature(),
        });
    }

    if previous.power_on() != current.power_on() {
        events.push(Event::PowerChanged {
            on: current.power_on(),
        });
    }

    for ((field, old), (_, new)) in previous
        .accueil
        .text_fields()
        .into_iter()
        .zip(current.accueil.text_fields())
    {
        if old != new {
            events.push(Event::AccueilTextChanged {
                field,
                value: new.map(str::to_string),
            });
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldIndexMap;
    use crate::types::RegMode;

    fn snap(super_raw: &str, accueil_raw: &str, reg_raw: &str) -> Snapshot {
        Snapshot::assemble(
            super_raw.into(),
            accueil_raw.into(),
            reg_raw.into(),
            FieldIndexMap::default(),
        )
    }

    #[test]
    fn table_diff_reports_added_removed_changed() {
        let prev = DonneeTable::from([(1, 1.0), (2, 2.0), (3, 3.0)]);
        let curr = DonneeTable::from([(1, 1.0), (2, 2.5), (4, 4.0)]);
        let changes = diff_tables(&prev, &curr);
        assert_eq!(
            changes,
            vec![
                (2, Some(2.0), Some(2.5)),
                (3, Some(3.0), None),
                (4, None, Some(4.0)),
            ]
        );
    }

    #[test]
    fn identical_snapshots_produce_no_events() {
        let a = snap("DONNEE5=26", "<p>Pompe : Marche</p>", "28,CHAUD");
        let b = snap("DONNEE5=26", "<p>Pompe : Marche</p>", "28,CHAUD");
        assert!(snapshot_events(&a, &b).is_empty());
    }

    #[test]
    fn mode_setpoint_and_text_changes() {
        let a = snap("", "<p>Pompe : Marche</p>", "28,CHAUD");
        let b = snap("", "<p>Pompe : Arrêt</p>", "26,FROID");
        let events = snapshot_events(&a, &b);
        assert!(events.contains(&Event::RegulatorModeChanged {
            mode: RegMode::Froid
        }));
        assert!(events.contains(&Event::SetpointChanged {
            setpoint: Some(26.0)
        }));
        assert!(events.contains(&Event::AccueilTextChanged {
            field: "pump",
            value: Some("Arrêt".to_string()),
        }));
    }

    #[test]
    fn power_change_detected() {
        let a = snap("DONNEE24=1", "", "");
        let b = snap("DONNEE24=0", "", "");
        let events = snapshot_events(&a, &b);
        assert!(events.contains(&Event::PowerChanged { on: false }));
        assert!(events.contains(&Event::DonneeChanged {
            table: Table::Super,
            index: 24,
            value: Some(0.0),
        }));
    }
}
