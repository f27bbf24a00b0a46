//! Отбор кандидатов для привязки счётчик ↔ квартира ↔ абонент.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{FlatResponse, Meter, MeterStatus};

/// Счётчик доступен для привязки, если он активен и не привязан ни к одной
/// квартире. При редактировании квартиры её собственный счётчик остаётся в
/// списке (`keep`), иначе форма потеряла бы текущее значение.
pub fn assignable_meters(meters: &[Meter], keep: Option<Uuid>) -> Vec<Meter> {
    meters
        .iter()
        .filter(|m| {
            (m.flat_id.is_none() && m.status == MeterStatus::Active) || Some(m.id) == keep
        })
        .cloned()
        .collect()
}

/// Квартира свободна, если к ней не привязан абонент. При редактировании
/// абонента его текущая квартира не считается занятой.
pub fn vacant_flats(flats: &[FlatResponse], keep_flat: Option<Uuid>) -> Vec<FlatResponse> {
    flats
        .iter()
        .filter(|f| f.customer_id.is_none() || Some(f.id) == keep_flat)
        .cloned()
        .collect()
}

/// Серийный номер занят, если им владеет другой счётчик. При редактировании
/// сам счётчик (`keep`) не конфликтует со своим номером.
pub fn serial_taken(existing: Option<&Meter>, keep: Option<Uuid>) -> bool {
    existing.map_or(false, |m| Some(m.id) != keep)
}

/// Предзаполнение поля "предыдущее показание" при выборе квартиры: берётся
/// показание счётчика квартиры, при его отсутствии поле сбрасывается, а не
/// оставляет значение от прошлого выбора.
pub fn propagated_previous_reading(meter: Option<&Meter>) -> Option<Decimal> {
    meter.and_then(|m| m.previous_reading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn meter(status: MeterStatus, flat_id: Option<Uuid>) -> Meter {
        Meter {
            id: Uuid::new_v4(),
            serial_no: format!("GMS-{}", Uuid::new_v4().simple()),
            status,
            total_units: Decimal::ZERO,
            previous_reading: None,
            flat_id,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn flat(customer_id: Option<Uuid>) -> FlatResponse {
        FlatResponse {
            id: Uuid::new_v4(),
            floor_id: Uuid::new_v4(),
            flat_no: "101".to_string(),
            meter_id: None,
            customer_id,
        }
    }

    #[test]
    fn only_active_unassigned_meters_are_assignable() {
        let meters = vec![
            meter(MeterStatus::Active, None),
            meter(MeterStatus::Inactive, None),
            meter(MeterStatus::Maintenance, None),
            meter(MeterStatus::Active, Some(Uuid::new_v4())),
        ];

        let available = assignable_meters(&meters, None);
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, meters[0].id);
    }

    #[test]
    fn current_meter_stays_in_list_when_editing_flat() {
        let flat_id = Uuid::new_v4();
        let assigned = meter(MeterStatus::Active, Some(flat_id));
        let keep = assigned.id;
        let meters = vec![assigned, meter(MeterStatus::Active, None)];

        let available = assignable_meters(&meters, Some(keep));
        assert_eq!(available.len(), 2);
        assert!(available.iter().any(|m| m.id == keep));
    }

    #[test]
    fn occupied_flats_are_filtered_out() {
        let flats = vec![flat(None), flat(Some(Uuid::new_v4()))];
        let available = vacant_flats(&flats, None);
        assert_eq!(available.len(), 1);
        assert!(available[0].customer_id.is_none());
    }

    #[test]
    fn customers_own_flat_is_not_a_conflict() {
        let occupied = flat(Some(Uuid::new_v4()));
        let keep = occupied.id;
        let flats = vec![occupied, flat(None)];

        let available = vacant_flats(&flats, Some(keep));
        assert_eq!(available.len(), 2);
    }

    #[test]
    fn duplicate_serial_conflicts_except_with_itself() {
        let owner = meter(MeterStatus::Active, None);

        assert!(serial_taken(Some(&owner), None));
        assert!(serial_taken(Some(&owner), Some(Uuid::new_v4())));
        // переименование счётчика в его же номер конфликтом не считается
        assert!(!serial_taken(Some(&owner), Some(owner.id)));
        assert!(!serial_taken(None, Some(owner.id)));
    }

    #[test]
    fn previous_reading_propagates_or_resets() {
        let mut with_reading = meter(MeterStatus::Active, None);
        with_reading.previous_reading = Some(Decimal::new(120, 0));
        let without_reading = meter(MeterStatus::Active, None);

        assert_eq!(
            propagated_previous_reading(Some(&with_reading)),
            Some(Decimal::new(120, 0))
        );
        assert_eq!(propagated_previous_reading(Some(&without_reading)), None);
        assert_eq!(propagated_previous_reading(None), None);
    }
}
