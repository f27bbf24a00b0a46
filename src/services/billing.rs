//! Расчёт потребления и суммы счёта.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::models::{CostConfiguration, InvoiceStatus};

/// Разбор показания из строки. Нечисловое значение — None, никогда не NaN.
pub fn parse_reading(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

/// Показания приходят из форм как число или строка; приводим к Decimal.
pub fn coerce_reading(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        serde_json::Value::String(s) => parse_reading(s),
        _ => None,
    }
}

/// units_consumed = |current − previous|
pub fn units_consumed(previous: Decimal, current: Decimal) -> Decimal {
    (current - previous).abs()
}

/// То же поверх сырых значений; недоступно, если любое из них нечисловое.
pub fn units_consumed_raw(
    previous: &serde_json::Value,
    current: &serde_json::Value,
) -> Option<Decimal> {
    Some(units_consumed(coerce_reading(previous)?, coerce_reading(current)?))
}

/// Отображение потребления: "25.000 units" либо "N/A".
pub fn format_units(units: Option<Decimal>) -> String {
    match units {
        Some(u) => format!("{:.3} units", u),
        None => "N/A".to_string(),
    }
}

/// Денежные поля показываются с двумя знаками после запятой.
pub fn format_currency(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

/// Составляющие суммы счёта. Каждое поле редактируется независимо.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillComponents {
    pub gas_unit_rate: Decimal,
    pub unit_consumed: Decimal,
    pub amc_cost: Decimal,
    pub utility_tax: Decimal,
    pub app_charges: Decimal,
    pub penalty_amount: Decimal,
    pub overdue_penalty: Decimal,
}

impl BillComponents {
    /// Составляющие из тарифной карты проекта.
    pub fn from_rate_card(
        cost: &CostConfiguration,
        unit_consumed: Decimal,
        overdue_penalty: Decimal,
    ) -> Self {
        Self {
            gas_unit_rate: cost.gas_unit_rate,
            unit_consumed,
            amc_cost: cost.amc_cost,
            utility_tax: cost.utility_tax,
            app_charges: cost.app_charges,
            penalty_amount: cost.penalty_amount,
            overdue_penalty,
        }
    }
}

/// bill_amount = gas_unit_rate × unit_consumed + amc_cost + utility_tax
///             + app_charges + penalty_amount + overdue_penalty
pub fn bill_amount(c: &BillComponents) -> Decimal {
    c.gas_unit_rate * c.unit_consumed
        + c.amc_cost
        + c.utility_tax
        + c.app_charges
        + c.penalty_amount
        + c.overdue_penalty
}

/// Срок оплаты: ближайшее наступление дня месяца `due_day`, начиная с `from`
/// включительно. В тарифной карте хранится день месяца, а не сдвиг в днях.
pub fn next_due_date(from: NaiveDate, due_day: u32) -> NaiveDate {
    let candidate = date_with_day(from.year(), from.month(), due_day);
    if candidate >= from {
        candidate
    } else if from.month() == 12 {
        date_with_day(from.year() + 1, 1, due_day)
    } else {
        date_with_day(from.year(), from.month() + 1, due_day)
    }
}

// День зажимается по длине месяца: 31 в апреле даёт 30-е, в феврале 28/29-е.
fn date_with_day(year: i32, month: u32, day: u32) -> NaiveDate {
    (1..=day.clamp(1, 31))
        .rev()
        .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
        .unwrap_or_default()
}

/// Статус счёта после успешного платежа. Выводится только здесь: при правке
/// счёта статус остаётся полностью на усмотрение администратора.
pub fn derive_invoice_status(
    bill_amount: Decimal,
    paid_total: Decimal,
    current: InvoiceStatus,
) -> InvoiceStatus {
    if paid_total <= Decimal::ZERO {
        return current;
    }
    if paid_total >= bill_amount {
        InvoiceStatus::Paid
    } else {
        InvoiceStatus::PartiallyPaid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn units_consumed_is_absolute_difference() {
        assert_eq!(units_consumed(d("120"), d("95")), d("25"));
        assert_eq!(units_consumed(d("95"), d("120")), d("25"));
        assert_eq!(units_consumed(d("100"), d("100")), d("0"));
    }

    #[test]
    fn non_numeric_reading_is_unavailable_not_nan() {
        assert_eq!(units_consumed_raw(&json!("abc"), &json!(95)), None);
        assert_eq!(units_consumed_raw(&json!("120"), &json!(null)), None);
        assert_eq!(format_units(None), "N/A");
    }

    #[test]
    fn readings_coerce_from_string_and_number() {
        assert_eq!(coerce_reading(&json!("120")), Some(d("120")));
        assert_eq!(coerce_reading(&json!(" 120.5 ")), Some(d("120.5")));
        assert_eq!(coerce_reading(&json!(95)), Some(d("95")));
        assert_eq!(coerce_reading(&json!(true)), None);
    }

    #[test]
    fn reading_update_scenario() {
        // previous_reading = "120", пользователь вводит 95
        let units = units_consumed_raw(&json!("120"), &json!(95));
        assert_eq!(units, Some(d("25")));
        assert_eq!(format_units(units), "25.000 units");
    }

    #[test]
    fn bill_amount_composition() {
        let components = BillComponents {
            gas_unit_rate: d("5.50"),
            unit_consumed: d("25"),
            amc_cost: d("50"),
            utility_tax: d("12.25"),
            app_charges: d("10"),
            penalty_amount: d("0"),
            overdue_penalty: d("100"),
        };
        assert_eq!(bill_amount(&components), d("309.75"));
        assert_eq!(format_currency(bill_amount(&components)), "309.75");
    }

    #[test]
    fn zero_consumption_still_charges_fixed_costs() {
        let components = BillComponents {
            gas_unit_rate: d("5.50"),
            unit_consumed: d("0"),
            amc_cost: d("50"),
            ..Default::default()
        };
        assert_eq!(bill_amount(&components), d("50"));
    }

    #[test]
    fn currency_is_formatted_to_two_places() {
        assert_eq!(format_currency(d("5")), "5.00");
        assert_eq!(format_currency(d("5.5")), "5.50");
        assert_eq!(format_currency(d("5.555")), "5.56");
    }

    #[test]
    fn due_date_is_day_of_month_not_offset() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();

        // создан 20-го, срок 15-го — 15-е следующего месяца
        assert_eq!(next_due_date(date(2026, 8, 20), 15), date(2026, 9, 15));
        // создан 10-го, срок 15-го — 15-е того же месяца
        assert_eq!(next_due_date(date(2026, 8, 10), 15), date(2026, 8, 15));
        // день совпадает — срок сегодня
        assert_eq!(next_due_date(date(2026, 8, 15), 15), date(2026, 8, 15));
    }

    #[test]
    fn due_date_clamps_short_months_and_rolls_over_year() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();

        assert_eq!(next_due_date(date(2026, 2, 1), 31), date(2026, 2, 28));
        assert_eq!(next_due_date(date(2028, 2, 1), 31), date(2028, 2, 29));
        assert_eq!(next_due_date(date(2026, 12, 20), 15), date(2027, 1, 15));
    }

    #[test]
    fn status_derivation_after_payment() {
        assert_eq!(
            derive_invoice_status(d("100"), d("100"), InvoiceStatus::Unpaid),
            InvoiceStatus::Paid
        );
        assert_eq!(
            derive_invoice_status(d("100"), d("40"), InvoiceStatus::Unpaid),
            InvoiceStatus::PartiallyPaid
        );
        assert_eq!(
            derive_invoice_status(d("100"), d("0"), InvoiceStatus::Overdue),
            InvoiceStatus::Overdue
        );
    }
}
