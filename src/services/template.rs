//! Проверка переменных шаблонов писем и SMS.
//!
//! Каждый токен `{{variable}}` в теле шаблона обязан входить в белый список
//! своего типа; сохранение с посторонней переменной отклоняется до записи в
//! базу.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::models::{EmailTemplateType, SmsTemplateType};

static VARIABLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").unwrap());

pub fn email_template_variables(template_type: EmailTemplateType) -> &'static [&'static str] {
    match template_type {
        EmailTemplateType::InvoiceGenerated => &[
            "customer_name",
            "invoice_no",
            "bill_amount",
            "due_date",
            "units_consumed",
        ],
        EmailTemplateType::PaymentReceipt => &[
            "customer_name",
            "invoice_no",
            "payment_amount",
            "payment_date",
        ],
        EmailTemplateType::PaymentReminder => &[
            "customer_name",
            "invoice_no",
            "bill_amount",
            "due_date",
            "overdue_penalty",
        ],
        EmailTemplateType::Welcome => &["customer_name", "customer_no", "flat_no"],
    }
}

pub fn sms_template_variables(template_type: SmsTemplateType) -> &'static [&'static str] {
    match template_type {
        SmsTemplateType::InvoiceGenerated => &["customer_name", "invoice_no", "bill_amount"],
        SmsTemplateType::PaymentReminder => &["customer_name", "bill_amount", "due_date"],
        SmsTemplateType::ReadingRecorded => &["customer_name", "units_consumed", "meter_serial"],
    }
}

pub fn extract_variables(text: &str) -> Vec<String> {
    VARIABLE_REGEX
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

fn invalid_variables(texts: &[&str], allowed: &[&str]) -> Vec<String> {
    let mut invalid = Vec::new();
    for text in texts {
        for var in extract_variables(text) {
            if !allowed.contains(&var.as_str()) && !invalid.contains(&var) {
                invalid.push(var);
            }
        }
    }
    invalid
}

/// Err — список недопустимых переменных для типа шаблона.
pub fn validate_email_template(
    template_type: EmailTemplateType,
    subject: &str,
    body: &str,
    html_body: Option<&str>,
) -> Result<(), Vec<String>> {
    let allowed = email_template_variables(template_type);
    let mut texts = vec![subject, body];
    if let Some(html) = html_body {
        texts.push(html);
    }
    let invalid = invalid_variables(&texts, allowed);
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(invalid)
    }
}

pub fn validate_sms_template(
    template_type: SmsTemplateType,
    message: &str,
) -> Result<(), Vec<String>> {
    let invalid = invalid_variables(&[message], sms_template_variables(template_type));
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(invalid)
    }
}

/// Подстановка значений. Токены без значения остаются как есть, чтобы
/// предпросмотр показал, что именно не заполнено.
pub fn render(text: &str, variables: &HashMap<String, String>) -> String {
    VARIABLE_REGEX
        .replace_all(text, |caps: &regex::Captures| {
            match variables.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_variables_with_whitespace() {
        let vars = extract_variables("Hello {{customer_name}}, bill {{ bill_amount }}");
        assert_eq!(vars, vec!["customer_name", "bill_amount"]);
    }

    #[test]
    fn whitelisted_variables_pass() {
        let result = validate_email_template(
            EmailTemplateType::InvoiceGenerated,
            "Счёт {{invoice_no}}",
            "Уважаемый {{customer_name}}, сумма {{bill_amount}} до {{due_date}}",
            None,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn unknown_variable_rejects_save() {
        let result = validate_email_template(
            EmailTemplateType::InvoiceGenerated,
            "Счёт",
            "Привет {{customer_name}}, ваш баланс {{wallet_balance}}",
            None,
        );
        assert_eq!(result.unwrap_err(), vec!["wallet_balance".to_string()]);
    }

    #[test]
    fn html_body_is_validated_too() {
        let result = validate_email_template(
            EmailTemplateType::Welcome,
            "Добро пожаловать",
            "{{customer_name}}",
            Some("<b>{{secret_token}}</b>"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn whitelist_is_per_type() {
        // units_consumed разрешена для InvoiceGenerated, но не для PaymentReceipt
        let result = validate_email_template(
            EmailTemplateType::PaymentReceipt,
            "Квитанция",
            "{{units_consumed}}",
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn sms_validation() {
        assert!(validate_sms_template(
            SmsTemplateType::ReadingRecorded,
            "{{customer_name}}: {{units_consumed}} по счётчику {{meter_serial}}"
        )
        .is_ok());
        assert!(
            validate_sms_template(SmsTemplateType::PaymentReminder, "{{meter_serial}}").is_err()
        );
    }

    #[test]
    fn render_substitutes_known_and_keeps_unknown() {
        let mut vars = HashMap::new();
        vars.insert("customer_name".to_string(), "Иван".to_string());

        let rendered = render("Привет {{customer_name}}, счёт {{invoice_no}}", &vars);
        assert_eq!(rendered, "Привет Иван, счёт {{invoice_no}}");
    }
}
