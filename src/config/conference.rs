//! Conference settings loaded from the `[conference]` section of config.toml.
//!
//! These are read-only inputs to the domain rules: the conference window,
//! the ticket editability defaults consulted by the edit-permission check,
//! the tax rate used for invoice breakdowns and the invoice/product
//! numbering parameters.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

/// Conference-wide configuration.
///
/// Every field has a default so a minimal config.toml works; dates in the
/// file are RFC 3339 strings.
#[derive(Debug, Deserialize, Clone)]
pub struct ConferenceConfig {
    /// Conference title, used in logs and notification payloads
    #[serde(default = "default_title")]
    pub title: String,
    /// First conference day
    pub start: Option<NaiveDate>,
    /// Last conference day
    pub end: Option<NaiveDate>,
    /// Default edit permission for ticket types without an explicit flag
    #[serde(default)]
    pub tickets_editable: bool,
    /// Conference-level deadline after which no ticket can be edited
    #[serde(default)]
    pub tickets_editable_until: Option<DateTime<Utc>>,
    /// Tax rate included in all fees (0.19 = 19%)
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    /// Prefix of the formatted invoice number
    #[serde(default = "default_invoice_number_prefix")]
    pub invoice_number_prefix: String,
    /// Zero-padded width of the formatted invoice number
    #[serde(default = "default_invoice_number_digits")]
    pub invoice_number_digits: usize,
    /// First product number handed out to a ticket type
    #[serde(default = "default_product_number_start")]
    pub product_number_start: i32,
}

fn default_title() -> String {
    "Conference".to_string()
}

fn default_tax_rate() -> f64 {
    0.19
}

fn default_invoice_number_prefix() -> String {
    "INVOICE".to_string()
}

fn default_invoice_number_digits() -> usize {
    4
}

fn default_product_number_start() -> i32 {
    1000
}

impl Default for ConferenceConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            start: None,
            end: None,
            tickets_editable: false,
            tickets_editable_until: None,
            tax_rate: default_tax_rate(),
            invoice_number_prefix: default_invoice_number_prefix(),
            invoice_number_digits: default_invoice_number_digits(),
            product_number_start: default_product_number_start(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_conference_config() {
        let toml_str = r#"
            title = "PyCon DE 2014"
            start = "2014-07-21"
            end = "2014-07-27"
            tickets_editable = true
            tickets_editable_until = "2014-07-20T23:59:59Z"
            tax_rate = 0.19
        "#;

        let config: ConferenceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.title, "PyCon DE 2014");
        assert_eq!(config.start, NaiveDate::from_ymd_opt(2014, 7, 21));
        assert!(config.tickets_editable);
        assert!(config.tickets_editable_until.is_some());
        assert_eq!(config.tax_rate, 0.19);
        // Defaults for omitted fields
        assert_eq!(config.invoice_number_prefix, "INVOICE");
        assert_eq!(config.invoice_number_digits, 4);
        assert_eq!(config.product_number_start, 1000);
    }

    #[test]
    fn test_defaults() {
        let config = ConferenceConfig::default();
        assert!(!config.tickets_editable);
        assert!(config.tickets_editable_until.is_none());
        assert_eq!(config.tax_rate, 0.19);
        assert_eq!(config.product_number_start, 1000);
    }
}
