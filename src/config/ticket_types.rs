//! Ticket type seed configuration from config.toml.
//!
//! The `[[ticket_types]]` entries describe the catalog an organizer wants
//! available; they are used to seed the database on first run (seeding is
//! idempotent, keyed by name). Sale window timestamps are RFC 3339 strings.

use crate::entities::TicketKind;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Seed definition for a single ticket type
#[derive(Debug, Deserialize, Clone)]
pub struct TicketTypeConfig {
    /// Name of the ticket type
    pub name: String,
    /// Fee in EUR, tax inclusive
    pub fee: f64,
    /// Purchase limit; 0 means no limit
    #[serde(default)]
    pub max_purchases: i32,
    /// Whether the type is on sale at all
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    /// Sale window start
    pub date_valid_from: DateTime<Utc>,
    /// Sale window end
    pub date_valid_to: DateTime<Utc>,
    /// Name of the voucher type required to purchase this type, if any
    #[serde(default)]
    pub voucher_type: Option<String>,
    /// Explicit edit permission; omitted means "use the conference default"
    #[serde(default)]
    pub allow_editing: Option<bool>,
    /// Type-level edit deadline
    #[serde(default)]
    pub editable_until: Option<DateTime<Utc>>,
    /// Suppress the invoice mail for purchases made up entirely of this type
    #[serde(default)]
    pub prevent_invoice: bool,
    /// Which ticket variant the type generates (`venue`, `support`, `sim_card`)
    pub kind: TicketKind,
}

fn default_is_active() -> bool {
    true
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_ticket_type_config() {
        let toml_str = r#"
            [[ticket_types]]
            name = "Conference Ticket"
            fee = 100.0
            max_purchases = 400
            date_valid_from = "2014-01-01T00:00:00Z"
            date_valid_to = "2014-07-01T00:00:00Z"
            kind = "venue"

            [[ticket_types]]
            name = "Supporter"
            fee = 250.0
            date_valid_from = "2014-01-01T00:00:00Z"
            date_valid_to = "2014-07-01T00:00:00Z"
            prevent_invoice = true
            allow_editing = false
            kind = "support"
        "#;

        #[derive(Deserialize)]
        struct Wrapper {
            ticket_types: Vec<TicketTypeConfig>,
        }

        let config: Wrapper = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ticket_types.len(), 2);

        let venue = &config.ticket_types[0];
        assert_eq!(venue.name, "Conference Ticket");
        assert_eq!(venue.fee, 100.0);
        assert_eq!(venue.max_purchases, 400);
        assert!(venue.is_active);
        assert_eq!(venue.kind, TicketKind::Venue);
        assert_eq!(venue.allow_editing, None);

        let support = &config.ticket_types[1];
        assert_eq!(support.max_purchases, 0);
        assert!(support.prevent_invoice);
        assert_eq!(support.allow_editing, Some(false));
        assert_eq!(support.kind, TicketKind::Support);
    }
}
