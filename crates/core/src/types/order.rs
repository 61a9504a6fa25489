//! Customer orders as seen by the management screens.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use super::{OrderId, OrderStatus, Price, display_amount};

/// An order summary.
///
/// Orders are created by checkout; the client only reads them and changes
/// their status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Creation timestamp, as wall-clock time.
    #[serde(rename = "date", deserialize_with = "deserialize_timestamp")]
    pub created_at: NaiveDateTime,
    /// `None` when the backend sends no total.
    #[serde(default)]
    pub total: Option<Price>,
    #[serde(rename = "statut")]
    pub status: OrderStatus,
}

impl Order {
    /// Creation date formatted as `dd/mm/yyyy hh:mm`.
    #[must_use]
    pub fn display_date(&self) -> String {
        self.created_at.format("%d/%m/%Y %H:%M").to_string()
    }

    /// Total with two decimals, or a dash when absent.
    #[must_use]
    pub fn display_total(&self) -> String {
        display_amount(self.total)
    }
}

/// Parse a backend timestamp, with or without a UTC offset.
///
/// A timestamp carrying an offset keeps the wall-clock time it was written
/// in.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    raw.parse::<NaiveDateTime>().ok().or_else(|| {
        raw.parse::<DateTime<FixedOffset>>()
            .ok()
            .map(|timestamp| timestamp.naive_local())
    })
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        de::Error::invalid_value(de::Unexpected::Str(&raw), &"an ISO 8601 date-time")
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_order() {
        let json = r#"{
            "id": 12,
            "date": "2024-03-05T14:07:09.123",
            "total": 42.9,
            "statut": "PAID",
            "items": []
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, OrderId::new(12));
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.total, Some(Price::from_cents(4290)));
        assert_eq!(order.display_date(), "05/03/2024 14:07");
        assert_eq!(order.display_total(), "42.90 €");
    }

    #[test]
    fn test_offset_timestamps_are_accepted() {
        for (raw, shown) in [
            ("2024-03-05T14:07:09Z", "05/03/2024 14:07"),
            ("2024-03-05T14:07:09.5+01:00", "05/03/2024 14:07"),
            ("2024-12-31T23:59:00-05:00", "31/12/2024 23:59"),
        ] {
            let json = format!(r#"{{"id": 1, "date": "{raw}", "total": 1, "statut": "PENDING"}}"#);
            let order: Order = serde_json::from_str(&json).unwrap();
            assert_eq!(order.display_date(), shown, "{raw}");
        }
    }

    #[test]
    fn test_unparseable_date_is_rejected() {
        assert!(parse_timestamp("yesterday").is_none());
        let json = r#"{"id": 1, "date": "05/03/2024", "total": 1, "statut": "PAID"}"#;
        assert!(serde_json::from_str::<Order>(json).is_err());
    }

    #[test]
    fn test_null_or_missing_total() {
        let json = r#"{"id": 2, "date": "2024-03-05T14:07:09", "total": null, "statut": "SHIPPED"}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.total, None);
        assert_eq!(order.display_total(), "-");

        let json = r#"{"id": 3, "date": "2024-03-05T14:07:09", "statut": "SHIPPED"}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.total, None);
    }
}
