//! Status enums mirrored from the backend.
//!
//! The backend owns these lifecycles. Values this build does not know about
//! deserialize to `Unknown` instead of failing the whole response.

use core::fmt;

use serde::{Deserialize, Serialize};

/// How an order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentType {
    /// Customer collects the order from a shop or warehouse.
    Pickup,
    /// Order is delivered to an address.
    Delivery,
}

impl FulfillmentType {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pickup => "Pickup",
            Self::Delivery => "Delivery",
        }
    }

    /// Value used in query strings and form fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
        }
    }
}

impl fmt::Display for FulfillmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Preparing,
    ReadyForPickup,
    OutForDelivery,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Preparing => "Preparing",
            Self::ReadyForPickup => "Ready for pickup",
            Self::OutForDelivery => "Out for delivery",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Unknown => "Processing",
        }
    }

    /// Whether the order can still change.
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
    Refunded,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Awaiting payment",
            Self::Paid => "Paid",
            Self::Failed => "Payment failed",
            Self::Cancelled => "Payment cancelled",
            Self::Refunded => "Refunded",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfillment_type_wire_format() {
        assert_eq!(
            serde_json::to_string(&FulfillmentType::Pickup).unwrap(),
            "\"pickup\""
        );
        let parsed: FulfillmentType = serde_json::from_str("\"delivery\"").unwrap();
        assert_eq!(parsed, FulfillmentType::Delivery);
        assert_eq!(parsed.as_str(), "delivery");
    }

    #[test]
    fn test_order_status_unknown_values() {
        let status: OrderStatus = serde_json::from_str("\"ready_for_pickup\"").unwrap();
        assert_eq!(status, OrderStatus::ReadyForPickup);
        assert_eq!(status.to_string(), "Ready for pickup");

        let status: OrderStatus = serde_json::from_str("\"on_hold\"").unwrap();
        assert_eq!(status, OrderStatus::Unknown);
        assert!(status.is_open());
        assert!(!OrderStatus::Cancelled.is_open());
    }

    #[test]
    fn test_payment_status_labels() {
        let status: PaymentStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status.label(), "Payment cancelled");
    }
}
