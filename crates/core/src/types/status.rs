//! Status enums for checkout and orders.

use serde::{Deserialize, Serialize};

/// Payment status reported by the payment provider.
///
/// Unknown values deserialize to [`PaymentStatus::Unknown`] instead of failing,
/// since the provider adds states without notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Approved,
    Authorized,
    #[default]
    Pending,
    InProcess,
    Rejected,
    Cancelled,
    Refunded,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    /// Whether the order is paid (or guaranteed to be) and the cart can be cleared.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Approved | Self::Authorized)
    }

    /// Whether the payment is still being processed (boleto, PIX, manual review).
    #[must_use]
    pub const fn is_waiting(self) -> bool {
        matches!(self, Self::Pending | Self::InProcess)
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "approved" | "paid" => Self::Approved,
            "authorized" => Self::Authorized,
            "pending" => Self::Pending,
            "in_process" | "in_mediation" => Self::InProcess,
            "rejected" | "failed" => Self::Rejected,
            "cancelled" | "canceled" => Self::Cancelled,
            "refunded" | "charged_back" => Self::Refunded,
            _ => Self::Unknown,
        })
    }
}

/// Order lifecycle status as stored by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl From<PaymentStatus> for OrderStatus {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Approved | PaymentStatus::Authorized => Self::Paid,
            PaymentStatus::Pending | PaymentStatus::InProcess => Self::Pending,
            PaymentStatus::Rejected | PaymentStatus::Cancelled | PaymentStatus::Refunded => {
                Self::Cancelled
            }
            PaymentStatus::Unknown => Self::Unknown,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_deserialize_unknown() {
        let status: PaymentStatus = serde_json::from_str("\"something_new\"").unwrap();
        assert_eq!(status, PaymentStatus::Unknown);
    }

    #[test]
    fn test_payment_status_from_str_aliases() {
        assert_eq!("PAID".parse::<PaymentStatus>().unwrap(), PaymentStatus::Approved);
        assert_eq!("canceled".parse::<PaymentStatus>().unwrap(), PaymentStatus::Cancelled);
        assert_eq!("in_mediation".parse::<PaymentStatus>().unwrap(), PaymentStatus::InProcess);
    }

    #[test]
    fn test_order_status_from_payment() {
        assert_eq!(OrderStatus::from(PaymentStatus::Approved), OrderStatus::Paid);
        assert_eq!(OrderStatus::from(PaymentStatus::InProcess), OrderStatus::Pending);
        assert_eq!(OrderStatus::from(PaymentStatus::Rejected), OrderStatus::Cancelled);
    }
}
