//! Value Objects for the shop domain

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    #[error("Invalid status value: {0:?}")]
    Invalid(String),
}

/// Order lifecycle status.
///
/// `Cancelled` is the admin/customer cancellation literal, `Canceled` is
/// written only by the payment-failure callback. They are stored as two
/// distinct values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
    Canceled,
}

impl OrderStatus {
    /// Values an administrator may set directly.
    pub const ADMIN_SETTABLE: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Canceled => "CANCELED",
        }
    }

    /// Parse a status supplied by an administrator. `CANCELED` is rejected.
    pub fn parse_admin(value: &str) -> Result<Self, StatusError> {
        Self::ADMIN_SETTABLE
            .into_iter()
            .find(|s| s.as_str() == value)
            .ok_or_else(|| StatusError::Invalid(value.to_string()))
    }
}

impl FromStr for OrderStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CANCELED" => Ok(Self::Canceled),
            other => Self::parse_admin(other),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Moderation status shared by reviews, review videos and questions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl FromStr for ModerationStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(StatusError::Invalid(other.to_string())),
        }
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self { Self::User => "USER", Self::Admin => "ADMIN" }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Amount in Korean won. The currency has no minor unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub fn won(amount: i64) -> Self { Self(amount) }
    pub fn zero() -> Self { Self(0) }
    pub fn amount(&self) -> i64 { self.0 }
    pub fn checked_add(&self, other: Money) -> Option<Money> { self.0.checked_add(other.0).map(Money) }
    pub fn checked_multiply(&self, qty: u32) -> Option<Money> { self.0.checked_mul(i64::from(qty)).map(Money) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} KRW", self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_statuses() {
        for s in ["PENDING", "PAID", "SHIPPED", "DELIVERED", "CANCELLED"] {
            assert_eq!(OrderStatus::parse_admin(s).unwrap().as_str(), s);
        }
    }

    #[test]
    fn test_admin_rejects_unknown_and_payment_literal() {
        for s in ["CANCELED", "pending", "", "REFUNDED", " PAID"] {
            assert_eq!(OrderStatus::parse_admin(s), Err(StatusError::Invalid(s.to_string())));
        }
    }

    #[test]
    fn test_stored_literals_stay_distinct() {
        assert_eq!("CANCELED".parse::<OrderStatus>().unwrap(), OrderStatus::Canceled);
        assert_eq!("CANCELLED".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert_ne!(OrderStatus::Canceled, OrderStatus::Cancelled);
        assert_eq!(serde_json::to_string(&OrderStatus::Canceled).unwrap(), "\"CANCELED\"");
    }

    #[test]
    fn test_moderation_status() {
        assert_eq!("APPROVED".parse::<ModerationStatus>().unwrap(), ModerationStatus::Approved);
        assert!("approved".parse::<ModerationStatus>().is_err());
    }

    #[test]
    fn test_money() {
        let line = Money::won(12_000).checked_multiply(3).unwrap();
        assert_eq!(line.checked_add(Money::won(500)).unwrap().amount(), 36_500);
        assert!(Money::won(i64::MAX).checked_multiply(2).is_none());
    }
}
