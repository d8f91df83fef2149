//! Subscription aggregate entity.
//!
//! A subscription is a client's purchased instance of a subscription type
//! under one of its price tiers. Renewal never mutates an existing row: it
//! creates a new subscription chained from the prior window's end.
//!
//! # Invariants
//!
//! - `valid_from < valid_until` strictly, at construction and on every
//!   window edit.
//! - Status transitions follow the [`SubscriptionStatus`] state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    ClientId, DomainError, ErrorCode, PriceTierId, StateMachine, SubscriptionId,
    SubscriptionTypeId, Timestamp,
};

use super::SubscriptionStatus;

/// A purchased, time-bounded subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub client_id: ClientId,
    pub type_id: SubscriptionTypeId,
    pub tier_id: PriceTierId,
    pub valid_from: Timestamp,
    pub valid_until: Timestamp,
    /// Money in integer cents.
    pub amount_paid_cents: i64,
    pub paid_at: Timestamp,
    pub status: SubscriptionStatus,
    /// Free-form payment method label ("card", "cash", ...), if recorded.
    pub payment_method: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Creates a subscription, validating the validity window.
    ///
    /// # Errors
    ///
    /// Returns `InvalidWindow` unless `valid_from < valid_until` strictly.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: SubscriptionId,
        client_id: ClientId,
        type_id: SubscriptionTypeId,
        tier_id: PriceTierId,
        valid_from: Timestamp,
        valid_until: Timestamp,
        amount_paid_cents: i64,
        paid_at: Timestamp,
        status: SubscriptionStatus,
        payment_method: Option<String>,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        Self::check_window(valid_from, valid_until)?;
        Ok(Self {
            id,
            client_id,
            type_id,
            tier_id,
            valid_from,
            valid_until,
            amount_paid_cents,
            paid_at,
            status,
            payment_method,
            created_at: now,
            updated_at: now,
        })
    }

    /// True iff `t` lies within `[valid_from, valid_until]`, both inclusive.
    pub fn window_contains(&self, t: Timestamp) -> bool {
        self.valid_from <= t && t <= self.valid_until
    }

    /// True once `valid_until` lies strictly before `now`.
    pub fn window_closed_at(&self, now: Timestamp) -> bool {
        self.valid_until < now
    }

    /// Default start of a renewal: the day after this window ends.
    pub fn renewal_start(&self) -> Timestamp {
        self.valid_until.add_days(1)
    }

    /// Rewrites the validity window, re-validating strict ordering.
    pub fn set_window(
        &mut self,
        valid_from: Timestamp,
        valid_until: Timestamp,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        Self::check_window(valid_from, valid_until)?;
        self.valid_from = valid_from;
        self.valid_until = valid_until;
        self.updated_at = now;
        Ok(())
    }

    /// Transitions to Expired (sweeper path, natural end of window).
    pub fn expire(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Expired)?;
        self.updated_at = now;
        Ok(())
    }

    /// Transitions to Cancelled (manual termination path).
    pub fn cancel(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition_to(SubscriptionStatus::Cancelled)?;
        self.updated_at = now;
        Ok(())
    }

    /// Sets an explicit status through the state machine (manual edit path).
    pub fn set_status(
        &mut self,
        status: SubscriptionStatus,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.transition_to(status)?;
        self.updated_at = now;
        Ok(())
    }

    fn transition_to(&mut self, target: SubscriptionStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition subscription from {} to {}",
                    self.status, target
                ),
            )
        })?;
        Ok(())
    }

    fn check_window(valid_from: Timestamp, valid_until: Timestamp) -> Result<(), DomainError> {
        if valid_until <= valid_from {
            return Err(DomainError::invalid_window(format!(
                "valid_from {} must be strictly before valid_until {}",
                valid_from, valid_until
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> Timestamp {
        Timestamp::from_ymd(2025, 1, d).unwrap()
    }

    fn subscription(from: Timestamp, until: Timestamp) -> Subscription {
        Subscription::new(
            SubscriptionId::new(),
            ClientId::new(),
            SubscriptionTypeId::new(),
            PriceTierId::new(),
            from,
            until,
            4500,
            from,
            SubscriptionStatus::Active,
            Some("card".to_string()),
            from,
        )
        .unwrap()
    }

    #[test]
    fn construction_enforces_strict_window() {
        let result = Subscription::new(
            SubscriptionId::new(),
            ClientId::new(),
            SubscriptionTypeId::new(),
            PriceTierId::new(),
            day(10),
            day(10),
            0,
            day(10),
            SubscriptionStatus::Pending,
            None,
            day(10),
        );
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, ErrorCode::InvalidWindow);
    }

    #[test]
    fn inverted_window_is_rejected() {
        let mut sub = subscription(day(1), day(31));
        assert!(sub.set_window(day(20), day(10), day(5)).is_err());
        // Unchanged on failure.
        assert_eq!(sub.valid_from, day(1));
        assert_eq!(sub.valid_until, day(31));
    }

    #[test]
    fn window_contains_is_inclusive() {
        let sub = subscription(day(1), day(31));
        assert!(sub.window_contains(day(1)));
        assert!(sub.window_contains(day(31)));
        assert!(!sub.window_contains(Timestamp::from_ymd(2025, 2, 1).unwrap()));
    }

    #[test]
    fn window_closed_at_is_strict() {
        let sub = subscription(day(1), day(31));
        assert!(!sub.window_closed_at(day(31)));
        assert!(sub.window_closed_at(Timestamp::from_ymd(2025, 2, 1).unwrap()));
    }

    #[test]
    fn renewal_start_is_day_after_window_end() {
        let sub = subscription(day(1), day(31));
        assert_eq!(sub.renewal_start(), Timestamp::from_ymd(2025, 2, 1).unwrap());
    }

    #[test]
    fn active_subscription_can_expire() {
        let mut sub = subscription(day(1), day(31));
        sub.expire(day(31)).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Expired);
    }

    #[test]
    fn expired_subscription_cannot_cancel() {
        let mut sub = subscription(day(1), day(31));
        sub.expire(day(31)).unwrap();
        let result = sub.cancel(day(31));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn set_window_updates_timestamps() {
        let mut sub = subscription(day(1), day(31));
        sub.set_window(day(2), day(20), day(5)).unwrap();
        assert_eq!(sub.valid_from, day(2));
        assert_eq!(sub.valid_until, day(20));
        assert_eq!(sub.updated_at, day(5));
    }
}
