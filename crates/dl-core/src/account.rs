//! Driver accounts: balance, claims and top-ups.
//!
//! The balance is a cached running total of the history. Every claim and
//! top-up is appended together with its balance delta in one atomic store
//! operation, so `balance == sum(topups) - sum(claims)` always holds.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AdminId, ClaimCategory, ProofRef, ValidationError, require_positive};

/// An expense claim. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimEntry {
    pub id: Uuid,
    pub amount: Decimal,
    pub category: ClaimCategory,
    pub date: NaiveDate,
    pub proof: ProofRef,
}

/// A credit issued by an admin. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopupEntry {
    pub id: Uuid,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub initiated_by: AdminId,
}

/// A claim as collected from the driver, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClaim {
    pub category: ClaimCategory,
    pub amount: Decimal,
    pub date: NaiveDate,
    /// Missing until the driver attaches a photo.
    pub proof: Option<ProofRef>,
}

impl NewClaim {
    /// Validates the claim and assigns it an id.
    pub fn into_entry(self) -> Result<ClaimEntry, ValidationError> {
        let amount = require_positive(self.amount)?;
        let proof = self.proof.ok_or(ValidationError::MissingProof)?;
        if let ClaimCategory::Other(description) = &self.category {
            if description.trim().is_empty() {
                return Err(ValidationError::MissingDescription);
            }
        }
        Ok(ClaimEntry {
            id: Uuid::new_v4(),
            amount,
            category: self.category,
            date: self.date,
            proof,
        })
    }
}

impl TopupEntry {
    /// Validates the amount and assigns an id.
    pub fn new(
        amount: Decimal,
        date: NaiveDate,
        initiated_by: AdminId,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            amount: require_positive(amount)?,
            date,
            initiated_by,
        })
    }
}

/// A driver's account. Absent accounts behave as an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// May be negative; there is no floor.
    pub balance: Decimal,
    /// Oldest first.
    pub claims: Vec<ClaimEntry>,
    /// Oldest first.
    pub topups: Vec<TopupEntry>,
}

impl AccountRecord {
    /// Appends a claim and debits its amount.
    ///
    /// Fails without touching the account when the new balance or the claim
    /// total would overflow.
    pub fn apply_claim(&mut self, claim: ClaimEntry) -> Result<Decimal, ValidationError> {
        let out_of_range = || ValidationError::AmountOutOfRange {
            value: claim.amount,
        };
        let balance = self.balance.checked_sub(claim.amount).ok_or_else(out_of_range)?;
        self.total_claimed()
            .and_then(|total| total.checked_add(claim.amount))
            .ok_or_else(out_of_range)?;
        self.balance = balance;
        self.claims.push(claim);
        Ok(balance)
    }

    /// Appends a top-up and credits its amount.
    ///
    /// Fails without touching the account when the new balance or the top-up
    /// total would overflow.
    pub fn apply_topup(&mut self, topup: TopupEntry) -> Result<Decimal, ValidationError> {
        let out_of_range = || ValidationError::AmountOutOfRange {
            value: topup.amount,
        };
        let balance = self.balance.checked_add(topup.amount).ok_or_else(out_of_range)?;
        self.total_topped_up()
            .and_then(|total| total.checked_add(topup.amount))
            .ok_or_else(out_of_range)?;
        self.balance = balance;
        self.topups.push(topup);
        Ok(balance)
    }

    /// Balance recomputed from history, or `None` if the totals overflow.
    pub fn history_balance(&self) -> Option<Decimal> {
        self.total_topped_up()?.checked_sub(self.total_claimed()?)
    }

    pub fn is_consistent(&self) -> bool {
        self.history_balance() == Some(self.balance)
    }

    pub fn total_claimed(&self) -> Option<Decimal> {
        checked_total(self.claims.iter().map(|c| c.amount))
    }

    pub fn total_topped_up(&self) -> Option<Decimal> {
        checked_total(self.topups.iter().map(|t| t.amount))
    }
}

/// Sums `amounts`, or `None` on overflow.
pub fn checked_total(amounts: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    fn claim(amount: Decimal, proof: Option<&str>) -> NewClaim {
        NewClaim {
            category: ClaimCategory::Toll,
            amount,
            date: date(),
            proof: proof.map(|p| ProofRef::new(p).unwrap()),
        }
    }

    #[test]
    fn claim_requires_positive_amount() {
        let err = claim(Decimal::ZERO, Some("photo-1")).into_entry().unwrap_err();
        assert_eq!(err, ValidationError::InvalidAmount { value: Decimal::ZERO });
        let err = claim(dec!(-1), Some("photo-1")).into_entry().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidAmount { .. }));
    }

    #[test]
    fn claim_requires_proof() {
        let err = claim(dec!(10), None).into_entry().unwrap_err();
        assert_eq!(err, ValidationError::MissingProof);
    }

    #[test]
    fn valid_claim_becomes_entry() {
        let entry = claim(dec!(12.40), Some("photo-1")).into_entry().unwrap();
        assert_eq!(entry.amount, dec!(12.40));
        assert_eq!(entry.proof.as_str(), "photo-1");
    }

    #[test]
    fn topup_requires_positive_amount() {
        let err = TopupEntry::new(dec!(0), date(), AdminId::from(1_u64)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidAmount { .. }));
    }

    #[test]
    fn balance_tracks_history() {
        let mut account = AccountRecord::default();
        let claimed = claim(dec!(50.00), Some("p")).into_entry().unwrap();
        assert_eq!(account.apply_claim(claimed).unwrap(), dec!(-50.00));
        let topup = TopupEntry::new(dec!(100.00), date(), AdminId::from(1_u64)).unwrap();
        assert_eq!(account.apply_topup(topup).unwrap(), dec!(50.00));
        assert!(account.is_consistent());
        assert_eq!(account.total_claimed(), Some(dec!(50.00)));
        assert_eq!(account.history_balance(), Some(dec!(50.00)));
    }

    #[test]
    fn claim_past_decimal_range_is_refused() {
        let mut account = AccountRecord::default();
        let huge = claim(Decimal::MAX, Some("p")).into_entry().unwrap();
        assert_eq!(account.apply_claim(huge.clone()).unwrap(), -Decimal::MAX);

        let before = account.clone();
        let err = account.apply_claim(huge).unwrap_err();
        assert_eq!(err, ValidationError::AmountOutOfRange { value: Decimal::MAX });
        assert_eq!(account, before);
        assert!(account.is_consistent());
    }

    #[test]
    fn topup_past_decimal_range_is_refused() {
        let mut account = AccountRecord::default();
        let admin = AdminId::from(1_u64);
        account
            .apply_topup(TopupEntry::new(Decimal::MAX, date(), admin.clone()).unwrap())
            .unwrap();

        let before = account.clone();
        let err = account
            .apply_topup(TopupEntry::new(dec!(1), date(), admin).unwrap())
            .unwrap_err();
        assert!(matches!(err, ValidationError::AmountOutOfRange { .. }));
        assert_eq!(account, before);
    }

    #[test]
    fn topup_total_cannot_overflow_even_with_room_in_balance() {
        let mut account = AccountRecord::default();
        let admin = AdminId::from(1_u64);
        account
            .apply_topup(TopupEntry::new(Decimal::MAX, date(), admin.clone()).unwrap())
            .unwrap();
        account
            .apply_claim(claim(dec!(10), Some("p")).into_entry().unwrap())
            .unwrap();

        // The balance could take another 1.00, the top-up history could not.
        let err = account
            .apply_topup(TopupEntry::new(dec!(1), date(), admin).unwrap())
            .unwrap_err();
        assert!(matches!(err, ValidationError::AmountOutOfRange { .. }));
        assert!(account.is_consistent());
    }

    #[test]
    fn checked_total_reports_overflow() {
        assert_eq!(checked_total([dec!(1.5), dec!(2.5)]), Some(dec!(4.0)));
        assert_eq!(checked_total([Decimal::MAX, dec!(1)]), None);
        assert_eq!(checked_total(std::iter::empty()), Some(Decimal::ZERO));
    }

    #[test]
    fn inconsistent_balance_is_detected() {
        let account = AccountRecord {
            balance: dec!(5),
            ..AccountRecord::default()
        };
        assert!(!account.is_consistent());
    }
}
