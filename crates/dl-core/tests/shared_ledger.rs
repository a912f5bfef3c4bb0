//! Concurrent use of one ledger from several threads.
//!
//! Handlers for many drivers run in parallel and share a single ledger behind
//! a mutex. These tests check that the balance and salary invariants hold no
//! matter how the operations interleave.

use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{Duration, TimeZone, Utc};
use dl_core::{
    AdminId, AttendanceError, ClaimCategory, DriverId, FixedClock, Ledger, LedgerSettings,
    LedgerStore, MemoryStore, NewClaim, ProofRef,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

type SharedLedger = Arc<Mutex<Ledger<MemoryStore, Arc<FixedClock>>>>;

fn shared_ledger() -> (SharedLedger, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 3, 3, 1, 0, 0).unwrap(),
    ));
    let ledger = Ledger::with_clock(
        MemoryStore::new(),
        Arc::clone(&clock),
        LedgerSettings::default(),
    );
    (Arc::new(Mutex::new(ledger)), clock)
}

fn toll(amount: Decimal) -> NewClaim {
    NewClaim {
        category: ClaimCategory::Toll,
        amount,
        date: chrono::NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
        proof: Some(ProofRef::new("photo").unwrap()),
    }
}

#[test]
fn test_concurrent_claims_and_topups_keep_balance_consistent() {
    let (ledger, _clock) = shared_ledger();
    let driver = DriverId::from(7_u64);
    let admin = AdminId::from(1_u64);

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let ledger = Arc::clone(&ledger);
            let driver = driver.clone();
            let admin = admin.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    let mut ledger = ledger.lock().unwrap();
                    if worker % 2 == 0 {
                        ledger.submit_claim(&driver, toll(dec!(1.25))).unwrap();
                    } else {
                        ledger.topup_today(&driver, dec!(2.50), &admin).unwrap();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let ledger = ledger.lock().unwrap();
    let account = ledger.store().account(&driver).unwrap().unwrap();
    assert_eq!(account.claims.len(), 100);
    assert_eq!(account.topups.len(), 100);
    assert_eq!(account.balance, dec!(125.00));
    assert!(account.is_consistent());
}

#[test]
fn test_racing_clock_ins_admit_exactly_one() {
    let (ledger, _clock) = shared_ledger();
    let driver = DriverId::from(7_u64);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            let driver = driver.clone();
            thread::spawn(move || ledger.lock().unwrap().clock_in(&driver))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let admitted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(admitted, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(
            err.as_attendance(),
            Some(AttendanceError::AlreadyClockedIn { .. })
        ));
    }
}

#[test]
fn test_drivers_work_independently_in_parallel() {
    let (ledger, clock) = shared_ledger();
    let drivers: Vec<DriverId> = (1..=5_u64).map(DriverId::from).collect();

    for driver in &drivers {
        ledger.lock().unwrap().clock_in(driver).unwrap();
    }
    clock.advance(Duration::hours(8));

    let handles: Vec<_> = drivers
        .iter()
        .cloned()
        .map(|driver| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || ledger.lock().unwrap().clock_out(&driver).unwrap())
        })
        .collect();
    for handle in handles {
        let receipt = handle.join().unwrap();
        assert_eq!(receipt.elapsed, "8Hour");
    }

    let ledger = ledger.lock().unwrap();
    for driver in &drivers {
        let salary = ledger.store().salary(driver).unwrap().unwrap();
        assert_eq!(salary.total_hours(), dec!(8));
        assert_eq!(salary.total_worked, salary.daily_sum());
    }
    assert_eq!(ledger.drivers().unwrap().len(), drivers.len());
}

#[test]
fn test_oversized_claims_are_refused_without_poisoning_the_lock() {
    let (ledger, _clock) = shared_ledger();
    let driver = DriverId::from(7_u64);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            let driver = driver.clone();
            thread::spawn(move || ledger.lock().unwrap().submit_claim(&driver, toll(Decimal::MAX)))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(!ledger.is_poisoned());

    let ledger = ledger.lock().unwrap();
    let account = ledger.store().account(&driver).unwrap().unwrap();
    assert_eq!(account.claims.len(), 1);
    assert_eq!(account.balance, -Decimal::MAX);
    assert!(account.is_consistent());
}
