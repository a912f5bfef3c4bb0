//! Behavioral checks every [`LedgerStore`] backend must pass.
//!
//! Each check drives a [`Ledger`] over a fresh store with a pinned clock and
//! panics on the first violated expectation. Backends call [`run_all`] from
//! their own test modules; the failure checks take a hook that arms a
//! backend-specific fault just before the operation under test.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::account::NewClaim;
use crate::attendance::AttendanceState;
use crate::error::{AttendanceError, ErrorKind, LedgerError};
use crate::ledger::{Ledger, LedgerSettings};
use crate::store::LedgerStore;
use crate::time::{DateRange, FixedClock};
use crate::types::{AdminId, ClaimCategory, DriverId, DriverProfile, ProofRef, ValidationError};

type TestLedger<S> = Ledger<S, Arc<FixedClock>>;

/// 2025-03-03 09:00 in Kuala Lumpur.
fn opening() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 1, 0, 0)
        .single()
        .unwrap_or_default()
}

fn business_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 3).unwrap_or_default()
}

fn ledger<S: LedgerStore>(store: S) -> (TestLedger<S>, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(opening()));
    let ledger = Ledger::with_clock(store, Arc::clone(&clock), LedgerSettings::default());
    (ledger, clock)
}

fn driver() -> DriverId {
    DriverId::from(1_001_u64)
}

fn admin() -> AdminId {
    AdminId::from(9_u64)
}

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn claim(category: ClaimCategory, cents: i64, proof: Option<&str>) -> NewClaim {
    NewClaim {
        category,
        amount: money(cents),
        date: business_day(),
        proof: proof.and_then(|p| ProofRef::new(p).ok()),
    }
}

fn assert_account_consistent<S: LedgerStore>(ledger: &TestLedger<S>, driver: &DriverId) {
    let account = ledger
        .store()
        .account(driver)
        .expect("account readable")
        .unwrap_or_default();
    assert!(
        account.is_consistent(),
        "balance {} does not match history {:?}",
        account.balance,
        account.history_balance()
    );
}

fn assert_salary_consistent<S: LedgerStore>(ledger: &TestLedger<S>, driver: &DriverId) {
    let salary = ledger
        .store()
        .salary(driver)
        .expect("salary readable")
        .unwrap_or_default();
    assert_eq!(salary.total_worked, salary.daily_sum(), "total drifted from daily sum");
}

/// Runs every non-failure check, each against a fresh store from `make`.
pub fn run_all<S: LedgerStore>(make: impl Fn() -> S) {
    clock_in_then_out_accrues_hours(make());
    second_clock_in_is_rejected(make());
    clock_out_without_clock_in_is_rejected(make());
    second_clock_out_is_rejected(make());
    off_day_blocks_clock_in(make());
    off_day_after_attendance_is_rejected(make());
    off_day_twice_is_a_no_op(make());
    skewed_clock_out_uses_absolute_time(make());
    business_date_follows_configured_zone(make());
    salary_total_tracks_daily_entries(make());
    monthly_salary_sets_hourly_rate(make());
    claim_and_topup_move_balance(make());
    invalid_claims_change_nothing(make());
    oversized_amounts_are_refused(make());
    oversized_pay_is_reported(make());
    unknown_driver_reads_as_empty(make());
    drivers_are_recorded_implicitly(make());
    summary_covers_requested_range(make());
    claims_are_paged_newest_first(make());
    recent_attendance_is_newest_first(make());
    export_includes_every_driver(make());
}

pub fn clock_in_then_out_accrues_hours<S: LedgerStore>(store: S) {
    let (mut ledger, clock) = ledger(store);
    let driver = driver();

    let receipt = ledger.clock_in(&driver).expect("clock in");
    assert_eq!(receipt.date, business_day());
    assert_eq!(receipt.at, opening());

    clock.advance(Duration::minutes(135));
    let receipt = ledger.clock_out(&driver).expect("clock out");
    assert_eq!(receipt.elapsed, "2Hour 15Min");
    assert_eq!(receipt.worked.seconds(), 8100);

    let salary = ledger
        .store()
        .salary(&driver)
        .expect("salary readable")
        .expect("salary created on clock-out");
    assert_eq!(salary.total_hours(), Decimal::new(225, 2));
    assert_eq!(salary.daily.get(&business_day()), Some(&receipt.worked));

    let record = ledger
        .attendance(&driver, business_day())
        .expect("attendance readable")
        .expect("attendance stored");
    assert_eq!(
        record.state(),
        AttendanceState::ClockedOut {
            clock_in: opening(),
            clock_out: opening() + Duration::minutes(135),
        }
    );
    // Default rate 20.00 for 2.25 hours.
    assert_eq!(ledger.gross_pay(&driver).expect("gross pay"), money(4500));
}

pub fn second_clock_in_is_rejected<S: LedgerStore>(store: S) {
    let (mut ledger, clock) = ledger(store);
    let driver = driver();
    ledger.clock_in(&driver).expect("first clock in");
    clock.advance(Duration::minutes(5));

    let err = ledger.clock_in(&driver).expect_err("second clock in");
    assert_eq!(
        err.as_attendance(),
        Some(&AttendanceError::AlreadyClockedIn {
            date: business_day(),
            at: opening(),
        })
    );
    assert_eq!(err.kind(), ErrorKind::UserState);

    let record = ledger
        .attendance(&driver, business_day())
        .expect("attendance readable")
        .expect("attendance stored");
    assert_eq!(record.state(), AttendanceState::ClockedIn { at: opening() });
}

pub fn clock_out_without_clock_in_is_rejected<S: LedgerStore>(store: S) {
    let (mut ledger, _clock) = ledger(store);
    let driver = driver();
    let err = ledger.clock_out(&driver).expect_err("clock out first");
    assert_eq!(
        err.as_attendance(),
        Some(&AttendanceError::NotClockedIn {
            date: business_day()
        })
    );
    assert!(ledger.store().salary(&driver).expect("salary readable").is_none());
    assert!(
        ledger
            .attendance(&driver, business_day())
            .expect("attendance readable")
            .is_none()
    );
}

pub fn second_clock_out_is_rejected<S: LedgerStore>(store: S) {
    let (mut ledger, clock) = ledger(store);
    let driver = driver();
    ledger.clock_in(&driver).expect("clock in");
    clock.advance(Duration::hours(8));
    ledger.clock_out(&driver).expect("clock out");
    clock.advance(Duration::hours(1));

    let err = ledger.clock_out(&driver).expect_err("second clock out");
    assert!(matches!(
        err.as_attendance(),
        Some(AttendanceError::AlreadyClockedOut { .. })
    ));
    let salary = ledger
        .store()
        .salary(&driver)
        .expect("salary readable")
        .unwrap_or_default();
    assert_eq!(salary.total_worked.seconds(), 8 * 3600);
}

pub fn off_day_blocks_clock_in<S: LedgerStore>(store: S) {
    let (mut ledger, _clock) = ledger(store);
    let driver = driver();
    let date = ledger.mark_off_today(&driver).expect("off day");
    assert_eq!(date, business_day());

    let err = ledger.clock_in(&driver).expect_err("clock in on off day");
    assert_eq!(
        err.as_attendance(),
        Some(&AttendanceError::CannotClockInOnOffDay { date })
    );
    let err = ledger.clock_out(&driver).expect_err("clock out on off day");
    assert_eq!(err.as_attendance(), Some(&AttendanceError::NotClockedIn { date }));
}

pub fn off_day_after_attendance_is_rejected<S: LedgerStore>(store: S) {
    let (mut ledger, _clock) = ledger(store);
    let driver = driver();
    ledger.clock_in(&driver).expect("clock in");

    let err = ledger
        .mark_off_day(&driver, business_day())
        .expect_err("off day after clock in");
    assert_eq!(
        err.as_attendance(),
        Some(&AttendanceError::AlreadyHasAttendance {
            date: business_day()
        })
    );

    // Other dates are unaffected.
    let tomorrow = business_day().succ_opt().unwrap_or_default();
    ledger.mark_off_day(&driver, tomorrow).expect("off day tomorrow");
}

pub fn off_day_twice_is_a_no_op<S: LedgerStore>(store: S) {
    let (mut ledger, _clock) = ledger(store);
    let driver = driver();
    ledger.mark_off_day(&driver, business_day()).expect("first");
    ledger.mark_off_day(&driver, business_day()).expect("second");
    let record = ledger
        .attendance(&driver, business_day())
        .expect("attendance readable")
        .expect("attendance stored");
    assert_eq!(record.state(), AttendanceState::OffDay);
}

pub fn skewed_clock_out_uses_absolute_time<S: LedgerStore>(store: S) {
    let (mut ledger, clock) = ledger(store);
    let driver = driver();
    ledger.clock_in(&driver).expect("clock in");
    clock.set(opening() - Duration::minutes(30));

    let receipt = ledger.clock_out(&driver).expect("clock out");
    assert_eq!(receipt.elapsed, "30Min");
    let salary = ledger
        .store()
        .salary(&driver)
        .expect("salary readable")
        .unwrap_or_default();
    assert_eq!(salary.total_hours(), Decimal::new(5, 1));
}

pub fn business_date_follows_configured_zone<S: LedgerStore>(store: S) {
    let (mut ledger, clock) = ledger(store);
    let driver = driver();
    // 23:30 local on 2025-03-03.
    clock.set(Utc.with_ymd_and_hms(2025, 3, 3, 15, 30, 0).single().unwrap_or_default());
    let receipt = ledger.clock_in(&driver).expect("late clock in");
    assert_eq!(receipt.date, business_day());

    // 00:30 local is already the next business day, which has no clock-in.
    clock.advance(Duration::hours(1));
    let err = ledger.clock_out(&driver).expect_err("clock out next day");
    let next_day = business_day().succ_opt().unwrap_or_default();
    assert_eq!(
        err.as_attendance(),
        Some(&AttendanceError::NotClockedIn { date: next_day })
    );
}

pub fn salary_total_tracks_daily_entries<S: LedgerStore>(store: S) {
    let (mut ledger, clock) = ledger(store);
    let driver = driver();
    let shifts = [(0, 480), (1, 135), (2, 61), (4, 600)];
    let mut expected = 0;
    for (day, minutes) in shifts {
        clock.set(opening() + Duration::days(day));
        ledger.clock_in(&driver).expect("clock in");
        clock.advance(Duration::minutes(minutes));
        ledger.clock_out(&driver).expect("clock out");
        expected += minutes * 60;
        assert_salary_consistent(&ledger, &driver);
    }
    let salary = ledger
        .store()
        .salary(&driver)
        .expect("salary readable")
        .unwrap_or_default();
    assert_eq!(salary.total_worked.seconds(), expected);
    assert_eq!(salary.daily.len(), shifts.len());
}

pub fn monthly_salary_sets_hourly_rate<S: LedgerStore>(store: S) {
    let (mut ledger, clock) = ledger(store);
    let driver = driver();
    assert_eq!(ledger.hourly_rate(&driver).expect("rate"), money(2000));

    let rate = ledger
        .set_monthly_salary(&driver, money(350_000))
        .expect("set salary");
    assert_eq!(rate, money(1989));
    assert_eq!(ledger.hourly_rate(&driver).expect("rate"), money(1989));

    let err = ledger
        .set_monthly_salary(&driver, Decimal::ZERO)
        .expect_err("zero salary");
    assert!(matches!(
        err.as_validation(),
        Some(ValidationError::InvalidAmount { .. })
    ));
    assert_eq!(ledger.hourly_rate(&driver).expect("rate"), money(1989));

    // Setting a salary keeps previously accrued hours.
    ledger.clock_in(&driver).expect("clock in");
    clock.advance(Duration::hours(9));
    ledger.clock_out(&driver).expect("clock out");
    ledger
        .set_monthly_salary(&driver, money(350_000))
        .expect("set salary again");
    assert_eq!(ledger.gross_pay(&driver).expect("gross pay"), money(17_901));
    assert_salary_consistent(&ledger, &driver);
}

pub fn claim_and_topup_move_balance<S: LedgerStore>(store: S) {
    let (mut ledger, _clock) = ledger(store);
    let driver = driver();
    assert_eq!(ledger.balance(&driver).expect("balance"), Decimal::ZERO);

    let balance = ledger
        .submit_claim(&driver, claim(ClaimCategory::Toll, 5000, Some("photo-1")))
        .expect("claim");
    assert_eq!(balance, money(-5000));

    let balance = ledger
        .topup_today(&driver, money(10_000), &admin())
        .expect("topup");
    assert_eq!(balance, money(5000));
    assert_eq!(ledger.balance(&driver).expect("balance"), money(5000));

    let account = ledger
        .store()
        .account(&driver)
        .expect("account readable")
        .expect("account created");
    assert_eq!(account.claims.len(), 1);
    assert_eq!(account.claims[0].category, ClaimCategory::Toll);
    assert_eq!(account.claims[0].proof.as_str(), "photo-1");
    assert_eq!(account.topups.len(), 1);
    assert_eq!(account.topups[0].initiated_by, admin());
    assert_eq!(account.topups[0].date, business_day());
    assert_account_consistent(&ledger, &driver);
}

pub fn invalid_claims_change_nothing<S: LedgerStore>(store: S) {
    let (mut ledger, _clock) = ledger(store);
    let driver = driver();
    ledger
        .topup_today(&driver, money(2000), &admin())
        .expect("topup");

    let cases = [
        (claim(ClaimCategory::Petrol, 0, Some("p")), "zero amount"),
        (claim(ClaimCategory::Petrol, -100, Some("p")), "negative amount"),
        (claim(ClaimCategory::Petrol, 1000, None), "missing proof"),
        (
            claim(ClaimCategory::Other("  ".to_string()), 1000, Some("p")),
            "blank description",
        ),
    ];
    for (new_claim, case) in cases {
        let err = ledger.submit_claim(&driver, new_claim).expect_err(case);
        assert_eq!(err.kind(), ErrorKind::Validation, "{case}");
    }
    let err = ledger
        .topup_today(&driver, Decimal::ZERO, &admin())
        .expect_err("zero topup");
    assert_eq!(err.kind(), ErrorKind::Validation);

    let account = ledger
        .store()
        .account(&driver)
        .expect("account readable")
        .unwrap_or_default();
    assert_eq!(account.balance, money(2000));
    assert!(account.claims.is_empty());
    assert_eq!(account.topups.len(), 1);
}

pub fn oversized_amounts_are_refused<S: LedgerStore>(store: S) {
    let (mut ledger, _clock) = ledger(store);
    let driver = driver();
    let huge_claim = || NewClaim {
        amount: Decimal::MAX,
        ..claim(ClaimCategory::Toll, 100, Some("p"))
    };

    let balance = ledger
        .submit_claim(&driver, huge_claim())
        .expect("largest claim fits");
    assert_eq!(balance, Decimal::MIN);
    let err = ledger
        .submit_claim(&driver, huge_claim())
        .expect_err("balance below the decimal range");
    assert_eq!(
        err.as_validation(),
        Some(&ValidationError::AmountOutOfRange { value: Decimal::MAX })
    );

    let balance = ledger
        .topup_today(&driver, Decimal::MAX, &admin())
        .expect("topup back to zero");
    assert_eq!(balance, Decimal::ZERO);
    for err in [
        ledger
            .topup_today(&driver, money(100), &admin())
            .expect_err("top-up total overflows"),
        ledger
            .submit_claim(&driver, claim(ClaimCategory::Toll, 100, Some("p")))
            .expect_err("claim total overflows"),
    ] {
        assert_eq!(err.kind(), ErrorKind::Validation, "unexpected error: {err}");
    }

    let account = ledger
        .store()
        .account(&driver)
        .expect("account readable")
        .unwrap_or_default();
    assert_eq!(account.balance, Decimal::ZERO);
    assert_eq!(account.claims.len(), 1);
    assert_eq!(account.topups.len(), 1);
    assert_account_consistent(&ledger, &driver);
}

pub fn oversized_pay_is_reported<S: LedgerStore>(store: S) {
    let (mut ledger, clock) = ledger(store);
    let driver = driver();
    ledger
        .set_monthly_salary(&driver, Decimal::MAX)
        .expect("largest salary is accepted");
    for _ in 0..25 {
        ledger.clock_in(&driver).expect("clock in");
        clock.advance(Duration::hours(9));
        ledger.clock_out(&driver).expect("clock out");
        clock.advance(Duration::hours(15));
    }

    let err = ledger.gross_pay(&driver).expect_err("pay past the decimal range");
    assert_eq!(
        err.as_validation(),
        Some(&ValidationError::TotalOutOfRange { what: "gross pay" })
    );
    let month = DateRange::month_of(business_day());
    let err = ledger
        .driver_summary(&driver, month)
        .expect_err("summary pay past the decimal range");
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_salary_consistent(&ledger, &driver);
}

pub fn unknown_driver_reads_as_empty<S: LedgerStore>(store: S) {
    let (ledger, _clock) = ledger(store);
    let stranger = DriverId::from(404_u64);
    assert_eq!(ledger.balance(&stranger).expect("balance"), Decimal::ZERO);
    assert_eq!(ledger.hourly_rate(&stranger).expect("rate"), money(2000));
    assert_eq!(ledger.gross_pay(&stranger).expect("gross pay"), Decimal::ZERO);
    assert!(
        ledger
            .recent_attendance(&stranger, 7)
            .expect("attendance")
            .is_empty()
    );
    assert_eq!(ledger.driver(&stranger).expect("driver").display_name(), "User 404");
    assert!(ledger.drivers().expect("drivers").is_empty());
    assert!(ledger.balances().expect("balances").is_empty());
}

pub fn drivers_are_recorded_implicitly<S: LedgerStore>(store: S) {
    let (mut ledger, _clock) = ledger(store);
    let first = DriverId::from(2_u64);
    let second = DriverId::from(1_u64);
    ledger.clock_in(&first).expect("clock in");
    ledger
        .topup_today(&second, money(100), &admin())
        .expect("topup");

    let ids: Vec<DriverId> = ledger
        .drivers()
        .expect("drivers")
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![second.clone(), first.clone()]);

    let profile = DriverProfile {
        id: first.clone(),
        username: Some("lorry_king".to_string()),
        first_name: Some("Ali".to_string()),
    };
    ledger.register_driver(&profile).expect("register");
    assert_eq!(ledger.driver(&first).expect("driver"), profile);
    // Registration leaves the driver's records alone.
    assert!(
        ledger
            .attendance(&first, business_day())
            .expect("attendance readable")
            .is_some()
    );

    let balances = ledger.balances().expect("balances");
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0].0.id, second);
    assert_eq!(balances[0].1, money(100));
}

pub fn summary_covers_requested_range<S: LedgerStore>(store: S) {
    let (mut ledger, clock) = ledger(store);
    let driver = driver();
    // Work 2025-03-03 and 2025-03-04, off on 2025-03-05, work 2025-04-01.
    for day in [0, 1] {
        clock.set(opening() + Duration::days(day));
        ledger.clock_in(&driver).expect("clock in");
        clock.advance(Duration::hours(8));
        ledger.clock_out(&driver).expect("clock out");
    }
    let off = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap_or_default();
    ledger.mark_off_day(&driver, off).expect("off day");
    clock.set(Utc.with_ymd_and_hms(2025, 4, 1, 1, 0, 0).single().unwrap_or_default());
    ledger.clock_in(&driver).expect("clock in");
    clock.advance(Duration::hours(4));
    ledger.clock_out(&driver).expect("clock out");
    ledger
        .submit_claim(&driver, claim(ClaimCategory::Petrol, 3000, Some("p")))
        .expect("claim");

    let march = DateRange::month_of(business_day());
    let summary = ledger.driver_summary(&driver, march).expect("summary");
    assert_eq!(summary.attendance.len(), 3);
    assert_eq!(summary.days_worked(), 2);
    assert_eq!(summary.days_off(), 1);
    assert_eq!(summary.hours_in_range, Decimal::from(16));
    assert_eq!(summary.pay_in_range, money(32_000));
    assert_eq!(summary.total_hours, Decimal::from(20));
    assert_eq!(summary.gross_pay, money(40_000));
    assert_eq!(summary.claimed_in_range, money(3000));
    assert_eq!(summary.balance, money(-3000));

    let april = DateRange::month_of(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap_or_default());
    let summary = ledger.driver_summary(&driver, april).expect("summary");
    assert_eq!(summary.attendance.len(), 1);
    assert_eq!(summary.hours_in_range, Decimal::from(4));
    assert!(summary.claims.is_empty());
}

pub fn claims_are_paged_newest_first<S: LedgerStore>(store: S) {
    let (mut ledger, _clock) = ledger(store);
    let driver = driver();
    let other = DriverId::from(2_u64);
    for day in 1..=6 {
        let mut new_claim = claim(ClaimCategory::Toll, i64::from(day) * 100, Some("p"));
        new_claim.date = NaiveDate::from_ymd_opt(2025, 3, day).unwrap_or_default();
        ledger.submit_claim(&driver, new_claim).expect("claim");
    }
    let mut late = claim(ClaimCategory::Petrol, 700, Some("p"));
    late.date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap_or_default();
    ledger.submit_claim(&other, late).expect("claim");

    let page = ledger.claims_page(Some(&driver), 1, 5).expect("page");
    assert_eq!(page.total_claims, 6);
    assert_eq!(page.total_pages, 2);
    let amounts: Vec<Decimal> = page.claims.iter().map(|c| c.claim.amount).collect();
    assert_eq!(
        amounts,
        vec![money(600), money(500), money(400), money(300), money(200)]
    );
    let page = ledger.claims_page(Some(&driver), 2, 5).expect("page");
    assert_eq!(page.claims.len(), 1);
    assert_eq!(page.claims[0].claim.amount, money(100));

    let everyone = ledger.claims_page(None, 1, 5).expect("page");
    assert_eq!(everyone.total_claims, 7);
    assert_eq!(everyone.claims[0].driver, other);
}

pub fn recent_attendance_is_newest_first<S: LedgerStore>(store: S) {
    let (mut ledger, _clock) = ledger(store);
    let driver = driver();
    for day in 1..=9 {
        let date = NaiveDate::from_ymd_opt(2025, 3, day).unwrap_or_default();
        ledger.mark_off_day(&driver, date).expect("off day");
    }
    let recent = ledger.recent_attendance(&driver, 7).expect("recent");
    assert_eq!(recent.len(), 7);
    assert_eq!(recent[0].date, NaiveDate::from_ymd_opt(2025, 3, 9).unwrap_or_default());
    assert_eq!(recent[6].date, NaiveDate::from_ymd_opt(2025, 3, 3).unwrap_or_default());
}

pub fn export_includes_every_driver<S: LedgerStore>(store: S) {
    let (mut ledger, clock) = ledger(store);
    let driver = driver();
    ledger.clock_in(&driver).expect("clock in");
    clock.advance(Duration::hours(1));
    ledger.clock_out(&driver).expect("clock out");
    ledger
        .topup_today(&DriverId::from(2_u64), money(500), &admin())
        .expect("topup");

    let export = ledger.export().expect("export");
    assert_eq!(export.timezone, "Asia/Kuala_Lumpur");
    assert_eq!(export.generated_at, opening() + Duration::hours(1));
    assert_eq!(export.drivers.len(), 2);
    let worker = export
        .drivers
        .iter()
        .find(|d| d.profile.id == driver)
        .expect("driver exported");
    assert_eq!(worker.attendance.len(), 1);
    assert!(worker.salary.is_some());
    assert!(worker.account.is_none());
}

/// Arms a fault with `arm`, then checks that a failed claim leaves the
/// balance and history exactly as they were.
pub fn claim_failure_leaves_account_unchanged<S: LedgerStore>(store: S, arm: impl FnOnce(&mut S)) {
    let (mut ledger, _clock) = ledger(store);
    let driver = driver();
    ledger
        .topup_today(&driver, money(10_000), &admin())
        .expect("topup");
    let before = ledger
        .store()
        .account(&driver)
        .expect("account readable")
        .unwrap_or_default();

    arm(ledger.store_mut());
    let err = ledger
        .submit_claim(&driver, claim(ClaimCategory::Toll, 5000, Some("photo-1")))
        .expect_err("claim should fail");
    assert!(matches!(err, LedgerError::Store(_)), "unexpected error: {err}");
    assert_eq!(err.kind(), ErrorKind::Store);

    let after = ledger
        .store()
        .account(&driver)
        .expect("account readable")
        .unwrap_or_default();
    assert_eq!(after, before);
    assert_account_consistent(&ledger, &driver);
}

/// Arms a fault with `arm`, then checks that a failed top-up leaves the
/// balance and history exactly as they were.
pub fn topup_failure_leaves_account_unchanged<S: LedgerStore>(store: S, arm: impl FnOnce(&mut S)) {
    let (mut ledger, _clock) = ledger(store);
    let driver = driver();
    ledger
        .submit_claim(&driver, claim(ClaimCategory::Petrol, 4000, Some("photo-1")))
        .expect("claim");
    ledger
        .topup_today(&driver, money(10_000), &admin())
        .expect("topup");
    let before = ledger
        .store()
        .account(&driver)
        .expect("account readable")
        .unwrap_or_default();

    arm(ledger.store_mut());
    let err = ledger
        .topup_today(&driver, money(2500), &admin())
        .expect_err("topup should fail");
    assert!(matches!(err, LedgerError::Store(_)), "unexpected error: {err}");

    let after = ledger
        .store()
        .account(&driver)
        .expect("account readable")
        .unwrap_or_default();
    assert_eq!(after, before);
    assert_eq!(ledger.balance(&driver).expect("balance"), money(6000));
    assert_account_consistent(&ledger, &driver);
}

/// Arms a fault with `arm`, then checks that a failed clock-out leaves the
/// day clocked in and the salary untouched.
pub fn clock_out_failure_leaves_salary_unchanged<S: LedgerStore>(
    store: S,
    arm: impl FnOnce(&mut S),
) {
    let (mut ledger, clock) = ledger(store);
    let driver = driver();
    ledger.clock_in(&driver).expect("clock in");
    clock.advance(Duration::hours(3));

    arm(ledger.store_mut());
    let err = ledger.clock_out(&driver).expect_err("clock out should fail");
    assert_eq!(err.kind(), ErrorKind::Store, "unexpected error: {err}");

    let record = ledger
        .attendance(&driver, business_day())
        .expect("attendance readable")
        .expect("attendance stored");
    assert_eq!(record.state(), AttendanceState::ClockedIn { at: opening() });
    let salary = ledger
        .store()
        .salary(&driver)
        .expect("salary readable")
        .unwrap_or_default();
    assert_eq!(salary.total_worked.seconds(), 0);
    assert!(salary.daily.is_empty());
}
