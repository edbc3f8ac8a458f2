use std::{
    sync::atomic::{AtomicU32, Ordering},
    thread,
    time::Duration,
};

use contact_relay::{
    admission::{check_origin, AdmissionDecision, RateDecision},
    clock::ManualClock,
    limiter::rate_limiter::FixedWindowLimiter,
};

const WINDOW: Duration = Duration::from_secs(60);
const IDLE_TTL: Duration = Duration::from_secs(600);

fn limiter(limit: u32) -> (FixedWindowLimiter, ManualClock) {
    let clock = ManualClock::default();
    let limiter = FixedWindowLimiter::with_clock(limit, WINDOW, IDLE_TTL, clock.clone());
    (limiter, clock)
}

#[test]
fn allows_up_to_limit_then_rejects() {
    let (limiter, _clock) = limiter(3);

    let remaining: Vec<u32> = (0..3)
        .map(|_| {
            let decision = limiter.check_and_record("1.2.3.4:/api/contact");
            assert!(decision.allowed);
            decision.remaining
        })
        .collect();
    assert_eq!(remaining, vec![2, 1, 0]);

    let decision = limiter.check_and_record("1.2.3.4:/api/contact");
    assert!(!decision.allowed);
    assert_eq!(decision.remaining, 0);
    assert_eq!(decision.limit, 3);
    assert_eq!(decision.resets_in, WINDOW);
}

#[test]
fn window_rolls_over_exactly_at_boundary() {
    let (limiter, clock) = limiter(1);
    let key = "1.2.3.4:/api/contact";

    assert!(limiter.check_and_record(key).allowed);

    clock.advance(WINDOW - Duration::from_millis(1));
    let decision = limiter.check_and_record(key);
    assert!(!decision.allowed);
    assert_eq!(decision.retry_after_secs(), 1);

    clock.advance(Duration::from_millis(1));
    assert!(limiter.check_and_record(key).allowed);
}

#[test]
fn rejected_hits_do_not_extend_the_window() {
    let (limiter, clock) = limiter(1);
    let key = "1.2.3.4:/api/contact";
    limiter.check_and_record(key);

    for _ in 0..5 {
        clock.advance(Duration::from_secs(10));
        assert!(!limiter.check_and_record(key).allowed);
    }

    clock.advance(Duration::from_secs(10));
    assert!(limiter.check_and_record(key).allowed);
}

#[test]
fn keys_have_independent_budgets() {
    let (limiter, _clock) = limiter(1);

    assert!(limiter.check_and_record("1.2.3.4:/api/contact").allowed);
    assert!(!limiter.check_and_record("1.2.3.4:/api/contact").allowed);
    assert!(limiter.check_and_record("5.6.7.8:/api/contact").allowed);
    assert!(limiter.check_and_record("1.2.3.4:/api/other").allowed);
    assert_eq!(limiter.tracked_keys(), 3);
}

#[test]
fn refund_returns_a_slot_within_the_window() {
    let (limiter, _clock) = limiter(2);
    let key = "1.2.3.4:/api/contact";

    limiter.check_and_record(key);
    limiter.check_and_record(key);
    limiter.refund(key);

    let decision = limiter.check_and_record(key);
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 0);
}

#[test]
fn refund_after_rejections_frees_exactly_one_slot() {
    let (limiter, _clock) = limiter(2);
    let key = "1.2.3.4:/api/contact";

    limiter.check_and_record(key);
    limiter.check_and_record(key);
    for _ in 0..4 {
        assert!(!limiter.check_and_record(key).allowed);
    }
    limiter.refund(key);

    let decision = limiter.check_and_record(key);
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 0);
    assert!(!limiter.check_and_record(key).allowed);
}

#[test]
fn refund_of_unknown_key_is_a_no_op() {
    let (limiter, _clock) = limiter(2);

    limiter.refund("never-seen");

    assert_eq!(limiter.tracked_keys(), 0);
}

#[test]
fn purge_drops_only_idle_closed_windows() {
    let (limiter, clock) = limiter(5);
    limiter.check_and_record("idle");

    clock.advance(IDLE_TTL);
    limiter.check_and_record("active");
    assert_eq!(limiter.purge_idle(), 0);

    clock.advance(Duration::from_secs(1));
    assert_eq!(limiter.purge_idle(), 1);
    assert_eq!(limiter.tracked_keys(), 1);
}

#[test]
fn purged_key_starts_a_tracked_window_again() {
    let (limiter, clock) = limiter(1);
    let key = "1.2.3.4:/api/contact";

    limiter.check_and_record(key);
    clock.advance(WINDOW + IDLE_TTL + Duration::from_secs(1));
    assert_eq!(limiter.purge_idle(), 1);

    assert!(limiter.check_and_record(key).allowed);
    assert_eq!(limiter.tracked_keys(), 1);
    assert!(!limiter.check_and_record(key).allowed);
}

#[test]
fn concurrent_hits_never_exceed_limit() {
    let (limiter, _clock) = limiter(50);
    let allowed = AtomicU32::new(0);

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..25 {
                    if limiter.check_and_record("shared").allowed {
                        allowed.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    assert_eq!(allowed.load(Ordering::SeqCst), 50);
}

#[test]
fn retry_after_rounds_up_and_is_at_least_one() {
    let decision = |resets_in| RateDecision { allowed: false, limit: 5, remaining: 0, resets_in };

    assert_eq!(decision(Duration::from_millis(1500)).retry_after_secs(), 2);
    assert_eq!(decision(Duration::from_secs(42)).retry_after_secs(), 42);
    assert_eq!(decision(Duration::ZERO).retry_after_secs(), 1);
}

#[test]
fn rate_decision_maps_to_admission() {
    let allowed = RateDecision { allowed: true, limit: 5, remaining: 4, resets_in: WINDOW };
    let denied = RateDecision { allowed: false, remaining: 0, ..allowed };

    assert_eq!(AdmissionDecision::from(&allowed), AdmissionDecision::allow());

    let admission = AdmissionDecision::from(&denied);
    assert!(!admission.allowed);
    assert!(admission.reason.unwrap().contains("rate limit of 5"));
}

#[test]
fn origin_check_is_exact_and_ignores_absent_origin() {
    let allowed = vec!["https://example.com".to_string(), "http://localhost:3000".to_string()];

    assert!(check_origin(None, &allowed).allowed);
    assert!(check_origin(Some("https://example.com"), &allowed).allowed);
    assert!(check_origin(Some("http://localhost:3000"), &allowed).allowed);

    for origin in ["https://example.com/", "https://EXAMPLE.com", "https://sub.example.com", "null", ""] {
        let decision = check_origin(Some(origin), &allowed);
        assert!(!decision.allowed, "{origin} should be rejected");
        assert!(decision.reason.is_some());
    }
}

#[test]
fn empty_allow_list_rejects_every_browser_origin() {
    assert!(!check_origin(Some("http://localhost:3000"), &[]).allowed);
    assert!(check_origin(None, &[]).allowed);
}
