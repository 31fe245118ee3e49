use std::time::Duration;
use surveyor::rate_limit::{
    check_login_rate_limit, check_otp_rate_limit, check_registration_rate_limit,
    check_submission_rate_limit, clear_login_attempts, RateLimiter,
};

#[test]
fn test_login_rate_limit_allows_within_limit() {
    // Should allow 5 login attempts per window
    for i in 0..5 {
        let result = check_login_rate_limit("192.168.1.1", "tester@example.com");
        assert!(
            result.is_ok(),
            "Login attempt {} should be allowed within rate limit",
            i + 1
        );
    }
}

#[test]
fn test_login_rate_limit_blocks_over_limit() {
    for _ in 0..5 {
        check_login_rate_limit("192.168.1.2", "blocked@example.com").unwrap();
    }

    let result = check_login_rate_limit("192.168.1.2", "blocked@example.com");
    assert!(result.is_err(), "6th attempt should be blocked");
    assert!(result.unwrap_err().retry_after_seconds > 0);

    // The same address may still try another account
    assert!(check_login_rate_limit("192.168.1.2", "other@example.com").is_ok());
}

#[test]
fn test_successful_login_clears_attempts() {
    for _ in 0..5 {
        check_login_rate_limit("192.168.1.3", "cleared@example.com").unwrap();
    }
    clear_login_attempts("192.168.1.3", "cleared@example.com");
    assert!(check_login_rate_limit("192.168.1.3", "cleared@example.com").is_ok());
}

#[test]
fn test_registration_rate_limit() {
    for _ in 0..5 {
        assert!(check_registration_rate_limit("10.1.1.1").is_ok());
    }
    assert!(check_registration_rate_limit("10.1.1.1").is_err());
    assert!(check_registration_rate_limit("10.1.1.2").is_ok());
}

#[test]
fn test_otp_rate_limit() {
    for _ in 0..5 {
        assert!(check_otp_rate_limit("10.2.2.2").is_ok());
    }
    let err = check_otp_rate_limit("10.2.2.2").unwrap_err();
    assert!(err.to_string().starts_with("Too many attempts"));
}

#[test]
fn test_submission_rate_limit() {
    for _ in 0..30 {
        assert!(check_submission_rate_limit("10.3.3.3").is_ok());
    }
    assert!(check_submission_rate_limit("10.3.3.3").is_err());
}

#[test]
fn test_window_expiry() {
    let limiter = RateLimiter::new();
    let window = Duration::from_millis(50);

    assert!(limiter.check_rate_limit("test", "user", 1, window).is_ok());
    assert!(limiter.check_rate_limit("test", "user", 1, window).is_err());

    std::thread::sleep(Duration::from_millis(80));
    assert!(limiter.check_rate_limit("test", "user", 1, window).is_ok());
}

#[test]
fn test_cleanup_removes_stale_keys() {
    let limiter = RateLimiter::new();
    limiter
        .check_rate_limit("test", "a", 5, Duration::from_secs(60))
        .unwrap();
    limiter
        .check_rate_limit("test", "b", 5, Duration::from_secs(60))
        .unwrap();
    assert_eq!(limiter.tracked_keys_count(), 2);

    std::thread::sleep(Duration::from_millis(20));
    limiter.cleanup_old_entries(Duration::from_millis(10));
    assert_eq!(limiter.tracked_keys_count(), 0);
}
