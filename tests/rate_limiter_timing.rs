use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use event_impact::data::{DataError, RateLimitConfig, RateLimiter};

fn assert_elapsed_near(start: Instant, expected: Duration) {
    let elapsed = start.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(10),
        "expected ~{:?}, got {:?}",
        expected,
        elapsed
    );
}

#[tokio::test(start_paused = true)]
async fn test_reservations_under_quota_do_not_wait() {
    let limiter = RateLimiter::default();
    let start = Instant::now();

    for _ in 0..5 {
        limiter.reserve().await;
    }

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(limiter.in_flight().await, 5);
}

#[tokio::test(start_paused = true)]
async fn test_reservation_over_quota_waits_for_window() {
    let limiter = RateLimiter::default();
    let start = Instant::now();

    for _ in 0..5 {
        limiter.reserve().await;
    }
    limiter.reserve().await;

    let waited = start.elapsed();
    // window (60s) plus the 1s safety margin
    assert!(waited >= Duration::from_secs(60), "waited only {:?}", waited);
    assert!(waited <= Duration::from_millis(61_050), "waited too long: {:?}", waited);

    // the first five aged out, only the sixth remains
    assert_eq!(limiter.in_flight().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_wait_tracks_oldest_request() {
    let limiter = RateLimiter::new(RateLimitConfig {
        max_requests: 2,
        window: Duration::from_secs(10),
        safety_margin: Duration::ZERO,
    });
    let start = Instant::now();

    limiter.reserve().await;
    tokio::time::advance(Duration::from_secs(3)).await;
    limiter.reserve().await;

    // third waits for the first to age out at t=10s
    limiter.reserve().await;
    assert_elapsed_near(start, Duration::from_secs(10));

    // fourth waits for the second (t=3s) to age out at t=13s
    limiter.reserve().await;
    assert_elapsed_near(start, Duration::from_secs(13));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_respect_quota() {
    let config = RateLimitConfig {
        max_requests: 3,
        window: Duration::from_secs(60),
        safety_margin: Duration::from_millis(1000),
    };
    let limiter = Arc::new(RateLimiter::new(config));
    let start = Instant::now();

    let mut handles = vec![];

    // Spawn 7 concurrent reservations
    for _ in 0..7 {
        let limiter_clone = Arc::clone(&limiter);
        let handle = tokio::spawn(async move {
            limiter_clone.reserve().await;
            Instant::now()
        });
        handles.push(handle);
    }

    let results = futures::future::join_all(handles).await;

    let mut granted: Vec<Duration> = results
        .into_iter()
        .map(|r| r.expect("Task panicked").duration_since(start))
        .collect();
    granted.sort();

    // No trailing 60s window may contain more than 3 grants
    for (i, at) in granted.iter().enumerate() {
        let in_window = granted[i..]
            .iter()
            .take_while(|later| **later - *at < Duration::from_secs(60))
            .count();
        assert!(in_window <= 3, "{} grants within 60s of {:?}", in_window, at);
    }

    assert_eq!(granted.iter().filter(|t| t.is_zero()).count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_accessors_answer_while_a_reservation_waits() {
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        max_requests: 1,
        window: Duration::from_secs(60),
        safety_margin: Duration::from_millis(1000),
    }));
    limiter.reserve().await;

    let waiter = {
        let limiter = Arc::clone(&limiter);
        tokio::spawn(async move { limiter.reserve().await })
    };

    // let the spawned reservation start its wait
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!waiter.is_finished());

    let start = Instant::now();
    let wait = limiter.time_until_slot().await;
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(wait, Duration::from_millis(60_990));
    assert_eq!(limiter.in_flight().await, 1);
    assert_eq!(start.elapsed(), Duration::ZERO);

    waiter.await.expect("Task panicked");
    assert_elapsed_near(start, Duration::from_millis(60_990));
    assert_eq!(limiter.in_flight().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_reservation_records_nothing() {
    let limiter = RateLimiter::new(RateLimitConfig {
        max_requests: 1,
        window: Duration::from_secs(60),
        safety_margin: Duration::from_millis(1000),
    });
    limiter.reserve().await;

    let result = limiter
        .reserve_or_cancel(tokio::time::sleep(Duration::from_secs(5)))
        .await;
    assert!(matches!(result, Err(DataError::Cancelled)));
    assert_eq!(limiter.in_flight().await, 1);

    // an uncancelled reservation still goes through once the window frees up
    let result = limiter
        .reserve_or_cancel(tokio::time::sleep(Duration::from_secs(600)))
        .await;
    assert!(result.is_ok());
    assert_eq!(limiter.in_flight().await, 1);
}
