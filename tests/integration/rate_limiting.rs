//! Integration tests for tick-based rate limiting

use geo_bulk_fetcher::scheduler::RateLimiter;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_allowance_refills_one_tick_after_grant() {
    let limiter = RateLimiter::per_tick(3, Duration::from_millis(500));
    let start = Instant::now();

    let first = limiter.acquire(3).await.unwrap();
    let second = limiter.acquire(3).await.unwrap();
    let third = limiter.acquire(1).await.unwrap();

    assert_eq!(first.duration_since(start), Duration::ZERO);
    assert_eq!(second.duration_since(start), Duration::from_millis(500));
    assert_eq!(third.duration_since(start), Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_single_permits_spread_over_ticks() {
    let limiter = RateLimiter::per_tick(2, Duration::from_secs(1));
    let start = Instant::now();
    let mut grants = Vec::new();
    for _ in 0..6 {
        grants.push(limiter.acquire(1).await.unwrap().duration_since(start).as_secs());
    }
    assert_eq!(grants, vec![0, 0, 1, 1, 2, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_clones_share_one_allowance() {
    let limiter = RateLimiter::per_tick(2, Duration::from_secs(1));
    let other = limiter.clone();
    let start = Instant::now();

    limiter.acquire(2).await.unwrap();
    let granted = other.acquire(1).await.unwrap();
    assert_eq!(granted.duration_since(start), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_separate_limiters_are_independent() {
    let a = RateLimiter::per_tick(2, Duration::from_secs(1));
    let b = RateLimiter::per_tick(2, Duration::from_secs(1));
    let start = Instant::now();

    a.acquire(2).await.unwrap();
    let granted = b.acquire(2).await.unwrap();
    assert_eq!(granted.duration_since(start), Duration::ZERO);
}
