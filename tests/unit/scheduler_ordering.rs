//! Unit tests for the batch scheduler: ordering, windows and the pool cap

use futures::future::join_all;
use geo_bulk_fetcher::fetcher::FetchOutcome;
use geo_bulk_fetcher::scheduler::{BatchConfig, BatchScheduler, RetryPolicy, WorkItem};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};

const TICK: Duration = Duration::from_secs(1);

async fn echo(item: WorkItem<u32>) -> u32 {
    item.payload
}

fn config(window: usize, pool: usize) -> BatchConfig {
    BatchConfig::default()
        .with_window_size(window)
        .with_pool_cap(pool)
        .with_tick(TICK)
}

#[tokio::test(start_paused = true)]
async fn test_results_follow_input_order_despite_completion_order() {
    let scheduler = BatchScheduler::new(&config(5, 10)).unwrap();
    // later items finish first
    let delays: Vec<u64> = vec![900, 700, 500, 300, 100, 50, 20];

    let results = scheduler
        .run(delays.clone(), |item| async move {
            sleep(Duration::from_millis(item.payload)).await;
            format!("done-{}", item.index)
        })
        .await
        .unwrap();

    assert_eq!(results.len(), delays.len());
    for (i, record) in results.iter().enumerate() {
        assert_eq!(record.index, i);
        assert_eq!(record.outcome, format!("done-{i}"));
    }
}

#[tokio::test(start_paused = true)]
async fn test_twelve_items_with_window_five_take_two_ticks() {
    let scheduler = BatchScheduler::new(&config(5, 20)).unwrap();
    assert_eq!(scheduler.window_count(12), 3);

    let start = Instant::now();
    let dispatched = Arc::new(Mutex::new(Vec::new()));
    let log = dispatched.clone();

    scheduler
        .run((0..12).collect::<Vec<u32>>(), move |item| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push((item.index, start.elapsed()));
                item.payload
            }
        })
        .await
        .unwrap();

    let mut dispatched = dispatched.lock().unwrap().clone();
    dispatched.sort_by_key(|(index, _)| *index);

    let tick_of = |elapsed: Duration| elapsed.as_secs();
    let first: Vec<u64> = dispatched[0..5].iter().map(|(_, t)| tick_of(*t)).collect();
    let second: Vec<u64> = dispatched[5..10].iter().map(|(_, t)| tick_of(*t)).collect();
    let third: Vec<u64> = dispatched[10..12].iter().map(|(_, t)| tick_of(*t)).collect();

    assert_eq!(first, vec![0; 5]);
    assert_eq!(second, vec![1; 5]);
    assert_eq!(third, vec![2; 2]);
}

#[tokio::test(start_paused = true)]
async fn test_slow_requests_do_not_delay_next_window() {
    let scheduler = BatchScheduler::new(&config(2, 10)).unwrap();
    let start = Instant::now();
    let dispatched = Arc::new(Mutex::new(Vec::new()));
    let log = dispatched.clone();

    scheduler
        .run(vec![(); 4], move |item| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push((item.index, start.elapsed()));
                // far longer than a tick
                sleep(Duration::from_secs(10)).await;
            }
        })
        .await
        .unwrap();

    let dispatched = dispatched.lock().unwrap();
    let second_window_start = dispatched
        .iter()
        .filter(|(index, _)| *index >= 2)
        .map(|(_, t)| *t)
        .min()
        .unwrap();
    assert_eq!(second_window_start, TICK);
}

#[tokio::test(start_paused = true)]
async fn test_pool_cap_bounds_requests_in_flight() {
    let scheduler = BatchScheduler::new(&config(10, 3)).unwrap();
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let (current, max_seen) = (in_flight.clone(), peak.clone());
    let results = scheduler
        .run((0..10).collect::<Vec<usize>>(), move |item| {
            let current = current.clone();
            let max_seen = max_seen.clone();
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                sleep(Duration::from_millis(200)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                item.payload
            }
        })
        .await
        .unwrap();

    assert_eq!(results.len(), 10);
    assert_eq!(peak.load(Ordering::SeqCst), 3);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_separate_schedulers_do_not_share_a_clock() {
    let a = BatchScheduler::new(&config(5, 10)).unwrap();
    let b = BatchScheduler::new(&config(5, 10)).unwrap();
    let start = Instant::now();

    // each run fits in one window; a shared limiter would push one to the next tick
    let runs = join_all(vec![
        a.run(vec![1u32; 5], echo),
        b.run(vec![2u32; 5], echo),
    ])
    .await;

    assert_eq!(start.elapsed(), Duration::ZERO);
    for run in runs {
        assert_eq!(run.unwrap().len(), 5);
    }
}

#[tokio::test(start_paused = true)]
async fn test_every_item_gets_an_outcome_even_when_failing() {
    let scheduler = BatchScheduler::new(&config(4, 4)).unwrap();
    let retry = RetryPolicy::new(2, Duration::from_millis(100));

    let results = scheduler
        .run((0..6).collect::<Vec<usize>>(), move |item| async move {
            let value = item.payload;
            let label = item.index.to_string();
            retry
                .run(&label, |_| async move {
                    if value % 2 == 0 {
                        FetchOutcome::Success(value)
                    } else {
                        FetchOutcome::ServerError(503)
                    }
                })
                .await
        })
        .await
        .unwrap();

    let outcomes: Vec<_> = results.into_iter().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            FetchOutcome::Success(0),
            FetchOutcome::ServerError(503),
            FetchOutcome::Success(2),
            FetchOutcome::ServerError(503),
            FetchOutcome::Success(4),
            FetchOutcome::ServerError(503),
        ]
    );
}
