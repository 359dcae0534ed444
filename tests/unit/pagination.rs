//! Unit tests for offset pagination

use geo_bulk_fetcher::fetcher::pagination::{DrainStop, PageCursor, PageDrain};
use geo_bulk_fetcher::fetcher::FetchOutcome;
use std::sync::{Arc, Mutex};

/// Serves `total` numbered results in pages, recording each requested offset
#[derive(Clone)]
struct FakeResultSet {
    total: usize,
    offsets: Arc<Mutex<Vec<usize>>>,
}

impl FakeResultSet {
    fn new(total: usize) -> Self {
        Self {
            total,
            offsets: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn page(&self, cursor: PageCursor) -> FetchOutcome<Vec<usize>> {
        self.offsets.lock().unwrap().push(cursor.offset);
        let end = (cursor.offset + cursor.page_size).min(self.total);
        FetchOutcome::Success((cursor.offset.min(end)..end).collect())
    }

    fn offsets(&self) -> Vec<usize> {
        self.offsets.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn test_two_full_pages_and_a_short_one() {
    let results = FakeResultSet::new(599);
    let drained = PageDrain::new(200)
        .drain("cell", |cursor| {
            let page = results.page(cursor);
            async move { page }
        })
        .await;

    assert_eq!(results.offsets(), vec![0, 200, 400]);
    assert_eq!(drained.pages, 3);
    assert_eq!(drained.items.len(), 599);
    assert_eq!(drained.items, (0..599).collect::<Vec<_>>());
    assert!(drained.is_complete());
}

#[tokio::test]
async fn test_exact_multiple_needs_one_empty_page() {
    let results = FakeResultSet::new(400);
    let drained = PageDrain::new(200)
        .drain("cell", |cursor| {
            let page = results.page(cursor);
            async move { page }
        })
        .await;

    assert_eq!(results.offsets(), vec![0, 200, 400]);
    assert_eq!(drained.items.len(), 400);
    assert_eq!(drained.stop, DrainStop::Exhausted);
}

#[tokio::test]
async fn test_persistent_failure_terminates() {
    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    let drained = PageDrain::new(200)
        .drain::<usize, _, _>("cell", move |_| {
            *counter.lock().unwrap() += 1;
            async { FetchOutcome::RateLimited }
        })
        .await;

    assert_eq!(*calls.lock().unwrap(), 1);
    assert!(drained.items.is_empty());
    assert_eq!(drained.stop, DrainStop::Failed(FetchOutcome::RateLimited));
    assert!(!drained.is_complete());
}

#[tokio::test]
async fn test_page_size_of_zero_is_treated_as_one() {
    let results = FakeResultSet::new(3);
    let drained = PageDrain::new(0)
        .drain("cell", |cursor| {
            let page = results.page(cursor);
            async move { page }
        })
        .await;

    assert_eq!(drained.items, vec![0, 1, 2]);
    assert_eq!(drained.pages, 4);
}
