/// Concurrent access integration tests
///
/// These tests verify that one provider can serve many build passes at once:
/// seed values are shared, factory outputs are per pass, and every pass
/// releases exactly what it acquired.

use ferrous_scope::{AsyncProvider, AsyncScoped, DiError, Provider, Scoped};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

// ===== Test Services =====

#[derive(Debug)]
pub struct SharedResource {
    data: Mutex<Vec<String>>,
    access_count: AtomicU32,
}

impl SharedResource {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(Vec::new()),
            access_count: AtomicU32::new(0),
        }
    }

    pub fn add_entry(&self, entry: String) {
        self.data.lock().unwrap().push(entry);
        self.access_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn entries(&self) -> Vec<String> {
        self.data.lock().unwrap().clone()
    }
}

#[derive(Debug)]
pub struct Session {
    id: usize,
    created_on: thread::ThreadId,
}

#[derive(Debug)]
pub struct Worker {
    session: Arc<Session>,
    resource: Arc<SharedResource>,
}

impl Worker {
    fn record(&self, what: &str) {
        self.resource
            .add_entry(format!("session-{}:{}", self.session.id, what));
    }
}

struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    live: AtomicUsize,
    peak: AtomicUsize,
}

impl Counters {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
            live: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }
}

fn app_provider(counters: Arc<Counters>) -> Provider {
    let mut provider = Provider::new().with_value(SharedResource::new());
    provider
        .include_scoped(move || {
            let id = counters.opened.fetch_add(1, Ordering::SeqCst);
            let live = counters.live.fetch_add(1, Ordering::SeqCst) + 1;
            counters.peak.fetch_max(live, Ordering::SeqCst);
            let counters = counters.clone();
            Ok(Scoped::new(Session {
                id,
                created_on: thread::current().id(),
            })
            .on_release(move |_| {
                counters.live.fetch_sub(1, Ordering::SeqCst);
                counters.closed.fetch_add(1, Ordering::SeqCst);
            }))
        })
        .unwrap()
        .include(|session: Arc<Session>, resource: Arc<SharedResource>| Worker { session, resource })
        .unwrap();
    provider
}

// ===== Tests =====

#[test]
fn test_parallel_builds_share_seeds_but_not_outputs() {
    const THREADS: usize = 8;

    let counters = Counters::new();
    let provider = Arc::new(app_provider(counters.clone()));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let provider = provider.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                provider
                    .build(|c| {
                        let worker = c.require::<Worker>().unwrap();
                        worker.record(&format!("thread-{}", i));
                        assert_eq!(worker.session.created_on, thread::current().id());
                        (worker.session.id, worker.resource.clone())
                    })
                    .unwrap()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let sessions: HashSet<usize> = results.iter().map(|(id, _)| *id).collect();
    assert_eq!(sessions.len(), THREADS, "each pass opens its own session");

    let first = &results[0].1;
    assert!(results.iter().all(|(_, r)| Arc::ptr_eq(r, first)), "seed is shared");
    assert_eq!(first.entries().len(), THREADS);
    assert_eq!(first.access_count.load(Ordering::SeqCst), THREADS as u32);

    assert_eq!(counters.opened.load(Ordering::SeqCst), THREADS);
    assert_eq!(counters.closed.load(Ordering::SeqCst), THREADS);
    assert_eq!(counters.live.load(Ordering::SeqCst), 0);
}

#[test]
fn test_overlapping_scopes_release_independently() {
    let counters = Counters::new();
    let provider = Arc::new(app_provider(counters.clone()));
    let inside = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let provider = provider.clone();
            let inside = inside.clone();
            thread::spawn(move || {
                provider
                    .build(|_| {
                        // Both passes hold their session at the same time
                        inside.wait();
                    })
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(counters.peak.load(Ordering::SeqCst), 2);
    assert_eq!(counters.live.load(Ordering::SeqCst), 0);
}

#[test]
fn test_failing_passes_do_not_disturb_others() {
    struct Audit;

    let counters = Counters::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let mut flaky = app_provider(counters.clone());
    let c = calls.clone();
    flaky
        .include_scoped(move |worker: Arc<Worker>| {
            worker.record("audit");
            if c.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                Err(DiError::producer(std::io::Error::other("audit log unavailable")))
            } else {
                Ok(Scoped::new(Audit))
            }
        })
        .unwrap();
    let flaky = Arc::new(flaky);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let flaky = flaky.clone();
            thread::spawn(move || flaky.build(|c| c.len()))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    assert_eq!(failed, 3);
    assert!(results.iter().flatten().all(|&len| len == 4));

    // Failed passes still released their sessions
    assert_eq!(counters.opened.load(Ordering::SeqCst), 6);
    assert_eq!(counters.closed.load(Ordering::SeqCst), 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_async_builds() {
    let open = Arc::new(AtomicUsize::new(0));
    let o = open.clone();

    let mut provider = AsyncProvider::new().with_value(SharedResource::new());
    provider
        .include_async_scoped(move || {
            let open = o.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                let id = open.fetch_add(1, Ordering::SeqCst);
                Ok::<_, DiError>(
                    AsyncScoped::new(Session {
                        id,
                        created_on: thread::current().id(),
                    })
                    .on_release_async(move |_| async move {
                        tokio::time::sleep(Duration::from_millis(1)).await;
                        open.fetch_sub(1, Ordering::SeqCst);
                    }),
                )
            }
        })
        .unwrap()
        .include(|session: Arc<Session>, resource: Arc<SharedResource>| Worker { session, resource })
        .unwrap();
    let provider = Arc::new(provider);

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let provider = provider.clone();
            tokio::spawn(async move {
                provider
                    .build_async(|c| async move {
                        c.require::<Worker>().unwrap().record(&format!("task-{}", i));
                    })
                    .await
                    .unwrap()
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let resource = provider
        .build_async(|c| async move { c.require::<SharedResource>().unwrap() })
        .await
        .unwrap();
    assert_eq!(resource.entries().len(), 16);
    assert_eq!(open.load(Ordering::SeqCst), 0);
}
