/// Teardown when a producer fails or the caller panics

use ferrous_scope::{AsyncProvider, AsyncScoped, DiError, DiResult, Provider, Scoped};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

#[derive(Debug, thiserror::Error)]
#[error("connection refused by {host}")]
struct ConnectionRefused {
    host: String,
}

struct Pool;
struct Cache;
struct Api;

fn tracked(log: &Log, provider: &mut Provider) {
    let l = log.clone();
    provider
        .include_scoped(move || {
            l.lock().unwrap().push("open pool".to_string());
            let l = l.clone();
            Ok(Scoped::new(Pool).on_release(move |_| l.lock().unwrap().push("close pool".to_string())))
        })
        .unwrap();
    let l = log.clone();
    provider
        .include_scoped(move |_: Arc<Pool>| {
            l.lock().unwrap().push("open cache".to_string());
            let l = l.clone();
            Ok(Scoped::new(Cache).on_release(move |_| l.lock().unwrap().push("close cache".to_string())))
        })
        .unwrap();
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn test_producer_error_releases_in_reverse_and_keeps_source() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut provider = Provider::new();
    tracked(&log, &mut provider);
    provider
        .include_scoped(|_: Arc<Cache>| -> DiResult<Scoped<Api>> {
            Err(DiError::producer(ConnectionRefused {
                host: "api.internal".to_string(),
            }))
        })
        .unwrap();

    let called = Arc::new(Mutex::new(false));
    let c = called.clone();
    let error = provider.build(move |_| *c.lock().unwrap() = true).unwrap_err();

    assert!(!*called.lock().unwrap(), "caller must not run after a failure");
    assert_eq!(
        entries(&log),
        vec!["open pool", "open cache", "close cache", "close pool"]
    );

    let refused = error.producer_source::<ConnectionRefused>().unwrap();
    assert_eq!(refused.host, "api.internal");
    match &error {
        DiError::Producer { key: Some(key), .. } => assert!(key.ends_with("Api")),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(error.to_string().contains("connection refused by api.internal"));
}

#[test]
fn test_caller_panic_releases_everything() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut provider = Provider::new();
    tracked(&log, &mut provider);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        provider.build(|c| {
            assert!(c.contains::<Cache>());
            panic!("handler crashed");
        })
    }));

    let payload = outcome.unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"handler crashed"));
    assert_eq!(
        entries(&log),
        vec!["open pool", "open cache", "close cache", "close pool"]
    );
}

#[test]
fn test_producer_panic_releases_earlier_acquisitions() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut provider = Provider::new();
    tracked(&log, &mut provider);
    provider
        .include(|_: Arc<Cache>| -> Api { panic!("bad config") })
        .unwrap();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| provider.build(|_| ())));
    assert!(outcome.is_err());
    assert_eq!(
        entries(&log),
        vec!["open pool", "open cache", "close cache", "close pool"]
    );
}

#[test]
fn test_failure_is_not_sticky() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let attempts = Arc::new(Mutex::new(0));
    let a = attempts.clone();

    let mut provider = Provider::new();
    tracked(&log, &mut provider);
    provider
        .include_scoped(move |_: Arc<Cache>| {
            let mut attempts = a.lock().unwrap();
            *attempts += 1;
            if *attempts == 1 {
                Err(DiError::producer(ConnectionRefused {
                    host: "flaky".to_string(),
                }))
            } else {
                Ok(Scoped::new(Api))
            }
        })
        .unwrap();

    assert!(provider.build(|_| ()).is_err());
    assert!(provider.build(|c| c.contains::<Api>()).unwrap());
    assert_eq!(entries(&log).len(), 8);
}

#[tokio::test]
async fn test_async_producer_error_awaits_releases() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut provider = AsyncProvider::new();

    let l = log.clone();
    provider
        .include_async_scoped(move || {
            let l = l.clone();
            async move {
                l.lock().unwrap().push("open pool".to_string());
                Ok::<_, DiError>(AsyncScoped::new(Pool).on_release_async(move |_| async move {
                    tokio::task::yield_now().await;
                    l.lock().unwrap().push("close pool".to_string());
                }))
            }
        })
        .unwrap()
        .include_async_scoped(|_: Arc<Pool>| async {
            Err::<AsyncScoped<Api>, _>(DiError::producer(ConnectionRefused {
                host: "async".to_string(),
            }))
        })
        .unwrap();

    let error = provider.build_async(|_| async {}).await.unwrap_err();
    assert!(error.producer_source::<ConnectionRefused>().is_some());
    assert_eq!(entries(&log), vec!["open pool", "close pool"]);
}

#[tokio::test]
async fn test_async_caller_error_still_closes() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut sync = Provider::new();
    tracked(&log, &mut sync);
    let provider = sync.into_async();

    let result: DiResult<Result<(), String>> = provider
        .build_async(|_| async { Err("handler failed".to_string()) })
        .await;

    assert_eq!(result.unwrap(), Err("handler failed".to_string()));
    assert_eq!(
        entries(&log),
        vec!["open pool", "open cache", "close cache", "close pool"]
    );
}

async fn broken_api(_: Arc<Cache>) -> Api {
    panic!("bad config")
}

#[tokio::test]
async fn test_async_caller_panic_releases_everything() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut sync = Provider::new();
    tracked(&log, &mut sync);
    let provider = sync.into_async();

    let joined = tokio::spawn(async move {
        provider
            .build_async(|c| async move {
                assert!(c.contains::<Cache>());
                panic!("handler crashed")
            })
            .await
    })
    .await;

    let payload = joined.unwrap_err().into_panic();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"handler crashed"));
    assert_eq!(
        entries(&log),
        vec!["open pool", "open cache", "close cache", "close pool"]
    );
}

#[tokio::test]
async fn test_async_producer_panic_releases_earlier_acquisitions() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut sync = Provider::new();
    tracked(&log, &mut sync);
    let mut provider = sync.into_async();
    provider.include_async(broken_api).unwrap();

    let joined = tokio::spawn(async move { provider.build_async(|_| async {}).await }).await;

    assert!(joined.unwrap_err().is_panic());
    assert_eq!(
        entries(&log),
        vec!["open pool", "open cache", "close cache", "close pool"]
    );
}
