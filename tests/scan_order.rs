/// Deterministic acquisition order under both scan strategies

use ferrous_scope::config::{SCAN_ORDER_ENV, TRACE_STEPS_ENV};
use ferrous_scope::{
    AnyArc, FactoryBuilder, Key, Provider, ResolveConfig, ScanOrder, Scoped,
};
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<&'static str>>>;

/// Registers `name` depending on `inputs`, logging its acquisition.
fn node(provider: &mut Provider, log: &Log, name: &'static str, inputs: &[&'static str]) {
    let mut builder = FactoryBuilder::new().output(Key::Token(name));
    for input in inputs {
        builder = builder.input(Key::Token(*input));
    }
    let log = log.clone();
    let factory = builder
        .build_sync(move |_: &[AnyArc]| {
            log.lock().unwrap().push(name);
            Ok(Scoped::from_arc(Arc::new(name) as AnyArc))
        })
        .unwrap();
    provider.include_factory(factory);
}

fn acquisition_order(config: ResolveConfig, nodes: &[(&'static str, &[&'static str])]) -> Vec<&'static str> {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut provider = Provider::new().with_config(config);
    for &(name, inputs) in nodes {
        node(&mut provider, &log, name, inputs);
    }
    provider.build(|_| ()).unwrap();
    let order = log.lock().unwrap().clone();
    order
}

const GRAPH: [(&str, &[&str]); 5] = [
    ("handler", &["service", "logger"]),
    ("service", &["repo"]),
    ("logger", &[]),
    ("repo", &[]),
    ("audit", &["logger"]),
];

#[test]
fn test_registration_order_rescans_from_the_start() {
    let order = acquisition_order(ResolveConfig::default(), &GRAPH);
    assert_eq!(order, vec!["logger", "repo", "service", "handler", "audit"]);
}

#[test]
fn test_key_order_picks_smallest_solvable_key() {
    let config = ResolveConfig::default().scan_order(ScanOrder::KeyOrder);
    let order = acquisition_order(config, &GRAPH);
    assert_eq!(order, vec!["logger", "audit", "repo", "service", "handler"]);
}

#[test]
fn test_only_key_order_ignores_registration_order() {
    let mut reversed = GRAPH;
    reversed.reverse();

    let by_key = ResolveConfig::default().scan_order(ScanOrder::KeyOrder);
    assert_eq!(
        acquisition_order(by_key.clone(), &GRAPH),
        acquisition_order(by_key, &reversed)
    );

    assert_eq!(
        acquisition_order(ResolveConfig::default(), &reversed),
        vec!["repo", "logger", "audit", "service", "handler"]
    );
}

#[test]
fn test_trace_steps_do_not_change_order() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ferrous_scope=trace")
        .with_test_writer()
        .try_init();

    for scan_order in [ScanOrder::Registration, ScanOrder::KeyOrder] {
        let quiet = ResolveConfig::default().scan_order(scan_order);
        let chatty = quiet.clone().trace_steps(true);
        assert_eq!(acquisition_order(quiet, &GRAPH), acquisition_order(chatty, &GRAPH));
    }
}

#[test]
fn test_config_from_lookup() {
    let config = ResolveConfig::from_lookup(|name| match name {
        SCAN_ORDER_ENV => Some("key_order".to_string()),
        TRACE_STEPS_ENV => Some("on".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config, ResolveConfig::default().scan_order(ScanOrder::KeyOrder).trace_steps(true));

    let order = acquisition_order(config, &GRAPH);
    assert_eq!(order[..2], ["logger", "audit"]);
}

#[test]
fn test_config_from_env() {
    // The only test in this binary that touches these variables
    std::env::set_var(SCAN_ORDER_ENV, "REGISTRATION");
    std::env::remove_var(TRACE_STEPS_ENV);
    let config = ResolveConfig::from_env().unwrap();
    std::env::remove_var(SCAN_ORDER_ENV);

    assert_eq!(config, ResolveConfig::default());
}

#[test]
fn test_scan_order_parse() {
    assert_eq!(ScanOrder::parse(" Key ").unwrap(), ScanOrder::KeyOrder);
    assert_eq!(ScanOrder::parse("registration").unwrap(), ScanOrder::Registration);
    assert!(ScanOrder::parse("alphabetical").is_err());
}

#[cfg(feature = "config")]
#[test]
fn test_config_deserializes_with_defaults() {
    use serde::de::value::{Error, MapDeserializer, StrDeserializer};
    use serde::Deserialize;

    let order = ScanOrder::deserialize(StrDeserializer::<Error>::new("key_order")).unwrap();
    assert_eq!(order, ScanOrder::KeyOrder);

    let partial: MapDeserializer<_, Error> = MapDeserializer::new([("scan_order", "key_order")].into_iter());
    assert_eq!(
        ResolveConfig::deserialize(partial).unwrap(),
        ResolveConfig::default().scan_order(ScanOrder::KeyOrder)
    );

    let empty: MapDeserializer<_, Error> = MapDeserializer::new(std::iter::empty::<(&str, &str)>());
    assert_eq!(ResolveConfig::deserialize(empty).unwrap(), ResolveConfig::default());
}
