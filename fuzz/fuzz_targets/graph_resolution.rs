#![no_main]

use ferrous_scope::{AnyArc, DiError, FactoryBuilder, Key, Provider, ResolveConfig, ScanOrder, Scoped};
use libfuzzer_sys::fuzz_target;
use std::sync::{Arc, Mutex};

const NAMES: [&str; 16] = [
    "n0", "n1", "n2", "n3", "n4", "n5", "n6", "n7", "n8", "n9", "n10", "n11", "n12", "n13", "n14",
    "n15",
];

// Arbitrary graphs, cycles included: every byte pair is (node, input mask).
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let order = if data[0] & 1 == 0 {
        ScanOrder::Registration
    } else {
        ScanOrder::KeyOrder
    };
    let fail_on = data[0] >> 4;

    let log: Arc<Mutex<Vec<(bool, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let mut provider = Provider::new().with_config(ResolveConfig::default().scan_order(order));

    for pair in data[1..].chunks_exact(2) {
        let node = (pair[0] as usize) % NAMES.len();
        let mut builder = FactoryBuilder::new().output(Key::Token(NAMES[node]));
        for bit in 0..8 {
            if pair[1] & (1 << bit) != 0 {
                builder = builder.input(Key::Token(NAMES[(node + bit + 1) % NAMES.len()]));
            }
        }
        let log = log.clone();
        let Ok(factory) = builder.build_sync(move |_: &[AnyArc]| {
            if node == fail_on as usize {
                return Err(DiError::producer(std::io::Error::other("injected")));
            }
            log.lock().unwrap().push((true, node));
            let log = log.clone();
            Ok(Scoped::from_arc(Arc::new(node) as AnyArc)
                .on_release(move |_| log.lock().unwrap().push((false, node))))
        }) else {
            continue;
        };
        provider.include_factory(factory);
    }

    let _ = provider.build(|c| {
        for key in c.keys() {
            assert!(c.contains_key(&key));
        }
    });

    // Whatever happened, releases mirror acquisitions exactly
    let events = log.lock().unwrap();
    let acquired: Vec<usize> = events.iter().filter(|e| e.0).map(|e| e.1).collect();
    let mut released: Vec<usize> = events.iter().filter(|e| !e.0).map(|e| e.1).collect();
    released.reverse();
    assert_eq!(acquired, released);
});
