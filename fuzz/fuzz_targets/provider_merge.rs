#![no_main]

use ferrous_scope::{Key, Provider, Resolver, SyncFactory};
use libfuzzer_sys::fuzz_target;

const NAMES: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

// Each byte registers one key on the left or right operand, as a value or a
// factory. Checks the precedence rules of `|` against a direct model.
fuzz_target!(|data: &[u8]| {
    let mut left = Provider::new();
    let mut right = Provider::new();
    // Last registration per key on each side: (is factory, tag)
    let mut left_model: [Option<(bool, u8)>; 8] = [None; 8];
    let mut right_model: [Option<(bool, u8)>; 8] = [None; 8];

    for (i, byte) in data.iter().enumerate().take(64) {
        let slot = (*byte as usize) % NAMES.len();
        let key = Key::Token(NAMES[slot]);
        let is_factory = byte & 0x10 != 0;
        let on_right = byte & 0x20 != 0;
        let tag = i as u8;

        let (provider, side) = if on_right {
            (&mut right, &mut right_model)
        } else {
            (&mut left, &mut left_model)
        };
        if is_factory {
            let Ok(factory) = SyncFactory::from_fn(move || tag) else {
                return;
            };
            provider.include_factory(factory.with_key(key));
        } else {
            *provider = std::mem::take(provider).with_keyed_value(key, tag);
        }
        side[slot] = Some((is_factory, tag));
    }

    // A factory beats a value on either side; otherwise the right side wins
    let model: Vec<Option<(bool, u8)>> = left_model
        .iter()
        .zip(right_model.iter())
        .map(|(l, r)| match (*l, *r) {
            (None, r) => r,
            (l, None) => l,
            (Some((true, _)), Some((false, _))) => *l,
            (Some(_), r) => r,
        })
        .collect();

    let merged = &left | &right;
    let observed = merged
        .build(|c| {
            NAMES
                .iter()
                .map(|name| c.require_as::<u8>(&Key::Token(name)).ok().map(|v| *v))
                .collect::<Vec<_>>()
        })
        .unwrap();

    for (slot, expected) in model.iter().enumerate() {
        assert_eq!(observed[slot], expected.map(|(_, tag)| tag));
    }
});
