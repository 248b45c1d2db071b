//! Generated checks for splitting and reassembly.

use std::{
    num::{NonZeroU32, NonZeroUsize},
    time::{Duration, Instant},
};

use proptest::{
    collection::vec,
    prelude::{Just, Strategy, any},
    prop_assert,
    prop_assert_eq,
    sample::Index,
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestCaseError, TestRng, TestRunner},
};
use rstest::rstest;

use crate::{
    envelope::PayloadKind,
    fragment::{FragmentKey, Reassembler, join, split},
};

fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    let rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    TestRunner::new_with_rng(config, rng)
}

fn payload_strategy(max_len: usize) -> impl Strategy<Value = String> {
    vec(any::<char>(), 0..=max_len).prop_map(|chars| chars.into_iter().collect())
}

/// Payload, chunk size and a seed list used to shuffle fragment order.
fn transfer_strategy() -> impl Strategy<Value = (String, usize, Vec<Index>)> {
    (payload_strategy(200), 1usize..=32)
        .prop_flat_map(|(payload, chunk)| (Just(payload), Just(chunk), vec(any::<Index>(), 64)))
}

#[rstest]
#[case(64)]
#[case(256)]
fn split_then_join_restores_payload(#[case] cases: u32) {
    let mut runner = deterministic_runner(cases);
    runner
        .run(&(payload_strategy(300), 1usize..=40), |(payload, chunk)| {
            let size = NonZeroUsize::new(chunk).ok_or_else(|| TestCaseError::fail("zero"))?;
            let batch =
                split(&payload, size).map_err(|err| TestCaseError::fail(err.to_string()))?;

            let expected = payload.chars().count().div_ceil(chunk).max(1);
            prop_assert_eq!(batch.len(), expected);
            for fragment in batch.fragments() {
                prop_assert!(fragment.body().chars().count() <= chunk);
            }

            let joined = join(&batch.into_slots())
                .map_err(|err| TestCaseError::fail(err.to_string()))?;
            prop_assert_eq!(joined, payload);
            Ok(())
        })
        .expect("split and join should round-trip");
}

#[test]
fn any_arrival_order_completes_once_with_original_payload() {
    let mut runner = deterministic_runner(128);
    runner
        .run(&transfer_strategy(), |(payload, chunk, seeds)| {
            let size = NonZeroUsize::new(chunk).ok_or_else(|| TestCaseError::fail("zero"))?;
            let mut fragments: Vec<_> = split(&payload, size)
                .map_err(|err| TestCaseError::fail(err.to_string()))?
                .into_iter()
                .collect();
            for (position, seed) in (0..fragments.len()).zip(&seeds) {
                let other = seed.index(fragments.len());
                fragments.swap(position, other);
            }

            let limit = NonZeroU32::new(u32::MAX).ok_or_else(|| TestCaseError::fail("zero"))?;
            let mut reassembler = Reassembler::new(Duration::from_secs(60), limit);
            let key = FragmentKey::new("prop", PayloadKind::Image);
            let now = Instant::now();

            let mut completions = Vec::new();
            for fragment in fragments {
                let (header, body) = fragment.into_parts();
                let outcome = reassembler
                    .push_at(key.clone(), header, body, now)
                    .map_err(|err| TestCaseError::fail(err.to_string()))?;
                prop_assert!(outcome.violation.is_none());
                completions.extend(outcome.completed);
            }

            prop_assert_eq!(completions.len(), 1);
            prop_assert_eq!(completions[0].body(), payload.as_str());
            prop_assert_eq!(reassembler.buffered_len(), 0);
            Ok(())
        })
        .expect("reassembly should be order independent");
}
