//! Property-based tests for the setup failure latch and session config
//!
//! Run with: cargo test --test setup_result_props

use crabcapture::session::{SetupResult, SetupResultCell};
use crabcapture::types::{DevicePosition, DeviceSelector, DeviceType};
use crabcapture::CrabCaptureConfig;
use proptest::prelude::*;
use std::sync::Arc;

fn any_result() -> impl Strategy<Value = SetupResult> {
    prop_oneof![
        Just(SetupResult::Success),
        Just(SetupResult::NotAuthorized),
        Just(SetupResult::ConfigurationFailed),
    ]
}

fn any_selector() -> impl Strategy<Value = DeviceSelector> {
    (
        prop_oneof![
            Just(DeviceType::BuiltInDualWideCamera),
            Just(DeviceType::BuiltInDualCamera),
            Just(DeviceType::BuiltInWideAngleCamera),
        ],
        prop_oneof![Just(DevicePosition::Back), Just(DevicePosition::Front)],
    )
        .prop_map(|(device_type, position)| DeviceSelector::new(device_type, position))
}

proptest! {
    /// The first failure latched is the value observed forever after
    #[test]
    fn first_failure_wins(sequence in prop::collection::vec(any_result(), 0..20)) {
        let cell = SetupResultCell::new();
        for result in &sequence {
            cell.latch(*result);
        }

        let expected = sequence
            .iter()
            .copied()
            .find(|r| !r.is_success())
            .unwrap_or(SetupResult::Success);
        prop_assert_eq!(cell.get(), expected);
    }

    /// Exactly one latch call reports the transition out of Success
    #[test]
    fn transition_reported_once(sequence in prop::collection::vec(any_result(), 1..20)) {
        let cell = SetupResultCell::new();
        let transitions = sequence.iter().filter(|r| cell.latch(**r)).count();
        let has_failure = sequence.iter().any(|r| !r.is_success());
        prop_assert_eq!(transitions, usize::from(has_failure));
    }

    /// Racing failures still leave one of the raced values in the cell
    #[test]
    fn concurrent_latches_keep_one_failure(
        failures in prop::collection::vec(
            prop_oneof![Just(SetupResult::NotAuthorized), Just(SetupResult::ConfigurationFailed)],
            1..8,
        )
    ) {
        let cell = Arc::new(SetupResultCell::new());
        let handles: Vec<_> = failures
            .iter()
            .copied()
            .map(|failure| {
                let cell = cell.clone();
                std::thread::spawn(move || cell.latch(failure))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        prop_assert_eq!(winners, 1);
        prop_assert!(failures.contains(&cell.get()));
    }

    /// Validation accepts a preference list exactly when it is non-empty
    /// and free of duplicates
    #[test]
    fn preference_list_validation(list in prop::collection::vec(any_selector(), 0..8)) {
        let mut config = CrabCaptureConfig::default();
        config.session.device_preference = list.clone();

        let mut seen = std::collections::HashSet::new();
        let unique = list.iter().all(|s| seen.insert(*s));
        prop_assert_eq!(config.validate().is_ok(), !list.is_empty() && unique);
    }

    /// Buffer capacity must stay within 1..=1024
    #[test]
    fn buffer_capacity_validation(capacity in 0usize..2048) {
        let mut config = CrabCaptureConfig::default();
        config.delivery.buffer_capacity = capacity;
        prop_assert_eq!(config.validate().is_ok(), (1..=1024).contains(&capacity));
    }
}
