mod common;

use common::*;
use flowsync::progress::{ProgressCounts, TargetClass, derive_node_status};
use flowsync::runs::PathState;
use flowsync::types::StatusColor;

#[test]
fn without_progress_the_overall_outcome_decides() {
    let cases = [
        (Some(true), StatusColor::Green),
        (Some(false), StatusColor::Red),
        (None, StatusColor::Blue),
    ];
    for (success, expected) in cases {
        let state = PathState {
            success,
            ..Default::default()
        };
        let status = derive_node_status(&state);
        assert_eq!(status.color, expected, "success={success:?}");
        assert_eq!(status.label, "");
    }
}

#[test]
fn device_counts_drive_color_and_label() {
    // (total, success, failure, skipped, color, label)
    let cases = [
        (4, 4, 0, 0, StatusColor::Green, "4/4 (4 passed)"),
        (4, 1, 1, 2, StatusColor::Red, "4/4 (1 passed, 1 failed, 2 skipped)"),
        (4, 0, 0, 0, StatusColor::Blue, "0/4"),
        (4, 2, 0, 0, StatusColor::Blue, "2/4 (2 passed)"),
        (4, 0, 0, 4, StatusColor::Gray, "4/4 (4 skipped)"),
        (3, 2, 0, 1, StatusColor::Cyan, "3/3 (2 passed, 1 skipped)"),
        (5, 0, 5, 0, StatusColor::Red, "5/5 (5 failed)"),
    ];
    for (total, success, failure, skipped, color, label) in cases {
        let state = device_counts(total, success, failure, skipped);
        let status = derive_node_status(&state);
        assert_eq!(status.color, color, "counts {total}/{success}/{failure}/{skipped}");
        assert_eq!(status.label, label);
    }
}

#[test]
fn mixed_counts_with_overall_success_are_green() {
    let mut state = device_counts(3, 2, 0, 1);
    state.success = Some(true);
    assert_eq!(derive_node_status(&state).color, StatusColor::Green);
}

#[test]
fn iteration_devices_count_when_no_device_bucket_exists() {
    let mut state = PathState::default();
    state.progress.insert(
        TargetClass::IterationDevice,
        ProgressCounts {
            total: 2,
            success: 2,
            failure: 0,
            skipped: 0,
        },
    );
    let status = derive_node_status(&state);
    assert_eq!(status.color, StatusColor::Green);
    assert_eq!(status.label, "2/2 (2 passed)");
}

#[test]
fn a_zero_total_bucket_is_ignored() {
    let mut state = device_counts(0, 0, 0, 0);
    state.success = Some(false);
    // Falls back to the overall outcome.
    assert_eq!(derive_node_status(&state).color, StatusColor::Red);
}

#[test]
fn derivation_is_deterministic() {
    let state = device_counts(4, 1, 1, 2);
    assert_eq!(derive_node_status(&state), derive_node_status(&state));
}
