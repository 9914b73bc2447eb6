use std::time::{Duration, Instant};

use rstest::rstest;
use sprayer_hardware::error::HwError;
use sprayer_hardware::util::pulse_train;

#[rstest]
#[case(0, 0)]
#[case(1, 2)]
#[case(3, 6)]
fn pulse_train_toggles_twice_per_repeat(#[case] repeats: u8, #[case] edges: usize) {
    let mut seen = Vec::new();
    pulse_train(
        |high| {
            seen.push(high);
            Ok(())
        },
        Duration::from_millis(1),
        Duration::from_millis(1),
        repeats,
    )
    .expect("pulse train");
    assert_eq!(seen.len(), edges);
    // strictly alternating, starting high, ending low
    for (i, level) in seen.iter().enumerate() {
        assert_eq!(*level, i % 2 == 0);
    }
}

#[test]
fn pulse_train_skips_trailing_gap() {
    let start = Instant::now();
    pulse_train(|_| Ok(()), Duration::ZERO, Duration::from_millis(200), 1).unwrap();
    assert!(start.elapsed() < Duration::from_millis(150));
}

#[test]
fn failed_high_phase_leaves_line_low() {
    let mut last = None;
    let err = pulse_train(
        |high| {
            last = Some(high);
            if high {
                Err(HwError::Gpio("stuck".into()))
            } else {
                Ok(())
            }
        },
        Duration::ZERO,
        Duration::ZERO,
        2,
    )
    .expect_err("expected gpio error");
    assert!(matches!(err, HwError::Gpio(_)));
    assert_eq!(last, Some(false));
}
