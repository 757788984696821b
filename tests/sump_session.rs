mod common;

use common::*;
use sumpla::command::*;

#[test]
fn query_identifies_device() {
    let mut analyzer = analyzer(Wire::new(|_| 0));
    let mut host = Host::default();
    host.send(&[GET_ID]);
    run(&mut analyzer, &mut host);
    assert_eq!(host.received(), b"1ALS");
}

#[test]
fn metadata_frame_is_terminated_and_reports_memory() {
    let mut analyzer = analyzer(Wire::new(|_| 0));
    let mut host = Host::default();
    host.send(&[GET_META]);
    run(&mut analyzer, &mut host);

    let frame = host.received();
    assert_eq!(frame.last(), Some(&0x00));
    assert_eq!(frame[0], 0x01);
    let name_end = frame.iter().position(|&b| b == 0).unwrap();
    assert_eq!(&frame[1..name_end], sumpla::DEVICE_NAME.as_bytes());

    let at = frame.windows(5).position(|w| w == [0x21, 0x00, 0x00, 0x80, 0x00]);
    assert!(at.is_some(), "sample memory tag missing from {frame:x?}");
    assert!(frame.windows(5).any(|w| w == [0x23, 0x00, 0x98, 0x96, 0x80]));
    assert!(frame.windows(2).any(|w| w == [0x40, 0x08]));
}

#[test]
fn reset_then_read_count_yields_404_samples() {
    let mut analyzer = analyzer(Wire::new(|idx| (idx % 251) as u8));
    let mut host = Host::default();
    host.send(&[RESET; 5]);
    host.send(&long(SET_READ_DELAY_COUNT, 100));
    host.send(&[ARM]);
    run(&mut analyzer, &mut host);

    let samples = host.received();
    assert_eq!(samples.len(), 404);
    assert!(samples
        .iter()
        .enumerate()
        .all(|(idx, &s)| s == (idx % 251) as u8));
}

#[test]
fn triggered_capture_at_ten_megahertz() {
    // channel 3 goes high at sample 40
    let mut analyzer = analyzer(Wire::new(|idx| if idx >= 40 { 0x08 | idx as u8 & 1 } else { idx as u8 & 1 }));
    let mut host = Host::default();
    host.send(&long(SET_DIVIDER, 0));
    host.send(&long(SET_READ_DELAY_COUNT, 1));
    host.send(&long(SET_TRIGGER_MASK, 0x08));
    host.send(&long(SET_TRIGGER_VALUES, 0x08));
    host.send(&long(SET_TRIGGER_CONFIG, 0x08));
    host.send(&[ARM]);
    run(&mut analyzer, &mut host);

    assert_eq!(host.received(), [0x09, 0x08, 0x09, 0x08, 0x09, 0x08, 0x09, 0x08]);
    assert_eq!(analyzer.sampler().config().sampling_period(), 100);
}

#[test]
fn garbage_before_commands_is_skipped() {
    let mut analyzer = analyzer(Wire::new(|_| 0));
    let mut host = Host::default();
    host.send(&[0x42, 0x7f, 0xee, GET_ID]);
    run(&mut analyzer, &mut host);
    assert_eq!(host.received(), b"1ALS");
}

#[test]
fn split_frames_across_polls() {
    let mut analyzer = analyzer(Wire::new(|_| 0x5a));
    let mut host = Host::default();
    let frame = long(SET_READ_DELAY_COUNT, 0);
    host.send(&frame[..2]);
    run(&mut analyzer, &mut host);
    assert_eq!(
        analyzer.decoder().state(),
        sumpla::DecoderState::AccumulatingLong { filled: 1 }
    );
    host.send(&frame[2..]);
    host.send(&[ARM]);
    run(&mut analyzer, &mut host);
    assert_eq!(host.received(), [0x5a; 4]);
}

#[test]
fn test_mode_and_self_test_only_stream_the_armed_capture() {
    let mut analyzer = analyzer(Wire::new(|idx| idx as u8));
    let mut host = Host::default();
    host.send(&long(SET_FLAGS, sumpla::Flags::TEST));
    host.send(&long(SET_READ_DELAY_COUNT, 0));
    host.send(&[ARM, SELF_TEST, XOFF]);
    run(&mut analyzer, &mut host);
    assert_eq!(host.received(), [0, 1, 2, 3]);
}
