//! Strings that straddle frame boundaries.

use crate::{assert_roundtrip, table_of, us};
use duke_sheets_sst::layout::{CONT_CAPACITY, HEAD_CAPACITY};
use duke_sheets_sst::{decode_frame, plan_frames, DecodeState, FormatRun, PendingPart};
use pretty_assertions::assert_eq;

#[test]
fn test_long_string_between_short_ones() {
    let table = table_of(vec![
        us("A"),
        us(&"x".repeat(9000)),
        us("Hi").with_run(0, 3),
    ]);

    let plan = plan_frames(&table);
    assert_eq!(plan.frame_lengths(), &[8216, 803]);
    assert_eq!(plan.total_record_bytes(), 12 + 8216 + 4 + 803);

    let bodies = assert_roundtrip(&table);
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0].len(), 8 + 8216);
    // the continuation restates the flags, then resumes the x's
    assert_eq!(&bodies[1][..3], &[0x00, b'x', b'x']);
    // "Hi" closes the continuation: count, flags, run count, text, run
    assert_eq!(
        &bodies[1][792..],
        &[2, 0, 0x08, 1, 0, b'H', b'i', 0, 0, 3, 0]
    );
}

#[test]
fn test_wide_text_never_splits_a_code_unit() {
    let table = table_of(vec![us("a"), us(&"\u{4e2d}".repeat(5000))]);
    assert_eq!(plan_frames(&table).frame_lengths(), &[8215, 1793]);

    let bodies = assert_roundtrip(&table);
    // one byte of the head frame is left unused
    assert_eq!(bodies[0].len(), 8 + 8215);
    assert_eq!(bodies[1][0], 0x01);
    assert_eq!(bodies[1].len(), 1 + 896 * 2);
}

#[test]
fn test_run_entries_are_atomic() {
    let mut rich = us("0123456789");
    for (i, pos) in [0u16, 2, 4, 6, 8].iter().enumerate() {
        rich = rich.with_run(*pos, i as u16 + 1);
    }
    let table = table_of(vec![us(&"f".repeat(8188)), rich]);

    // 8191 + header 5 + 10 chars + 2 runs leaves 2 bytes: not enough for a run
    assert_eq!(plan_frames(&table).frame_lengths(), &[8214, 12]);

    let bodies = assert_roundtrip(&table);
    // run continuations carry no flags byte
    assert_eq!(bodies[1], vec![4, 0, 3, 0, 6, 0, 4, 0, 8, 0, 5, 0]);
}

#[test]
fn test_two_bytes_left_defer_the_string_body() {
    let table = table_of(vec![us(&"f".repeat(HEAD_CAPACITY - 5)), us("xyz")]);
    assert_eq!(plan_frames(&table).frame_lengths(), &[8216, 4]);

    let bodies = assert_roundtrip(&table);
    assert_eq!(&bodies[0][bodies[0].len() - 2..], &[3, 0]);
    assert_eq!(bodies[1], vec![0x00, b'x', b'y', b'z']);

    let mut out = Vec::new();
    let state = decode_frame(DecodeState::Idle, &bodies[0][8..], &mut out, 2).unwrap();
    assert_eq!(out.len(), 1);
    match &state {
        DecodeState::InFlight(p) => {
            assert_eq!(p.part(), PendingPart::Body);
            assert_eq!(p.char_count(), 3);
        }
        DecodeState::Idle => panic!("expected a deferred string"),
    }
    let state = decode_frame(state, &bodies[1], &mut out, 2).unwrap();
    assert!(state.is_idle());
    assert_eq!(out[1].text(), "xyz");
}

#[test]
fn test_deferred_rich_header_moves_whole() {
    let table = table_of(vec![
        us(&"f".repeat(HEAD_CAPACITY - 5)),
        us("xyz").with_run(1, 9),
    ]);
    let bodies = assert_roundtrip(&table);
    assert_eq!(
        bodies[1],
        vec![0x08, 1, 0, b'x', b'y', b'z', 1, 0, 9, 0]
    );
}

#[test]
fn test_extension_bytes_split_anywhere() {
    let ext: Vec<u8> = (0..100).collect();
    let table = table_of(vec![
        us(&"f".repeat(8200)),
        us("e").with_extension(ext.clone()),
    ]);
    // 8203 + header 7 + 1 char + 5 extension bytes fill the head frame
    assert_eq!(plan_frames(&table).frame_lengths(), &[8216, 95]);

    let bodies = assert_roundtrip(&table);
    assert_eq!(&bodies[0][bodies[0].len() - 5..], &ext[..5]);
    assert_eq!(bodies[1], ext[5..].to_vec());
}

#[test]
fn test_many_continuations() {
    let table = table_of(vec![
        us(&"\u{3042}".repeat(20_000)),
        us(&"b".repeat(30_000)).with_run(0, 1).with_run(29_999, 2),
        us(&"\u{1F600}".repeat(10_000)),
        us("end"),
    ]);
    let plan = plan_frames(&table);
    assert!(plan.frame_count() > 10);

    let bodies = assert_roundtrip(&table);
    assert_eq!(bodies.len(), plan.frame_count());
    for body in &bodies[1..] {
        assert!(body.len() <= CONT_CAPACITY);
    }
    let total: usize = bodies.iter().map(|b| b.len() + 4).sum();
    assert_eq!(total, plan.total_record_bytes());
}

#[test]
fn test_surrogate_pair_split_across_frames() {
    // 8211 bytes before the emoji string leave an odd-sized tail in the head frame
    let table = table_of(vec![
        us(&"f".repeat(8208)),
        us(&"\u{1F600}".repeat(4)),
    ]);
    let bodies = assert_roundtrip(&table);
    // 3 + 8208 + header 3 leaves 2 bytes: exactly one code unit, half an emoji
    assert_eq!(bodies[0].len(), 8 + HEAD_CAPACITY);
    assert_eq!(bodies[1][0], 0x01);
    assert_eq!(bodies[1].len(), 1 + 7 * 2);
}

#[test]
fn test_empty_string_and_empty_table() {
    let bodies = assert_roundtrip(&table_of(vec![]));
    assert_eq!(bodies, vec![vec![0u8; 8]]);

    let table = table_of(vec![us(""), us("").with_run(0, 4)]);
    let bodies = assert_roundtrip(&table);
    assert_eq!(
        &bodies[0][8..],
        &[0, 0, 0x00, 0, 0, 0x08, 1, 0, 0, 0, 4, 0]
    );
    assert_eq!(
        table.get(1).unwrap().format_runs(),
        &[FormatRun::new(0, 4)]
    );
}
