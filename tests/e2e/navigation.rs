use crate::common::harness::BufferHarness;
use chunkpad::{BufferConfig, BufferError, Direction};

fn numbered_rows(count: usize) -> String {
    (0..count)
        .map(|i| format!("row {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_tab_expands_to_next_stop() {
    let mut harness = BufferHarness::new(4, 16);
    harness.type_text("ab\tcd").unwrap();
    assert_eq!(harness.buffer().visual_column(0, 4).unwrap(), 9);

    harness.press(Direction::Left);
    assert_eq!(harness.cursor(), (4, 0, 9));
    harness.press_n(Direction::Left, 2);
    assert_eq!(harness.cursor(), (2, 0, 2));
    harness.press(Direction::Right);
    assert_eq!(harness.cursor(), (3, 0, 8));
}

#[test]
fn test_goal_column_survives_short_line() {
    let mut harness = BufferHarness::new(8, 32);
    harness
        .type_text("this line is long enough\nshort\nanother long line here")
        .unwrap();
    harness.buffer_mut().set_cursor(15).unwrap();
    assert_eq!(harness.cursor(), (15, 0, 15));

    harness.press(Direction::Down);
    assert_eq!(harness.cursor(), (30, 1, 5));
    assert_eq!(harness.buffer().goal_column(), 15);

    harness.press(Direction::Down);
    assert_eq!(harness.cursor(), (46, 2, 15));

    harness.press_n(Direction::Up, 2);
    assert_eq!(harness.cursor(), (15, 0, 15));
    harness.assert_valid();
}

#[test]
fn test_horizontal_move_resets_goal() {
    let mut harness = BufferHarness::new(8, 32);
    harness.type_text("abcdefgh\nab\nabcdefgh").unwrap();
    harness.buffer_mut().set_cursor(6).unwrap();

    harness.press(Direction::Down);
    assert_eq!(harness.cursor(), (11, 1, 2));
    harness.press(Direction::Left);
    harness.press(Direction::Down);
    assert_eq!(harness.cursor(), (13, 2, 1));
}

#[test]
fn test_down_on_last_line_and_up_on_first_are_noops() {
    let mut harness = BufferHarness::new(4, 16);
    harness.type_text("one\ntwo").unwrap();
    harness.press(Direction::Down);
    assert_eq!(harness.cursor(), (7, 1, 3));

    harness.buffer_mut().set_cursor(1).unwrap();
    harness.press(Direction::Up);
    assert_eq!(harness.cursor(), (1, 0, 1));
}

#[test]
fn test_set_cursor_out_of_range_clamps() {
    let mut harness = BufferHarness::new(4, 16);
    harness.type_text("ab\ncd").unwrap();

    let err = harness.buffer_mut().set_cursor(42).unwrap_err();
    assert!(matches!(err, BufferError::OutOfRange { offset: 42, size: 5 }));
    assert_eq!(harness.cursor(), (5, 1, 2));
}

#[test]
fn test_goto_line_missing() {
    let mut harness = BufferHarness::new(4, 16);
    harness.type_text(&numbered_rows(3)).unwrap();

    harness.buffer_mut().goto_line(1).unwrap();
    assert_eq!(harness.cursor(), (6, 1, 0));

    assert!(matches!(
        harness.buffer_mut().goto_line(3),
        Err(BufferError::LineNotFound { line: 3, .. })
    ));
    assert_eq!(harness.cursor(), (17, 2, 5));
}

#[test]
fn test_screen_follows_cursor() {
    let config = BufferConfig {
        screen_rows: 3,
        screen_cols: 10,
        ..BufferConfig::with_chunks(8, 64)
    };
    let mut harness = BufferHarness::with_config(&config);
    harness.type_text(&numbered_rows(9)).unwrap();

    harness.buffer_mut().goto_line(5).unwrap();
    insta::assert_snapshot!(harness.screen(), @r"
    row 3
    row 4
    row 5
    ");

    harness.press(Direction::PageUp);
    assert_eq!(harness.cursor().1, 2);
    assert_eq!(harness.buffer().viewport().top_line, 2);
    insta::assert_snapshot!(harness.screen(), @r"
    row 2
    row 3
    row 4
    ");

    harness.press(Direction::PageDown);
    assert_eq!(harness.cursor().1, 5);
    assert_eq!(harness.buffer().viewport().top_line, 3);
    harness.assert_valid();
}

#[test]
fn test_page_moves_clamp_at_ends() {
    let config = BufferConfig {
        screen_rows: 4,
        ..BufferConfig::with_chunks(8, 64)
    };
    let mut harness = BufferHarness::with_config(&config);
    harness.type_text(&numbered_rows(6)).unwrap();
    harness.buffer_mut().set_cursor(3).unwrap();

    harness.press(Direction::PageDown);
    harness.press(Direction::PageDown);
    assert_eq!(harness.cursor().1, 5);
    assert_eq!(harness.buffer().viewport().top_line, 2);

    harness.press_n(Direction::PageUp, 3);
    assert_eq!(harness.cursor(), (3, 0, 3));
    assert_eq!(harness.buffer().viewport().top_line, 0);
    harness.assert_valid();
}

#[test]
fn test_horizontal_scroll() {
    let config = BufferConfig {
        screen_rows: 2,
        screen_cols: 8,
        ..BufferConfig::with_chunks(8, 64)
    };
    let mut harness = BufferHarness::with_config(&config);
    harness.type_text("0123456789abcdefghij\nuvwxyz0123456789").unwrap();
    harness.buffer_mut().set_cursor(0).unwrap();

    harness.press(Direction::End);
    assert_eq!(harness.cursor(), (20, 0, 20));
    insta::assert_snapshot!(harness.screen(), @r"
    defghij
    789
    ");
    assert_eq!(harness.buffer().viewport().left_column, 13);

    harness.press(Direction::Home);
    insta::assert_snapshot!(harness.screen(), @r"
    01234567
    uvwxyz01
    ");
}
