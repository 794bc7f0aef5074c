use crate::common::harness::BufferHarness;
use chunkpad::Direction;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(u8),
    Backspace,
    Delete,
    Move(Direction),
    Seek(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => prop::sample::select(b"abc \t\n\x01".to_vec()).prop_map(Op::Insert),
        2 => Just(Op::Backspace),
        1 => Just(Op::Delete),
        2 => prop::sample::select(vec![
            Direction::Left,
            Direction::Right,
            Direction::Up,
            Direction::Down,
            Direction::PageUp,
            Direction::PageDown,
            Direction::Home,
            Direction::End,
        ])
        .prop_map(Op::Move),
        1 => (0usize..200).prop_map(Op::Seek),
    ]
}

proptest! {
    /// Any sequence of edits and moves keeps the chain, cursor and anchor
    /// consistent with a flat model of the text
    #[test]
    fn random_edits_match_model(
        ops in prop::collection::vec(op_strategy(), 1..150),
        capacity in 1usize..6
    ) {
        let mut harness = BufferHarness::new(capacity, 512);
        harness.buffer_mut().resize(3, 6);
        let mut model: Vec<u8> = Vec::new();
        let mut cursor = 0usize;

        for op in ops {
            match op {
                Op::Insert(byte) => {
                    harness.buffer_mut().insert(byte).unwrap();
                    model.insert(cursor, byte);
                    cursor += 1;
                }
                Op::Backspace => {
                    harness.backspace(1);
                    if cursor > 0 {
                        cursor -= 1;
                        model.remove(cursor);
                    }
                }
                Op::Delete => {
                    harness.buffer_mut().delete_at_cursor();
                    if cursor < model.len() {
                        model.remove(cursor);
                    }
                }
                Op::Move(direction) => {
                    harness.press(direction);
                    cursor = harness.buffer().cursor_offset();
                }
                Op::Seek(abs) => {
                    let result = harness.buffer_mut().set_cursor(abs);
                    prop_assert_eq!(result.is_err(), abs > model.len());
                    cursor = abs.min(model.len());
                }
            }

            // Rendering resolves and caches the anchor between edits
            harness.screen();

            prop_assert_eq!(harness.buffer().contents(), model.clone());
            prop_assert_eq!(harness.buffer().cursor_offset(), cursor);
            prop_assert!(harness.buffer().validate().is_ok(), "{:?}", harness.buffer().validate());
        }
    }
}
