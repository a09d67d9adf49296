#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sketchboard_history::undo::factory::{
    create_add_image_action, create_add_text_action, create_delete_image_action,
    create_edit_text_action, create_select_items_action, create_transform_image_action,
    validate_action,
};
use sketchboard_history::{
    HistoryConfig, HistoryManager, ImageItem, ItemKind, SelectedItem, TextItem, TransformState,
};

#[derive(Debug, Arbitrary)]
enum Op {
    AddImage { x: i16, y: i16 },
    AddText { text: String },
    Move { pick: u8, x: i16, y: i16 },
    Delete { pick: u8 },
    Type { pick: u8, text: String },
    Select { pick: u8 },
    Undo,
    Redo,
    StartBatch,
    EndBatch,
    CancelBatch,
    Clear,
    Resize { max: u8 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    max: u8,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let mut history = HistoryManager::with_config(HistoryConfig::new(usize::from(input.max)));
    let mut serial = 0usize;

    for op in input.ops.into_iter().take(512) {
        serial += 1;
        let board = history.state();
        let image = |pick: u8| board.images.get(usize::from(pick) % board.images.len().max(1));

        let action = match op {
            Op::AddImage { x, y } => {
                let t = TransformState::new(f64::from(x), f64::from(y), 10.0, 10.0);
                Some(create_add_image_action(
                    &ImageItem::new(format!("img{serial}"), "blob:f", t),
                    None,
                ))
            }
            Op::AddText { text } => Some(create_add_text_action(
                &TextItem::new(format!("txt{serial}"), text, TransformState::default()),
                None,
            )),
            Op::Move { pick, x, y } => image(pick).map(|img| {
                create_transform_image_action(
                    &img.id,
                    img.transform,
                    img.transform.moved_to(f64::from(x), f64::from(y)),
                    None,
                )
            }),
            Op::Delete { pick } => {
                image(pick).map(|img| create_delete_image_action(&img.id, img, None))
            }
            Op::Type { pick, text } => board
                .texts
                .get(usize::from(pick) % board.texts.len().max(1))
                .map(|t| {
                    create_edit_text_action(
                        &t.id,
                        &t.text,
                        &text,
                        t.char_len(),
                        text.chars().count(),
                        None,
                    )
                }),
            Op::Select { pick } => image(pick).map(|img| {
                create_select_items_action(
                    board.selection(),
                    &[SelectedItem::new(img.id.clone(), ItemKind::Image)],
                    None,
                )
            }),
            Op::Undo => {
                history.undo();
                None
            }
            Op::Redo => {
                history.redo();
                None
            }
            Op::StartBatch => {
                let _ = history.start_batch("");
                None
            }
            Op::EndBatch => {
                if let Some(batch) = history.end_batch() {
                    assert!(validate_action(&batch).is_ok(), "committed batch invalid");
                }
                None
            }
            Op::CancelBatch => {
                history.cancel_batch();
                None
            }
            Op::Clear => {
                history.clear();
                None
            }
            Op::Resize { max } => {
                history.set_max_stack_size(usize::from(max));
                None
            }
        };

        if let Some(action) = action {
            assert!(validate_action(&action).is_ok(), "factory built invalid action");
            history.push_action(action);
        }

        // Post-conditions that must always hold:
        let max = history.max_stack_size();
        assert!(max >= 1, "stack bound below 1");
        assert!(history.undo_depth() <= max, "undo stack over bound");
        assert!(history.redo_depth() <= max, "redo stack over bound");
        let info = history.history_info();
        assert_eq!(info.can_undo, info.undo_count > 0);
        assert_eq!(info.can_redo, info.redo_count > 0);
        assert!(history.state().validate().is_ok(), "board lost id uniqueness");
    }
});
