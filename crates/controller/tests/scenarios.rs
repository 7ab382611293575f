//! End-to-end controller scenarios: opening moves, rule rejections,
//! undo, notifications and the history invariants.

use controller::{GameController, GameOptions, HintOutcome, Notification, Status};
use rules::{Color, START_FEN};

fn game() -> GameController {
    GameController::new(GameOptions::default()).unwrap()
}

fn game_from(fen: &str) -> GameController {
    GameController::new(GameOptions {
        initial_fen: Some(fen.to_string()),
        ..GameOptions::default()
    })
    .unwrap()
}

fn position_field(fen: &str) -> &str {
    fen.split_whitespace().next().unwrap()
}

#[tokio::test]
async fn legal_opening_move() {
    let mut game = game();
    game.try_move(1, 7, 4, 7).await.unwrap();

    assert_eq!(game.turn(), Color::Black);
    assert_eq!(game.move_history(), vec!["b2-e2".to_string()]);
    assert_eq!(
        position_field(&game.current_fen()),
        "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/4C2C1/9/RNBAKABNR"
    );
    assert_eq!(game.last_move(), Some(((1, 7), (4, 7))));
}

#[tokio::test]
async fn blocked_horse_leg_is_rejected_without_state_change() {
    // The open-leg jump works from the start position.
    let mut game = game();
    game.try_move(1, 9, 2, 7).await.unwrap();

    // With a piece on b1 the same jump is refused.
    let fen = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/1C7/RNBAKABNR w - - 0 1";
    let mut game = game_from(fen);
    let before = game.current_fen();

    let err = game.try_move(1, 9, 2, 7).await.unwrap_err();
    assert!(err.to_string().contains("horse leg"));
    assert_eq!(game.current_fen(), before);
    assert!(game.move_history().is_empty());
    assert_eq!(game.turn(), Color::Red);
}

#[tokio::test]
async fn cannon_capture_needs_exactly_one_screen() {
    // Red cannon e2, screen e7, black rook e9.
    let mut game = game_from("3kr4/9/4p4/9/9/9/9/4C4/9/4K4 w - - 0 1");
    game.try_move(4, 7, 4, 0).await.unwrap();
    assert_eq!(game.move_history(), vec!["e2xe9".to_string()]);

    // Zero screens: the capture is refused.
    let mut game = game_from("3kr4/9/9/9/9/9/9/4C4/9/4K4 w - - 0 1");
    assert!(game.try_move(4, 7, 4, 0).await.is_err());

    // Two screens: also refused.
    let mut game = game_from("3kr4/9/4p4/9/4p4/9/9/4C4/9/4K4 w - - 0 1");
    assert!(game.try_move(4, 7, 4, 0).await.is_err());
}

#[tokio::test]
async fn undo_restores_the_previous_state_exactly() {
    let mut game = game();
    let before = game.current_fen();

    game.try_move(7, 7, 4, 7).await.unwrap(); // h2e2
    assert_eq!(game.fen_history().len(), 2);

    game.undo().await.unwrap();
    assert_eq!(game.current_fen(), before);
    assert_eq!(game.turn(), Color::Red);
    assert!(game.move_history().is_empty());
    assert_eq!(game.fen_history().len(), 1);
    assert_eq!(game.status(), Status::Playing);
}

#[tokio::test]
async fn undo_with_nothing_to_undo_fails() {
    let mut game = game();
    assert!(game.undo().await.is_err());
}

#[tokio::test]
async fn check_notification_is_set_and_drained() {
    // Black to move; the rook swings to the king's file and checks.
    let mut game = game_from("3k5/9/9/9/9/9/9/9/r8/4K4 b - - 0 1");
    game.try_move(0, 8, 4, 8).await.unwrap();

    assert_eq!(game.consume_notification(), Some(Notification::Check));
    assert_eq!(game.consume_notification(), None);
    assert_eq!(game.status(), Status::Playing);
}

#[tokio::test]
async fn checkmate_is_terminal_and_persists() {
    // Double rooks: one covers rank 1, the other swings to rank 0 for
    // mate; the d9 flight square is denied by the flying-general rule.
    let mut game = game_from("4k4/R8/8R/9/9/9/9/9/9/3K5 w - - 0 1");
    game.try_move(8, 2, 8, 0).await.unwrap();
    assert_eq!(game.status(), Status::Checkmate);

    // Further moves are refused while terminal.
    assert!(game.try_move(4, 0, 3, 0).await.is_err());

    // Undo leaves the terminal state behind.
    game.undo().await.unwrap();
    assert_eq!(game.status(), Status::Playing);
}

#[tokio::test]
async fn histories_keep_the_off_by_one_invariant() {
    let mut game = game();
    assert_eq!(game.fen_history().len(), game.move_history().len() + 1);

    game.try_move(1, 7, 4, 7).await.unwrap();
    game.try_move(7, 2, 4, 2).await.unwrap();
    assert_eq!(game.fen_history().len(), game.move_history().len() + 1);

    game.undo().await.unwrap();
    assert_eq!(game.fen_history().len(), game.move_history().len() + 1);

    game.reset().unwrap();
    assert_eq!(game.fen_history().len(), 1);
    assert!(game.move_history().is_empty());
}

#[tokio::test]
async fn reset_is_idempotent() {
    let mut game = game();
    game.try_move(1, 7, 4, 7).await.unwrap();
    game.reset().unwrap();
    let once = game.current_fen();
    game.reset().unwrap();
    assert_eq!(game.current_fen(), once);
    assert_eq!(once, START_FEN);
}

#[tokio::test]
async fn rejections_do_not_touch_the_clock_or_history() {
    let mut game = game();
    let stats_before = game.get_stats();

    // Same square, wrong colour, empty origin, friendly capture.
    assert!(game.try_move(0, 9, 0, 9).await.is_err());
    assert!(game.try_move(0, 0, 0, 1).await.is_err());
    assert!(game.try_move(4, 4, 4, 5).await.is_err());
    assert!(game.try_move(0, 9, 0, 6).await.is_err());

    let stats_after = game.get_stats();
    assert_eq!(stats_after.moves_played, stats_before.moves_played);
    assert_eq!(stats_after.red_total_ms, 0);
    assert_eq!(stats_after.black_total_ms, 0);
}

#[tokio::test]
async fn clock_credits_the_mover_on_completion() {
    let mut game = game();
    game.try_move(1, 7, 4, 7).await.unwrap();
    let stats = game.get_stats();
    assert_eq!(stats.black_total_ms, 0);
    assert_eq!(stats.turn, Color::Black);
    assert_eq!(stats.moves_played, 1);
}

#[tokio::test]
async fn legal_targets_come_from_the_generator_only() {
    let game = game();
    let targets = game.legal_targets(4, 9);
    assert_eq!(targets, vec![(4, 8)]);
    assert!(game.legal_targets(4, 4).is_empty());
}

#[tokio::test]
async fn hint_suggests_without_committing() {
    let mut game = game();
    let outcome = game.hint(2).await.unwrap();
    let HintOutcome::Move(uci) = outcome else {
        panic!("expected a hint move");
    };
    assert_eq!(uci.len(), 4);
    assert!(game.last_hint().is_some());
    assert!(game.move_history().is_empty());

    // A committed move clears the stored hint.
    game.try_move(1, 7, 4, 7).await.unwrap();
    assert!(game.last_hint().is_none());
}

#[tokio::test]
async fn evaluate_is_red_positive() {
    let mut game = game_from("3k5/9/9/9/9/9/9/9/9/4K2R1 w - - 0 1");
    assert!(game.evaluate().await.unwrap() > 0);
}

#[tokio::test]
async fn piece_ids_stay_stable_across_moves_and_undo() {
    let mut game = game();
    let cannon_id = game.piece_at(1, 7).unwrap().id;

    game.try_move(1, 7, 4, 7).await.unwrap();
    assert_eq!(game.piece_at(4, 7).unwrap().id, cannon_id);

    game.undo().await.unwrap();
    assert_eq!(game.piece_at(1, 7).unwrap().id, cannon_id);
}

#[tokio::test]
async fn play_uci_move_can_force_the_acting_colour() {
    // Black opens even though the FEN says red to move.
    let mut game1 = game();
    game1.play_uci_move("h7e7", Color::Black).await.unwrap();
    assert_eq!(game1.move_history(), vec!["h7-e7".to_string()]);
    assert_eq!(game1.turn(), Color::Red);

    // A rejected forced move restores the original turn.
    let mut game2 = game();
    assert!(game2.play_uci_move("h7e6", Color::Black).await.is_err());
    assert_eq!(game2.turn(), Color::Red);
    assert_eq!(game2.current_fen(), START_FEN);
}

#[tokio::test]
async fn ai_drives_a_turn_and_self_play_stops_at_terminal() {
    let mut game = GameController::new(GameOptions {
        ai_enabled: true,
        ai_level: 1,
        ai_color: Color::Black,
        ..GameOptions::default()
    })
    .unwrap();

    game.try_move(1, 7, 4, 7).await.unwrap();
    assert!(game.is_ai_turn());
    game.run_ai_turns().await.unwrap();
    assert_eq!(game.turn(), Color::Red);
    assert_eq!(game.get_stats().moves_played, 2);
}

#[tokio::test]
async fn opening_book_first_move_respects_ai_colour() {
    let mut game = GameController::new(GameOptions {
        ai_enabled: true,
        ai_level: 1,
        ai_color: Color::Red,
        ai_moves_first: true,
        ..GameOptions::default()
    })
    .unwrap();

    assert!(game.play_book_opening().await.unwrap());
    assert_eq!(game.get_stats().moves_played, 1);
    assert_eq!(game.turn(), Color::Black);
}

#[tokio::test]
async fn listeners_hear_state_changes() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let mut game = game();
    let hits = Arc::new(AtomicUsize::new(0));
    let counted = hits.clone();
    let id = game.set_on_state_changed(Box::new(move || {
        counted.fetch_add(1, Ordering::SeqCst);
    }));

    game.try_move(1, 7, 4, 7).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    assert!(game.remove_listener(id));
    game.undo().await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
