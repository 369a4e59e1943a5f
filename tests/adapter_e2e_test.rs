use std::time::Duration;

use tokio::sync::mpsc;

use tetra_slide::adapter::{spawn_timed_presenter, DeltaLog, DeltaRecord, Frame, PacedDriver, Pacing};
use tetra_slide::core::{Board, GameConfig, GameState};
use tetra_slide::types::DeltaKind;

fn temp_log(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("{}-{}.jsonl", name, std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

#[tokio::test]
async fn autoplay_turns_are_presented_and_logged_in_order() {
    let path = temp_log("tetra-e2e");
    let (log, writer) = DeltaLog::spawn(path.to_string_lossy().into_owned());

    let (tx, rx) = mpsc::channel::<Frame>(1);
    let presenter = spawn_timed_presenter(rx, Pacing::instant());
    let mut driver = PacedDriver::new(tx, Some(log));

    let mut game = GameState::with_seed(2718);
    driver.start(&mut game).await;

    for _ in 0..10 {
        let Some(&id) = game.movable_pieces().first() else { break };
        let target = *game.target_cols(id).unwrap().end() as i32;
        let presented = driver.play_turn(&mut game, id, target).await;
        assert!(presented.is_some() || game.board().piece(id).unwrap().col == target as usize);
        assert!(!game.is_settling());
    }

    let total = driver.presented();
    drop(driver);
    let shown = tokio::time::timeout(Duration::from_secs(2), presenter)
        .await
        .expect("presenter did not finish")
        .unwrap();
    assert_eq!(shown, total);
    writer.await.unwrap().unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let records: Vec<DeltaRecord> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len() as u64, total);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.seq, i as u64 + 1);
    }

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn board_stays_locked_through_every_paced_frame() {
    let board = Board::from_pieces(8, 10, &[(0, 0, 4), (0, 4, 4), (0, 8, 1), (5, 9, 1), (6, 0, 1)])
        .unwrap();
    let mut game = GameState::from_board(GameConfig::default(), board).unwrap();
    let observer = game.settle_lock();

    let (tx, mut rx) = mpsc::channel::<Frame>(1);
    let presenter = tokio::spawn(async move {
        let mut first_kind = None;
        while let Some(frame) = rx.recv().await {
            if first_kind.is_none() {
                first_kind = Some(frame.delta.kind);
            }
            assert!(observer.is_held());
            tokio::time::sleep(Duration::from_millis(1)).await;
            frame.complete();
        }
        first_kind
    });

    let mut driver = PacedDriver::new(tx, None);
    assert!(driver.settle(&mut game).await.is_some());
    drop(driver);
    assert_eq!(presenter.await.unwrap(), Some(DeltaKind::Drop));

    // Once the run is over the board accepts moves again
    assert!(!game.is_settling());
    if let Some(&id) = game.movable_pieces().first() {
        let col = game.board().piece(id).unwrap().col;
        let range = game.target_cols(id).unwrap();
        let target = if *range.end() != col { *range.end() } else { *range.start() };
        assert!(game.move_request(id, target as i32).is_some());
    }
}

#[test]
fn snapshot_serializes_bottom_row_first() {
    let board = Board::from_pieces(2, 3, &[(0, 1, 2)]).unwrap();
    let game = GameState::from_board(GameConfig::default(), board).unwrap();

    let v = serde_json::to_value(game.snapshot()).unwrap();
    assert_eq!(v["rows"], 2);
    assert_eq!(v["columns"], 3);
    assert_eq!(v["grid"][0], serde_json::json!([0, 1, 1]));
    assert_eq!(v["grid"][1], serde_json::json!([0, 0, 0]));
    assert_eq!(v["pieces"][0]["width"], 2);
    assert_eq!(v["settling"], false);
    assert_eq!(v["phase"], "idle");
}
