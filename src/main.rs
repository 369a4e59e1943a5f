//! Headless autoplay runner (default binary).
//!
//! Starts a game from `TETRA_*` environment variables, then plays random legal
//! moves through the paced driver and prints the board after every turn.
//! `RUST_LOG=debug` shows the settle phases; `RUST_LOG=trace` dumps the grid
//! after every mutation.

use anyhow::{Context, Result};
use log::info;
use tokio::sync::mpsc;

use tetra_slide::adapter::{spawn_timed_presenter, DeltaLog, Frame, PacedDriver, RuntimeConfig};
use tetra_slide::core::{GameState, SimpleRng};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = RuntimeConfig::from_env();
    let mut game = GameState::new(config.game.clone()).context("invalid game configuration")?;

    let (log, writer) = match config.delta_log_path.clone() {
        Some(path) => {
            let (log, handle) = DeltaLog::spawn(path);
            (Some(log), Some(handle))
        }
        None => (None, None),
    };

    let (frame_tx, frame_rx) = mpsc::channel::<Frame>(1);
    let presenter = spawn_timed_presenter(frame_rx, config.effective_pacing());
    let mut driver = PacedDriver::new(frame_tx, log);

    driver.start(&mut game).await;
    println!("seed {}\n{}", config.game.seed, game.board());

    let mut bot = SimpleRng::new(config.game.seed.wrapping_add(1));
    for turn in 1..=config.turns {
        let movable = game.movable_pieces();
        if movable.is_empty() {
            info!("no piece can move; stopping after {} turn(s)", turn - 1);
            break;
        }

        let id = movable[bot.next_range(movable.len() as u32) as usize];
        let (Some(piece), Some(range)) = (game.board().piece(id).copied(), game.target_cols(id))
        else {
            continue;
        };
        let targets: Vec<usize> = range.filter(|&col| col != piece.col).collect();
        let target = targets[bot.next_range(targets.len() as u32) as usize];

        let presented = driver
            .play_turn(&mut game, id, target as i32)
            .await
            .unwrap_or(0);
        println!(
            "turn {}: {} row {} column {} -> {} ({} deltas, {} pieces left)",
            turn,
            id,
            piece.row,
            piece.col,
            target,
            presented,
            game.all_pieces().len()
        );
        println!("{}", game.board());
    }

    let snapshot = game.snapshot();
    info!(
        "episode {} finished with {} occupied cell(s) (playable: {})",
        snapshot.episode_id,
        snapshot.occupied_cells(),
        snapshot.playable()
    );

    drop(driver);
    let shown = presenter.await.context("presenter task failed")?;
    info!("presented {} frame(s)", shown);

    if let Some(writer) = writer {
        writer.await.context("delta log task failed")??;
    }
    Ok(())
}
