use std::time::Duration;

use tetra_slide_core::GameConfig;

use crate::types::{
    DeltaKind, CLEAR_PAUSE_MS, DROP_PAUSE_MS, INJECT_PAUSE_MS, SLIDE_PAUSE_MS, SPAWN_PAUSE_MS,
};

/// Animation pause after each kind of delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub slide_ms: u64,
    pub drop_ms: u64,
    pub clear_ms: u64,
    pub inject_ms: u64,
    pub spawn_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            slide_ms: SLIDE_PAUSE_MS,
            drop_ms: DROP_PAUSE_MS,
            clear_ms: CLEAR_PAUSE_MS,
            inject_ms: INJECT_PAUSE_MS,
            spawn_ms: SPAWN_PAUSE_MS,
        }
    }
}

impl Pacing {
    /// No pauses at all
    pub fn instant() -> Self {
        Self {
            slide_ms: 0,
            drop_ms: 0,
            clear_ms: 0,
            inject_ms: 0,
            spawn_ms: 0,
        }
    }

    pub fn delay_for(&self, kind: DeltaKind) -> Duration {
        let ms = match kind {
            DeltaKind::Slide => self.slide_ms,
            DeltaKind::Drop => self.drop_ms,
            DeltaKind::Clear => self.clear_ms,
            DeltaKind::Inject => self.inject_ms,
            DeltaKind::Spawn => self.spawn_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Runtime configuration for the autoplay binary
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub game: GameConfig,
    pub turns: u32,
    pub paced: bool,
    pub pacing: Pacing,
    pub delta_log_path: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            turns: 20,
            paced: false,
            pacing: Pacing::default(),
            delta_log_path: None,
        }
    }
}

impl RuntimeConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`RuntimeConfig::from_env`] with an explicit variable source.
    ///
    /// Absent or unparsable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
            value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
        }

        let defaults = Self::default();
        let mut game = defaults.game;
        game.rows = parsed(lookup("TETRA_ROWS"), game.rows);
        game.columns = parsed(lookup("TETRA_COLUMNS"), game.columns);
        game.seed = parsed(lookup("TETRA_SEED"), game.seed);
        game.inject_attempts = parsed(lookup("TETRA_INJECT_ATTEMPTS"), game.inject_attempts);
        game.fill_density_min = parsed(lookup("TETRA_FILL_MIN"), game.fill_density_min);
        game.fill_density_max = parsed(lookup("TETRA_FILL_MAX"), game.fill_density_max);

        let turns = parsed(lookup("TETRA_TURNS"), defaults.turns);

        let paced = lookup("TETRA_PACED")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        let delta_log_path = lookup("TETRA_DELTA_LOG_PATH")
            .map(|s| s.trim().to_string())
            .and_then(|s| if s.is_empty() { None } else { Some(s) });

        Self {
            game,
            turns,
            paced,
            pacing: defaults.pacing,
            delta_log_path,
        }
    }

    /// Pauses to apply, honouring `paced`
    pub fn effective_pacing(&self) -> Pacing {
        if self.paced {
            self.pacing
        } else {
            Pacing::instant()
        }
    }
}
