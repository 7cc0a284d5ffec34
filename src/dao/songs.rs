//! Song library scanning the `ai` and `human` folders and picking tracks for rounds.

use std::{
    collections::{HashSet, VecDeque},
    fs,
    path::{Path, PathBuf},
};

use rand::{Rng, rngs::StdRng, seq::IndexedRandom, SeedableRng};
use tracing::{info, warn};

use crate::{
    config::SongsConfig,
    dao::storage::{StorageError, StorageResult},
    state::game::{Category, Track},
};

const ALLOWED_EXTENSIONS: [&str; 3] = ["mp3", "wav", "ogg"];

/// Source of tracks for new rounds.
pub trait SongSelector: Send {
    /// Pick a track whose path is not in `excluding`, or `None` when nothing is left.
    fn pick(&mut self, excluding: &HashSet<PathBuf>) -> Option<Track>;

    /// Whether the library holds at least one track.
    fn has_any(&self) -> bool;

    /// Whether the track can actually be handed to the audio sink.
    fn is_playable(&self, track: &Track) -> bool {
        track.path.is_file()
    }
}

/// Tracks found on disk, split by category, with a short memory of recent picks.
pub struct SongLibrary {
    silicon: Vec<PathBuf>,
    soul: Vec<PathBuf>,
    recent: VecDeque<PathBuf>,
    recent_memory: usize,
    rng: StdRng,
}

impl SongLibrary {
    /// Build a library from already known track lists.
    pub fn new(silicon: Vec<PathBuf>, soul: Vec<PathBuf>, recent_memory: usize) -> Self {
        Self {
            silicon,
            soul,
            recent: VecDeque::with_capacity(recent_memory),
            recent_memory,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Scan the configured folders. Missing folders count as empty.
    pub fn scan(config: &SongsConfig) -> Self {
        let silicon = scan_dir_or_empty(&config.ai_dir);
        let soul = scan_dir_or_empty(&config.human_dir);
        info!(
            silicon = silicon.len(),
            soul = soul.len(),
            "song library scanned"
        );
        Self::new(silicon, soul, config.recent_memory)
    }

    /// Replace the random source, mostly useful to get reproducible picks.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    fn remember(&mut self, path: PathBuf) {
        if self.recent_memory == 0 {
            return;
        }
        if self.recent.len() == self.recent_memory {
            self.recent.pop_front();
        }
        self.recent.push_back(path);
    }
}

impl SongSelector for SongLibrary {
    fn pick(&mut self, excluding: &HashSet<PathBuf>) -> Option<Track> {
        let mut candidates: Vec<(Category, Vec<&PathBuf>)> = Vec::with_capacity(2);
        for (category, paths) in [
            (Category::Silicon, &self.silicon),
            (Category::Soul, &self.soul),
        ] {
            let open: Vec<&PathBuf> = paths.iter().filter(|p| !excluding.contains(*p)).collect();
            if !open.is_empty() {
                candidates.push((category, open));
            }
        }

        let (category, paths) = candidates.choose(&mut self.rng)?;
        let fresh: Vec<&PathBuf> = paths
            .iter()
            .copied()
            .filter(|p| !self.recent.contains(*p))
            .collect();
        let pool = if fresh.is_empty() { paths } else { &fresh };
        let path = (*pool.get(self.rng.random_range(0..pool.len()))?).clone();
        let category = *category;

        self.remember(path.clone());
        Some(Track::new(path, category))
    }

    fn has_any(&self) -> bool {
        !(self.silicon.is_empty() && self.soul.is_empty())
    }
}

fn scan_dir_or_empty(dir: &Path) -> Vec<PathBuf> {
    match scan_dir(dir) {
        Ok(paths) => paths,
        Err(err) => {
            warn!(error = %err, "song folder unavailable; treating it as empty");
            Vec::new()
        }
    }
}

/// List playable audio files directly inside `dir`, sorted by path.
pub fn scan_dir(dir: &Path) -> StorageResult<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).map_err(|err| StorageError::io(dir, "reading song folder", err))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_allowed_extension(path))
        .collect();
    paths.sort();
    Ok(paths)
}

fn has_allowed_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}
