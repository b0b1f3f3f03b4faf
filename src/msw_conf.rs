// User configuration: difficulty and grid size, persisted to disk as TOML

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Difficulty presets. The mine count is fixed per level, independent of
/// the grid size.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,   // 10 mines
    Middle, // 25 mines
    Hard,   // 40 mines
}

impl Difficulty {
    pub fn mine_count(&self) -> usize {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Middle => 25,
            Difficulty::Hard => 40,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Middle => "Middle",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn to_index(&self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Middle => 1,
            Difficulty::Hard => 2,
        }
    }

    pub fn from_index(i: usize) -> Difficulty {
        match i {
            0 => Difficulty::Easy,
            1 => Difficulty::Middle,
            _ => Difficulty::Hard,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,
    pub rows: usize,
    pub columns: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            difficulty: Difficulty::Easy,
            rows: 10,
            columns: 10,
        }
    }
}

/// Configuration file path under the platform config directory
/// (e.g. ~/.config/mswpr/mswpr.toml on Linux), falling back to the
/// current directory.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(exe) = env::current_exe() {
        if let Some(name) = exe.file_stem().and_then(|s| s.to_str()) {
            if let Some(proj) = ProjectDirs::from("io", "mswpr", name) {
                let mut path = proj.config_dir().to_path_buf();
                path.push(format!("{}.toml", name));
                return Some(path);
            } else if let Ok(mut path) = env::current_dir() {
                path.push(format!("{}.toml", name));
                return Some(path);
            }
        }
    }
    None
}

/// Load configuration from disk, or create the default file if missing.
pub fn load_or_create_config() -> Config {
    if let Some(path) = config_path() {
        if path.exists() {
            if let Ok(s) = fs::read_to_string(&path) {
                if let Ok(cfg) = toml::from_str::<Config>(&s) {
                    return cfg;
                }
            }
        }
        let cfg = Config::default();
        save_config(&cfg);
        return cfg;
    }
    Config::default()
}

/// Best-effort save; a read-only config directory is not fatal.
pub fn save_config(cfg: &Config) {
    if let Some(path) = config_path() {
        if let Ok(s) = toml::to_string(cfg) {
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            let _ = fs::write(&path, s);
        }
    }
}
