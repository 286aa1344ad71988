//! Room journal persistence configuration (component C2).

use super::defaults::{default_archive_subdir, default_data_dir, default_rooms_subdir};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JournalConfig {
    /// Root directory for all persisted journal state.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Subdirectory (under `data_dir`) holding active room journals.
    #[serde(default = "default_rooms_subdir")]
    pub rooms_subdir: String,
    /// Subdirectory (under `data_dir`) holding archived room journals.
    #[serde(default = "default_archive_subdir")]
    pub archive_subdir: String,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            rooms_subdir: default_rooms_subdir(),
            archive_subdir: default_archive_subdir(),
        }
    }
}

impl JournalConfig {
    pub fn rooms_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join(&self.rooms_subdir)
    }

    pub fn archive_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join(&self.archive_subdir)
    }

    pub fn room_path(&self, code: &str) -> std::path::PathBuf {
        self.rooms_dir().join(format!("{code}.json"))
    }
}
