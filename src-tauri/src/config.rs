// Application configuration
// Data locations, the image server port and the fixed window layout

use std::path::{Path, PathBuf};

use crate::state::storage::{self, StorageResult};

pub const DATA_DIR_ENV: &str = "P5_PLAYER_DATA_DIR";
pub const IMAGE_PORT_ENV: &str = "P5_PLAYER_IMAGE_PORT";

pub const DEFAULT_IMAGE_PORT: u16 = 8080;
pub const BLOCKS_FILE: &str = "code_blocks.json";
pub const TRACK_FILE: &str = "track_data.json";
pub const IMAGES_DIR: &str = "images";

/// Position and size of one application window, in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowLayout {
    pub label: &'static str,
    pub title: &'static str,
    pub url: &'static str,
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
    pub decorations: bool,
    pub always_on_top: bool,
}

pub const RENDER_WINDOW: WindowLayout = WindowLayout {
    label: "render",
    title: "p5 Render",
    url: "render.html",
    width: 1000.0,
    height: 1000.0,
    x: 0.0,
    y: 250.0,
    decorations: false,
    always_on_top: true,
};

pub const EDITOR_WINDOW: WindowLayout = WindowLayout {
    label: "editor",
    title: "p5 Editor",
    url: "editor.html",
    width: 1000.0,
    height: 1000.0,
    x: 1000.0,
    y: 250.0,
    decorations: true,
    always_on_top: false,
};

pub const TRACK_WINDOW: WindowLayout = WindowLayout {
    label: "track",
    title: "p5 Track",
    url: "track.html",
    width: 2000.0,
    height: 350.0,
    x: 0.0,
    y: 0.0,
    decorations: true,
    always_on_top: false,
};

pub const WINDOWS: [WindowLayout; 3] = [RENDER_WINDOW, EDITOR_WINDOW, TRACK_WINDOW];

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub images_dir: PathBuf,
    pub image_server_port: u16,
}

impl AppConfig {
    /// Config rooted at `data_dir` with the default port
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        AppConfig {
            images_dir: data_dir.join(IMAGES_DIR),
            data_dir,
            image_server_port: DEFAULT_IMAGE_PORT,
        }
    }

    /// Build the config from the process environment
    pub fn from_env() -> StorageResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from `lookup`, falling back to the app data directory
    pub fn from_lookup<F>(lookup: F) -> StorageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = match lookup(DATA_DIR_ENV).filter(|dir| !dir.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => storage::get_app_data_dir()?,
        };

        let mut config = Self::with_data_dir(data_dir);
        if let Some(raw) = lookup(IMAGE_PORT_ENV) {
            match raw.parse::<u16>() {
                Ok(port) => config.image_server_port = port,
                Err(e) => log::warn!(
                    "Ignoring {}={:?}: {}, using port {}",
                    IMAGE_PORT_ENV,
                    raw,
                    e,
                    DEFAULT_IMAGE_PORT
                ),
            }
        }
        Ok(config)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn blocks_path(&self) -> PathBuf {
        self.data_dir.join(BLOCKS_FILE)
    }

    pub fn track_path(&self) -> PathBuf {
        self.data_dir.join(TRACK_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (DATA_DIR_ENV, "/tmp/p5-data"),
            (IMAGE_PORT_ENV, "9090"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir(), Path::new("/tmp/p5-data"));
        assert_eq!(config.images_dir, PathBuf::from("/tmp/p5-data/images"));
        assert_eq!(config.image_server_port, 9090);
        assert_eq!(config.blocks_path(), PathBuf::from("/tmp/p5-data/code_blocks.json"));
        assert_eq!(config.track_path(), PathBuf::from("/tmp/p5-data/track_data.json"));
    }

    #[test]
    fn test_bad_port_falls_back() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (DATA_DIR_ENV, "/tmp/p5-data"),
            (IMAGE_PORT_ENV, "not-a-port"),
        ]))
        .unwrap();

        assert_eq!(config.image_server_port, DEFAULT_IMAGE_PORT);
    }

    #[test]
    fn test_window_layout() {
        assert_eq!(WINDOWS.len(), 3);
        assert!(RENDER_WINDOW.always_on_top);
        assert!(!RENDER_WINDOW.decorations);
        assert_eq!((TRACK_WINDOW.width, TRACK_WINDOW.height), (2000.0, 350.0));
        assert_eq!((EDITOR_WINDOW.x, EDITOR_WINDOW.y), (1000.0, 250.0));
    }
}
