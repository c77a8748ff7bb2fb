use color_eyre::eyre::{eyre, Result};
use std::path::{Path, PathBuf};
use url::Url;

/// Extension of every downloaded episode.
pub const MEDIA_EXTENSION: &str = "mp4";

/// Addresses of the show, season and episode pages below a base watch URL.
#[derive(Debug, Clone)]
pub struct Site {
    base: Url,
    segments: Vec<String>,
}

impl Site {
    pub fn new(base: Url) -> Result<Self> {
        // Empty segments come from a trailing slash and would double it up.
        let segments = base
            .path_segments()
            .ok_or_else(|| eyre!("Supplied URL cannot be used as a base"))?
            .filter(|segment| !segment.is_empty())
            .map(String::from)
            .collect();
        Ok(Site { base, segments })
    }

    fn join<I: IntoIterator<Item = String>>(&self, tail: I) -> Url {
        let mut url = self.base.clone();
        let segments: Vec<String> = self.segments.iter().cloned().chain(tail).collect();
        url.set_path(&segments.join("/"));
        url
    }

    /// `{site}/{show}/season/{season}`
    pub fn season_url(&self, show_id: u32, season: u32) -> Url {
        self.join([show_id.to_string(), "season".into(), season.to_string()])
    }

    /// `{site}/{show}/season/{season}/episode/{episode}`
    pub fn episode_url(&self, show_id: u32, season: u32, episode: u32) -> Url {
        self.join([
            show_id.to_string(),
            "season".into(),
            season.to_string(),
            "episode".into(),
            episode.to_string(),
        ])
    }
}

pub fn season_dir<P: AsRef<Path>>(root: P, season: u32) -> PathBuf {
    root.as_ref().join(format!("Season_{season}"))
}

pub fn episode_file<P: AsRef<Path>>(season_dir: P, episode: u32) -> PathBuf {
    season_dir
        .as_ref()
        .join(format!("Episode_{episode}.{MEDIA_EXTENSION}"))
}
