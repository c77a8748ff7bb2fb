use crate::{
    listing::ListEpisodes,
    site::{self, Site},
};

use color_eyre::{
    eyre::{ensure, Result, WrapErr},
    Section,
};
use log::info;
use std::{
    ops::RangeInclusive,
    path::{Path, PathBuf},
};
use tokio::fs;
use url::Url;

/// Inclusive range of seasons to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonRange {
    first: u32,
    last: u32,
}

impl SeasonRange {
    pub fn new(first: u32, last: u32) -> Result<Self> {
        ensure!(first >= 1, "Seasons are numbered from 1, got {first}");
        ensure!(
            first <= last,
            "First season {first} is after last season {last}"
        );
        Ok(SeasonRange { first, last })
    }

    pub fn seasons(&self) -> RangeInclusive<u32> {
        self.first..=self.last
    }
}

/// Everything needed to fetch one episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mission {
    pub season: u32,
    pub episode: u32,
    /// The episode page to resolve the video from.
    pub url: Url,
    /// Where the video ends up.
    pub output: PathBuf,
}

/// Expands the season range of a show into missions, one per listed episode.
///
/// Season directories are created below `root` up front, even for seasons
/// without any episodes, so workers never race on creating them.
pub async fn build<L: ListEpisodes + ?Sized>(
    lister: &L,
    site: &Site,
    show_id: u32,
    seasons: SeasonRange,
    root: &Path,
) -> Result<Vec<Mission>> {
    let mut missions = Vec::new();
    for season in seasons.seasons() {
        let episodes = lister.list_episodes(&site.season_url(show_id, season)).await;
        let directory = site::season_dir(root, season);
        fs::create_dir_all(&directory)
            .await
            .wrap_err(format!(
                "Failed to create season directory {}",
                directory.display()
            ))
            .suggestion("Try supplying an output location you can write to")?;
        info!("Season {season} has {} episodes", episodes.len());

        missions.extend(episodes.into_iter().map(|episode| Mission {
            season,
            episode,
            url: site.episode_url(show_id, season, episode),
            output: site::episode_file(&directory, episode),
        }));
    }
    Ok(missions)
}
