use crate::{
    download::Fetch,
    mission::Mission,
    progress::{BatchProgress, Reporter},
    resolve::{Resolve, ResolvedStream},
};

use color_eyre::eyre::{eyre, Result};
use futures::{stream, FutureExt, StreamExt};
use log::{debug, error, info};
use std::{panic::AssertUnwindSafe, sync::Arc};
use tokio::task;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    ResolveFailed,
    DownloadFailed,
}

/// How a single mission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissionOutcome {
    pub season: u32,
    pub episode: u32,
    pub status: Status,
}

/// Tally of a finished batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub resolve_failed: usize,
    pub download_failed: usize,
}

impl BatchReport {
    fn record(&mut self, outcome: &MissionOutcome) {
        match outcome.status {
            Status::Success => self.succeeded += 1,
            Status::ResolveFailed => self.resolve_failed += 1,
            Status::DownloadFailed => self.download_failed += 1,
        }
    }

    pub fn failed(&self) -> usize {
        self.resolve_failed + self.download_failed
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed()
    }
}

/// Runs missions on a fixed number of worker slots.
pub struct Runner {
    jobs: usize,
    resolver: Arc<dyn Resolve>,
    fetcher: Box<dyn Fetch>,
}

impl Runner {
    pub fn new(jobs: usize, resolver: Arc<dyn Resolve>, fetcher: Box<dyn Fetch>) -> Self {
        Runner {
            jobs: jobs.max(1),
            resolver,
            fetcher,
        }
    }

    /// Resolves on the blocking pool; a panicking resolver counts as a failure.
    async fn resolve(&self, url: Url) -> Result<ResolvedStream> {
        let resolver = Arc::clone(&self.resolver);
        task::spawn_blocking(move || resolver.resolve(&url))
            .await
            .map_err(|e| eyre!("Resolver did not finish: {e}"))?
    }

    /// Resolves then downloads one episode. Never fails: every error ends up
    /// in the returned outcome.
    pub async fn run(&self, mission: Mission) -> MissionOutcome {
        let Mission {
            season,
            episode,
            url,
            output,
        } = mission;
        let outcome = |status| MissionOutcome {
            season,
            episode,
            status,
        };

        debug!("Resolving season {season} / episode {episode} from {url}");
        let stream = match self.resolve(url).await {
            Ok(stream) => stream,
            Err(e) => {
                error!("Failed to get episode url of season {season} / episode {episode}: {e:#}");
                return outcome(Status::ResolveFailed);
            }
        };

        debug!("Downloading season {season} / episode {episode} from {}", stream.url);
        let saved = AssertUnwindSafe(self.fetcher.fetch(&stream, &output))
            .catch_unwind()
            .await;
        match saved {
            Ok(Ok(true)) => {
                info!("Saved season {season} / episode {episode} to {}", output.display());
                outcome(Status::Success)
            }
            Ok(Ok(false)) => {
                error!("Failed to download video of season {season} / episode {episode}");
                outcome(Status::DownloadFailed)
            }
            Ok(Err(e)) => {
                error!("Failed to download video of season {season} / episode {episode}: {e:#}");
                outcome(Status::DownloadFailed)
            }
            Err(_) => {
                error!("Failed to download video of season {season} / episode {episode}: downloader panicked");
                outcome(Status::DownloadFailed)
            }
        }
    }

    /// Runs every mission, at most `jobs` at a time, advancing the progress
    /// once per mission in whatever order they complete.
    pub async fn run_batch(&self, missions: Vec<Mission>, reporter: &dyn Reporter) -> BatchReport {
        let progress = BatchProgress::new(missions.len(), reporter);
        let report = stream::iter(missions)
            .map(|mission| self.run(mission))
            .buffer_unordered(self.jobs)
            .fold(BatchReport::default(), |mut report, outcome| {
                report.record(&outcome);
                let completed = progress.increment();
                debug!(
                    "Season {} / episode {} finished as {:?} ({completed} done)",
                    outcome.season, outcome.episode, outcome.status
                );
                async move { report }
            })
            .await;
        progress.finish();
        report
    }
}
