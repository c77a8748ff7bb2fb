mod args;
mod download;
mod expression;
mod listing;
mod logging;
mod mission;
mod progress;
mod resolve;
mod runner;
mod site;

use crate::{
    download::Downloader,
    listing::SiteLister,
    mission::SeasonRange,
    resolve::BrowserResolver,
    runner::Runner,
    site::Site,
};

use color_eyre::{
    eyre::{bail, Result, WrapErr},
    Section,
};
use indicatif::ProgressDrawTarget;
use log::info;
use reqwest::Client;
use std::{path::Path, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = args::parse();

    // Hidden while the seasons are listed, so only the batch is counted.
    let bar = progress::console_bar()?;
    bar.set_draw_target(ProgressDrawTarget::hidden());
    logging::init(args.verbose, &bar)?;

    let site = Site::new(args.site.clone())
        .suggestion("Pass the show listing URL, like https://sdarot.tv/watch")?;
    let seasons = SeasonRange::new(args.first_season, args.last_season)?;
    let client = Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .wrap_err("Failed to set up the HTTP client")?;

    let missions = mission::build(
        &SiteLister::new(client.clone()),
        &site,
        args.show_id,
        seasons,
        Path::new(&args.output),
    )
    .await?;
    info!(
        "Downloading {} episodes of show {}, {} at a time",
        missions.len(),
        args.show_id,
        args.jobs
    );

    let resolver = Arc::new(BrowserResolver {
        load_timeout: args.load_timeout,
        video_timeout: args.video_timeout,
        headless: !args.show_browser,
    });
    let runner = Runner::new(args.jobs.into(), resolver, Box::new(Downloader::new(client)));

    bar.set_draw_target(ProgressDrawTarget::stderr());
    let report = runner.run_batch(missions, &bar).await;
    info!(
        "Downloaded {} of {} episodes, {} failed",
        report.succeeded,
        report.total(),
        report.failed()
    );

    if args.fail_on_error && report.failed() > 0 {
        bail!(
            "{} episodes could not be resolved and {} could not be downloaded",
            report.resolve_failed,
            report.download_failed
        );
    }
    Ok(())
}
