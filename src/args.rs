use clap::{error::ErrorKind, ArgAction::Count, CommandFactory, Parser};
use tokio::time::Duration;
use url::Url;

/// Download agent for sdarot.tv
///
/// The show_id can be read off any of the show's URLs, like so:
/// https://sdarot.tv/watch/{show_id}-anything
///
/// For example, the following URLs are equivalent:
/// https://sdarot.tv/watch/82-Games-of-thrones,
/// https://sdarot.tv/watch/82-ABC and
/// https://sdarot.tv/watch/82-123
#[derive(Parser, Debug, Clone)]
#[command(author, version)]
pub struct Args {
    /// Numeric identifier of the show
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub show_id: u32,

    /// First season to download
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub first_season: u32,

    /// Last season to download, inclusive
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    pub last_season: u32,

    /// Number of episodes to process in parallel
    #[arg(short = 'j', long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: u16,

    /// Directory to create the season directories in
    #[arg(short, long, default_value = ".")]
    pub output: String,

    /// Base URL of the show pages
    #[arg(long, default_value = "https://sdarot.tv/watch")]
    pub site: Url,

    /// How long to wait for an episode page to finish loading
    #[arg(long, default_value = "40", value_parser = parse_seconds, value_name = "SECONDS")]
    pub load_timeout: Duration,

    /// How long to wait for the video to appear after proceeding
    #[arg(long, default_value = "5", value_parser = parse_seconds, value_name = "SECONDS")]
    pub video_timeout: Duration,

    /// Show the browser window instead of running it headless
    #[arg(long)]
    pub show_browser: bool,

    /// Exit with a nonzero status if any episode failed
    #[arg(long)]
    pub fail_on_error: bool,

    /// Turn debugging information on
    #[arg(short, long, action = Count)]
    pub verbose: u8,
}

pub fn parse() -> Args {
    validate(Args::parse()).unwrap_or_else(|e| e.exit())
}

/// Rejects what clap cannot check one argument at a time.
fn validate(args: Args) -> Result<Args, clap::Error> {
    if args.first_season > args.last_season {
        return Err(Args::command().error(
            ErrorKind::ValueValidation,
            format!(
                "first season ({}) must not be greater than last season ({})",
                args.first_season, args.last_season
            ),
        ));
    }
    Ok(args)
}

fn parse_seconds(arg: &str) -> Result<std::time::Duration, std::num::ParseIntError> {
    let seconds = arg.parse()?;
    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["sdarot-dl", "82", "1", "3"]).unwrap();
        assert_eq!(args.show_id, 82);
        assert_eq!((args.first_season, args.last_season), (1, 3));
        assert_eq!(args.jobs, 4);
        assert_eq!(args.load_timeout, Duration::from_secs(40));
        assert_eq!(args.video_timeout, Duration::from_secs(5));
        assert_eq!(args.site.as_str(), "https://sdarot.tv/watch");
        assert!(!args.fail_on_error);
    }

    #[test]
    fn reversed_season_range_is_a_usage_error() {
        let args = Args::try_parse_from(["sdarot-dl", "82", "3", "1"]).unwrap();
        let err = validate(args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn single_season_range_is_accepted() {
        let args = Args::try_parse_from(["sdarot-dl", "82", "2", "2"]).unwrap();
        let args = validate(args).unwrap();
        assert_eq!((args.first_season, args.last_season), (2, 2));
    }

    #[test]
    fn rejects_zero_season() {
        assert!(Args::try_parse_from(["sdarot-dl", "82", "0", "3"]).is_err());
    }

    #[test]
    fn rejects_zero_jobs() {
        assert!(Args::try_parse_from(["sdarot-dl", "82", "1", "1", "-j", "0"]).is_err());
    }

    #[test]
    fn custom_timeouts() {
        let args = Args::try_parse_from([
            "sdarot-dl",
            "82",
            "2",
            "2",
            "--load-timeout",
            "60",
            "--video-timeout",
            "10",
        ])
        .unwrap();
        assert_eq!(args.load_timeout, Duration::from_secs(60));
        assert_eq!(args.video_timeout, Duration::from_secs(10));
    }
}
