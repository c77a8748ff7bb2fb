use color_eyre::{eyre::bail, Result};
use indicatif::ProgressBar;
use log::{LevelFilter, Log, Metadata, Record};
use simple_logger::SimpleLogger;

/// Forwards records to `simple_logger` with the progress bar suspended,
/// so log lines never tear through it.
struct BarLogger {
    inner: SimpleLogger,
    bar: ProgressBar,
}

impl Log for BarLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.bar.suspend(|| self.inner.log(record));
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

pub fn init(verbosity: u8, bar: &ProgressBar) -> Result<()> {
    let level = match verbosity {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        2 => log::Level::Trace,
        _ => {
            bail!("Trace is as verbose as it gets, drop the extra -v flags")
        }
    };
    // The browser driver and HTTP stack are chatty below warnings.
    let inner = SimpleLogger::new()
        .with_level(level.to_level_filter())
        .with_module_level("headless_chrome", LevelFilter::Warn)
        .with_module_level("tungstenite", LevelFilter::Warn)
        .with_module_level("hyper", LevelFilter::Warn)
        .with_module_level("reqwest", LevelFilter::Warn);
    log::set_max_level(inner.max_level());
    log::set_boxed_logger(Box::new(BarLogger {
        inner,
        bar: bar.clone(),
    }))?;
    Ok(())
}
