use color_eyre::eyre::{eyre, Result, WrapErr};
use headless_chrome::{util::Wait, Browser, LaunchOptions, Tab};
use log::{debug, trace};
use std::{collections::BTreeMap, fmt::Display, time::Duration};
use url::Url;

/// Shown once the episode page has finished its countdown.
const GATE: &str = "#afterLoad";
/// Clicked to get past the gate.
const PROCEED: &str = "#proceed";
/// The player's `<video>` element.
const VIDEO: &str = "#videojs_html5_api";

/// Extra time the browser may sit idle beyond both waits before it gives up.
const IDLE_MARGIN: Duration = Duration::from_secs(30);

/// A playable video together with the session it was resolved in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    pub url: Url,
    pub cookies: BTreeMap<String, String>,
}

impl ResolvedStream {
    /// Builds a stream from the video element's source and the session cookies.
    pub fn new<I>(source: Option<String>, cookies: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let source = source
            .filter(|source| !source.is_empty())
            .ok_or_else(|| eyre!("Video element has no source"))?;
        let url = Url::parse(&source).wrap_err(format!("Invalid video source {source}"))?;
        Ok(ResolvedStream {
            url,
            cookies: cookies.into_iter().collect(),
        })
    }

    /// The cookies as the value of a `Cookie` request header, in name order.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Turns an episode page into the video it plays.
///
/// Resolving blocks for as long as the page takes to render, so callers run it
/// off the async executor.
pub trait Resolve: Send + Sync {
    fn resolve(&self, page: &Url) -> Result<ResolvedStream>;
}

/// Resolves episodes by rendering their pages in Chrome.
pub struct BrowserResolver {
    pub load_timeout: Duration,
    pub video_timeout: Duration,
    pub headless: bool,
}

fn browser_error<E: Display>(e: E) -> color_eyre::Report {
    eyre!("{e:#}")
}

/// A script evaluating to whether the element matched by `selector` is rendered.
fn visibility_script(selector: &str) -> String {
    format!(
        "(() => {{ \
            const element = document.querySelector('{selector}'); \
            return element !== null \
                && element.getClientRects().length > 0 \
                && getComputedStyle(element).visibility !== 'hidden'; \
        }})()"
    )
}

fn wait_until_visible(tab: &Tab, selector: &str, timeout: Duration) -> Result<()> {
    let script = visibility_script(selector);
    Wait::with_timeout(timeout)
        .until(|| {
            tab.evaluate(&script, false)
                .ok()
                .and_then(|result| result.value)
                .and_then(|value| value.as_bool())
                .filter(|&visible| visible)
        })
        .map_err(|_| {
            eyre!(
                "{selector} did not become visible within {} seconds",
                timeout.as_secs()
            )
        })?;
    trace!("{selector} is visible");
    Ok(())
}

impl Resolve for BrowserResolver {
    fn resolve(&self, page: &Url) -> Result<ResolvedStream> {
        let options = LaunchOptions::default_builder()
            .headless(self.headless)
            .idle_browser_timeout(self.load_timeout + self.video_timeout + IDLE_MARGIN)
            .build()
            .map_err(|e| eyre!("Invalid browser options: {e}"))?;

        // The browser process is killed when `browser` drops, on every return path.
        let browser = Browser::new(options).map_err(browser_error)?;
        let tab = browser.new_tab().map_err(browser_error)?;

        debug!("Loading {page}");
        tab.navigate_to(page.as_str()).map_err(browser_error)?;
        wait_until_visible(&tab, GATE, self.load_timeout)?;

        tab.find_element(PROCEED)
            .map_err(browser_error)?
            .click()
            .map_err(browser_error)?;
        wait_until_visible(&tab, VIDEO, self.video_timeout)?;

        let source = tab
            .evaluate(&format!("document.querySelector('{VIDEO}').src"), false)
            .map_err(browser_error)?
            .value
            .and_then(|value| value.as_str().map(String::from));
        let cookies = tab
            .get_cookies()
            .map_err(browser_error)?
            .into_iter()
            .map(|cookie| (cookie.name, cookie.value));

        ResolvedStream::new(source, cookies).wrap_err(format!("While resolving {page}"))
    }
}
