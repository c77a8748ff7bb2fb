use crate::expression;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use url::Url;

/// Discovers the episodes of a season.
#[async_trait]
pub trait ListEpisodes: Send + Sync {
    /// Returns the episode numbers in the order the season page lists them.
    /// A season that could not be fetched has no episodes.
    async fn list_episodes(&self, season_url: &Url) -> Vec<u32>;
}

/// Lists episodes by scraping the season page.
pub struct SiteLister {
    client: Client,
}

impl SiteLister {
    pub fn new(client: Client) -> Self {
        SiteLister { client }
    }
}

#[async_trait]
impl ListEpisodes for SiteLister {
    async fn list_episodes(&self, season_url: &Url) -> Vec<u32> {
        let response = match self.client.get(season_url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to fetch {season_url}: {e}");
                return vec![];
            }
        };
        let status = response.status();
        if status != StatusCode::OK {
            warn!("{season_url} responded with status code {status}");
            return vec![];
        }
        match response.text().await {
            Ok(text) => {
                let episodes = parse(&text);
                debug!("{season_url} lists {} episodes", episodes.len());
                episodes
            }
            Err(e) => {
                warn!("Failed to read {season_url}: {e}");
                vec![]
            }
        }
    }
}

/// Returns every episode number marked up in the text, duplicates included.
pub fn parse(text: &str) -> Vec<u32> {
    expression::EPISODE
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .filter_map(|number| number.as_str().parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SEASON_PAGE: &str = r##"
<ul id="episode">
    <li data-episode="1" data-episode-id="101"><a href="#">1</a></li>
    <li data-episode="2" data-episode-id="102"><a href="#">2</a></li>
    <li data-episode="5" data-episode-id="105"><a href="#">5</a></li>
</ul>
"##;

    #[test]
    fn parses_non_contiguous_episodes_in_order() {
        assert_eq!(parse(SEASON_PAGE), vec![1, 2, 5]);
    }

    #[test]
    fn keeps_duplicates_and_listing_order() {
        let text = r#"<li data-episode="3"><li data-episode="1"><li data-episode="3">"#;
        assert_eq!(parse(text), vec![3, 1, 3]);
    }

    #[test]
    fn ignores_other_markup() {
        let text = r#"<li data-season="4"><li data-episode="x"><li data-episode="99999999999">"#;
        assert!(parse(text).is_empty());
    }

    #[tokio::test]
    async fn lists_episodes_from_season_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/watch/82/season/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SEASON_PAGE))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/watch/82/season/1", server.uri())).unwrap();
        let lister = SiteLister::new(Client::new());
        assert_eq!(lister.list_episodes(&url).await, vec![1, 2, 5]);
    }

    #[tokio::test]
    async fn non_success_status_lists_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string(SEASON_PAGE))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/watch/82/season/9", server.uri())).unwrap();
        let lister = SiteLister::new(Client::new());
        assert!(lister.list_episodes(&url).await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_site_lists_nothing() {
        // Nothing listens on the discard port.
        let url = Url::parse("http://127.0.0.1:9/watch/82/season/1").unwrap();
        let lister = SiteLister::new(Client::new());
        assert!(lister.list_episodes(&url).await.is_empty());
    }
}
