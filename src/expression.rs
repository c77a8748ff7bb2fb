use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// An entry of the episode list on a season page.
    pub static ref EPISODE: Regex = Regex::new(r#"<li data-episode="(\d+)""#).unwrap();
}
