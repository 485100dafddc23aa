use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CrawlerError;

pub const DEFAULT_BASE_URL: &str = "https://demonlist.org";
pub const DEFAULT_OUTPUT_PATH: &str = "data/demonlist.json";

/// Anchors of list cards; the link path carries the rank.
pub const DEFAULT_CARD_SELECTOR: &str = r#"a[href^="/classic/"]"#;
/// Grid wrapping the list; its presence means the first batch rendered.
pub const DEFAULT_LIST_CONTAINER_SELECTOR: &str =
    r"div.w-\[90\%\].mx-auto.grid.justify-items-center";
/// Label elements on a level page. The value is the following `<p>` sibling.
pub const DEFAULT_DETAIL_LABEL_SELECTOR: &str = "p.font-bold";

/// Settings for one crawl run. Built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub base_url: String,
    pub output_path: PathBuf,
    /// Where the published dataset is served from. Only reported.
    pub mirror_url: Option<String>,
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,

    pub page_load_timeout: Duration,
    pub selector_timeout: Duration,
    pub detail_selector_timeout: Duration,

    pub scroll_pause: Duration,
    pub max_wait_for_new: Duration,
    pub max_no_new_attempts: u32,
    pub fast_scrolls_per_step: u32,
    pub fast_scroll_delay: Duration,
    /// Give up with an error if the list is still not settled after this
    /// many scroll bursts. Unlimited by default.
    pub max_scroll_rounds: Option<u32>,

    pub list_settle_delay: Duration,
    pub detail_settle_delay: Duration,

    pub card_selector: String,
    pub list_container_selector: String,
    pub detail_label_selector: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            mirror_url: None,
            headless: false,
            chrome_executable: None,
            page_load_timeout: Duration::from_secs(60),
            selector_timeout: Duration::from_secs(30),
            detail_selector_timeout: Duration::from_secs(15),
            scroll_pause: Duration::from_millis(500),
            max_wait_for_new: Duration::from_secs(5),
            max_no_new_attempts: 5,
            fast_scrolls_per_step: 3,
            fast_scroll_delay: Duration::from_millis(300),
            max_scroll_rounds: None,
            list_settle_delay: Duration::from_secs(2),
            detail_settle_delay: Duration::from_millis(500),
            card_selector: DEFAULT_CARD_SELECTOR.to_string(),
            list_container_selector: DEFAULT_LIST_CONTAINER_SELECTOR.to_string(),
            detail_label_selector: DEFAULT_DETAIL_LABEL_SELECTOR.to_string(),
        }
    }
}

impl CrawlerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Defaults overlaid with `DEMONLIST_*` environment variables.
    pub fn from_env() -> Result<Self, CrawlerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CrawlerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("DEMONLIST_BASE_URL") {
            config.base_url = url;
        }
        if let Some(path) = lookup("DEMONLIST_OUTPUT") {
            config.output_path = PathBuf::from(path);
        }
        if let Some(url) = lookup("DEMONLIST_MIRROR_URL") {
            config.mirror_url = Some(url);
        }
        if let Some(headless) = parse_var::<bool, _>(&lookup, "DEMONLIST_HEADLESS")? {
            config.headless = headless;
        }
        if let Some(path) = lookup("CHROME_PATH").or_else(|| lookup("CHROMIUM_PATH")) {
            config.chrome_executable = Some(PathBuf::from(path));
        }

        let millis = |key: &str| -> Result<Option<Duration>, CrawlerError> {
            Ok(parse_var::<u64, _>(&lookup, key)?.map(Duration::from_millis))
        };
        if let Some(d) = millis("DEMONLIST_PAGE_LOAD_TIMEOUT_MS")? {
            config.page_load_timeout = d;
        }
        if let Some(d) = millis("DEMONLIST_SELECTOR_TIMEOUT_MS")? {
            config.selector_timeout = d;
        }
        if let Some(d) = millis("DEMONLIST_DETAIL_TIMEOUT_MS")? {
            config.detail_selector_timeout = d;
        }
        if let Some(d) = millis("DEMONLIST_SCROLL_PAUSE_MS")? {
            config.scroll_pause = d;
        }
        if let Some(d) = millis("DEMONLIST_MAX_WAIT_FOR_NEW_MS")? {
            config.max_wait_for_new = d;
        }
        if let Some(d) = millis("DEMONLIST_FAST_SCROLL_DELAY_MS")? {
            config.fast_scroll_delay = d;
        }
        if let Some(n) = parse_var(&lookup, "DEMONLIST_MAX_NO_NEW_ATTEMPTS")? {
            config.max_no_new_attempts = n;
        }
        if let Some(n) = parse_var(&lookup, "DEMONLIST_FAST_SCROLLS_PER_STEP")? {
            config.fast_scrolls_per_step = n;
        }
        if let Some(n) = parse_var(&lookup, "DEMONLIST_MAX_SCROLL_ROUNDS")? {
            config.max_scroll_rounds = Some(n);
        }

        Ok(config)
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_mirror_url(mut self, url: impl Into<String>) -> Self {
        self.mirror_url = Some(url.into());
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_page_load_timeout(mut self, timeout: Duration) -> Self {
        self.page_load_timeout = timeout;
        self
    }

    pub fn with_selector_timeout(mut self, timeout: Duration) -> Self {
        self.selector_timeout = timeout;
        self
    }

    pub fn with_scroll_pause(mut self, pause: Duration) -> Self {
        self.scroll_pause = pause;
        self
    }

    pub fn with_max_wait_for_new(mut self, wait: Duration) -> Self {
        self.max_wait_for_new = wait;
        self
    }

    pub fn with_max_no_new_attempts(mut self, attempts: u32) -> Self {
        self.max_no_new_attempts = attempts;
        self
    }

    pub fn with_fast_scrolls_per_step(mut self, scrolls: u32) -> Self {
        self.fast_scrolls_per_step = scrolls;
        self
    }

    pub fn with_max_scroll_rounds(mut self, rounds: u32) -> Self {
        self.max_scroll_rounds = Some(rounds);
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, CrawlerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| CrawlerError::Config(format!("{key}={raw:?}: {e}"))),
    }
}
