//! Headline scraping from the finance quote page

use crate::cache::HeadlineCache;
use crate::config::WatchConfig;
use crate::error::{Result, WatchError};
use crate::sentiment::SentimentScorer;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;

use super::quotes::USER_AGENT;

/// Shown when the page has no headline element
pub const NO_HEADLINE: &str = "No headline";

/// Shown when the page could not be fetched
pub const NEWS_ERROR: &str = "News error";

/// Scored headline for a symbol
#[derive(Debug, Clone, PartialEq)]
pub struct Headline {
    pub text: String,
    /// Compound score in `[-1, 1]`
    pub sentiment: f64,
}

impl Headline {
    pub fn unavailable() -> Self {
        Self {
            text: NEWS_ERROR.to_string(),
            sentiment: 0.0,
        }
    }

    /// First `max_chars` characters followed by an ellipsis
    pub fn truncated(&self, max_chars: usize) -> String {
        let mut short: String = self.text.chars().take(max_chars).collect();
        short.push_str("...");
        short
    }
}

/// Anything that can produce the latest headline text for a symbol
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    /// `Ok(None)` when the page has no headline
    async fn latest_headline(&self, symbol: &str) -> Result<Option<String>>;
}

/// Pulls the lead headline out of a quote page
#[derive(Debug, Clone)]
pub struct HeadlineExtractor {
    mega_item: Regex,
    tag: Regex,
    numeric_entity: Regex,
}

impl HeadlineExtractor {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| WatchError::Other(format!("bad headline pattern: {e}")))
        };

        Ok(Self {
            mega_item: compile(r#"(?is)<li\b[^>]*\bdata-test-locator\s*=\s*["']mega["'][^>]*>(.*?)</li>"#)?,
            tag: compile(r"(?s)<[^>]*>")?,
            numeric_entity: compile(r"&#(?:[xX]([0-9a-fA-F]{1,6})|([0-9]{1,7}));")?,
        })
    }

    /// Text of the first `<li data-test-locator="mega">`, tags stripped
    pub fn extract(&self, html: &str) -> Option<String> {
        let inner = self.mega_item.captures(html)?.get(1)?.as_str();
        let stripped = self.tag.replace_all(inner, " ");
        let text = self
            .decode_entities(&stripped)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        (!text.is_empty()).then_some(text)
    }

    /// `&#8217;` / `&#x2019;` style references first, then the common named
    /// ones; `&amp;` last so escaped references stay literal
    fn decode_entities(&self, text: &str) -> String {
        let numeric = self.numeric_entity.replace_all(text, |caps: &regex::Captures<'_>| {
            let code = match (caps.get(1), caps.get(2)) {
                (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (None, Some(dec)) => dec.as_str().parse().ok(),
                (None, None) => None,
            };
            code.and_then(char::from_u32)
                .map_or_else(|| caps[0].to_string(), String::from)
        });

        numeric
            .replace("&nbsp;", " ")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&")
    }
}

/// Scrapes `{base}/quote/{symbol}?p={symbol}`
#[derive(Debug, Clone)]
pub struct YahooHeadlineClient {
    client: Client,
    base_url: String,
    extractor: HeadlineExtractor,
}

impl YahooHeadlineClient {
    pub fn new(config: &WatchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.headline_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.headline_base_url.trim_end_matches('/').to_string(),
            extractor: HeadlineExtractor::new()?,
        })
    }
}

#[async_trait]
impl HeadlineSource for YahooHeadlineClient {
    async fn latest_headline(&self, symbol: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/quote/{symbol}", self.base_url))
            .query(&[("p", symbol)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WatchError::HeadlineError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let html = response.text().await?;
        Ok(self.extractor.extract(&html))
    }
}

/// Headline source, sentiment scorer and cache wired together
#[derive(Clone)]
pub struct HeadlineAnalyzer {
    source: Arc<dyn HeadlineSource>,
    scorer: Arc<dyn SentimentScorer>,
    cache: HeadlineCache,
}

impl HeadlineAnalyzer {
    pub fn new(
        source: Arc<dyn HeadlineSource>,
        scorer: Arc<dyn SentimentScorer>,
        cache: HeadlineCache,
    ) -> Self {
        Self {
            source,
            scorer,
            cache,
        }
    }

    /// Scored headline for `symbol`. Never fails: scraping problems degrade
    /// to a neutral "News error" headline.
    pub async fn analyze(&self, symbol: &str) -> Headline {
        let result = self
            .cache
            .get_or_fetch(symbol, || async {
                let headline = match self.source.latest_headline(symbol).await? {
                    Some(text) => Headline {
                        sentiment: self.scorer.score(&text),
                        text,
                    },
                    None => Headline {
                        text: NO_HEADLINE.to_string(),
                        sentiment: 0.0,
                    },
                };
                Ok::<_, WatchError>(headline)
            })
            .await;

        result.unwrap_or_else(|e| {
            tracing::debug!(symbol, error = %e, "headline unavailable");
            Headline::unavailable()
        })
    }
}
