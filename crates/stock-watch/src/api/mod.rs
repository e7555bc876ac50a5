//! Clients for the market-data provider and the headline page

pub mod headlines;
pub mod quotes;

pub use headlines::{
    Headline, HeadlineAnalyzer, HeadlineExtractor, HeadlineSource, YahooHeadlineClient,
    NEWS_ERROR, NO_HEADLINE,
};
pub use quotes::{Quote, QuoteSource, UNKNOWN_NAME, YahooQuoteClient};
