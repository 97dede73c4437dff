//! SEC EDGAR filing resolution

pub mod client;
pub mod fetcher;
pub mod index;
pub mod rate_limiter;

pub use client::{EdgarClient, FetchStrategy};
pub use fetcher::{FetchOutcome, FilingFetcher};
pub use index::{Cik, FilingIndex, FilingMatch, FilingQuery};
pub use rate_limiter::{Clock, ManualClock, RateLimiter, TokioClock};
