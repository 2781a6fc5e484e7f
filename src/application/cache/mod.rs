//! Runtime caches shared between the feed and the strategies.
//!
//! - [`quote::QuoteCache`]: latest top-of-book per outcome token

pub mod quote;

pub use quote::QuoteCache;
