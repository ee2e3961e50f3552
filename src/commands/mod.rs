pub mod crawl;
pub mod serve;

// Re-export command functions for convenience
pub use crawl::{crawl, CrawlParams};
pub use serve::{serve, ServeParams};
