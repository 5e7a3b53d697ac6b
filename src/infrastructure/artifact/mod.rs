//! Model artifact retrieval

mod http_fetcher;

pub use http_fetcher::HttpArtifactFetcher;
