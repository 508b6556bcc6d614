pub mod fake_fetcher;
pub mod fixtures;

pub use fake_fetcher::{FakeBackend, FetchCall};
