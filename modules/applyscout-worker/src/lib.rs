pub mod adapter;
pub mod pipeline;
pub mod query;
pub mod ranker;
pub mod retry;
pub mod runner;
pub mod search;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod throttle;
pub mod yutori;
