pub mod apply;
pub mod discover;
pub mod scheduler;

pub use apply::{run_apply_pass, ApplyStats};
pub use discover::{run_discovery, DiscoveryStats};
pub use scheduler::run_scheduler;
