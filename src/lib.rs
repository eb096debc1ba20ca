// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod analysis;
pub mod app_dirs;
pub mod config;
pub mod history;
pub mod metrics;
pub mod results;
pub mod runtime;
pub mod session;
pub mod store;
pub mod texts;
pub mod time_series;
pub mod timer;
pub mod trainer;
pub mod util;
