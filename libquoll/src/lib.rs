use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub mod args;
pub mod context;
pub mod dead_strip;
pub mod error;
pub(crate) mod gc_stats;
pub mod macho;
pub mod subsection;
pub mod symbol;
pub mod symbol_db;

pub use context::Context;
pub use dead_strip::dead_strip;

/// Installs the default tracing subscriber. The surrounding linker driver should call this
/// once on startup; the filter is controlled via `RUST_LOG`.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();
}
