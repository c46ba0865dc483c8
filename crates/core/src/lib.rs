pub mod config;
pub mod config_loader;
pub mod config_watcher;
pub mod kelly;

pub use config::ArbitrageConfig;
pub use config_loader::ConfigLoader;
pub use config_watcher::ConfigWatcher;
pub use kelly::{BetDecision, BetReason, KellySizer};
