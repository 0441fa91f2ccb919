mod config;
mod driver;
pub mod view;

pub use config::SyncConfig;
pub use driver::{SyncHandle, Synchronizer};
pub use view::{HistoryRequest, MarketView, ViewModel};
