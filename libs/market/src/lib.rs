mod history;
mod price_client;
mod symbol;
mod watchlist_store;

pub mod indicators;
pub mod poller;

pub use history::{DEFAULT_HISTORY_CAPACITY, HistoryBuffer, PricePoint};
pub use indicators::{IndicatorEngine, IndicatorResult};
pub use poller::{FocusOutcome, FocusView, MarketState, PollOutcome, PollScheduler};
pub use price_client::{FetchError, PriceClient, PriceSource};
pub use symbol::SymbolId;
pub use watchlist_store::WatchlistStore;
