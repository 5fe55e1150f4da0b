use std::sync::Arc;

use market::{PollScheduler, WatchlistStore};

pub mod command;
pub mod config;

pub struct Data {
    pub watchlist: Arc<WatchlistStore>,
    pub scheduler: Arc<PollScheduler>,
    pub history_days: u32,
}

pub type Error = anyhow::Error;
