//! Background polling of the watchlist and the focused symbol's history.
//!
//! Two independent streams share one [`MarketState`]:
//!
//! * the watchlist stream batches every watched symbol into one current-price
//!   request per tick and appends the results to the rolling history;
//! * the focus stream fetches a longer price range for the focused symbol and
//!   runs the [`IndicatorEngine`] over it.
//!
//! Each stream allows at most one request in flight. A tick that fires while
//! its stream is busy is dropped, not queued.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, info_span, instrument, warn};
use tracing_futures::Instrument;

use crate::{
    HistoryBuffer, IndicatorEngine, IndicatorResult, PricePoint, PriceSource, SymbolId,
    WatchlistStore,
};

/// Latest prices, rolling history and focus analysis.
///
/// Everything a single fetch response changes is applied under one write
/// lock.
#[derive(Debug, Clone)]
pub struct MarketState {
    prices: HashMap<SymbolId, f32>,
    history: HistoryBuffer,
    focus: Option<FocusView>,
}

impl MarketState {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            prices: HashMap::new(),
            history: HistoryBuffer::new(history_capacity),
            focus: None,
        }
    }

    /// Record prices for the requested ids present in `prices`, all stamped
    /// with `fetched_at`. Returns how many symbols were updated.
    pub fn apply_prices(
        &mut self,
        requested: &[SymbolId],
        prices: &HashMap<SymbolId, f32>,
        fetched_at: f64,
    ) -> usize {
        let mut updated = 0;

        for id in requested {
            let Some(&price) = prices.get(id) else {
                continue;
            };

            self.prices.insert(id.clone(), price);
            self.history.append(id, PricePoint::new(fetched_at, price));
            updated += 1;
        }

        updated
    }

    pub fn price(&self, id: &SymbolId) -> Option<f32> {
        self.prices.get(id).copied()
    }

    pub fn prices(&self) -> &HashMap<SymbolId, f32> {
        &self.prices
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn focus(&self) -> Option<&FocusView> {
        self.focus.as_ref()
    }
}

/// Long-range history and indicators for the focused symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusView {
    pub symbol: SymbolId,
    pub points: Vec<PricePoint>,
    pub indicators: IndicatorResult,
    pub fetched_at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Another watchlist fetch was still in flight.
    Skipped,
    /// Nothing to fetch.
    Empty,
    Failed,
    /// Number of symbols updated.
    Updated(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    Skipped,
    /// No symbol is focused.
    Unfocused,
    Failed,
    Updated,
}

/// Clears its flag on drop.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct PollScheduler {
    source: Arc<dyn PriceSource>,
    watchlist: Arc<WatchlistStore>,
    state: RwLock<MarketState>,
    engine: Mutex<IndicatorEngine>,
    focused: RwLock<Option<SymbolId>>,
    poll_in_flight: AtomicBool,
    focus_in_flight: AtomicBool,
    poll_interval: Duration,
    focus_interval: Duration,
    history_days: u32,
}

impl PollScheduler {
    pub fn new(
        source: Arc<dyn PriceSource>,
        watchlist: Arc<WatchlistStore>,
        history_capacity: usize,
    ) -> Self {
        Self {
            source,
            watchlist,
            state: RwLock::new(MarketState::new(history_capacity)),
            engine: Mutex::new(IndicatorEngine::new()),
            focused: RwLock::new(None),
            poll_in_flight: AtomicBool::new(false),
            focus_in_flight: AtomicBool::new(false),
            poll_interval: Duration::from_secs(5),
            focus_interval: Duration::from_secs(60),
            history_days: 7,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_focus_interval(mut self, interval: Duration) -> Self {
        self.focus_interval = interval;
        self
    }

    pub fn with_history_days(mut self, days: u32) -> Self {
        self.history_days = days;
        self
    }

    pub fn watchlist(&self) -> &Arc<WatchlistStore> {
        &self.watchlist
    }

    /// Drive both streams until the task is aborted.
    ///
    /// Each tick spawns its work, so a slow request never delays the timer;
    /// the in-flight guards turn overlapping ticks into no-ops.
    pub async fn run(self: Arc<Self>) {
        let mut poll_tick = tokio::time::interval(self.poll_interval);
        poll_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut focus_tick = tokio::time::interval(self.focus_interval);
        focus_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // focusing triggers its own fetch; skip the immediate first tick
        focus_tick.tick().await;

        info!(
            poll_interval = ?self.poll_interval,
            focus_interval = ?self.focus_interval,
            "poller started"
        );

        loop {
            tokio::select! {
                _ = poll_tick.tick() => {
                    let this = Arc::clone(&self);
                    tokio::spawn(
                        async move {
                            this.poll_once().await;
                        }
                        .instrument(info_span!("poll")),
                    );
                }
                _ = focus_tick.tick() => {
                    if self.focused().is_some() {
                        self.spawn_focus_refresh();
                    }
                }
            }
        }
    }

    /// One watchlist fetch.
    #[instrument(name = "poll_once", skip(self))]
    pub async fn poll_once(&self) -> PollOutcome {
        let Some(_guard) = InFlight::acquire(&self.poll_in_flight) else {
            debug!("previous fetch still in flight, skipping tick");
            return PollOutcome::Skipped;
        };

        let symbols = self.watchlist.list().await;
        if symbols.is_empty() {
            return PollOutcome::Empty;
        }

        match self.source.fetch_current(&symbols).await {
            Ok(prices) => {
                let fetched_at = now_secs();
                let updated = self
                    .state
                    .write()
                    .apply_prices(&symbols, &prices, fetched_at);

                debug!(
                    requested = symbols.len(),
                    updated, "applied current prices"
                );
                PollOutcome::Updated(updated)
            }
            Err(e) => {
                warn!(error = %e, requested = symbols.len(), "fetch_current failed");
                PollOutcome::Failed
            }
        }
    }

    /// Focus `symbol` and fetch its history in the background.
    pub fn focus(self: &Arc<Self>, symbol: SymbolId) {
        info!(%symbol, "focus changed");
        *self.focused.write() = Some(symbol);
        self.spawn_focus_refresh();
    }

    pub fn unfocus(&self) {
        *self.focused.write() = None;
        self.state.write().focus = None;
    }

    pub fn focused(&self) -> Option<SymbolId> {
        self.focused.read().clone()
    }

    fn spawn_focus_refresh(self: &Arc<Self>) {
        let this = Arc::clone(self);
        tokio::spawn(
            async move {
                this.refresh_focus().await;
            }
            .instrument(info_span!("focus_refresh")),
        );
    }

    /// Fetch history for the focused symbol and evaluate its indicators.
    ///
    /// If the focus moves while a request is in flight, the stale result is
    /// dropped and the newly focused symbol is fetched instead.
    #[instrument(name = "refresh_focus", skip(self))]
    pub async fn refresh_focus(&self) -> FocusOutcome {
        let Some(_guard) = InFlight::acquire(&self.focus_in_flight) else {
            debug!("history fetch still in flight, skipping");
            return FocusOutcome::Skipped;
        };

        loop {
            let Some(symbol) = self.focused() else {
                return FocusOutcome::Unfocused;
            };

            let result = self.source.fetch_history(&symbol, self.history_days).await;

            if self.focused().as_ref() != Some(&symbol) {
                debug!(%symbol, "focus moved during fetch, discarding");
                continue;
            }

            let points = match result {
                Ok(points) => points,
                Err(e) => {
                    warn!(%symbol, error = %e, "fetch_history failed");
                    return FocusOutcome::Failed;
                }
            };

            let prices: Vec<f64> = points.iter().map(|p| f64::from(p.price)).collect();
            let indicators = match self.engine.lock().evaluate(&symbol, &prices) {
                Ok(indicators) => indicators,
                Err(e) => {
                    warn!(%symbol, error = ?e, "indicator evaluation failed");
                    return FocusOutcome::Failed;
                }
            };

            debug!(
                %symbol,
                points = points.len(),
                rsi = ?indicators.rsi,
                macd = indicators.macd,
                signal = indicators.signal,
                "evaluated indicators"
            );

            // unfocus/forget clear `focused` before the view, so checking
            // under the state lock cannot leave a stale view behind
            let mut state = self.state.write();
            if self.focused().as_ref() != Some(&symbol) {
                drop(state);
                debug!(%symbol, "focus moved during evaluation, discarding");
                continue;
            }

            state.focus = Some(FocusView {
                symbol,
                points,
                indicators,
                fetched_at: now_secs(),
            });

            return FocusOutcome::Updated;
        }
    }

    /// Forget everything derived for a symbol that left the watchlist.
    pub fn forget(&self, symbol: &SymbolId) {
        self.engine.lock().forget(symbol);

        let was_focused = {
            let mut focused = self.focused.write();
            let was_focused = focused.as_ref() == Some(symbol);
            if was_focused {
                *focused = None;
            }
            was_focused
        };

        if was_focused {
            self.state.write().focus = None;
        }
    }

    pub fn price(&self, id: &SymbolId) -> Option<f32> {
        self.state.read().price(id)
    }

    pub fn prices(&self) -> HashMap<SymbolId, f32> {
        self.state.read().prices().clone()
    }

    pub fn history(&self, id: &SymbolId) -> Vec<PricePoint> {
        self.state.read().history().get(id)
    }

    pub fn focus_view(&self) -> Option<FocusView> {
        self.state.read().focus().cloned()
    }

    /// Consistent copy of the whole state.
    pub fn snapshot(&self) -> MarketState {
        self.state.read().clone()
    }
}

fn now_secs() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}
