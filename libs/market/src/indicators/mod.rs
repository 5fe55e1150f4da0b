pub mod macd;
pub mod rsi;

use std::collections::{HashMap, hash_map::Entry};

use anyhow::Error;

use crate::SymbolId;
use macd::SignalLine;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorResult {
    /// `None` until there are enough prices.
    pub rsi: Option<f64>,
    pub macd: f64,
    pub signal: f64,
}

/// Evaluates indicators over a symbol's price history.
///
/// The signal line is a trailing average of past MACD evaluations, so each
/// symbol keeps its own window here.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    rsi_period: usize,
    signals: HashMap<SymbolId, SignalLine>,
}

impl IndicatorEngine {
    pub fn new() -> Self {
        Self::with_rsi_period(rsi::DEFAULT_PERIOD)
    }

    pub fn with_rsi_period(rsi_period: usize) -> Self {
        Self {
            rsi_period,
            signals: HashMap::new(),
        }
    }

    pub fn evaluate(&mut self, id: &SymbolId, prices: &[f64]) -> Result<IndicatorResult, Error> {
        let rsi = rsi::calculate(prices, self.rsi_period);

        let (macd, signal) = match macd::macd_line(prices)? {
            Some(macd) => {
                let line = match self.signals.entry(id.clone()) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => entry.insert(SignalLine::new()?),
                };
                (macd, line.push(macd))
            }
            None => (0.0, 0.0),
        };

        Ok(IndicatorResult { rsi, macd, signal })
    }

    /// Drop the signal window for a symbol.
    pub fn forget(&mut self, id: &SymbolId) {
        self.signals.remove(id);
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new()
    }
}
