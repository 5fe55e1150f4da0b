use anyhow::{Error, anyhow};
use ta::Next;
use ta::indicators::{ExponentialMovingAverage, SimpleMovingAverage};

pub const FAST_PERIOD: usize = 12;
pub const SLOW_PERIOD: usize = 26;
pub const SIGNAL_PERIOD: usize = 9;

/// MACD line (EMA12 - EMA26) at the last price.
///
/// Both averages are seeded with the first price and walked forward over the
/// whole series. Returns `None` with fewer than 26 prices.
pub fn macd_line(prices: &[f64]) -> Result<Option<f64>, Error> {
    if prices.len() < SLOW_PERIOD {
        return Ok(None);
    }

    let mut fast = ema(FAST_PERIOD)?;
    let mut slow = ema(SLOW_PERIOD)?;

    let (mut fast_val, mut slow_val) = (0.0, 0.0);
    for &x in prices {
        fast_val = fast.next(x);
        slow_val = slow.next(x);
    }

    Ok(Some(fast_val - slow_val))
}

fn ema(period: usize) -> Result<ExponentialMovingAverage, Error> {
    ExponentialMovingAverage::new(period).map_err(|e| anyhow!("invalid EMA period {period}: {e:?}"))
}

/// Trailing mean of the most recent MACD values for one symbol.
#[derive(Debug, Clone)]
pub struct SignalLine {
    sma: SimpleMovingAverage,
}

impl SignalLine {
    pub fn new() -> Result<Self, Error> {
        let sma = SimpleMovingAverage::new(SIGNAL_PERIOD)
            .map_err(|e| anyhow!("invalid signal period: {e:?}"))?;
        Ok(Self { sma })
    }

    /// Push a MACD value and return the mean of the last nine (or fewer).
    pub fn push(&mut self, macd: f64) -> f64 {
        self.sma.next(macd)
    }
}
