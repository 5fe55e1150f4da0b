use std::collections::{HashMap, VecDeque};

use crate::SymbolId;

/// Samples retained per symbol unless configured otherwise.
pub const DEFAULT_HISTORY_CAPACITY: usize = 12096;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    /// USD.
    pub price: f32,
}

impl PricePoint {
    pub fn new(timestamp: f64, price: f32) -> Self {
        Self { timestamp, price }
    }
}

/// Rolling per-symbol price history, oldest first.
///
/// Each series holds at most `capacity` points; appending past that evicts
/// from the front.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    capacity: usize,
    series: HashMap<SymbolId, VecDeque<PricePoint>>,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            series: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn append(&mut self, id: &SymbolId, point: PricePoint) {
        let series = self.series.entry(id.clone()).or_default();
        series.push_back(point);
        while series.len() > self.capacity {
            series.pop_front();
        }
    }

    /// Owned copy of the series, empty for unknown symbols.
    pub fn get(&self, id: &SymbolId) -> Vec<PricePoint> {
        self.series
            .get(id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn latest(&self, id: &SymbolId) -> Option<PricePoint> {
        self.series.get(id).and_then(|s| s.back().copied())
    }

    pub fn len(&self, id: &SymbolId) -> usize {
        self.series.get(id).map_or(0, VecDeque::len)
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> SymbolId {
        SymbolId::parse(s).unwrap()
    }

    #[test]
    fn unknown_symbol_is_empty() {
        let buffer = HistoryBuffer::default();
        assert!(buffer.get(&id("bitcoin")).is_empty());
        assert_eq!(buffer.latest(&id("bitcoin")), None);
        assert_eq!(buffer.capacity(), DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn evicts_oldest_first_once_full() {
        let mut buffer = HistoryBuffer::new(4);
        let btc = id("bitcoin");

        for i in 0..10 {
            buffer.append(&btc, PricePoint::new(i as f64, i as f32 * 10.0));
            assert!(buffer.len(&btc) <= 4);
        }

        let series = buffer.get(&btc);
        let stamps: Vec<f64> = series.iter().map(|p| p.timestamp).collect();
        assert_eq!(stamps, vec![6.0, 7.0, 8.0, 9.0]);
        assert_eq!(buffer.latest(&btc), Some(PricePoint::new(9.0, 90.0)));
    }

    #[test]
    fn series_stay_sorted_and_independent() {
        let mut buffer = HistoryBuffer::new(3);
        let btc = id("bitcoin");
        let eth = id("ethereum");

        for i in 0..7 {
            buffer.append(&btc, PricePoint::new(i as f64, 1.0));
            if i % 2 == 0 {
                buffer.append(&eth, PricePoint::new(i as f64, 2.0));
            }
        }

        for sym in [&btc, &eth] {
            let series = buffer.get(sym);
            assert!(series.len() <= 3);
            assert!(series.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        }
        assert_eq!(buffer.len(&eth), 3);
        assert_eq!(buffer.get(&eth)[0].timestamp, 2.0);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut buffer = HistoryBuffer::new(0);
        let btc = id("bitcoin");
        buffer.append(&btc, PricePoint::new(1.0, 1.0));
        buffer.append(&btc, PricePoint::new(2.0, 2.0));
        assert_eq!(buffer.get(&btc), vec![PricePoint::new(2.0, 2.0)]);
    }
}
