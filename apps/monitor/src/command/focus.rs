use anyhow::bail;
use chrono::{DateTime, Utc};
use market::{FocusView, IndicatorResult, SymbolId};
use tracing::info;

use crate::{Data, Error};

const OVERBOUGHT: f64 = 70.0;
const OVERSOLD: f64 = 30.0;

/// MACD crossover reading.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    pub fn from_indicators(indicators: &IndicatorResult) -> Self {
        if indicators.macd > indicators.signal {
            Action::Buy
        } else if indicators.macd < indicators.signal {
            Action::Sell
        } else {
            Action::Hold
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn from_rsi(rsi: f64) -> Self {
        if rsi > OVERBOUGHT {
            RsiZone::Overbought
        } else if rsi < OVERSOLD {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }
}

pub fn focus(data: &Data, raw: &str) -> Result<String, Error> {
    let Some(symbol) = SymbolId::parse(raw) else {
        bail!("Usage: focus <id>");
    };

    info!(%symbol, "focus: requested");
    data.scheduler.focus(symbol.clone());

    Ok(format!(
        "Fetching {}-day history for {symbol}. Use `analysis` to view it.",
        data.history_days
    ))
}

pub fn unfocus(data: &Data) -> String {
    match data.scheduler.focused() {
        Some(symbol) => {
            data.scheduler.unfocus();
            format!("No longer focused on {symbol}.")
        }
        None => "Nothing is focused.".to_string(),
    }
}

pub fn analysis(data: &Data) -> String {
    let Some(focused) = data.scheduler.focused() else {
        return "Nothing is focused. Use `focus <id>` first.".to_string();
    };

    match data.scheduler.focus_view() {
        Some(view) if view.symbol == focused => render(&view),
        _ => format!("History for {focused} is still loading."),
    }
}

fn render(view: &FocusView) -> String {
    let mut lines = vec![format!("{} Analysis", view.symbol.as_str().to_uppercase())];

    if let (Some(first), Some(last)) = (view.points.first(), view.points.last()) {
        lines.push(format!(
            "History: {} points, {} to {}",
            view.points.len(),
            format_timestamp(first.timestamp),
            format_timestamp(last.timestamp)
        ));
        lines.push(format!("Last price: ${:.2}", last.price));
    }

    let indicators = &view.indicators;
    match indicators.rsi {
        Some(rsi) => {
            let zone = match RsiZone::from_rsi(rsi) {
                RsiZone::Overbought => " (Overbought)",
                RsiZone::Oversold => " (Oversold)",
                RsiZone::Neutral => "",
            };
            lines.push(format!("RSI: {rsi:.2}{zone}"));
        }
        None => lines.push("RSI: insufficient data".to_string()),
    }

    lines.push(format!("MACD: {:.4}", indicators.macd));
    lines.push(format!("Signal Line: {:.4}", indicators.signal));
    lines.push(
        match Action::from_indicators(indicators) {
            Action::Buy => "Signal: BUY (MACD > Signal)",
            Action::Sell => "Signal: SELL (MACD < Signal)",
            Action::Hold => "Signal: HOLD",
        }
        .to_string(),
    );
    lines.push(format!("Updated: {}", format_timestamp(view.fetched_at)));

    lines.join("\n")
}

fn format_timestamp(secs: f64) -> String {
    DateTime::<Utc>::from_timestamp_millis((secs * 1000.0) as i64)
        .map(|t| t.format("%d %b %H:%M").to_string())
        .unwrap_or_else(|| "?".to_string())
}
