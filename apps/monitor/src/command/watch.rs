use market::SymbolId;
use tracing::{debug, info, warn};

use super::split_symbols;
use crate::{Data, Error};

pub async fn watch(data: &Data, raw: &str) -> Result<String, Error> {
    let store = &data.watchlist;

    let symbols = split_symbols(raw);
    if symbols.is_empty() {
        warn!(raw_input = raw, "watch: no valid symbols");
        return Ok("No valid symbols provided.".to_string());
    }

    info!(count = symbols.len(), symbols = %symbols.join(", "), "watch: parsed symbols");

    let mut added: Vec<String> = Vec::new();
    let mut already: Vec<String> = Vec::new();
    let mut invalid: Vec<String> = Vec::new();

    for sym in symbols {
        if SymbolId::parse(&sym).is_none() {
            debug!(symbol = %sym, "watch: invalid symbol");
            invalid.push(sym);
            continue;
        }

        match store.add(&sym).await {
            Ok(true) => {
                debug!(symbol = %sym, "watch: added");
                added.push(sym);
            }
            Ok(false) => {
                debug!(symbol = %sym, "watch: already watched");
                already.push(sym);
            }
            Err(e) => {
                warn!(symbol = %sym, error = ?e, "watch: store.add failed");
                return Err(e);
            }
        }
    }

    info!(
        added_count = added.len(),
        already_count = already.len(),
        invalid_count = invalid.len(),
        "watch: completed"
    );

    let mut lines = Vec::new();
    if !added.is_empty() {
        lines.push(format!("Now watching: {}", added.join(", ")));
    }
    if !already.is_empty() {
        lines.push(format!("Already watching: {}", already.join(", ")));
    }
    if !invalid.is_empty() {
        lines.push(format!("Invalid symbol: {}", invalid.join(", ")));
    }

    Ok(lines.join("\n"))
}
