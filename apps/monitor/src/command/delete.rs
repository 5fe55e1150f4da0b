use market::SymbolId;
use tracing::{debug, info};

use super::split_symbols;
use crate::{Data, Error};

pub async fn delete(data: &Data, raw: &str) -> Result<String, Error> {
    let symbols = split_symbols(raw);
    if symbols.is_empty() {
        if data.watchlist.is_empty().await {
            return Ok("Watchlist is empty.".to_string());
        }
        return Ok("Usage: delete <id>[,<id>...]".to_string());
    }

    let mut removed: Vec<String> = Vec::new();
    let mut missing: Vec<String> = Vec::new();

    for sym in symbols {
        if data.watchlist.remove(&sym).await? {
            debug!(symbol = %sym, "delete: removed");
            if let Some(id) = SymbolId::parse(&sym) {
                data.scheduler.forget(&id);
            }
            removed.push(sym);
        } else {
            missing.push(sym);
        }
    }

    info!(
        removed_count = removed.len(),
        missing_count = missing.len(),
        "delete: completed"
    );

    let mut lines = Vec::new();
    if !removed.is_empty() {
        lines.push(format!("Removed: {}", removed.join(", ")));
    }
    if !missing.is_empty() {
        lines.push(format!("Not watching: {}", missing.join(", ")));
    }

    Ok(lines.join("\n"))
}
