use crate::Data;

pub async fn list(data: &Data) -> String {
    let symbols = data.watchlist.list().await;
    if symbols.is_empty() {
        return "Watchlist is empty. Add coins with `watch <id>`.".to_string();
    }

    let state = data.scheduler.snapshot();
    let focused = data.scheduler.focused();

    symbols
        .iter()
        .map(|id| {
            let marker = if focused.as_ref() == Some(id) { '*' } else { ' ' };
            let price = state
                .price(id)
                .map(|p| format!("${p:.2}"))
                .unwrap_or_else(|| "n/a".to_string());
            let samples = state.history().len(id);
            let unit = if samples == 1 { "sample" } else { "samples" };

            format!("{marker} {:<20} {price:>14}  ({samples} {unit})", id.as_str())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use crate::command::tests::{StaticSource, data_with, id, run};

    #[tokio::test]
    async fn shows_prices_after_poll() {
        let source = StaticSource {
            current: [(id("bitcoin"), 50000.0)].into_iter().collect(),
            ..Default::default()
        };
        let (data, _dir) = data_with(source, &["bitcoin", "ethereum"]).await;

        data.scheduler.poll_once().await;
        let out = run(&data, "list").await;
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("bitcoin"));
        assert!(lines[0].contains("$50000.00"));
        assert!(lines[0].contains("(1 sample)"));
        assert!(lines[1].contains("ethereum"));
        assert!(lines[1].contains("n/a"));
        assert!(lines[1].contains("(0 samples)"));
    }

    #[tokio::test]
    async fn empty_watchlist() {
        let (data, _dir) = data_with(StaticSource::default(), &[]).await;
        assert!(run(&data, "ls").await.starts_with("Watchlist is empty."));
    }
}
