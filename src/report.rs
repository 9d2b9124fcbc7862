use crate::indicator::IndicatorSeries;
use crate::model::{PriceSeries, StockMetrics};

fn money(value: f64) -> String {
    format!("${value:.2}")
}

/// One line per headline metric; "N/A" for an empty series.
pub fn render_metrics(metrics: Option<&StockMetrics>) -> String {
    let fields: [(&str, Option<f64>); 4] = [
        ("Current Price", metrics.map(|m| m.current_price)),
        ("Open Price", metrics.map(|m| m.open_price)),
        ("High Price", metrics.map(|m| m.high_price)),
        ("Low Price", metrics.map(|m| m.low_price)),
    ];
    fields
        .into_iter()
        .map(|(label, value)| {
            let value = value.map_or_else(|| "N/A".to_owned(), money);
            format!("{label:<14} {value}\n")
        })
        .collect()
}

/// Table of the last `rows` bars with one column per indicator series.
///
/// Undefined warm-up entries are printed as `-`.
pub fn render_table(series: &PriceSeries, indicators: &[IndicatorSeries], rows: usize) -> String {
    let mut out = format!("{:<10}  {:>10}", "date", "close");
    for indicator in indicators {
        out.push_str(&format!("  {:>12}", indicator.label));
    }
    out.push('\n');

    let start = series.len().saturating_sub(rows);
    for (i, bar) in series.bars().iter().enumerate().skip(start) {
        out.push_str(&format!("{:<10}  {:>10.2}", bar.date, bar.close));
        for indicator in indicators {
            let cell = match indicator.values.get(i).copied().flatten() {
                Some(v) => format!("  {v:>12.4}"),
                None => format!("  {:>12}", "-"),
            };
            out.push_str(&cell);
        }
        out.push('\n');
    }
    out
}
