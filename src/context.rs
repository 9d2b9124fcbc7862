use crate::model::PriceSeries;

/// Context block describing the `rows` most recent bars of `series`.
pub fn price_context(series: &PriceSeries, rows: usize) -> String {
    let mut out = format!("Stock data for {}:\n", series.symbol());
    if series.is_empty() {
        out.push_str("(no rows)\n");
        return out;
    }
    out.push_str("date        open      high      low       close     volume\n");
    for bar in series.tail(rows) {
        out.push_str(&format!(
            "{}  {:<8.2}  {:<8.2}  {:<8.2}  {:<8.2}  {}\n",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
        ));
    }
    out
}

/// User message combining the price context with the question.
pub fn question_with_context(context: &str, question: &str) -> String {
    format!("{context}\n\nQuestion: {question}")
}
