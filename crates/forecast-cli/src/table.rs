//! Terminal rendering of a combined prediction

use comfy_table::presets::UTF8_FULL;
use comfy_table::{CellAlignment, ContentArrangement, Table};
use forecast_core::CombinedPrediction;

/// Date-ordered table of original vs adjusted prices
pub fn prediction_table(prediction: &CombinedPrediction) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Date", "Original", "Adjusted", "Change"]);

    for (date, original, adjusted) in prediction.rows() {
        let (adjusted, change) = match adjusted {
            Some(adjusted) => (
                format!("{adjusted:.2}"),
                format!("{:+.2}%", (adjusted / original - 1.0) * 100.0),
            ),
            None => ("-".to_string(), "-".to_string()),
        };
        table.add_row(vec![
            date.to_string(),
            format!("{original:.2}"),
            adjusted,
            change,
        ]);
    }

    for index in 1..=3 {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
    table
}

/// One-line sentiment summary
pub fn sentiment_line(prediction: &CombinedPrediction) -> String {
    format!(
        "{} sentiment: {} ({} / 5 stars)",
        prediction.symbol,
        prediction.sentiment.label(),
        prediction.sentiment.stars()
    )
}
