use crate::comparison::ComparisonResult;
use crate::error::AnalyticsError;
use crate::statistics;

const MISSING: &str = "-";

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{:.2}", v))
}

/// Renders a comparison as CSV: `Metric,<col1>,...,<colN>,Difference %`.
///
/// Cells hold the column mean to two decimals, or `-` when the column has no
/// data. "Difference %" is the average of the non-base percentage differences.
pub fn comparison_to_csv(result: &ComparisonResult) -> Result<String, AnalyticsError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut header = Vec::with_capacity(result.columns.len() + 2);
    header.push("Metric".to_string());
    header.extend(result.columns.iter().map(|c| c.label.clone()));
    header.push("Difference %".to_string());
    writer
        .write_record(&header)
        .map_err(|e| AnalyticsError::Export(e.to_string()))?;

    for comparison in &result.metrics {
        let mut row = Vec::with_capacity(header.len());
        row.push(comparison.metric.to_string());
        for column in &result.columns {
            row.push(format_value(comparison.values.get(&column.id).map(|s| s.mean)));
        }
        let percentages: Vec<f64> = comparison.non_base_percentages(&result.base_column).collect();
        row.push(format_value(statistics::mean(&percentages)));
        writer
            .write_record(&row)
            .map_err(|e| AnalyticsError::Export(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AnalyticsError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AnalyticsError::Export(e.to_string()))
}
