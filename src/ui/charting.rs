use typequote::time_series::TimeSeriesPoint;

/// Compute X (runs) and Y (wpm / accuracy) bounds for the history chart
pub fn compute_chart_params(wpm: &[TimeSeriesPoint], accuracy: &[TimeSeriesPoint]) -> (f64, f64) {
    let runs = wpm.len().max(accuracy.len()).max(1) as f64;

    let highest = wpm
        .iter()
        .chain(accuracy)
        .map(|p| p.value)
        .fold(0.0_f64, f64::max);

    (runs, highest.max(1.0).ceil())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[], &[]);
        assert_eq!(x, 1.0);
        assert_eq!(y, 1.0);
    }

    #[test]
    fn test_compute_chart_params_uses_highest_series() {
        let wpm = [TimeSeriesPoint::new(1.0, 48.0), TimeSeriesPoint::new(2.0, 120.4)];
        let accuracy = [TimeSeriesPoint::new(1.0, 91.0), TimeSeriesPoint::new(2.0, 100.0)];

        let (x, y) = compute_chart_params(&wpm, &accuracy);
        assert_eq!(x, 2.0);
        assert_eq!(y, 121.0);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
