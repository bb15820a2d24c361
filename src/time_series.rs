use crate::history::ScoreRecord;

/// One plotted point of the history chart: `t` is the run number, oldest first
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, value: f64) -> Self {
        Self { t, value }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.t, p.value)
    }
}

/// wpm and accuracy series for newest-first records, numbered from 1 (oldest)
pub fn history_series(records: &[ScoreRecord]) -> (Vec<TimeSeriesPoint>, Vec<TimeSeriesPoint>) {
    records
        .iter()
        .rev()
        .enumerate()
        .map(|(i, r)| {
            let t = (i + 1) as f64;
            (
                TimeSeriesPoint::new(t, r.wpm as f64),
                TimeSeriesPoint::new(t, r.accuracy as f64),
            )
        })
        .unzip()
}
