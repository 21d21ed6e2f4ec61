use crate::domain::TrendPoint;
use serde::{Deserialize, Serialize};

const DAY_MS: f64 = 1000.0 * 60.0 * 60.0 * 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Declining,
    SlightlyDown,
    Stable,
    Rising,
    StrongGrowth,
}

impl TrendDirection {
    fn from_one_year_change(pct: f64) -> Self {
        if pct < -5.0 {
            TrendDirection::Declining
        } else if pct < 0.0 {
            TrendDirection::SlightlyDown
        } else if pct < 5.0 {
            TrendDirection::Stable
        } else if pct < 10.0 {
            TrendDirection::Rising
        } else {
            TrendDirection::StrongGrowth
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrendDirection::Declining => "Declining",
            TrendDirection::SlightlyDown => "Slightly Down",
            TrendDirection::Stable => "Stable",
            TrendDirection::Rising => "Rising",
            TrendDirection::StrongGrowth => "Strong Growth",
        }
    }

    pub fn signal(self) -> &'static str {
        match self {
            TrendDirection::Declining => "Potential Distressed Deal",
            TrendDirection::SlightlyDown => "Watch For Opportunity",
            TrendDirection::Stable => "Normal Market",
            TrendDirection::Rising => "Appreciating Market",
            TrendDirection::StrongGrowth => "Hot Market - May Be Overvalued",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub current_value: f64,
    pub oldest_value: f64,
    pub peak_value: f64,
    pub trough_value: f64,
    pub one_year_change_pct: f64,
    pub six_month_change_pct: f64,
    pub total_change_pct: f64,
    pub from_peak_pct: f64,
    pub volatility_pct: f64,
    pub direction: TrendDirection,
    pub data_points: usize,
    pub range_days: i64,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn pct_change(from: f64, to: f64) -> f64 {
    if from > 0.0 {
        (to - from) / from * 100.0
    } else {
        0.0
    }
}

/// Summarize a value history. `None` with fewer than two points.
pub fn analyze_trend(points: &[TrendPoint]) -> Option<TrendAnalysis> {
    if points.len() < 2 {
        return None;
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| b.date_ms.cmp(&a.date_ms));

    let current = sorted[0];
    let oldest = sorted[sorted.len() - 1];

    let age_days = |p: &TrendPoint| (current.date_ms - p.date_ms) as f64 / DAY_MS;
    let one_year_ago = sorted.iter().find(|p| age_days(*p) >= 365.0).map(|p| p.value);
    let six_months_ago = sorted.iter().find(|p| age_days(*p) >= 180.0).map(|p| p.value);

    let one_year_change_pct = one_year_ago.map_or(0.0, |v| pct_change(v, current.value));
    let six_month_change_pct = six_months_ago.map_or(0.0, |v| pct_change(v, current.value));

    let values: Vec<f64> = sorted.iter().map(|p| p.value).filter(|v| *v > 0.0).collect();
    let (peak_value, trough_value, volatility_pct) = if values.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let peak = values.iter().cloned().fold(f64::MIN, f64::max);
        let trough = values.iter().cloned().fold(f64::MAX, f64::min);
        (peak, trough, variance.sqrt() / mean * 100.0)
    };

    Some(TrendAnalysis {
        current_value: current.value,
        oldest_value: oldest.value,
        peak_value,
        trough_value,
        one_year_change_pct: round2(one_year_change_pct),
        six_month_change_pct: round2(six_month_change_pct),
        total_change_pct: round2(pct_change(oldest.value, current.value)),
        from_peak_pct: round2(pct_change(peak_value, current.value)),
        volatility_pct: round2(volatility_pct),
        direction: TrendDirection::from_one_year_change(one_year_change_pct),
        data_points: sorted.len(),
        range_days: ((current.date_ms - oldest.date_ms) as f64 / DAY_MS) as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400_000;

    fn point(days_ago: i64, value: f64) -> TrendPoint {
        TrendPoint {
            date_ms: 1_700_000_000_000 - days_ago * DAY,
            value,
        }
    }

    #[test]
    fn needs_two_points() {
        assert!(analyze_trend(&[]).is_none());
        assert!(analyze_trend(&[point(0, 100.0)]).is_none());
    }

    #[test]
    fn declining_value_is_flagged() {
        let t = analyze_trend(&[
            point(400, 200_000.0),
            point(0, 180_000.0),
            point(200, 190_000.0),
        ])
        .unwrap();

        assert_eq!(t.current_value, 180_000.0);
        assert_eq!(t.one_year_change_pct, -10.0);
        assert_eq!(t.direction, TrendDirection::Declining);
        assert_eq!(t.direction.signal(), "Potential Distressed Deal");
        assert_eq!(t.peak_value, 200_000.0);
        assert_eq!(t.from_peak_pct, -10.0);
        assert_eq!(t.range_days, 400);
    }

    #[test]
    fn short_history_has_no_one_year_change() {
        let t = analyze_trend(&[point(30, 100_000.0), point(0, 120_000.0)]).unwrap();
        assert_eq!(t.one_year_change_pct, 0.0);
        assert_eq!(t.direction, TrendDirection::Stable);
        assert_eq!(t.total_change_pct, 20.0);
    }

    #[test]
    fn direction_bands() {
        let cases = [(-6.0, "Declining"), (-0.5, "Slightly Down"), (4.9, "Stable"), (7.0, "Rising"), (10.0, "Strong Growth")];
        for (pct, label) in cases {
            assert_eq!(TrendDirection::from_one_year_change(pct).label(), label);
        }
    }
}
