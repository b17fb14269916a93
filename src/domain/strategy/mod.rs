//! Strategy registry and evaluation contract.
//!
//! Every strategy is a pure function of `(code, series)`; the enum below is
//! the closed set of them. Names are resolved once, before any instrument is
//! processed, and the resolved [`Strategy`] is handed to the selection
//! engine explicitly.

pub mod high_price;
pub mod high_volume;
pub mod limit_up;
pub mod ma_condition;
pub mod ma_crossover;
pub mod weekly_alignment;

use crate::domain::bar::Bar;
use crate::domain::error::ScreenerError;
use crate::domain::window::Lookback;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Evidence keys shared across evaluators.
pub mod metric {
    pub const PCT_CHANGE: &str = "pct_change";
    pub const CLOSE: &str = "close";
    pub const TODAY_VOLUME: &str = "today_volume";
    pub const YESTERDAY_VOLUME: &str = "yesterday_volume";
}

/// Outcome of one evaluator on one instrument.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Verdict {
    pub selected: bool,
    pub trigger_date: Option<NaiveDate>,
    pub metrics: BTreeMap<String, Option<f64>>,
}

impl Verdict {
    pub fn rejected() -> Self {
        Self::default()
    }

    pub fn selected(trigger_date: Option<NaiveDate>) -> Self {
        Self {
            selected: true,
            trigger_date,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, key: &str, value: Option<f64>) -> Self {
        self.metrics.insert(key.to_string(), value);
        self
    }

    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied().flatten()
    }
}

/// Constants a run may tune. Fixed for the duration of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub consecutive_days: usize,
    pub min_close: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            consecutive_days: 1,
            min_close: high_price::DEFAULT_MIN_CLOSE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    NLimitUp { days: usize },
    MaCrossover,
    HighPriceFilter { min_close: f64 },
    HighVolume,
    MaCondition,
    WeeklyMaAlignment,
}

impl Strategy {
    pub const NAMES: [&'static str; 6] = [
        "n_limit_up",
        "ma_crossover",
        "high_price_filter",
        "high_volume",
        "ma_condition",
        "week_ma_arrangement",
    ];

    pub fn from_name(name: &str, params: &StrategyParams) -> Result<Self, ScreenerError> {
        match name.trim() {
            "n_limit_up" => Ok(Strategy::NLimitUp {
                days: params.consecutive_days,
            }),
            "ma_crossover" => Ok(Strategy::MaCrossover),
            "high_price_filter" => Ok(Strategy::HighPriceFilter {
                min_close: params.min_close,
            }),
            "high_volume" => Ok(Strategy::HighVolume),
            "ma_condition" => Ok(Strategy::MaCondition),
            "week_ma_arrangement" => Ok(Strategy::WeeklyMaAlignment),
            other => Err(ScreenerError::UnknownStrategy {
                name: other.to_string(),
            }),
        }
    }

    /// All registered strategies with default parameters.
    pub fn registry() -> Vec<Strategy> {
        let params = StrategyParams::default();
        Self::NAMES
            .iter()
            .filter_map(|n| Self::from_name(n, &params).ok())
            .collect()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::NLimitUp { .. } => "n_limit_up",
            Strategy::MaCrossover => "ma_crossover",
            Strategy::HighPriceFilter { .. } => "high_price_filter",
            Strategy::HighVolume => "high_volume",
            Strategy::MaCondition => "ma_condition",
            Strategy::WeeklyMaAlignment => "week_ma_arrangement",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Strategy::NLimitUp { .. } => "N consecutive limit-up days",
            Strategy::MaCrossover => "MA5 crosses above MA10 on the latest bar",
            Strategy::HighPriceFilter { .. } => "latest close above a price floor",
            Strategy::HighVolume => "volume spike followed by a shrinking-volume decline",
            Strategy::MaCondition => "rising MA60 with a recent MA30/MA60 golden cross",
            Strategy::WeeklyMaAlignment => "weekly MA5/10/20/30 turning into bullish order",
        }
    }

    /// Default history window the strategy needs.
    pub fn lookback(&self) -> Lookback {
        match self {
            Strategy::NLimitUp { .. } => Lookback::CurrentWeek,
            Strategy::MaCrossover => Lookback::Bars(ma_crossover::LOOKBACK),
            Strategy::HighPriceFilter { .. } => Lookback::Bars(high_price::LOOKBACK),
            Strategy::HighVolume => Lookback::Bars(high_volume::LOOKBACK),
            Strategy::MaCondition => Lookback::Bars(ma_condition::LOOKBACK),
            Strategy::WeeklyMaAlignment => Lookback::Bars(weekly_alignment::LOOKBACK),
        }
    }

    /// Evaluates `series` (ascending, date-unique) for instrument `code`.
    pub fn evaluate(&self, code: &str, series: &[Bar]) -> Verdict {
        match self {
            Strategy::NLimitUp { days } => limit_up::evaluate(code, series, *days),
            Strategy::MaCrossover => ma_crossover::evaluate(series),
            Strategy::HighPriceFilter { min_close } => high_price::evaluate(series, *min_close),
            Strategy::HighVolume => high_volume::evaluate(series),
            Strategy::MaCondition => ma_condition::evaluate(series),
            Strategy::WeeklyMaAlignment => weekly_alignment::evaluate(series),
        }
    }
}

/// Today's and yesterday's volume plus today's percent change, the evidence
/// most evaluators attach.
pub(crate) fn volume_evidence(verdict: Verdict, series: &[Bar]) -> Verdict {
    let today = series.last();
    let yesterday = series.len().checked_sub(2).and_then(|i| series.get(i));
    verdict
        .with_metric(metric::TODAY_VOLUME, today.and_then(|b| b.volume))
        .with_metric(metric::YESTERDAY_VOLUME, yesterday.and_then(|b| b.volume))
        .with_metric(metric::PCT_CHANGE, today.and_then(|b| b.pct_change))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::bar::Bar;
    use chrono::{Datelike, Days, NaiveDate, Weekday};

    /// The `i`-th weekday counting from Monday 2024-01-01.
    pub fn day(i: usize) -> NaiveDate {
        let mut date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut seen = 0;
        loop {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                if seen == i {
                    return date;
                }
                seen += 1;
            }
            date = date.checked_add_days(Days::new(1)).unwrap();
        }
    }

    pub fn series(
        code: &str,
        closes: &[Option<f64>],
        volumes: &[Option<f64>],
        pcts: &[Option<f64>],
    ) -> Vec<Bar> {
        let n = closes.len().max(volumes.len()).max(pcts.len());
        (0..n)
            .map(|i| {
                let mut b = Bar::new(code, day(i));
                b.close = closes.get(i).copied().flatten();
                b.volume = volumes.get(i).copied().flatten();
                b.pct_change = pcts.get(i).copied().flatten();
                b
            })
            .collect()
    }

    pub fn series_with_pct(code: &str, pcts: &[Option<f64>]) -> Vec<Bar> {
        series(code, &[], &[], pcts)
    }

    pub fn series_with_closes(closes: &[f64]) -> Vec<Bar> {
        let closes: Vec<Option<f64>> = closes.iter().copied().map(Some).collect();
        series("600000.SH", &closes, &[], &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_every_name() {
        let params = StrategyParams::default();
        for name in Strategy::NAMES {
            let s = Strategy::from_name(name, &params).unwrap();
            assert_eq!(s.name(), name);
        }
        assert_eq!(Strategy::registry().len(), Strategy::NAMES.len());
    }

    #[test]
    fn unknown_name_is_an_error() {
        let err = Strategy::from_name("moon_phase", &StrategyParams::default()).unwrap_err();
        assert!(matches!(err, ScreenerError::UnknownStrategy { name } if name == "moon_phase"));
    }

    #[test]
    fn params_flow_into_variants() {
        let params = StrategyParams {
            consecutive_days: 4,
            min_close: 50.0,
        };
        assert_eq!(
            Strategy::from_name("n_limit_up", &params).unwrap(),
            Strategy::NLimitUp { days: 4 }
        );
        assert_eq!(
            Strategy::from_name("high_price_filter", &params).unwrap(),
            Strategy::HighPriceFilter { min_close: 50.0 }
        );
    }

    #[test]
    fn lookbacks() {
        assert_eq!(Strategy::NLimitUp { days: 1 }.lookback(), Lookback::CurrentWeek);
        assert_eq!(Strategy::MaCondition.lookback(), Lookback::Bars(ma_condition::LOOKBACK));
        assert_eq!(
            Strategy::WeeklyMaAlignment.lookback(),
            Lookback::Bars(weekly_alignment::LOOKBACK)
        );
    }

    #[test]
    fn verdict_metrics() {
        let v = Verdict::selected(None)
            .with_metric("a", Some(1.5))
            .with_metric("b", None);
        assert!(v.selected);
        assert_eq!(v.metric("a"), Some(1.5));
        assert_eq!(v.metric("b"), None);
        assert_eq!(v.metric("missing"), None);
        assert!(!Verdict::rejected().selected);
    }
}
