use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::{DataError, DataResult, PriceSeries};

/// Simple (not log) return from `current` to `next`, as a fraction.
///
/// Each price is paired with its own date. `current` is the denominator and
/// must be finite and non-zero; `next` must be finite.
pub fn simple_return(current: (NaiveDate, f64), next: (NaiveDate, f64)) -> DataResult<f64> {
    let (current_date, current_price) = current;
    let (next_date, next_price) = next;

    if current_price == 0.0 || !current_price.is_finite() {
        return Err(DataError::InvalidPrice {
            date: current_date.to_string(),
            price: current_price,
        });
    }
    if !next_price.is_finite() {
        return Err(DataError::InvalidPrice {
            date: next_date.to_string(),
            price: next_price,
        });
    }
    Ok((next_price - current_price) / current_price)
}

/// Close and percent return for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReturn {
    pub date: NaiveDate,
    pub price: f64,
    /// Percent change from the previous close; `0.0` on the first day
    #[serde(rename = "return")]
    pub return_pct: f64,
}

/// Day-over-day percent returns in chronological order
pub fn daily_returns(series: &PriceSeries) -> DataResult<Vec<DailyReturn>> {
    let mut out = Vec::with_capacity(series.len());
    let mut previous: Option<(NaiveDate, f64)> = None;

    for (&date, &price) in series.iter() {
        let return_pct = match previous {
            Some(prev) => simple_return(prev, (date, price))? * 100.0,
            None => 0.0,
        };
        out.push(DailyReturn {
            date,
            price,
            return_pct,
        });
        previous = Some((date, price));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_simple_return() {
        assert_abs_diff_eq!(simple_return((day(1), 100.0), (day(2), 110.0)).unwrap(), 0.10, epsilon = 1e-12);
        assert_abs_diff_eq!(
            simple_return((day(1), 110.0), (day(2), 105.0)).unwrap(),
            -5.0 / 110.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_simple_return_rejects_bad_prices() {
        assert!(matches!(
            simple_return((day(1), 0.0), (day(2), 10.0)),
            Err(DataError::InvalidPrice { price, .. }) if price == 0.0
        ));
        assert!(simple_return((day(1), f64::NAN), (day(2), 10.0)).is_err());
        assert!(simple_return((day(1), 10.0), (day(2), f64::INFINITY)).is_err());
    }

    #[test]
    fn test_invalid_price_names_the_offending_day() {
        match simple_return((day(1), 100.0), (day(2), f64::NAN)) {
            Err(DataError::InvalidPrice { date, price }) => {
                assert_eq!(date, "2024-01-02");
                assert!(price.is_nan());
            }
            other => panic!("expected InvalidPrice, got {:?}", other),
        }

        match simple_return((day(1), 0.0), (day(2), 10.0)) {
            Err(DataError::InvalidPrice { date, .. }) => assert_eq!(date, "2024-01-01"),
            other => panic!("expected InvalidPrice, got {:?}", other),
        }
    }

    #[test]
    fn test_daily_returns_reports_bad_close_date() {
        let series: PriceSeries = [(day(1), 100.0), (day(2), f64::NAN), (day(3), 99.0)]
            .into_iter()
            .collect();

        match daily_returns(&series) {
            Err(DataError::InvalidPrice { date, .. }) => assert_eq!(date, "2024-01-02"),
            other => panic!("expected InvalidPrice, got {:?}", other),
        }
    }

    #[test]
    fn test_daily_returns() {
        let series: PriceSeries = [(day(1), 100.0), (day(2), 110.0), (day(3), 99.0)]
            .into_iter()
            .collect();

        let returns = daily_returns(&series).unwrap();
        assert_eq!(returns.len(), 3);
        assert_eq!(returns[0].return_pct, 0.0);
        assert_abs_diff_eq!(returns[1].return_pct, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(returns[2].return_pct, -10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_daily_returns_empty() {
        assert!(daily_returns(&PriceSeries::new()).unwrap().is_empty());
    }
}
