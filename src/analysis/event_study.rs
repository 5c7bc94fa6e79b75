//! Event-study abnormal returns
//!
//! Compares a stock's day-over-day returns with a benchmark inside a window
//! of trading positions around an event date. The abnormal return is the part
//! of the stock's move the benchmark does not explain; the cumulative abnormal
//! return (CAR) is its running sum.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::returns::simple_return;
use crate::data::{parse_date, DataError, DataResult, PriceSeries};

/// Trading positions analysed before and after the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWindow {
    pub before: usize,
    pub after: usize,
}

impl Default for EventWindow {
    fn default() -> Self {
        Self {
            before: 30,
            after: 30,
        }
    }
}

/// One day of the event study, all values in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbnormalReturn {
    /// Day the return materializes on
    pub date: NaiveDate,
    pub stock_return: f64,
    pub market_return: f64,
    pub abnormal_return: f64,
    pub cumulative_abnormal_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStudy {
    pub event_date: NaiveDate,
    pub window: EventWindow,
    pub records: Vec<AbnormalReturn>,
    /// Transitions dropped because the benchmark lacked one of the two dates
    pub skipped: usize,
}

impl EventStudy {
    /// CAR at the end of the window, 0 when no record was produced
    pub fn cumulative_abnormal_return(&self) -> f64 {
        self.records
            .last()
            .map(|r| r.cumulative_abnormal_return)
            .unwrap_or(0.0)
    }

    /// Records up to and including the event date
    pub fn pre_event(&self) -> &[AbnormalReturn] {
        let split = self.records.partition_point(|r| r.date <= self.event_date);
        &self.records[..split]
    }

    /// Records after the event date
    pub fn post_event(&self) -> &[AbnormalReturn] {
        let split = self.records.partition_point(|r| r.date <= self.event_date);
        &self.records[split..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Transition indices `[idx - before, min(len - 1, idx + after))`, clamped at 0.
///
/// Each index `i` covers the move from `dates[i]` to `dates[i + 1]`.
pub(crate) fn window_range(len: usize, event_index: usize, window: EventWindow) -> Range<usize> {
    let start = event_index.saturating_sub(window.before);
    let end = len.saturating_sub(1).min(event_index.saturating_add(window.after));
    start..end
}

/// Compute abnormal returns around `event_date` (`YYYY-MM-DD`).
///
/// Fails with `NotFound` when the date is not a key of `subject`, and with
/// `InvalidPrice` when a zero or non-finite price would be divided by.
pub fn compute_abnormal_returns(
    subject: &PriceSeries,
    benchmark: &PriceSeries,
    event_date: &str,
    window: EventWindow,
) -> DataResult<EventStudy> {
    let event = parse_date(event_date).map_err(|_| DataError::NotFound {
        date: event_date.to_string(),
    })?;
    compute_abnormal_returns_on(subject, benchmark, event, window)
}

/// Same as [`compute_abnormal_returns`] with an already parsed date
pub fn compute_abnormal_returns_on(
    subject: &PriceSeries,
    benchmark: &PriceSeries,
    event_date: NaiveDate,
    window: EventWindow,
) -> DataResult<EventStudy> {
    let dates = subject.dates();
    let event_index = dates
        .binary_search(&event_date)
        .map_err(|_| DataError::NotFound {
            date: event_date.to_string(),
        })?;

    let Range { start, end } = window_range(dates.len(), event_index, window);

    let mut records = Vec::with_capacity(end.saturating_sub(start));
    let mut skipped = 0;
    let mut cumulative = 0.0;

    for i in start..end {
        let current = dates[i];
        let next = dates[i + 1];

        let (Some(stock_cur), Some(stock_next), Some(market_cur), Some(market_next)) = (
            subject.get(&current),
            subject.get(&next),
            benchmark.get(&current),
            benchmark.get(&next),
        ) else {
            tracing::debug!(%current, %next, "Skipping transition with missing benchmark price");
            skipped += 1;
            continue;
        };

        let stock_return = simple_return((current, stock_cur), (next, stock_next))?;
        let market_return = simple_return((current, market_cur), (next, market_next))?;
        let abnormal_return = stock_return - market_return;
        cumulative += abnormal_return;

        records.push(AbnormalReturn {
            date: next,
            stock_return: stock_return * 100.0,
            market_return: market_return * 100.0,
            abnormal_return: abnormal_return * 100.0,
            cumulative_abnormal_return: cumulative * 100.0,
        });
    }

    if skipped > 0 {
        tracing::warn!(
            event = %event_date,
            skipped,
            emitted = records.len(),
            "Event study skipped transitions with incomplete price pairs"
        );
    }

    Ok(EventStudy {
        event_date,
        window,
        records,
        skipped,
    })
}
