//! Per-currency aggregation across the lookback window.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::domain::{CurrencyStat, DailyRates, Extreme};

/// Running statistics keyed by currency code.
///
/// Backed by a `BTreeMap` so iteration (and therefore report row order) is
/// sorted by code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateAggregate {
    stats: BTreeMap<String, CurrencyStat>,
}

impl RateAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one day's quotes into the running statistics.
    ///
    /// Min/max only move on a strictly smaller/larger value, so on ties the
    /// date of the first occurrence is kept. Days must be folded oldest first
    /// for that to mean "earliest".
    pub fn fold_day(&mut self, day: &DailyRates) {
        for entry in &day.entries {
            let value = entry.normalized();
            match self.stats.entry(entry.code.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(CurrencyStat::new(value, entry.date));
                }
                Entry::Occupied(mut slot) => {
                    let stat = slot.get_mut();
                    if value > stat.max.value {
                        stat.max = Extreme {
                            value,
                            date: entry.date,
                        };
                    }
                    if value < stat.min.value {
                        stat.min = Extreme {
                            value,
                            date: entry.date,
                        };
                    }
                    stat.sum += value;
                    stat.observations += 1;
                }
            }
        }
    }

    pub fn get(&self, code: &str) -> Option<&CurrencyStat> {
        self.stats.get(code)
    }

    /// Currencies in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CurrencyStat)> {
        self.stats.iter().map(|(code, stat)| (code.as_str(), stat))
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}
