use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{Result, VisitorCounterStore, VisitorId, VisitorStats};

/// Process-local counter. Counts reset on restart; fine for a single node.
#[derive(Debug, Default)]
pub struct InMemoryVisitorCounter {
    /// visitor -> last day it was counted
    seen: DashMap<VisitorId, NaiveDate>,
    total: AtomicU64,
    daily: DashMap<NaiveDate, u64>,
}

impl InMemoryVisitorCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn today(&self, day: NaiveDate) -> u64 {
        self.daily.get(&day).map(|c| *c).unwrap_or(0)
    }

    /// Daily buckets older than yesterday are never read again.
    fn prune(&self, day: NaiveDate) {
        if let Some(cutoff) = day.pred_opt() {
            self.daily.retain(|d, _| *d >= cutoff);
        }
    }
}

#[async_trait]
impl VisitorCounterStore for InMemoryVisitorCounter {
    async fn record_visit(&self, visitor: &VisitorId, day: NaiveDate) -> Result<VisitorStats> {
        let counted_today = match self.seen.entry(visitor.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(day);
                self.total.fetch_add(1, Ordering::Relaxed);
                true
            }
            Entry::Occupied(mut slot) => {
                if *slot.get() == day {
                    false
                } else {
                    slot.insert(day);
                    true
                }
            }
        };

        if counted_today {
            *self.daily.entry(day).or_insert(0) += 1;
            self.prune(day);
        }

        Ok(VisitorStats {
            total: self.total.load(Ordering::Relaxed),
            today: self.today(day),
        })
    }

    async fn stats(&self, day: NaiveDate) -> Result<VisitorStats> {
        Ok(VisitorStats {
            total: self.total.load(Ordering::Relaxed),
            today: self.today(day),
        })
    }
}
