//! Visitor counter widget.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domains::{DomainError, VisitorCounterStore, VisitorId, VisitorStats};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitRecord {
    pub visitor: VisitorId,
    /// A new id was minted; the caller must persist it in a cookie
    pub issued: bool,
    pub stats: VisitorStats,
}

pub struct VisitorService {
    store: Arc<dyn VisitorCounterStore>,
}

impl VisitorService {
    pub fn new(store: Arc<dyn VisitorCounterStore>) -> Self {
        Self { store }
    }

    /// Records a page view for `existing`, or for a freshly generated id
    /// when the browser has none yet.
    pub async fn record(
        &self,
        existing: Option<VisitorId>,
        now: DateTime<Utc>,
    ) -> Result<VisitRecord, DomainError> {
        let (visitor, issued) = match existing {
            Some(id) => (id, false),
            None => (VisitorId::generate(), true),
        };

        let stats = self.store.record_visit(&visitor, now.date_naive()).await?;
        debug!(visitor = %visitor, issued, total = stats.total, today = stats.today, "visit recorded");

        Ok(VisitRecord {
            visitor,
            issued,
            stats,
        })
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> Result<VisitorStats, DomainError> {
        self.store.stats(now.date_naive()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::MockVisitorCounterStore;

    #[tokio::test]
    async fn test_new_visitor_gets_an_id() {
        let mut store = MockVisitorCounterStore::new();
        store
            .expect_record_visit()
            .times(1)
            .returning(|_, _| Ok(VisitorStats { total: 10, today: 2 }));
        let service = VisitorService::new(Arc::new(store));

        let record = service.record(None, Utc::now()).await.unwrap();
        assert!(record.issued);
        assert!(VisitorId::parse(record.visitor.as_str()).is_some());
        assert_eq!(record.stats.total, 10);
    }

    #[tokio::test]
    async fn test_known_visitor_keeps_id() {
        let known = VisitorId::generate();
        let expected = known.clone();
        let mut store = MockVisitorCounterStore::new();
        store
            .expect_record_visit()
            .withf(move |v, _| *v == expected)
            .returning(|_, _| Ok(VisitorStats::default()));
        let service = VisitorService::new(Arc::new(store));

        let record = service.record(Some(known.clone()), Utc::now()).await.unwrap();
        assert!(!record.issued);
        assert_eq!(record.visitor, known);
    }
}
