//! Incremental collector - read, dedup, scroll, settle, repeat
//!
//! Key design: the row count advertised by the status indicator is read once,
//! up front. After that, every pass reads the rendered rows, appends the ones
//! not seen before and stops as soon as either:
//! - the collection holds the advertised total, or
//! - a pass adds nothing (the table is exhausted or stopped rendering)
//!
//! Read and scroll failures are fatal, and so is running past the configured
//! timeout. Nothing is retried; a partial collection is never returned.

use crate::status::parse_total_count;
use crate::view::TableView;
use harvest_core::config::CollectorSettings;
use harvest_core::{Collection, HarvestError, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Why the loop ended; both are normal outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The collection holds the advertised total
    TotalReached,
    /// A pass surfaced no rows that were not already collected
    NoProgress,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TotalReached => write!(f, "total reached"),
            Self::NoProgress => write!(f, "no progress"),
        }
    }
}

/// Result of a completed extraction
#[derive(Debug, Clone)]
pub struct Harvest {
    pub rows: Collection,
    /// Advertised total the run aimed for
    pub total: usize,
    pub stop: StopReason,
    /// Number of read passes performed
    pub iterations: usize,
}

impl Harvest {
    pub fn is_complete(&self) -> bool {
        self.rows.len() == self.total
    }
}

/// Drives a [`TableView`] until every advertised row has been collected
pub struct IncrementalCollector<V: TableView> {
    view: V,
    settle_interval: Duration,
    timeout: Option<Duration>,
}

impl<V: TableView> IncrementalCollector<V> {
    pub fn new(view: V, settings: &CollectorSettings) -> Self {
        Self::with_settle_interval(view, settings.settle_interval())
            .with_timeout(settings.timeout())
    }

    /// Collector without an overall time bound
    pub fn with_settle_interval(view: V, settle_interval: Duration) -> Self {
        Self {
            view,
            settle_interval,
            timeout: None,
        }
    }

    /// Bound [`run`](Self::run) to `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Read the advertised total from the status indicator
    pub async fn target_count(&self) -> Result<usize> {
        let text = self
            .view
            .read_status_text()
            .await
            .map_err(|e| HarvestError::TargetCountUnavailable(e.to_string()))?
            .ok_or_else(|| {
                HarvestError::TargetCountUnavailable("status indicator not found".to_string())
            })?;

        parse_total_count(&text)
    }

    /// Determine the target count, then collect
    ///
    /// Fails with [`HarvestError::ExtractionTimedOut`] once the timeout
    /// elapses, whatever pass the loop is in.
    pub async fn run(&self) -> Result<Harvest> {
        let Some(timeout) = self.timeout else {
            return self.run_unbounded().await;
        };

        tokio::time::timeout(timeout, self.run_unbounded())
            .await
            .map_err(|_| {
                warn!("Extraction did not finish within {:?}", timeout);
                HarvestError::ExtractionTimedOut(timeout.as_secs())
            })?
    }

    async fn run_unbounded(&self) -> Result<Harvest> {
        let total = self.target_count().await?;
        info!("Target: {} rows", total);
        self.collect(total).await
    }

    /// Collect until `total` rows are held or a pass adds nothing
    ///
    /// Rows surfaced beyond `total` are not kept, so the result never
    /// exceeds the advertised count.
    pub async fn collect(&self, total: usize) -> Result<Harvest> {
        let mut rows = Collection::new();
        let mut iterations = 0;

        let stop = loop {
            if rows.len() >= total {
                break StopReason::TotalReached;
            }

            iterations += 1;
            let before = rows.len();

            let visible = self.view.read_visible_rows().await.map_err(aborted)?;
            let rendered = visible.len();
            let mut surplus = 0;
            for row in visible {
                if rows.len() >= total {
                    if !rows.contains(&row) {
                        surplus += 1;
                    }
                    continue;
                }
                rows.insert(row);
            }

            if surplus > 0 {
                warn!(
                    "Ignored {} rows beyond the advertised total of {}",
                    surplus, total
                );
            }

            let added = rows.len() - before;
            debug!(
                "Pass {}: {} rendered, {} new",
                iterations, rendered, added
            );
            info!("Collected {} / {} rows", rows.len(), total);

            if added == 0 {
                info!("No new rows after pass {}, scroll limit reached", iterations);
                break StopReason::NoProgress;
            }
            if rows.len() >= total {
                break StopReason::TotalReached;
            }

            self.view.scroll_to_bottom().await.map_err(aborted)?;
            self.view.settle(self.settle_interval).await;
        };

        info!(
            "Extraction finished ({}): {} / {} rows in {} passes",
            stop,
            rows.len(),
            total,
            iterations
        );

        Ok(Harvest {
            rows,
            total,
            stop,
            iterations,
        })
    }
}

fn aborted(e: HarvestError) -> HarvestError {
    match e {
        HarvestError::ExtractionAborted(_) => e,
        other => HarvestError::ExtractionAborted(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::MockTableView;
    use async_trait::async_trait;
    use harvest_core::Row;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn row(name: &str) -> Row {
        Row::new().with("Name", Some(name)).with("Rating", None)
    }

    fn rows(names: &[&str]) -> Vec<Row> {
        names.iter().map(|n| row(n)).collect()
    }

    fn names(harvest: &Harvest) -> Vec<String> {
        harvest
            .rows
            .rows()
            .iter()
            .map(|r| r.get("Name").flatten().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_target_count_missing_status() {
        let collector =
            IncrementalCollector::with_settle_interval(MockTableView::new(), Duration::ZERO);
        assert!(matches!(
            collector.run().await,
            Err(HarvestError::TargetCountUnavailable(_))
        ));
        assert_eq!(collector.view().reads(), 0);
    }

    #[tokio::test]
    async fn test_target_count_unparseable_status() {
        let view = MockTableView::new().with_status("Loading products...");
        let collector = IncrementalCollector::with_settle_interval(view, Duration::ZERO);
        assert!(matches!(
            collector.target_count().await,
            Err(HarvestError::TargetCountUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_total_reads_nothing() {
        let view = MockTableView::new().with_batch(rows(&["A"]));
        let collector = IncrementalCollector::with_settle_interval(view, Duration::ZERO);

        let harvest = collector.collect(0).await.unwrap();
        assert_eq!(harvest.stop, StopReason::TotalReached);
        assert!(harvest.rows.is_empty());
        assert_eq!(collector.view().reads(), 0);
    }

    #[tokio::test]
    async fn test_single_pass_reaches_total_without_scrolling() {
        let view = MockTableView::new().with_batch(rows(&["A", "B"]));
        let collector = IncrementalCollector::with_settle_interval(view, Duration::ZERO);

        let harvest = collector.collect(2).await.unwrap();
        assert_eq!(harvest.stop, StopReason::TotalReached);
        assert_eq!(harvest.iterations, 1);
        assert_eq!(collector.view().scrolls(), 0);
    }

    #[tokio::test]
    async fn test_surplus_rows_are_capped() {
        let view = MockTableView::new().with_batch(rows(&["A", "B", "C", "D"]));
        let collector = IncrementalCollector::with_settle_interval(view, Duration::ZERO);

        let harvest = collector.collect(3).await.unwrap();
        assert_eq!(names(&harvest), vec!["A", "B", "C"]);
        assert!(harvest.is_complete());
    }

    #[tokio::test]
    async fn test_settle_uses_configured_interval() {
        let view = MockTableView::new()
            .with_batch(rows(&["A"]))
            .with_batch(rows(&["A", "B"]))
            .with_batch(rows(&["B"]));
        let settings = CollectorSettings {
            settle_ms: 250,
            timeout_seconds: 10,
        };
        let collector = IncrementalCollector::new(view, &settings);

        let harvest = collector.collect(10).await.unwrap();
        assert_eq!(harvest.stop, StopReason::NoProgress);
        assert_eq!(
            collector.view().settles(),
            vec![Duration::from_millis(250), Duration::from_millis(250)]
        );
    }

    #[tokio::test]
    async fn test_read_failure_aborts() {
        let view = MockTableView::new()
            .with_status("Showing 2 of 4 items")
            .with_batch(rows(&["A", "B"]))
            .with_batch(rows(&["C", "D"]))
            .failing_on_read(2);
        let collector = IncrementalCollector::with_settle_interval(view, Duration::ZERO);

        let err = collector.run().await.unwrap_err();
        assert!(matches!(err, HarvestError::ExtractionAborted(ref m) if m.contains("table not present")));
    }

    #[tokio::test]
    async fn test_scroll_failure_aborts() {
        let view = MockTableView::new()
            .with_batch(rows(&["A"]))
            .failing_scroll();
        let collector = IncrementalCollector::with_settle_interval(view, Duration::ZERO);

        assert!(matches!(
            collector.collect(5).await,
            Err(HarvestError::ExtractionAborted(_))
        ));
    }

    /// Renders one new row per read and really sleeps when settling
    struct EndlessView {
        reads: AtomicUsize,
    }

    #[async_trait]
    impl TableView for EndlessView {
        async fn read_status_text(&self) -> Result<Option<String>> {
            Ok(Some("Showing 20 of 1,000,000 products".to_string()))
        }

        async fn read_visible_rows(&self) -> Result<Vec<Row>> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(vec![row(&format!("Product {}", n))])
        }

        async fn scroll_to_bottom(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_run_times_out_while_rows_keep_coming() {
        let view = EndlessView {
            reads: AtomicUsize::new(0),
        };
        let collector = IncrementalCollector::with_settle_interval(view, Duration::from_millis(10))
            .with_timeout(Duration::from_millis(100));

        let err = collector.run().await.unwrap_err();
        assert!(matches!(err, HarvestError::ExtractionTimedOut(_)));
        assert!(collector.view().reads.load(Ordering::SeqCst) > 1);
    }

    #[test]
    fn test_settings_timeout_applies() {
        let settings = CollectorSettings {
            settle_ms: 0,
            timeout_seconds: 7,
        };
        let collector = IncrementalCollector::new(MockTableView::new(), &settings);
        assert_eq!(collector.timeout, Some(Duration::from_secs(7)));

        let unbounded =
            IncrementalCollector::with_settle_interval(MockTableView::new(), Duration::ZERO);
        assert_eq!(unbounded.timeout, None);
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(StopReason::TotalReached.to_string(), "total reached");
        assert_eq!(StopReason::NoProgress.to_string(), "no progress");
    }
}
