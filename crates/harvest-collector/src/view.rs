//! The view capability the collector drives

use async_trait::async_trait;
use harvest_core::{HarvestError, Result, Row};
use std::sync::Mutex;
use std::time::Duration;

/// A scrollable, lazily rendered table (allows mocking in tests)
#[async_trait]
pub trait TableView: Send + Sync {
    /// Text of the "Showing X of N" indicator, `None` if it is not on the page
    async fn read_status_text(&self) -> Result<Option<String>>;

    /// Every row currently rendered, already mapped onto the headers
    async fn read_visible_rows(&self) -> Result<Vec<Row>>;

    /// Scroll the table's container to its maximum extent
    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Pause after a scroll so the next batch can render
    async fn settle(&self, interval: Duration) {
        tokio::time::sleep(interval).await;
    }
}

#[async_trait]
impl<T: TableView + ?Sized> TableView for &T {
    async fn read_status_text(&self) -> Result<Option<String>> {
        (**self).read_status_text().await
    }

    async fn read_visible_rows(&self) -> Result<Vec<Row>> {
        (**self).read_visible_rows().await
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        (**self).scroll_to_bottom().await
    }

    async fn settle(&self, interval: Duration) {
        (**self).settle(interval).await
    }
}

#[derive(Debug, Default)]
struct MockState {
    reads: usize,
    scrolls: usize,
    settles: Vec<Duration>,
}

/// Scripted table view for testing
///
/// Each read returns the next batch; once the script runs out the last batch
/// repeats, like a table that has been scrolled all the way down. Settling
/// is recorded but never sleeps.
#[derive(Debug, Default)]
pub struct MockTableView {
    status: Option<String>,
    batches: Vec<Vec<Row>>,
    fail_on_read: Option<usize>,
    fail_scroll: bool,
    state: Mutex<MockState>,
}

impl MockTableView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn with_batch(mut self, rows: Vec<Row>) -> Self {
        self.batches.push(rows);
        self
    }

    /// Make the `n`th read (1-based) fail
    pub fn failing_on_read(mut self, n: usize) -> Self {
        self.fail_on_read = Some(n);
        self
    }

    pub fn failing_scroll(mut self) -> Self {
        self.fail_scroll = true;
        self
    }

    pub fn reads(&self) -> usize {
        self.lock().reads
    }

    pub fn scrolls(&self) -> usize {
        self.lock().scrolls
    }

    pub fn settles(&self) -> Vec<Duration> {
        self.lock().settles.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A panicking test thread is the only way to poison this
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TableView for MockTableView {
    async fn read_status_text(&self) -> Result<Option<String>> {
        Ok(self.status.clone())
    }

    async fn read_visible_rows(&self) -> Result<Vec<Row>> {
        let mut state = self.lock();
        state.reads += 1;

        if self.fail_on_read == Some(state.reads) {
            return Err(HarvestError::Browser("table not present".to_string()));
        }

        let index = (state.reads - 1).min(self.batches.len().saturating_sub(1));
        Ok(self.batches.get(index).cloned().unwrap_or_default())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        if self.fail_scroll {
            return Err(HarvestError::Browser("scroll container detached".to_string()));
        }
        self.lock().scrolls += 1;
        Ok(())
    }

    async fn settle(&self, interval: Duration) {
        self.lock().settles.push(interval);
    }
}
