//! The live product table as a [`TableView`]

use crate::browser::BrowserSession;
use crate::error::{BrowserError, Result};
use async_trait::async_trait;
use harvest_collector::TableView;
use harvest_core::config::TableSelectors;
use harvest_core::{Row, TableSnapshot};
use tracing::debug;

/// JS string literal for `value`
fn js_literal(value: &str) -> String {
    // A JSON string is a valid JS string literal
    serde_json::Value::String(value.to_string()).to_string()
}

/// Text of the smallest element matching "Showing X of N", or null
pub fn status_script() -> String {
    r#"(() => {
    const pattern = /Showing\s+[\d,]+\s+of\s+[\d,]+/i;
    let best = null;
    for (const el of document.querySelectorAll('body *')) {
        const text = (el.innerText || '').trim();
        if (pattern.test(text) && (best === null || text.length < best.length)) {
            best = text;
        }
    }
    return JSON.stringify(best);
})()"#
        .to_string()
}

/// Headers plus raw cells of every rendered body row, or null without a table
pub fn rows_script(selectors: &TableSelectors) -> String {
    format!(
        r#"(() => {{
    const table = document.querySelector({table});
    if (!table) return JSON.stringify(null);
    const headers = Array.from(table.querySelectorAll('thead th')).map(th => th.innerText.trim());
    const rows = Array.from(table.querySelectorAll('tbody tr')).map(tr =>
        Array.from(tr.querySelectorAll('td')).map(td => {{
            const nested = td.querySelector({nested});
            return {{ text: td.innerText.trim(), nested: nested ? nested.innerText.trim() : null }};
        }})
    );
    return JSON.stringify({{ headers, rows }});
}})()"#,
        table = js_literal(&selectors.table_selector),
        nested = js_literal(&selectors.rating_selector),
    )
}

/// Scroll the container to its maximum extent; false if it is missing
pub fn scroll_script(selectors: &TableSelectors) -> String {
    format!(
        r#"(() => {{
    const container = document.querySelector({container});
    if (!container) return JSON.stringify(false);
    container.scrollTop = container.scrollHeight;
    return JSON.stringify(true);
}})()"#,
        container = js_literal(&selectors.container_selector),
    )
}

/// Table view backed by a live browser tab
pub struct BrowserTableView<'a> {
    session: &'a BrowserSession,
    selectors: TableSelectors,
}

impl<'a> BrowserTableView<'a> {
    pub fn new(session: &'a BrowserSession, selectors: TableSelectors) -> Self {
        Self { session, selectors }
    }
}

#[async_trait]
impl TableView for BrowserTableView<'_> {
    async fn read_status_text(&self) -> Result<Option<String>> {
        self.session.evaluate_json(&status_script()).await
    }

    async fn read_visible_rows(&self) -> Result<Vec<Row>> {
        let snapshot: Option<TableSnapshot> =
            self.session.evaluate_json(&rows_script(&self.selectors)).await?;

        let snapshot = snapshot.ok_or_else(|| {
            BrowserError::ExtractionAborted(format!(
                "table '{}' not present",
                self.selectors.table_selector
            ))
        })?;

        debug!(
            "Read {} headers, {} rendered rows",
            snapshot.headers.len(),
            snapshot.rows.len()
        );
        Ok(snapshot.into_rows(&self.selectors.rating_column))
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        let scrolled: bool = self
            .session
            .evaluate_json(&scroll_script(&self.selectors))
            .await?;

        if !scrolled {
            return Err(BrowserError::ExtractionAborted(format!(
                "scroll container '{}' not present",
                self.selectors.container_selector
            )));
        }
        Ok(())
    }
}
