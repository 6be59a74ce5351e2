//! Deterministic UI navigation to the data view

use crate::browser::{urls_match, BrowserSession};
use crate::error::{BrowserError, Result};
use crate::locator;
use harvest_core::config::{NavAction, NavStep, NavigationConfig};
use tracing::{debug, info};

/// How a single step is carried out in the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepPlan {
    /// Load the URL unless already there
    Goto(String),
    /// Click the first element matching the XPath
    Click(String),
    /// Wait for the CSS selector
    Wait(String),
}

impl StepPlan {
    pub fn for_step(step: &NavStep) -> Self {
        match step.action {
            NavAction::GotoIfElsewhere => Self::Goto(step.target.clone()),
            NavAction::ClickButton => Self::Click(locator::button(&step.target)),
            NavAction::ClickText => Self::Click(locator::text(&step.target)),
            NavAction::WaitFor => Self::Wait(step.target.clone()),
        }
    }
}

/// Walks the configured step list in order
pub struct Navigator {
    steps: Vec<NavStep>,
}

impl Navigator {
    pub fn new(config: &NavigationConfig) -> Self {
        Self {
            steps: config.steps.clone(),
        }
    }

    pub fn steps(&self) -> &[NavStep] {
        &self.steps
    }

    /// Run every step; the first failure stops navigation
    pub async fn run(&self, session: &BrowserSession) -> Result<()> {
        info!("Navigating to the data view ({} steps)", self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            debug!("Step {}: {}", index + 1, step);
            self.run_step(session, step).await.map_err(|e| {
                BrowserError::Navigation(format!("step {} ({}) failed: {}", index + 1, step, e))
            })?;
        }

        info!("Data view ready");
        Ok(())
    }

    async fn run_step(&self, session: &BrowserSession, step: &NavStep) -> Result<()> {
        match StepPlan::for_step(step) {
            StepPlan::Goto(url) => {
                if urls_match(&session.current_url(), &url) {
                    debug!("Already at {}", url);
                    return Ok(());
                }
                session.navigate(&url).await
            }
            StepPlan::Click(xpath) => session.click_xpath(&xpath).await,
            StepPlan::Wait(selector) => session.wait_for_element(&selector, None).await,
        }
    }
}
