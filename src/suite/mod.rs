//! Runs the checklist against one image and collects the outcomes.

use crate::checks::{Check, CheckContext};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};


#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Failed(String),
    Skipped(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub status: CheckStatus,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub tag: String,
    pub image: String,
    pub started_at: String,
    pub outcomes: Vec<CheckOutcome>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SuiteReport {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for outcome in &self.outcomes {
            match outcome.status {
                CheckStatus::Passed => summary.passed += 1,
                CheckStatus::Failed(_) => summary.failed += 1,
                CheckStatus::Skipped(_) => summary.skipped += 1,
            }
        }
        summary
    }

    pub fn succeeded(&self) -> bool {
        self.summary().failed == 0
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {:?}", path))?;
        info!("Wrote report to {:?}", path);
        Ok(())
    }
}

pub struct Suite {
    context: CheckContext,
    selected: Option<Vec<Check>>,
}

impl Suite {
    pub fn new(context: CheckContext) -> Self {
        Self {
            context,
            selected: None,
        }
    }

    /// Run only these checks; the rest are reported as skipped
    pub fn with_filter(mut self, checks: Vec<Check>) -> Self {
        if !checks.is_empty() {
            self.selected = Some(checks);
        }
        self
    }

    fn is_selected(&self, check: Check) -> bool {
        self.selected
            .as_ref()
            .map_or(true, |selected| selected.contains(&check))
    }

    /// Run every check in order; a failing check does not stop the ones after it
    pub async fn run(&self) -> SuiteReport {
        let started_at = chrono::Utc::now().to_rfc3339();
        let mut outcomes = Vec::with_capacity(Check::ALL.len());

        for check in Check::ALL {
            if !self.is_selected(check) {
                outcomes.push(CheckOutcome {
                    name: check.name().to_string(),
                    description: check.description().to_string(),
                    status: CheckStatus::Skipped("not selected".to_string()),
                    elapsed_ms: 0,
                });
                continue;
            }

            info!("Running {}: {}", check, check.description());
            let start = Instant::now();
            let status = match check.run(&self.context).await {
                Ok(()) => {
                    info!("PASS {}", check);
                    CheckStatus::Passed
                }
                Err(e) => {
                    error!("FAIL {}: {:#}", check, e);
                    CheckStatus::Failed(format!("{:#}", e))
                }
            };

            outcomes.push(CheckOutcome {
                name: check.name().to_string(),
                description: check.description().to_string(),
                status,
                elapsed_ms: start.elapsed().as_millis(),
            });
        }

        let report = SuiteReport {
            tag: self.context.tag().to_string(),
            image: self.context.image.clone(),
            started_at,
            outcomes,
        };

        let summary = report.summary();
        if summary.failed > 0 {
            warn!(
                "{} passed, {} failed, {} skipped",
                summary.passed, summary.failed, summary.skipped
            );
        } else {
            info!(
                "{} passed, {} failed, {} skipped",
                summary.passed, summary.failed, summary.skipped
            );
        }
        report
    }
}
