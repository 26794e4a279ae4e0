use std::sync::{Mutex, OnceLock};

use ev_core::ItemId;
use ev_pipeline::{RunObserver, RunStage};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::ui;

pub struct Progress {
    bar: Option<ProgressBar>,
}

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(MultiProgress::new)
}

fn bar_template() -> &'static str {
    match ui::prefs().term_width {
        Some(cols) if cols >= 110 => "{bar:40.cyan/blue} {pos}/{len} {msg}",
        Some(cols) if cols >= 80 => "{wide_bar:.cyan/blue} {pos}/{len} {msg}",
        _ => "{wide_bar:.cyan/blue} {percent}% {msg}",
    }
}

impl Progress {
    #[must_use]
    pub const fn hidden() -> Self {
        Self { bar: None }
    }

    #[must_use]
    pub fn spinner(message: &str) -> Self {
        if !ui::prefs().progress {
            return Self::hidden();
        }

        let bar = multi_progress().add(ProgressBar::new_spinner());
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        Self { bar: Some(bar) }
    }

    #[must_use]
    pub fn bar(total: u64, message: &str) -> Self {
        if !ui::prefs().progress {
            return Self::hidden();
        }

        let bar = multi_progress().add(ProgressBar::new(total));
        bar.set_style(
            ProgressStyle::with_template(bar_template())
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(message.to_string());
        Self { bar: Some(bar) }
    }

    pub fn set_message(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.to_string());
        }
    }

    pub fn inc(&self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    pub fn finish_ok(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message.to_string());
        }
    }

    pub fn finish_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    pub fn finish_err(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.abandon_with_message(message.to_string());
        }
    }
}

/// Drives one spinner or bar per pipeline stage.
pub struct RunProgress {
    current: Mutex<Progress>,
}

impl RunProgress {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: Mutex::new(Progress::hidden()),
        }
    }

    fn replace(&self, next: Progress) {
        if let Ok(mut current) = self.current.lock() {
            current.finish_clear();
            *current = next;
        }
    }

    pub fn finish_ok(&self, message: &str) {
        if let Ok(current) = self.current.lock() {
            current.finish_ok(message);
        }
    }

    pub fn finish_err(&self, message: &str) {
        if let Ok(current) = self.current.lock() {
            current.finish_err(message);
        }
    }
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl RunObserver for RunProgress {
    fn stage(&self, stage: RunStage) {
        let next = match stage {
            RunStage::BuildingChecklist => Progress::spinner("extracting checklist"),
            RunStage::Indexing { documents } => {
                Progress::spinner(&format!("indexing {documents} evidence document(s)"))
            }
            RunStage::Evaluating { items } => Progress::bar(
                u64::try_from(items).unwrap_or(u64::MAX),
                "evaluating requirements",
            ),
            RunStage::Aggregating => Progress::spinner("aggregating report"),
        };
        self.replace(next);
    }

    fn item_finished(&self, id: ItemId, failed: bool) {
        if let Ok(current) = self.current.lock() {
            current.inc(1);
            if failed {
                current.set_message(&format!("item {id} failed"));
            }
        }
    }
}
