//! Terminal progress output
//!
//! Spinners via indicatif on a terminal, one line per step otherwise.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use nulink_lib::progress::{ProgressCallback, ProgressId, ProgressInfo, ProgressStatus};
use std::collections::HashMap;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn status_text(status: &ProgressStatus) -> String {
    match status {
        ProgressStatus::Success => "done".to_string(),
        ProgressStatus::NoAnswer => "no answer".to_string(),
        ProgressStatus::Failed(reason) => format!("failed: {reason}"),
    }
}

/// Plain line output for pipes and log files
#[derive(Default)]
pub struct LineProgressCallback {
    steps: Mutex<HashMap<u64, String>>,
    next_id: AtomicU64,
}

impl LineProgressCallback {
    pub fn new() -> Self {
        Self::default()
    }

    fn print_line(&self, line: &str) {
        let mut stdout = io::stdout();
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    }
}

impl ProgressCallback for LineProgressCallback {
    fn start(&self, info: ProgressInfo) -> ProgressId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let line = format!("[{}] {}", info.prefix, info.operation);
        self.print_line(&format!("{line} ..."));
        if let Ok(mut steps) = self.steps.lock() {
            steps.insert(id, line);
        }
        ProgressId(id)
    }

    fn finish(&self, id: ProgressId, status: ProgressStatus) {
        let line = self.steps.lock().ok().and_then(|mut s| s.remove(&id.0));
        if let Some(line) = line {
            self.print_line(&format!("{line} {}", status_text(&status)));
        }
    }
}

/// Spinners drawn with indicatif
pub struct IndicatifProgressCallback {
    multi_progress: MultiProgress,
    spinners: Mutex<HashMap<u64, ProgressBar>>,
    next_id: AtomicU64,
}

impl IndicatifProgressCallback {
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            spinners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for IndicatifProgressCallback {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressCallback for IndicatifProgressCallback {
    fn start(&self, info: ProgressInfo) -> ProgressId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let spinner = self.multi_progress.add(ProgressBar::new_spinner());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_style(
            ProgressStyle::with_template(&format!("[{}] {{spinner}} {{msg}}", info.prefix))
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(info.operation.to_string());

        if let Ok(mut spinners) = self.spinners.lock() {
            spinners.insert(id, spinner);
        }
        ProgressId(id)
    }

    fn finish(&self, id: ProgressId, status: ProgressStatus) {
        if let Ok(mut spinners) = self.spinners.lock()
            && let Some(spinner) = spinners.remove(&id.0)
        {
            let message = format!("{} {}", spinner.message(), status_text(&status));
            spinner.finish_with_message(message);
        }
    }
}

/// Pick spinners on a terminal, plain lines otherwise
pub fn create_progress_callback() -> Arc<dyn ProgressCallback> {
    if io::stdout().is_terminal() {
        Arc::new(IndicatifProgressCallback::new())
    } else {
        Arc::new(LineProgressCallback::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wording() {
        assert_eq!(status_text(&ProgressStatus::Success), "done");
        assert_eq!(status_text(&ProgressStatus::NoAnswer), "no answer");
        assert_eq!(
            status_text(&ProgressStatus::Failed("ICP connect fail".into())),
            "failed: ICP connect fail"
        );
    }
}
