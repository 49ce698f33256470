use std::cmp::min;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressState, ProgressStyle};

/// A progress bar running on its own thread. Stop it with [ProgressHandle::finish].
pub struct ProgressHandle {
    done: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ProgressHandle {
    pub fn finish(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.done.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("Progress thread panicked");
            }
        }
    }
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Displays a progress bar while the sweep is running to show the user how long is left.
///
/// The planned runtime is an estimate. Scenarios that fail early or an abort end the sweep sooner.
pub fn start_progress(planned_runtime: Duration) -> anyhow::Result<ProgressHandle> {
    let planned_ms = planned_runtime.as_millis() as u64;
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{wide_bar:.cyan/blue}] [{elapsed_precise} / {planned_runtime}]",
    )
    .context("Failed to set progress style")?
    .with_key("planned_runtime", {
        let secs = planned_runtime.as_secs();
        let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        move |_state: &ProgressState, w: &mut dyn Write| {
            let _ = write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds);
        }
    })
    .progress_chars("#>-");

    let done = Arc::new(AtomicBool::new(false));
    let thread_done = done.clone();
    let thread = std::thread::Builder::new()
        .name("progress".to_string())
        .spawn(move || {
            let start_time = Instant::now();
            let pb = ProgressBar::new(planned_ms);
            pb.set_style(style);

            while !thread_done.load(Ordering::Acquire) {
                pb.set_position(min(start_time.elapsed().as_millis() as u64, planned_ms));
                std::thread::sleep(Duration::from_millis(250));
            }

            log::trace!("Progress thread shutting down");
            pb.finish_and_clear();
        })
        .context("Failed to start progress thread")?;

    Ok(ProgressHandle {
        done,
        thread: Some(thread),
    })
}
