use std::cmp::min;
use std::fmt::Write;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressState, ProgressStyle};

use crate::shutdown::DelegatedShutdownListener;

/// Displays a progress bar while the run is in progress to show the user how long is left.
pub(crate) fn start_progress(planned_runtime: Duration, mut shutdown_listener: DelegatedShutdownListener) {
    let spawned = std::thread::Builder::new()
        .name("progress".to_string())
        .spawn(move || {
            let start_time = Instant::now();
            let planned_ms = planned_runtime.as_millis() as u64;
            let pb = ProgressBar::new(planned_ms);
            let style = match ProgressStyle::with_template(
                "{spinner:.green} [{wide_bar:.cyan/blue}] [{elapsed_precise} / {planned_runtime}]",
            ) {
                Ok(style) => style,
                Err(e) => {
                    log::warn!("Failed to set progress style: {e}");
                    return;
                }
            };
            pb.set_style(
                style
                    .with_key("planned_runtime", {
                        let secs = planned_runtime.as_secs();
                        let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
                        move |_state: &ProgressState, w: &mut dyn Write| {
                            let _ = write!(w, "{hours:02}:{minutes:02}:{seconds:02}");
                        }
                    })
                    .progress_chars("#>-"),
            );

            loop {
                if shutdown_listener.should_shutdown() {
                    log::trace!("Progress thread shutting down");
                    pb.finish_and_clear();
                    break;
                }

                pb.set_position(min(start_time.elapsed().as_millis() as u64, planned_ms));
                std::thread::sleep(Duration::from_millis(250));
            }
        });

    if let Err(e) = spawned {
        log::warn!("Failed to start progress thread: {e}");
    }
}
