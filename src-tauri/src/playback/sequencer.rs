// Lane sequencer
// Walks a cue sheet on its own thread and hands each cue to the surface

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::cues::CueSheet;
use crate::surface::Surface;

/// Longest uninterrupted sleep, bounds how late a stop takes effect
const TICK: Duration = Duration::from_millis(10);

/// Running playback of one cue sheet
///
/// Dropping the sequencer stops it.
pub struct Sequencer {
    stop_signal: Arc<AtomicBool>,
    is_running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Sequencer {
    /// Start dispatching `sheet` to `surface`
    ///
    /// `on_finish` runs on the sequencer thread once the last block has
    /// played out; it receives `false` when playback was stopped early.
    pub fn start<F>(sheet: CueSheet, surface: Arc<dyn Surface>, on_finish: F) -> Self
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let is_running = Arc::new(AtomicBool::new(true));

        let thread_stop = Arc::clone(&stop_signal);
        let thread_running = Arc::clone(&is_running);
        let handle = thread::Builder::new()
            .name("lane-sequencer".to_string())
            .spawn(move || {
                let completed = run_cues(&sheet, surface.as_ref(), &thread_stop);
                thread_running.store(false, Ordering::SeqCst);
                on_finish(completed);
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to spawn sequencer thread: {}", e);
                is_running.store(false, Ordering::SeqCst);
                None
            }
        };

        Sequencer {
            stop_signal,
            is_running,
            handle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Stop playback and wait for the thread to exit
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        self.wait();
    }

    /// Wait for playback to run to completion
    pub fn wait(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Sequencer thread panicked");
            }
        }
        self.is_running.store(false, Ordering::SeqCst);
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        self.stop();
    }
}

// Returns false when stopped before the sheet played out
fn run_cues(sheet: &CueSheet, surface: &dyn Surface, stop: &AtomicBool) -> bool {
    let started = Instant::now();

    for cue in &sheet.cues {
        if !sleep_until(started, cue.at_ms, stop) {
            return false;
        }
        log::debug!("Cue at {} ms: lane {} -> {}", cue.at_ms, cue.lane_index + 1, cue.block_id);
        if let Err(e) = surface.show(&cue.code, cue.lane_index) {
            log::error!("Error updating lane {}: {}", cue.lane_index + 1, e);
        }
    }

    sleep_until(started, sheet.total_ms, stop)
}

fn sleep_until(started: Instant, at_ms: u64, stop: &AtomicBool) -> bool {
    let target = Duration::from_millis(at_ms);
    loop {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let elapsed = started.elapsed();
        if elapsed >= target {
            return true;
        }
        thread::sleep((target - elapsed).min(TICK));
    }
}
