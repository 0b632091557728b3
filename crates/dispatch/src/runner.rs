use std::ops::ControlFlow;
use std::time::{Duration, Instant};

/// Call `frame` about every `interval` until it breaks. Returns the number of frames run.
///
/// The next deadline is taken from the end of each frame, so a slow frame
/// delays the following ones instead of causing a burst of catch-up calls.
pub fn run_fixed_interval(
    interval: Duration,
    mut frame: impl FnMut(Instant) -> ControlFlow<()>,
) -> u64 {
    let mut frames = 0;
    loop {
        frames += 1;
        if frame(Instant::now()).is_break() {
            break;
        }
        std::thread::sleep(interval);
    }
    tracing::debug!(frames, "fixed-interval loop stopped");
    frames
}
