use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use frame_tunnel_core::prelude::{AbortListener, Clock};
use tokio::time::MissedTickBehavior;

/// Arranges for the frame callback to run at the next frame boundary.
///
/// Scheduling is single-shot. A callback that wants another frame must schedule it again while it
/// is handling the current one, there is no recurring timer.
pub trait FrameScheduler {
    /// Arm the callback for the next frame boundary. Arming more than once before the frame is
    /// delivered still results in exactly one invocation.
    fn schedule_next_frame(&mut self);

    /// Arm the callback for the first frame boundary after `delay`, leaving the host idle until
    /// then. Replaces any earlier arming within the same frame.
    fn schedule_frame_after(&mut self, delay: Duration);

    /// Disarm the callback. No further invocation happens unless it is scheduled again.
    fn cancel(&mut self);
}

/// Work to do once per frame.
///
/// The callback should do a small, bounded amount of work and return. Frame N+1 is never delivered
/// before the callback for frame N has returned.
pub trait FrameCallback {
    fn on_frame(&mut self, scheduler: &mut dyn FrameScheduler) -> anyhow::Result<()>;
}

/// The host's frame loop, which owns the only suspension point of a sweep.
pub trait FrameHost {
    /// Deliver frames to `callback` for as long as it keeps scheduling them.
    ///
    /// The first frame is armed on entry. Returns the number of frames delivered. An error from the
    /// callback stops the loop and is returned.
    fn run(&mut self, callback: &mut dyn FrameCallback) -> anyhow::Result<u64>;
}

#[derive(Debug, Default)]
struct FrameRequest {
    armed: bool,
    delay: Option<Duration>,
}

impl FrameRequest {
    fn armed() -> Self {
        Self {
            armed: true,
            delay: None,
        }
    }

    /// Disarm and return the requested delay, `None` if no frame was requested.
    fn take(&mut self) -> Option<Duration> {
        let delay = self.delay.take().unwrap_or(Duration::ZERO);
        std::mem::take(&mut self.armed).then_some(delay)
    }
}

impl FrameScheduler for FrameRequest {
    fn schedule_next_frame(&mut self) {
        self.armed = true;
        self.delay = None;
    }

    fn schedule_frame_after(&mut self, delay: Duration) {
        self.armed = true;
        self.delay = Some(delay);
    }

    fn cancel(&mut self) {
        self.armed = false;
        self.delay = None;
    }
}

/// Longest uninterrupted sleep while idling without a runtime, so an abort is seen promptly.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A headless frame loop.
///
/// Unpaced loops deliver frames back-to-back. Paced loops wait for the next tick of a fixed frame
/// interval, in the way a display's refresh would. Either kind sleeps through a frame scheduled
/// with [FrameScheduler::schedule_frame_after] and wakes up early if an abort is requested, so
/// that the next callback can observe it without waiting out the interval.
#[derive(Clone)]
pub struct FrameLoop {
    frame_interval: Option<Duration>,
    abort_listener: Option<AbortListener>,
    idle_clock: Option<Arc<dyn Clock>>,
}

impl FrameLoop {
    pub fn unpaced() -> Self {
        Self {
            frame_interval: None,
            abort_listener: None,
            idle_clock: None,
        }
    }

    /// Pace frames at a target rate. A rate of 0 gives an unpaced loop.
    pub fn paced(frames_per_second: u32) -> Self {
        Self {
            frame_interval: (frames_per_second > 0)
                .then(|| Duration::from_secs_f64(1.0 / frames_per_second as f64)),
            abort_listener: None,
            idle_clock: None,
        }
    }

    pub fn with_abort_listener(mut self, abort_listener: AbortListener) -> Self {
        self.abort_listener = Some(abort_listener);
        self
    }

    /// Wait out delayed frames on `clock` rather than on the wall clock.
    ///
    /// For virtual clocks such as [ManualClock](frame_tunnel_core::prelude::ManualClock), which
    /// jump to the end of the delay. Waiting on a custom clock does not wake early on abort.
    pub fn with_idle_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.idle_clock = Some(Arc::new(clock));
        self
    }

    pub fn frame_interval(&self) -> Option<Duration> {
        self.frame_interval
    }
}

impl FrameHost for FrameLoop {
    fn run(&mut self, callback: &mut dyn FrameCallback) -> anyhow::Result<u64> {
        let mut request = FrameRequest::armed();
        let mut frames = 0u64;

        let Some(frame_interval) = self.frame_interval else {
            while let Some(delay) = request.take() {
                if !delay.is_zero() {
                    self.idle(delay);
                }
                callback.on_frame(&mut request)?;
                frames += 1;
            }
            return Ok(frames);
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .context("Failed to create frame loop runtime")?;
        let mut abort_listener = self.abort_listener.clone();
        let idle_clock = self.idle_clock.clone();

        runtime.block_on(async {
            let mut ticker = tokio::time::interval(frame_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            while let Some(delay) = request.take() {
                match &idle_clock {
                    Some(clock) if !delay.is_zero() => clock.sleep(delay),
                    None if !delay.is_zero() => {
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = wait_for_abort(&mut abort_listener) => {}
                        }
                        ticker.reset();
                    }
                    _ => {
                        tokio::select! {
                            _ = ticker.tick() => {}
                            _ = wait_for_abort(&mut abort_listener) => {}
                        }
                    }
                }
                callback.on_frame(&mut request)?;
                frames += 1;
            }

            anyhow::Ok(())
        })?;

        Ok(frames)
    }
}

impl FrameLoop {
    /// Sleep through a delayed frame without a runtime.
    fn idle(&self, delay: Duration) {
        if let Some(clock) = &self.idle_clock {
            clock.sleep(delay);
            return;
        }

        let deadline = Instant::now() + delay;
        loop {
            if self
                .abort_listener
                .as_ref()
                .is_some_and(|listener| listener.is_aborted())
            {
                return;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return;
            }
            std::thread::sleep(remaining.min(IDLE_POLL_INTERVAL));
        }
    }
}

async fn wait_for_abort(abort_listener: &mut Option<AbortListener>) {
    match abort_listener {
        Some(listener) => listener.wait_for_abort().await,
        None => std::future::pending().await,
    }
}
