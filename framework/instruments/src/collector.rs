use frame_tunnel_core::prelude::{Clock, InvalidSampleError, InvalidStateError};

/// Samples collected over one observation window, handed over by [SampleCollector::stop].
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedSamples {
    /// Frame durations in milliseconds, in the order they were recorded
    pub samples: Vec<f64>,
    /// Time from [SampleCollector::start] to [SampleCollector::stop]
    pub elapsed_ms: f64,
}

#[derive(Debug)]
enum CollectorState {
    Idle,
    Collecting { started_at: f64, samples: Vec<f64> },
}

/// Accumulates frame duration samples for the scenario that is currently running.
///
/// The collector is either idle or collecting. Samples may only be recorded while collecting, a
/// sample recorded at any other time is rejected rather than dropped.
#[derive(Debug)]
pub struct SampleCollector<C: Clock> {
    clock: C,
    state: CollectorState,
}

impl<C: Clock> SampleCollector<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: CollectorState::Idle,
        }
    }

    pub fn is_collecting(&self) -> bool {
        matches!(self.state, CollectorState::Collecting { .. })
    }

    /// Begin a new observation window with empty sample storage.
    pub fn start(&mut self) -> Result<(), InvalidStateError> {
        if self.is_collecting() {
            return Err(InvalidStateError::new(
                "Cannot start sample collection, it is already running",
            ));
        }

        self.state = CollectorState::Collecting {
            started_at: self.clock.now(),
            samples: Vec::with_capacity(1024),
        };

        Ok(())
    }

    pub fn record(&mut self, duration_ms: f64) -> anyhow::Result<()> {
        match &mut self.state {
            CollectorState::Idle => Err(InvalidStateError::new(
                "Cannot record a frame sample while the collector is idle",
            )
            .into()),
            CollectorState::Collecting { samples, .. } => {
                if !duration_ms.is_finite() || duration_ms < 0.0 {
                    return Err(InvalidSampleError::new(duration_ms).into());
                }
                samples.push(duration_ms);
                Ok(())
            }
        }
    }

    /// Number of samples recorded in the current window, zero when idle.
    pub fn sample_count(&self) -> usize {
        match &self.state {
            CollectorState::Idle => 0,
            CollectorState::Collecting { samples, .. } => samples.len(),
        }
    }

    /// Time since the current window started. Used by the caller to decide when the window closes.
    pub fn elapsed_ms(&self) -> Result<f64, InvalidStateError> {
        match &self.state {
            CollectorState::Idle => Err(InvalidStateError::new(
                "Cannot measure elapsed time while the collector is idle",
            )),
            CollectorState::Collecting { started_at, .. } => {
                Ok((self.clock.now() - started_at).max(0.0))
            }
        }
    }

    /// Close the window and take ownership of the samples. The collector is idle afterwards.
    pub fn stop(&mut self) -> Result<CollectedSamples, InvalidStateError> {
        match std::mem::replace(&mut self.state, CollectorState::Idle) {
            CollectorState::Idle => Err(InvalidStateError::new(
                "Cannot stop sample collection, it was never started",
            )),
            CollectorState::Collecting {
                started_at,
                samples,
            } => Ok(CollectedSamples {
                elapsed_ms: (self.clock.now() - started_at).max(0.0),
                samples,
            }),
        }
    }

    /// Drop an in-progress window without reducing it. Returns the number of samples discarded.
    pub fn discard(&mut self) -> usize {
        match std::mem::replace(&mut self.state, CollectorState::Idle) {
            CollectorState::Idle => 0,
            CollectorState::Collecting { samples, .. } => samples.len(),
        }
    }
}
