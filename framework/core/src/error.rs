/// An operation was invoked outside of its legal lifecycle state, for example recording a frame
/// sample before sample collection was started.
///
/// This is a programming error in the caller and is never silently absorbed.
#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct InvalidStateError {
    msg: String,
}

impl InvalidStateError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// Reduction was attempted over zero frame samples.
///
/// Usually means the scenario duration is shorter than a single frame.
#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct InsufficientSamplesError {
    msg: String,
}

impl Default for InsufficientSamplesError {
    fn default() -> Self {
        Self {
            msg: "No frame samples were recorded, cannot reduce".to_string(),
        }
    }
}

/// A frame duration that is negative, NaN or infinite.
#[derive(derive_more::Error, derive_more::Display, Debug)]
#[display("Invalid frame sample: {value}ms")]
pub struct InvalidSampleError {
    value: f64,
}

impl InvalidSampleError {
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Return this error from a render target to report that it could not configure a scenario or
/// render a frame.
///
/// The current scenario is terminated and the sweep moves on to the next one.
#[derive(derive_more::Error, derive_more::Display, Debug)]
#[display("Render target failed: {msg}")]
pub struct RenderTargetFailure {
    msg: String,
}

impl RenderTargetFailure {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}
