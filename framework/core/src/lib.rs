mod abort;
mod clock;
mod error;

pub mod prelude {
    pub use crate::abort::{AbortHandle, AbortListener};
    pub use crate::clock::{Clock, ManualClock, MonotonicClock};
    pub use crate::error::{
        InsufficientSamplesError, InvalidSampleError, InvalidStateError, RenderTargetFailure,
    };
}
