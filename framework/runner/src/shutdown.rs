use frame_tunnel_core::prelude::AbortHandle;
use tokio::signal;

/// Abort the sweep when Ctrl-C is received.
///
/// The runtime must outlive the sweep, the listener task is dropped with it.
pub(crate) fn start_abort_listener(runtime: &tokio::runtime::Runtime) -> AbortHandle {
    let handle = AbortHandle::default();

    let listener_handle = handle.clone();
    runtime.spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                println!("Received abort signal, finishing up...");
                listener_handle.abort();
            }
            Err(e) => log::error!("Failed to listen for Ctrl-C, the sweep can't be aborted: {e:?}"),
        }
    });

    handle
}
