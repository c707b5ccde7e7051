use tokio::signal;

pub(crate) use gust_core::prelude::{DelegatedShutdownListener, ShutdownHandle, ShutdownSignalError};

/// Trigger a shutdown of the run when the operator presses Ctrl-C.
pub(crate) fn start_shutdown_listener(runtime: &tokio::runtime::Runtime) -> ShutdownHandle {
    let handle = ShutdownHandle::default();

    let listener_handle = handle.clone();
    runtime.spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Received shutdown signal, shutting down...");
                listener_handle.shutdown();
            }
            Err(e) => {
                log::warn!("Unable to listen for Ctrl-C, the run will stop at its deadline: {e:?}");
            }
        }
    });

    handle
}
