/// Initialise logging for a Gust scenario.
///
/// Verbosity is controlled with `RUST_LOG`. Calling this more than once is harmless, later calls
/// leave the first logger in place.
pub fn init_logging() {
    if env_logger::try_init().is_err() {
        log::trace!("Logger already initialised");
    }
}
