/// Logs a debug message to the `runstats` log target.
macro_rules! runstats_debug {
    ($($arg:tt)*) => {
        log::debug!(target: "runstats", $($arg)*)
    };
}
