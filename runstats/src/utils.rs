/// Returns the hostname of this machine if available.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn server_name() -> Option<String> {
    hostname::get().ok().and_then(|s| s.into_string().ok())
}

/// Returns the hostname of this machine if available.
#[cfg(target_arch = "wasm32")]
pub(crate) fn server_name() -> Option<String> {
    None
}
