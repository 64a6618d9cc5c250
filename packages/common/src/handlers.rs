//! Default result and error handlers
//!
//! Both pass their argument through unchanged after logging it, so they can
//! be slotted into a result chain without altering it.

/// Pass a successful result through, logging at debug
pub fn on_result<T>(result: T) -> T {
    tracing::debug!("Operation completed successfully");
    result
}

/// Pass an error through, logging it at warn
///
/// Only the error's `Display` form is logged. Error types in this workspace
/// never carry passphrases or key material.
pub fn on_error<E: std::fmt::Display>(error: E) -> E {
    tracing::warn!("Error occurred: {error}");
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handlers_pass_values_through() {
        assert_eq!(on_result(5), 5);
        assert_eq!(on_error("bad salt"), "bad salt");
    }
}
