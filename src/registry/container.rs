//! IoC container boundary.
//!
//! The core never owns dependency registration; it only checks a service
//! instance out for the duration of one invocation and returns it after.
//! Registrations must complete before the host reaches its ready state;
//! resolve/release are the only calls made while serving traffic and the
//! container is assumed thread-safe for them.

/// Per-request service instance checkout.
pub trait ServiceContainer: Send + Sync {
    /// Called immediately before an operation invocation.
    fn resolve(&self, operation: &str);

    /// Called after the invocation completes, success or failure.
    fn release(&self, operation: &str);
}

/// Default container for hosts without per-request service state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullContainer;

impl ServiceContainer for NullContainer {
    fn resolve(&self, _operation: &str) {}
    fn release(&self, _operation: &str) {}
}
