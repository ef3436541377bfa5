//! Page view event for asynchronous counting.

/// A public page view waiting to be counted.
///
/// Handlers push these onto a bounded channel so the response never waits on
/// the counter update. Processed by [`crate::domain::view_worker::run_view_worker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewEvent {
    pub smartlink_id: i64,
}

impl ViewEvent {
    pub fn new(smartlink_id: i64) -> Self {
        Self { smartlink_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_event_creation() {
        let event = ViewEvent::new(42);
        assert_eq!(event.smartlink_id, 42);
    }
}
