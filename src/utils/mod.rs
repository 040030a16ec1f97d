//! The `utils` module holds definitions shared across `rfq`: the error type
//! and logging setup.

pub mod error;
pub mod logging;

pub use error::{QueueError, Result};

#[cfg(test)]
mod tests {
    use super::error::QueueError;
    use super::logging;

    #[test]
    fn logging_init_accepts_levels() {
        // Should not panic
        logging::init("info");
        logging::init("debug");
        logging::init("warn");
        logging::init("nonsense");
    }

    #[test]
    fn error_messages_name_the_topic_and_id() {
        let err = QueueError::PayloadMissing {
            topic: "ndvi".to_string(),
            id: "M1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "payload missing for message M1 in topic 'ndvi'"
        );

        let err = QueueError::InvalidTopicName {
            name: "a/b".to_string(),
            reason: "contains a path separator",
        };
        assert!(err.to_string().contains("a/b"));
    }
}
