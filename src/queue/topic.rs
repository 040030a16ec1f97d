use crate::utils::{QueueError, Result};

const BACKLOG_SUFFIX: &str = "backlog";
const NEXTLOG_SUFFIX: &str = "nextlog";
const PAYLOADS_SUFFIX: &str = "payloads";

/// A validated topic name and the three store keys derived from it.
///
/// Construction is the only validation point, so every store interaction
/// below this type works on a well-formed name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    name: String,
}

impl Topic {
    pub fn new(name: &str) -> Result<Self> {
        let reason = if name.is_empty() {
            Some("must not be empty")
        } else if name.contains(['/', '\\']) {
            Some("must not contain a path separator")
        } else if name.contains('\0') {
            Some("must not contain a NUL byte")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(QueueError::InvalidTopicName {
                name: name.to_string(),
                reason,
            }),
            None => Ok(Self {
                name: name.to_string(),
            }),
        }
    }

    /// Recover the topic a backing key belongs to, if it is one of ours.
    pub fn from_key(key: &str) -> Option<Self> {
        let (name, suffix) = key.rsplit_once(':')?;
        match suffix {
            BACKLOG_SUFFIX | NEXTLOG_SUFFIX | PAYLOADS_SUFFIX => Topic::new(name).ok(),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backlog_key(&self) -> String {
        format!("{}:{BACKLOG_SUFFIX}", self.name)
    }

    pub fn nextlog_key(&self) -> String {
        format!("{}:{NEXTLOG_SUFFIX}", self.name)
    }

    pub fn payloads_key(&self) -> String {
        format!("{}:{PAYLOADS_SUFFIX}", self.name)
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
