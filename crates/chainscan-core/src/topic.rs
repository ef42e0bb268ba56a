//! Log topic validation.
//!
//! A topic is a 32-byte word rendered as `0x` followed by 64 lowercase hex
//! digits. A topic set is an ordered, non-empty list of at most four topics;
//! position `i` maps to the provider's `topic{i}` slot. Invalid entries are
//! rejected, never filtered out: dropping a topic would turn it into a
//! wildcard and widen the query.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::ExplorerError;

/// Total length of a topic string, prefix included.
pub const TOPIC_LEN: usize = 66;

/// Maximum number of topic slots an EVM log (and the provider) supports.
pub const MAX_TOPICS: usize = 4;

/// Returns `true` if `s` is a canonical log topic.
pub fn is_log_topic(s: &str) -> bool {
    s.len() == TOPIC_LEN
        && s.starts_with("0x")
        && s[2..]
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Returns `true` if `topics` is a valid, non-empty topic set.
pub fn is_log_topic_set<S: AsRef<str>>(topics: &[S]) -> bool {
    !topics.is_empty()
        && topics.len() <= MAX_TOPICS
        && topics.iter().all(|t| is_log_topic(t.as_ref()))
}

/// Validate raw strings into a typed [`LogTopicSet`].
///
/// Fails with [`ExplorerError::InvalidTopics`] naming the first offending
/// position.
pub fn coerce_topics<S: AsRef<str>>(topics: &[S]) -> Result<LogTopicSet, ExplorerError> {
    if topics.is_empty() {
        return Err(ExplorerError::invalid_topics("topic set is empty"));
    }
    if topics.len() > MAX_TOPICS {
        return Err(ExplorerError::invalid_topics(format!(
            "{} topics given, at most {MAX_TOPICS} allowed",
            topics.len()
        )));
    }
    let parsed = topics
        .iter()
        .enumerate()
        .map(|(i, t)| {
            LogTopic::parse(t.as_ref()).ok_or_else(|| {
                ExplorerError::invalid_topics(format!("topic{i} '{}' is malformed", t.as_ref()))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LogTopicSet(parsed))
}

// ─── LogTopic ────────────────────────────────────────────────────────────────

/// A validated 32-byte topic (`0x` + 64 lowercase hex digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogTopic(String);

impl LogTopic {
    /// Parse a canonical topic string.
    pub fn parse(s: &str) -> Option<Self> {
        is_log_topic(s).then(|| Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LogTopic {
    type Error = ExplorerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if is_log_topic(&s) {
            Ok(Self(s))
        } else {
            Err(ExplorerError::invalid_topics(format!("'{s}' is malformed")))
        }
    }
}

impl From<LogTopic> for String {
    fn from(t: LogTopic) -> Self {
        t.0
    }
}

// ─── LogTopicSet ─────────────────────────────────────────────────────────────

/// An ordered, non-empty sequence of one to four topics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LogTopicSet(Vec<LogTopic>);

impl LogTopicSet {
    /// The event signature hash (always present).
    pub fn topic0(&self) -> &LogTopic {
        &self.0[0]
    }

    pub fn into_vec(self) -> Vec<LogTopic> {
        self.0
    }
}

impl Deref for LogTopicSet {
    type Target = [LogTopic];

    fn deref(&self) -> &[LogTopic] {
        &self.0
    }
}

impl TryFrom<Vec<String>> for LogTopicSet {
    type Error = ExplorerError;

    fn try_from(v: Vec<String>) -> Result<Self, Self::Error> {
        coerce_topics(&v)
    }
}

impl From<LogTopicSet> for Vec<String> {
    fn from(set: LogTopicSet) -> Self {
        set.0.into_iter().map(String::from).collect()
    }
}
