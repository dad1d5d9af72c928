use strum_macros::{Display, EnumString};

use super::models::{MessageModel, MessageType, BROADCAST_TARGET};
use crate::shared::AppError;

/// Which end of the visible log a `limit` keeps.
/// Results are always returned oldest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LimitPolicy {
    /// First `limit` matches in log order
    #[default]
    Oldest,
    /// Last `limit` matches in log order
    Newest,
}

/// Selects the part of the message log a viewer may read
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityFilter {
    viewer: Option<String>,
    limit: Option<usize>,
    policy: LimitPolicy,
}

impl VisibilityFilter {
    pub fn new(viewer: Option<String>, limit: Option<usize>, policy: LimitPolicy) -> Self {
        Self {
            viewer,
            limit,
            policy,
        }
    }

    /// Builds a filter from the raw `limit` query value
    pub fn from_request(
        viewer: Option<String>,
        raw_limit: Option<&str>,
        policy: LimitPolicy,
    ) -> Result<Self, AppError> {
        let limit = Self::parse_limit(raw_limit)?;
        Ok(Self::new(viewer, limit, policy))
    }

    /// Parses `limit`: absent means unbounded, otherwise it must be a positive integer
    pub fn parse_limit(raw: Option<&str>) -> Result<Option<usize>, AppError> {
        let Some(raw) = raw else {
            return Ok(None);
        };

        match raw.parse::<i64>() {
            Ok(n) if n > 0 => Ok(Some(usize::try_from(n).unwrap_or(usize::MAX))),
            Ok(_) => Err(AppError::invalid("\"limit\" must be a positive number")),
            Err(_) if raw.parse::<f64>().is_ok_and(f64::is_finite) => {
                Err(AppError::invalid("\"limit\" must be an integer"))
            }
            Err(_) => Err(AppError::invalid("\"limit\" must be a number")),
        }
    }

    pub fn viewer(&self) -> Option<&str> {
        self.viewer.as_deref()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn policy(&self) -> LimitPolicy {
        self.policy
    }

    /// Visibility predicate. The `type == message` clause overlaps with the
    /// broadcast clause on purpose: public messages reach every viewer whatever `to` says.
    pub fn is_visible(&self, message: &MessageModel) -> bool {
        let viewer = self.viewer();

        message.to == BROADCAST_TARGET
            || viewer.is_some_and(|v| message.to == v)
            || viewer.is_some_and(|v| message.from == v)
            || message.message_type == MessageType::Message
    }

    /// Applies the predicate and the limit to a log given oldest first
    pub fn apply<'a, I>(&self, messages: I) -> Vec<MessageModel>
    where
        I: IntoIterator<Item = &'a MessageModel>,
        I::IntoIter: DoubleEndedIterator,
    {
        let limit = self.limit.unwrap_or(usize::MAX);
        let messages = messages.into_iter();

        match self.policy {
            LimitPolicy::Oldest => messages
                .filter(|m| self.is_visible(m))
                .take(limit)
                .cloned()
                .collect(),
            LimitPolicy::Newest => {
                let mut newest: Vec<MessageModel> = messages
                    .rev()
                    .filter(|m| self.is_visible(m))
                    .take(limit)
                    .cloned()
                    .collect();
                newest.reverse();
                newest
            }
        }
    }
}
