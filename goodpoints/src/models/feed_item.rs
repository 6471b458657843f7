//! Dated activity feed items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{timestamp, MessageId};
use crate::error::{Error, Result};
use crate::feed::Dated;

/// Which dated feed is being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListType {
    /// Good points sent to students, as seen by a teacher or admin.
    StudentActivity,
    /// Good points sent to colleagues.
    TeacherActivity,
    /// Good points the viewer received.
    ReceivedGoodPoints,
}

impl ListType {
    pub const ALL: [ListType; 3] = [
        ListType::StudentActivity,
        ListType::TeacherActivity,
        ListType::ReceivedGoodPoints,
    ];

    /// REST path for this feed, relative to the API base.
    pub fn path(&self) -> &'static str {
        match self {
            ListType::StudentActivity => "feed/student-activity",
            ListType::TeacherActivity => "feed/teacher-activity",
            ListType::ReceivedGoodPoints => "feed/received-good-points",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListType::StudentActivity => "student-activity",
            ListType::TeacherActivity => "teacher-activity",
            ListType::ReceivedGoodPoints => "received-good-points",
        }
    }

    /// Whether opening this feed clears the viewer's unread counter.
    pub fn marks_read(&self) -> bool {
        matches!(self, ListType::ReceivedGoodPoints)
    }
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ListType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown list type `{s}`")))
    }
}

/// A good point sent to a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentActivity {
    pub id: MessageId,
    pub text: String,
    pub student_name: String,
    #[serde(default)]
    pub teacher_name: Option<String>,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// A good point sent to a colleague.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherActivity {
    pub id: MessageId,
    pub text: String,
    pub receiver_name: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// A good point the viewer received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedGoodPoint {
    pub id: MessageId,
    pub text: String,
    pub sender_name: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub reaction_count: u32,
}

/// One row of a dated feed, shaped by its [`ListType`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "listType", rename_all = "kebab-case")]
pub enum FeedItem {
    StudentActivity(StudentActivity),
    TeacherActivity(TeacherActivity),
    ReceivedGoodPoints(ReceivedGoodPoint),
}

impl FeedItem {
    /// Decode one server object according to the feed it came from.
    pub fn from_json(list_type: ListType, value: serde_json::Value) -> Result<Self> {
        Ok(match list_type {
            ListType::StudentActivity => FeedItem::StudentActivity(serde_json::from_value(value)?),
            ListType::TeacherActivity => FeedItem::TeacherActivity(serde_json::from_value(value)?),
            ListType::ReceivedGoodPoints => {
                FeedItem::ReceivedGoodPoints(serde_json::from_value(value)?)
            }
        })
    }

    pub fn list_type(&self) -> ListType {
        match self {
            FeedItem::StudentActivity(_) => ListType::StudentActivity,
            FeedItem::TeacherActivity(_) => ListType::TeacherActivity,
            FeedItem::ReceivedGoodPoints(_) => ListType::ReceivedGoodPoints,
        }
    }

    pub fn id(&self) -> MessageId {
        match self {
            FeedItem::StudentActivity(a) => a.id,
            FeedItem::TeacherActivity(a) => a.id,
            FeedItem::ReceivedGoodPoints(a) => a.id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            FeedItem::StudentActivity(a) => &a.text,
            FeedItem::TeacherActivity(a) => &a.text,
            FeedItem::ReceivedGoodPoints(a) => &a.text,
        }
    }
}

impl Dated for FeedItem {
    fn timestamp(&self) -> DateTime<Utc> {
        match self {
            FeedItem::StudentActivity(a) => a.timestamp,
            FeedItem::TeacherActivity(a) => a.timestamp,
            FeedItem::ReceivedGoodPoints(a) => a.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_type_parse() {
        assert_eq!(
            "received-good-points".parse::<ListType>().unwrap(),
            ListType::ReceivedGoodPoints
        );
        assert!("nope".parse::<ListType>().is_err());
        assert!(ListType::ReceivedGoodPoints.marks_read());
        assert!(!ListType::TeacherActivity.marks_read());
    }

    #[test]
    fn test_from_json_by_list_type() {
        let value = json!({
            "id": 4,
            "text": "Helped a classmate",
            "studentName": "Yael Cohen",
            "timestamp": "2024-02-29T10:00:00Z"
        });

        let item = FeedItem::from_json(ListType::StudentActivity, value.clone()).unwrap();
        assert_eq!(item.list_type(), ListType::StudentActivity);
        assert_eq!(item.id(), MessageId(4));
        assert_eq!(item.text(), "Helped a classmate");

        // The same object lacks the fields a received good point needs.
        assert!(FeedItem::from_json(ListType::ReceivedGoodPoints, value).is_err());
    }
}
