//! Data models for Good Points entities.

mod feed_item;
mod ids;
mod message;
pub mod timestamp;

pub use feed_item::{FeedItem, ListType, ReceivedGoodPoint, StudentActivity, TeacherActivity};
pub use ids::{participant_set, MessageId, UserId};
pub use message::{Delivery, Message, PersonName};
