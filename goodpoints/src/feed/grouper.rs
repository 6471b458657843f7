//! Same-day grouping of chronologically sorted items.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::Serialize;

/// Anything with an ordering timestamp.
pub trait Dated {
    fn timestamp(&self) -> DateTime<Utc>;
}

/// A run of consecutive items that fall on the same calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateBlock<T> {
    /// Calendar day shared by every item, in the grouping time zone.
    pub day: NaiveDate,
    pub items: Vec<T>,
}

impl<T> DateBlock<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Group items by the viewer's local calendar day.
///
/// See [`group_by_day_in`].
pub fn group_by_day<T: Dated + Clone>(items: &[T]) -> Vec<DateBlock<T>> {
    group_by_day_in(items, &Local)
}

/// Partition `items` into contiguous same-day blocks in time zone `tz`.
///
/// Input order is preserved and never re-sorted; a new block starts whenever
/// an item's calendar day differs from the previous item's.
pub fn group_by_day_in<T, Tz>(items: &[T], tz: &Tz) -> Vec<DateBlock<T>>
where
    T: Dated + Clone,
    Tz: TimeZone,
{
    let mut blocks: Vec<DateBlock<T>> = Vec::new();

    for item in items {
        let day = item.timestamp().with_timezone(tz).date_naive();
        match blocks.last_mut() {
            Some(block) if block.day == day => block.items.push(item.clone()),
            _ => blocks.push(DateBlock {
                day,
                items: vec![item.clone()],
            }),
        }
    }

    blocks
}
