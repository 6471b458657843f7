//! Group-send handlers.
//!
//! A group conversation has no server history: what the CLI shows is the
//! session draft, which lives in a file so it survives between invocations.

use anyhow::{ensure, Result};
use goodpoints::{ChatFeedController, Conversation, UserId};

use super::chat::{settle, ConversationResult, SendResult};

fn label(students: &[UserId]) -> String {
    let ids: Vec<String> = goodpoints::models::participant_set(students)
        .iter()
        .map(ToString::to_string)
        .collect();
    format!("group {}", ids.join(","))
}

/// Show what was sent to exactly this set of students in the current session.
pub async fn show_group(
    chat: &ChatFeedController,
    students: &[UserId],
) -> Result<ConversationResult> {
    ensure!(!students.is_empty(), "At least one student is required");

    let view = chat.load(Conversation::Group(students.to_vec())).await;
    Ok(ConversationResult::from_view(label(students), view))
}

/// Send `text` to every student in the set.
pub async fn send_group(
    chat: &ChatFeedController,
    students: &[UserId],
    text: &str,
) -> Result<SendResult> {
    ensure!(!students.is_empty(), "At least one student is required");

    chat.load(Conversation::Group(students.to_vec())).await;
    settle(chat.send(text).await?, label(students))
}

/// Forget the session draft.
pub fn clear_group(chat: &ChatFeedController) -> Result<()> {
    chat.leave_group()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_is_order_free() {
        let a = label(&[UserId(3), UserId(1)]);
        let b = label(&[UserId(1), UserId(3), UserId(3)]);
        assert_eq!(a, "group 1,3");
        assert_eq!(a, b);
    }
}
