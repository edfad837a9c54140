//! Dispute timeline: chat messages and evidence uploads merged into one
//! chronological feed.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub body: String,
    pub sent_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItem {
    pub id: String,
    pub uploaded_by: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub uploaded_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineEntry {
    Message(ChatMessage),
    Evidence(EvidenceItem),
}

impl TimelineEntry {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Message(m) => m.sent_at,
            Self::Evidence(e) => e.uploaded_at,
        }
    }
}

/// Merge both feeds oldest-first.
///
/// Each input is sorted first (stable, so equal timestamps keep their
/// order). On a tie between feeds the chat message comes first.
pub fn merge_timeline(
    mut messages: Vec<ChatMessage>,
    mut evidence: Vec<EvidenceItem>,
) -> Vec<TimelineEntry> {
    messages.sort_by_key(|m| m.sent_at);
    evidence.sort_by_key(|e| e.uploaded_at);

    let mut merged = Vec::with_capacity(messages.len() + evidence.len());
    let mut messages = messages.into_iter().peekable();
    let mut evidence = evidence.into_iter().peekable();

    loop {
        let take_message = match (messages.peek(), evidence.peek()) {
            (Some(m), Some(e)) => m.sent_at <= e.uploaded_at,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let entry = if take_message {
            messages.next().map(TimelineEntry::Message)
        } else {
            evidence.next().map(TimelineEntry::Evidence)
        };
        merged.extend(entry);
    }

    merged
}
