use crate::domain::recommendation::StructuredRecommendation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

/// One entry in the conversation history. The history is append-only and
/// rendering order equals insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    /// True when the message carried an uploaded image.
    pub has_attachment: bool,
    /// Present only when the raw assistant reply parsed as a recommendation.
    pub structured: Option<StructuredRecommendation>,
}

impl ChatMessage {
    pub fn user(text: String, has_attachment: bool) -> Self {
        Self {
            sender: Sender::User,
            text,
            has_attachment,
            structured: None,
        }
    }

    pub fn assistant(text: String) -> Self {
        Self {
            sender: Sender::Assistant,
            text,
            has_attachment: false,
            structured: None,
        }
    }

    pub fn assistant_structured(text: String, structured: StructuredRecommendation) -> Self {
        Self {
            sender: Sender::Assistant,
            text,
            has_attachment: false,
            structured: Some(structured),
        }
    }
}

/// An image selected but not yet sent. At most one exists at a time; the
/// preview is decoded asynchronously after selection.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAttachment {
    pub file: Vec<u8>,
    pub preview_data_url: Option<String>,
}
