use farsight_core::domain::message::{ChatMessage, PendingAttachment};
use farsight_core::domain::recommendation;

/// Conversation state for one session. All mutation flows through
/// [`transition`]; there are no ambient globals.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Append-only; rendering order equals insertion order.
    pub messages: Vec<ChatMessage>,
    /// Exactly one request may be outstanding; submission is disabled while
    /// this is set.
    pub awaiting_reply: bool,
    pub menu_open: bool,
    pub pending: Option<PendingAttachment>,
}

impl SessionState {
    pub fn with_greeting(text: &str) -> Self {
        let mut state = Self::default();
        state.messages.push(ChatMessage::assistant(text.to_string()));
        state
    }
}

#[derive(Debug)]
pub enum Event {
    MenuToggled,
    /// Cancel key, or any interaction outside the open menu.
    MenuDismissed,
    FileChosen { file: Vec<u8> },
    PreviewDecoded { data_url: String },
    Submitted { text: String },
    ChatReplyReceived { raw: String },
    ImageReplyReceived { reply: String },
    SendFailed { message: String },
}

/// Side effects requested by the reducer, executed by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SendChat { message: String },
    SendImage { image: Vec<u8>, message: Option<String> },
    DecodePreview { file: Vec<u8> },
}

/// Apply one event to the session. Pure: all I/O happens in the returned
/// effect.
pub fn transition(state: &mut SessionState, event: Event) -> Option<Effect> {
    match event {
        Event::MenuToggled => {
            state.menu_open = !state.menu_open;
            None
        }
        Event::MenuDismissed => {
            state.menu_open = false;
            None
        }
        Event::FileChosen { file } => {
            state.menu_open = false;
            state.pending = Some(PendingAttachment {
                file: file.clone(),
                preview_data_url: None,
            });
            Some(Effect::DecodePreview { file })
        }
        Event::PreviewDecoded { data_url } => {
            // The preview arrives asynchronously; the attachment may already
            // have been sent and cleared, in which case this is dropped.
            if let Some(pending) = state.pending.as_mut() {
                pending.preview_data_url = Some(data_url);
            }
            None
        }
        Event::Submitted { text } => submit(state, text),
        Event::ChatReplyReceived { raw } => {
            let message = match recommendation::parse_structured_reply(&raw) {
                Ok(structured) => ChatMessage::assistant_structured(raw, structured),
                Err(_) => ChatMessage::assistant(raw),
            };
            state.messages.push(message);
            state.awaiting_reply = false;
            None
        }
        Event::ImageReplyReceived { reply } => {
            // Image replies are never parsed for structure.
            state.messages.push(ChatMessage::assistant(reply));
            state.awaiting_reply = false;
            state.pending = None;
            None
        }
        Event::SendFailed { message } => {
            state.messages.push(ChatMessage::assistant(message));
            state.awaiting_reply = false;
            state.pending = None;
            None
        }
    }
}

fn submit(state: &mut SessionState, text: String) -> Option<Effect> {
    if state.awaiting_reply {
        return None;
    }

    let text = text.trim().to_string();
    if text.is_empty() && state.pending.is_none() {
        return None;
    }

    match &state.pending {
        Some(pending) => {
            state.messages.push(ChatMessage::user(text.clone(), true));
            state.awaiting_reply = true;
            let message = if text.is_empty() { None } else { Some(text) };
            Some(Effect::SendImage {
                image: pending.file.clone(),
                message,
            })
        }
        None => {
            state.messages.push(ChatMessage::user(text.clone(), false));
            state.awaiting_reply = true;
            Some(Effect::SendChat { message: text })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farsight_core::domain::message::Sender;
    use farsight_core::domain::recommendation::Recommendation;

    const FENCED_REPLY: &str = "```json\n{\"recommendation\":\"Buy\",\"confidence\":0.8,\"risk_score\":20,\"rationale\":\"x\",\"steps\":[\"a\"]}\n```";

    #[test]
    fn submit_with_nothing_to_send_is_a_noop() {
        let mut state = SessionState::default();
        let effect = transition(&mut state, Event::Submitted { text: "   ".to_string() });
        assert_eq!(effect, None);
        assert!(state.messages.is_empty());
        assert!(!state.awaiting_reply);
    }

    #[test]
    fn submit_is_ignored_while_awaiting_reply() {
        let mut state = SessionState::default();
        transition(&mut state, Event::Submitted { text: "first".to_string() });
        assert!(state.awaiting_reply);

        let effect = transition(&mut state, Event::Submitted { text: "second".to_string() });
        assert_eq!(effect, None);
        assert_eq!(state.messages.len(), 1);
    }

    #[test]
    fn text_submit_appends_user_message_and_requests_chat() {
        let mut state = SessionState::default();
        let effect = transition(&mut state, Event::Submitted { text: "should i buy?".to_string() });
        assert_eq!(
            effect,
            Some(Effect::SendChat {
                message: "should i buy?".to_string()
            })
        );
        assert!(state.awaiting_reply);
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].sender, Sender::User);
        assert!(!state.messages[0].has_attachment);
    }

    #[test]
    fn attachment_lifecycle_clears_pending_on_success() {
        let mut state = SessionState::default();

        let effect = transition(&mut state, Event::FileChosen { file: vec![1, 2, 3] });
        assert_eq!(effect, Some(Effect::DecodePreview { file: vec![1, 2, 3] }));
        assert!(state.pending.is_some());

        transition(&mut state, Event::PreviewDecoded { data_url: "data:image/png;base64,AQID".to_string() });
        assert_eq!(
            state.pending.as_ref().unwrap().preview_data_url.as_deref(),
            Some("data:image/png;base64,AQID")
        );

        let effect = transition(&mut state, Event::Submitted { text: "what is this?".to_string() });
        assert_eq!(
            effect,
            Some(Effect::SendImage {
                image: vec![1, 2, 3],
                message: Some("what is this?".to_string()),
            })
        );
        assert!(state.awaiting_reply);
        assert!(state.messages[0].has_attachment);

        transition(&mut state, Event::ImageReplyReceived { reply: "a chart".to_string() });
        assert!(state.pending.is_none());
        assert!(!state.awaiting_reply);
        assert_eq!(state.messages.last().unwrap().text, "a chart");
    }

    #[test]
    fn attachment_lifecycle_clears_pending_on_failure() {
        let mut state = SessionState::default();
        transition(&mut state, Event::FileChosen { file: vec![9] });
        transition(&mut state, Event::Submitted { text: String::new() });
        assert!(state.awaiting_reply);

        transition(&mut state, Event::SendFailed { message: "Unable to contact server. Try again.".to_string() });
        assert!(state.pending.is_none());
        assert!(!state.awaiting_reply);
        assert_eq!(
            state.messages.last().unwrap().text,
            "Unable to contact server. Try again."
        );
    }

    #[test]
    fn image_only_submit_sends_no_message_text() {
        let mut state = SessionState::default();
        transition(&mut state, Event::FileChosen { file: vec![7] });
        let effect = transition(&mut state, Event::Submitted { text: "  ".to_string() });
        assert_eq!(
            effect,
            Some(Effect::SendImage {
                image: vec![7],
                message: None,
            })
        );
        let user = &state.messages[0];
        assert!(user.has_attachment);
        assert!(user.text.is_empty());
    }

    #[test]
    fn chat_reply_with_fenced_json_attaches_structured() {
        let mut state = SessionState::default();
        transition(&mut state, Event::Submitted { text: "buy?".to_string() });
        transition(&mut state, Event::ChatReplyReceived { raw: FENCED_REPLY.to_string() });

        let assistant = state.messages.last().unwrap();
        assert_eq!(assistant.sender, Sender::Assistant);
        // Raw text is preserved verbatim alongside the parsed form.
        assert_eq!(assistant.text, FENCED_REPLY);
        let structured = assistant.structured.as_ref().unwrap();
        assert_eq!(structured.recommendation, Recommendation::Buy);
        assert!(!state.awaiting_reply);
    }

    #[test]
    fn plain_reply_stays_plain_text() {
        let mut state = SessionState::default();
        transition(&mut state, Event::Submitted { text: "explain arima".to_string() });
        transition(&mut state, Event::ChatReplyReceived { raw: "ARIMA models difference the series.".to_string() });

        let assistant = state.messages.last().unwrap();
        assert_eq!(assistant.text, "ARIMA models difference the series.");
        assert!(assistant.structured.is_none());
    }

    #[test]
    fn menu_state_is_orthogonal_to_everything_else() {
        let mut state = SessionState::default();
        transition(&mut state, Event::FileChosen { file: vec![1] });
        transition(&mut state, Event::MenuToggled);
        assert!(state.menu_open);

        transition(&mut state, Event::MenuDismissed);
        assert!(!state.menu_open);
        assert!(state.pending.is_some());
        assert!(state.messages.is_empty());
    }

    #[test]
    fn file_selection_closes_the_menu() {
        let mut state = SessionState::default();
        transition(&mut state, Event::MenuToggled);
        assert!(state.menu_open);
        transition(&mut state, Event::FileChosen { file: vec![1] });
        assert!(!state.menu_open);
    }

    #[test]
    fn preview_decode_after_clear_is_dropped() {
        let mut state = SessionState::default();
        transition(&mut state, Event::FileChosen { file: vec![1] });
        transition(&mut state, Event::Submitted { text: String::new() });
        transition(&mut state, Event::ImageReplyReceived { reply: "ok".to_string() });

        transition(&mut state, Event::PreviewDecoded { data_url: "late".to_string() });
        assert!(state.pending.is_none());
    }

    #[test]
    fn history_is_append_only_in_insertion_order() {
        let mut state = SessionState::with_greeting("hello");
        transition(&mut state, Event::Submitted { text: "one".to_string() });
        transition(&mut state, Event::ChatReplyReceived { raw: "reply one".to_string() });
        transition(&mut state, Event::Submitted { text: "two".to_string() });
        transition(&mut state, Event::SendFailed { message: "Server error: 500".to_string() });

        let texts: Vec<&str> = state.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "one", "reply one", "two", "Server error: 500"]);
    }
}
