//! Request assembly.
//!
//! Every request repeats the persona framing in front of the transcript:
//! an instruction turn written as if by the user, and a synthetic model
//! acknowledgement. The framing is rebuilt for each request and never
//! enters the transcript.

use trade_assistant_model::{ModelMessage, ModelRequest};

use crate::persona::PersonaConfig;
use crate::transcript::{Role, Transcript};

const INSTRUCTIONS_PREFIX: &str = "System Context: ";

/// Builds the request for the newest turn.
///
/// `page_snapshot` is folded into the newest user turn of the request,
/// so the model sees it next to the question it helps to answer.
pub(crate) fn build_request(
    persona: &PersonaConfig,
    transcript: &Transcript,
    page_snapshot: Option<&str>,
    history_window: Option<usize>,
) -> ModelRequest {
    let history = transcript.tail(history_window);
    let newest_user_idx = history
        .iter()
        .rposition(|msg| msg.role() == Role::User);

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ModelMessage::User(format!(
        "{INSTRUCTIONS_PREFIX}{}",
        persona.instructions()
    )));
    messages.push(ModelMessage::Model(persona.acknowledgement().to_owned()));

    for (idx, msg) in history.iter().enumerate() {
        let text = match page_snapshot {
            Some(page) if Some(idx) == newest_user_idx => format!(
                "[Page the visitor is viewing]\n{page}\n\n\
                 [Visitor message]\n{}",
                msg.content()
            ),
            _ => msg.content().to_owned(),
        };
        messages.push(match msg.role() {
            Role::User => ModelMessage::User(text),
            Role::Assistant => ModelMessage::Model(text),
        });
    }

    ModelRequest { messages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::PersonaConfigBuilder;
    use crate::transcript::Message;

    fn persona() -> PersonaConfig {
        PersonaConfigBuilder::with_instructions("Be blunt.")
            .with_acknowledgement("Righto.")
            .build()
    }

    fn framing() -> [ModelMessage; 2] {
        [
            ModelMessage::User("System Context: Be blunt.".to_owned()),
            ModelMessage::Model("Righto.".to_owned()),
        ]
    }

    #[test]
    fn test_framing_then_remapped_history() {
        let mut transcript = Transcript::seeded(Some("G'day!"));
        transcript.push(Message::user("How much?"));

        let request = build_request(&persona(), &transcript, None, None);
        assert_eq!(request.messages[..2], framing());
        assert_eq!(
            request.messages[2..],
            [
                ModelMessage::Model("G'day!".to_owned()),
                ModelMessage::User("How much?".to_owned()),
            ]
        );
    }

    #[test]
    fn test_framing_is_independent_of_transcript() {
        let empty = build_request(&persona(), &Transcript::default(), None, None);
        assert_eq!(empty.messages, framing());

        let mut long = Transcript::default();
        for i in 0..20 {
            long.push(Message::user(format!("q{i}")));
            long.push(Message::assistant(format!("a{i}"), i % 2 == 0));
        }
        long.push(Message::user("last"));
        let request = build_request(&persona(), &long, Some("page"), Some(3));
        assert_eq!(request.messages[..2], framing());
        assert_eq!(request.messages.len(), 5);
        assert_eq!(request.messages[2], ModelMessage::User("q19".to_owned()));
    }

    #[test]
    fn test_page_snapshot_goes_into_newest_user_turn() {
        let mut transcript = Transcript::default();
        transcript.push(Message::user("first"));
        transcript.push(Message::assistant("reply", false));
        transcript.push(Message::user("What's on this page?"));

        let request = build_request(
            &persona(),
            &transcript,
            Some("Revenue Blueprint"),
            None,
        );
        assert_eq!(request.messages[2], ModelMessage::User("first".to_owned()));
        let last = request.messages.last().unwrap();
        assert!(last.is_user());
        assert_eq!(
            last.text(),
            "[Page the visitor is viewing]\nRevenue Blueprint\n\n\
             [Visitor message]\nWhat's on this page?"
        );
        assert_eq!(request.last_user_text(), Some(last.text()));
    }
}
