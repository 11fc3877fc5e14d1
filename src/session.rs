use anyhow::Result;
use tracing::{info, warn};

use crate::client::ChatClient;
use crate::state::{Message, CONNECTION_ERROR, GREETING, NO_RESPONSE};

/// Undo the quoting a JSON-string response body carries.
///
/// Strips one leading and one trailing `"` and turns every literal `\n`
/// (backslash, n) into a newline.
pub fn normalize_reply(body: &str) -> String {
    let body = body.strip_prefix('"').unwrap_or(body);
    let body = body.strip_suffix('"').unwrap_or(body);
    body.replace("\\n", "\n")
}

/// Text of the assistant message for a finished request
pub fn reply_text(outcome: Result<String>) -> String {
    match outcome {
        Ok(body) => {
            let text = normalize_reply(&body);
            if text.is_empty() {
                NO_RESPONSE.to_string()
            } else {
                text
            }
        }
        Err(e) => {
            warn!(error = %e, "error sending message");
            CONNECTION_ERROR.to_string()
        }
    }
}

/// The conversation: an append-only transcript plus the draft being typed
#[derive(Debug, Clone)]
pub struct ChatSession {
    transcript: Vec<Message>,
    pub draft: String,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            transcript: vec![Message::assistant(GREETING)],
            draft: String::new(),
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Accept `text` for sending. Blank input is ignored and yields `None`;
    /// otherwise the trimmed text is recorded as a user message, the draft is
    /// cleared, and the text to post is returned.
    pub fn begin_submit(&mut self, text: &str) -> Option<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        info!(chars = trimmed.chars().count(), "submitting message");
        self.transcript.push(Message::user(trimmed));
        self.draft.clear();
        Some(trimmed.to_string())
    }

    pub fn submit_draft(&mut self) -> Option<String> {
        let draft = self.draft.clone();
        self.begin_submit(&draft)
    }

    /// Record the outcome of one request as exactly one assistant message.
    pub fn complete(&mut self, outcome: Result<String>) {
        self.transcript.push(Message::assistant(reply_text(outcome)));
    }

    /// Full request/response cycle. Returns false when `text` was blank.
    pub async fn submit(&mut self, client: &ChatClient, text: &str) -> bool {
        let Some(input) = self.begin_submit(text) else {
            return false;
        };
        let outcome = client.ask(&input).await;
        self.complete(outcome);
        true
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Origin;
    use anyhow::anyhow;

    #[test]
    fn test_normalize_quoted_with_escapes() {
        assert_eq!(normalize_reply(r#""hello\nworld""#), "hello\nworld");
    }

    #[test]
    fn test_normalize_clean_text_unchanged() {
        let text = "plain answer\nwith a real newline";
        assert_eq!(normalize_reply(text), text);
    }

    #[test]
    fn test_normalize_strips_only_one_quote_each_side() {
        assert_eq!(normalize_reply(r#"""quoted"""#), r#""quoted""#);
        assert_eq!(normalize_reply(r#""leading"#), "leading");
        assert_eq!(normalize_reply(r#"trailing""#), "trailing");
    }

    #[test]
    fn test_normalize_inner_quotes_kept() {
        assert_eq!(normalize_reply(r#""say "hi" now""#), r#"say "hi" now"#);
    }

    #[test]
    fn test_normalize_every_escape_replaced() {
        assert_eq!(normalize_reply(r"a\nb\n\nc"), "a\nb\n\nc");
    }

    #[test]
    fn test_normalize_empty_quotes() {
        assert_eq!(normalize_reply(r#""""#), "");
        assert_eq!(normalize_reply(r#"""#), "");
    }

    #[test]
    fn test_reply_text_fallbacks() {
        assert_eq!(reply_text(Ok(String::new())), NO_RESPONSE);
        assert_eq!(reply_text(Ok("\"\"".to_string())), NO_RESPONSE);
        assert_eq!(reply_text(Err(anyhow!("connection refused"))), CONNECTION_ERROR);
    }

    #[test]
    fn test_new_session_has_greeting() {
        let session = ChatSession::new();
        assert_eq!(session.transcript(), &[Message::assistant(GREETING)]);
        assert!(session.draft.is_empty());
    }

    #[test]
    fn test_blank_input_is_noop() {
        let mut session = ChatSession::new();
        for input in ["", " ", "  \t\n "] {
            session.draft = input.to_string();
            assert_eq!(session.submit_draft(), None);
            assert_eq!(session.transcript().len(), 1);
            assert_eq!(session.draft, input);
        }
    }

    #[test]
    fn test_begin_submit_trims_and_clears_draft() {
        let mut session = ChatSession::new();
        session.draft = "  hi there \n".to_string();

        let input = session.submit_draft();

        assert_eq!(input.as_deref(), Some("hi there"));
        assert!(session.draft.is_empty());
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[1], Message::user("hi there"));
    }

    #[test]
    fn test_complete_appends_one_assistant_message() {
        let mut session = ChatSession::new();
        session.begin_submit("hi");

        session.complete(Ok(r#""line one\nline two""#.to_string()));
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(
            session.transcript()[2],
            Message::assistant("line one\nline two")
        );

        session.begin_submit("again");
        session.complete(Err(anyhow!("boom")));
        assert_eq!(session.transcript().len(), 5);
        assert_eq!(session.transcript()[4].origin(), Origin::Assistant);
        assert_eq!(session.transcript()[4].text(), CONNECTION_ERROR);
    }

    #[test]
    fn test_overlapping_replies_append_in_arrival_order() {
        let mut session = ChatSession::new();
        session.begin_submit("first");
        session.begin_submit("second");

        session.complete(Ok("reply to second".to_string()));
        session.complete(Ok("reply to first".to_string()));

        let texts: Vec<&str> = session.transcript().iter().map(|m| m.text()).collect();
        assert_eq!(
            texts,
            vec![GREETING, "first", "second", "reply to second", "reply to first"]
        );
    }

    #[tokio::test]
    async fn test_submit_end_to_end() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ask_agent")
            .with_status(200)
            .with_body(r#""Hi!\nHow can I help?""#)
            .expect(1)
            .create_async()
            .await;

        let client = ChatClient::new(&format!("{}/ask_agent", server.url()));
        let mut session = ChatSession::new();

        assert!(!session.submit(&client, "  ").await);
        assert_eq!(session.transcript().len(), 1);

        assert!(session.submit(&client, "hi").await);
        mock.assert_async().await;

        assert_eq!(
            session.transcript(),
            &[
                Message::assistant(GREETING),
                Message::user("hi"),
                Message::assistant("Hi!\nHow can I help?"),
            ]
        );
    }

    #[tokio::test]
    async fn test_submit_error_status_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/ask_agent")
            .with_status(503)
            .create_async()
            .await;

        let client = ChatClient::new(&format!("{}/ask_agent", server.url()));
        let mut session = ChatSession::new();

        assert!(session.submit(&client, "hi").await);
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(session.transcript()[2].text(), CONNECTION_ERROR);

        // Still usable afterwards
        assert!(session.submit(&client, "hello?").await);
        assert_eq!(session.transcript().len(), 5);
    }

    #[tokio::test]
    async fn test_submit_unreachable_falls_back() {
        let client = ChatClient::new("http://127.0.0.1:1/ask_agent");
        let mut session = ChatSession::new();

        assert!(session.submit(&client, "hi").await);
        assert_eq!(session.transcript()[1], Message::user("hi"));
        assert_eq!(session.transcript()[2], Message::assistant(CONNECTION_ERROR));
    }
}
