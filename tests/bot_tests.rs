//! # Conversation Flow Tests
//!
//! Drives `ConversionFlow` with a recording transport and checks the state
//! transitions, deliveries and error handling of the text-to-file dialogue.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use teloxide::types::{ChatId, InlineKeyboardMarkup, ReplyMarkup};

use textfile_bot::bot::message_handler::classify_text;
use textfile_bot::bot::{ConversionFlow, InboundEvent, Transport};
use textfile_bot::dialogue::{ConversionState, SessionStore};
use textfile_bot::errors::BotError;
use textfile_bot::file_generator::{DocumentGenerator, FileGenerator, FileRequest, GeneratedFile};
use textfile_bot::formats::FileKind;
use textfile_bot::localization::t_lang;

#[derive(Debug, Clone)]
enum Sent {
    Text {
        chat_id: ChatId,
        text: String,
        with_markup: bool,
    },
    Keyboard {
        chat_id: ChatId,
        prompt: String,
        keyboard: InlineKeyboardMarkup,
    },
    Document {
        chat_id: ChatId,
        file: GeneratedFile,
        caption: String,
    },
}

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    fail_documents: bool,
    uploads: HashMap<String, Vec<u8>>,
}

impl RecordingTransport {
    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn documents(&self, chat_id: ChatId) -> Vec<GeneratedFile> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Document { chat_id: id, file, .. } if id == chat_id => Some(file),
                _ => None,
            })
            .collect()
    }

    fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn last(&self) -> Sent {
        self.sent().last().cloned().expect("nothing was sent")
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: String,
        markup: Option<ReplyMarkup>,
    ) -> Result<(), BotError> {
        self.sent.lock().unwrap().push(Sent::Text {
            chat_id,
            text,
            with_markup: markup.is_some(),
        });
        Ok(())
    }

    async fn send_keyboard(
        &self,
        chat_id: ChatId,
        prompt: String,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), BotError> {
        self.sent.lock().unwrap().push(Sent::Keyboard {
            chat_id,
            prompt,
            keyboard,
        });
        Ok(())
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        file: GeneratedFile,
        caption: String,
    ) -> Result<(), BotError> {
        if self.fail_documents {
            return Err(BotError::Transport("upload rejected".to_string()));
        }
        self.sent.lock().unwrap().push(Sent::Document {
            chat_id,
            file,
            caption,
        });
        Ok(())
    }

    async fn fetch_document(&self, file_id: &str) -> Result<Vec<u8>, BotError> {
        self.uploads
            .get(file_id)
            .cloned()
            .ok_or_else(|| BotError::Transport(format!("no such file: {file_id}")))
    }
}

/// Records every request and delegates to the real generator
#[derive(Default)]
struct RecordingGenerator {
    requests: Mutex<Vec<FileRequest>>,
    inner: DocumentGenerator,
}

impl RecordingGenerator {
    fn requests(&self) -> Vec<FileRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl FileGenerator for RecordingGenerator {
    fn generate(&self, request: &FileRequest) -> Result<GeneratedFile, BotError> {
        self.requests.lock().unwrap().push(request.clone());
        self.inner.generate(request)
    }
}

struct FailingGenerator;

impl FileGenerator for FailingGenerator {
    fn generate(&self, _request: &FileRequest) -> Result<GeneratedFile, BotError> {
        Err(BotError::Generation("renderer exploded".to_string()))
    }
}

struct Harness {
    flow: Arc<ConversionFlow>,
    transport: Arc<RecordingTransport>,
    generator: Arc<RecordingGenerator>,
}

impl Harness {
    fn new() -> Self {
        Self::with_transport(RecordingTransport::default())
    }

    fn with_transport(transport: RecordingTransport) -> Self {
        let transport = Arc::new(transport);
        let generator = Arc::new(RecordingGenerator::default());
        let flow = ConversionFlow::new(SessionStore::new(), transport.clone(), generator.clone());
        Self {
            flow: Arc::new(flow),
            transport,
            generator,
        }
    }

    async fn send(&self, chat: i64, event: InboundEvent) {
        self.flow
            .handle_event(ChatId(chat), event, Some("en"))
            .await
            .expect("event handling failed");
    }

    async fn state(&self, chat: i64) -> ConversionState {
        self.flow.sessions().state(ChatId(chat)).await.unwrap()
    }
}

fn text(value: &str) -> InboundEvent {
    InboundEvent::Text(value.to_string())
}

fn choose(token: &str) -> InboundEvent {
    InboundEvent::TypeChoice(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// /start → /generate → "hello" → typed "txt" delivers exactly one file
    #[tokio::test]
    async fn test_full_flow_with_typed_type() -> Result<()> {
        let h = Harness::new();

        h.send(1, InboundEvent::Start).await;
        assert_eq!(h.state(1).await, ConversionState::Idle);

        h.send(1, InboundEvent::Generate).await;
        assert_eq!(h.state(1).await, ConversionState::AwaitingText);

        h.send(1, text("hello")).await;
        assert_eq!(
            h.state(1).await,
            ConversionState::AwaitingType {
                pending_text: "hello".to_string()
            }
        );

        h.send(1, text("txt")).await;
        assert_eq!(h.state(1).await, ConversionState::Idle);

        assert_eq!(
            h.generator.requests(),
            vec![FileRequest {
                text: "hello".to_string(),
                kind: FileKind::Txt
            }]
        );
        let documents = h.transport.documents(ChatId(1));
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].bytes, b"hello".to_vec());
        assert!(documents[0].filename.ends_with(".txt"));

        match h.transport.last() {
            Sent::Document { caption, .. } => assert!(caption.contains("`txt`")),
            other => panic!("expected a document last, got {other:?}"),
        }
        Ok(())
    }

    /// Source text opening with a comment is accepted as text, not a command
    #[tokio::test]
    async fn test_text_starting_with_slash_is_converted() -> Result<()> {
        let h = Harness::new();
        let css = "/* reset */\nbody{}";

        h.send(1, classify_text("/generate", "bot")).await;
        h.send(1, classify_text(css, "bot")).await;
        assert_eq!(h.state(1).await.pending_text(), Some(css));

        h.send(1, classify_text("css", "bot")).await;
        let documents = h.transport.documents(ChatId(1));
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].bytes, css.as_bytes().to_vec());
        assert!(documents[0].filename.ends_with(".css"));
        assert_eq!(h.state(1).await, ConversionState::Idle);
        Ok(())
    }

    /// A deep link start payload still shows the welcome menu
    #[tokio::test]
    async fn test_start_with_payload_welcomes() -> Result<()> {
        let h = Harness::new();
        h.send(1, InboundEvent::Generate).await;

        h.send(1, classify_text("/start campaign_7", "bot")).await;
        assert_eq!(h.state(1).await, ConversionState::Idle);
        match h.transport.last() {
            Sent::Text {
                text, with_markup, ..
            } => {
                assert_eq!(text, t_lang("welcome", Some("en")));
                assert!(with_markup);
            }
            other => panic!("expected welcome, got {other:?}"),
        }
        Ok(())
    }

    /// The keyboard button path produces the same result as typing
    #[tokio::test]
    async fn test_button_selection_matches_typed_selection() -> Result<()> {
        let typed = Harness::new();
        typed.send(1, InboundEvent::Generate).await;
        typed.send(1, text("same text")).await;
        typed.send(1, text(".YML")).await;

        let pressed = Harness::new();
        pressed.send(1, InboundEvent::Generate).await;
        pressed.send(1, text("same text")).await;
        pressed.send(1, choose("yml")).await;

        assert_eq!(typed.generator.requests(), pressed.generator.requests());
        assert_eq!(typed.generator.requests()[0].kind, FileKind::Yaml);
        assert_eq!(typed.state(1).await, ConversionState::Idle);
        assert_eq!(pressed.state(1).await, ConversionState::Idle);
        Ok(())
    }

    /// An unknown type keeps the pending text and re-sends the keyboard
    #[tokio::test]
    async fn test_invalid_type_reprompts() -> Result<()> {
        let h = Harness::new();
        h.send(1, InboundEvent::Generate).await;
        h.send(1, text("hi")).await;

        let first_keyboard = match h.transport.last() {
            Sent::Keyboard { keyboard, .. } => keyboard,
            other => panic!("expected keyboard, got {other:?}"),
        };

        for bad in [text("zzz"), choose("zzz")] {
            h.send(1, bad).await;
            assert_eq!(
                h.state(1).await,
                ConversionState::AwaitingType {
                    pending_text: "hi".to_string()
                }
            );
            match h.transport.last() {
                Sent::Keyboard {
                    prompt, keyboard, ..
                } => {
                    assert_eq!(prompt, t_lang("unsupported-type", Some("en")));
                    assert_eq!(keyboard, first_keyboard);
                }
                other => panic!("expected keyboard, got {other:?}"),
            }
        }

        assert!(h.generator.requests().is_empty());
        assert!(h.transport.documents(ChatId(1)).is_empty());
        Ok(())
    }

    /// Start over discards the first text
    #[tokio::test]
    async fn test_start_over_discards_pending_text() -> Result<()> {
        let h = Harness::new();
        h.send(1, InboundEvent::Generate).await;
        h.send(1, text("hi")).await;
        h.send(1, InboundEvent::StartOver).await;
        assert_eq!(h.state(1).await, ConversionState::AwaitingText);

        h.send(1, text("bye")).await;
        h.send(1, choose("pdf")).await;

        assert_eq!(
            h.generator.requests(),
            vec![FileRequest {
                text: "bye".to_string(),
                kind: FileKind::Pdf
            }]
        );
        let documents = h.transport.documents(ChatId(1));
        assert_eq!(documents.len(), 1);
        assert!(documents[0].bytes.starts_with(b"%PDF"));
        assert_eq!(documents[0].mime_kind, "application/pdf");
        assert_eq!(h.state(1).await, ConversionState::Idle);
        Ok(())
    }

    /// Typing "start over" behaves like the button
    #[tokio::test]
    async fn test_typed_start_over() -> Result<()> {
        let h = Harness::new();
        h.send(1, InboundEvent::Generate).await;
        h.send(1, text("hi")).await;
        h.send(1, text("⬅️ Start over")).await;
        assert_eq!(h.state(1).await, ConversionState::AwaitingText);
        assert!(h.generator.requests().is_empty());
        Ok(())
    }

    /// /help leaves the conversation where it was
    #[tokio::test]
    async fn test_help_keeps_state() -> Result<()> {
        let h = Harness::new();
        h.send(1, InboundEvent::Generate).await;
        h.send(1, text("draft")).await;
        h.send(1, InboundEvent::Help).await;
        h.send(1, InboundEvent::More).await;

        assert_eq!(h.state(1).await.pending_text(), Some("draft"));
        let texts = h.transport.texts();
        assert!(texts.iter().any(|t| t.contains("/generate") && t.contains("xlsx")));
        assert!(texts.contains(&t_lang("more", Some("en"))));
        Ok(())
    }

    /// /start resets a half finished conversation and shows the menu
    #[tokio::test]
    async fn test_start_resets_and_shows_menu() -> Result<()> {
        let h = Harness::new();
        h.send(1, InboundEvent::Generate).await;
        h.send(1, text("draft")).await;
        h.send(1, InboundEvent::Start).await;

        assert_eq!(h.state(1).await, ConversionState::Idle);
        match h.transport.last() {
            Sent::Text {
                text, with_markup, ..
            } => {
                assert!(text.contains("Welcome"));
                assert!(with_markup);
            }
            other => panic!("expected welcome text, got {other:?}"),
        }
        Ok(())
    }

    /// Free text while idle gets the nudge and nothing else
    #[tokio::test]
    async fn test_idle_text_gets_fallback() -> Result<()> {
        let h = Harness::new();
        h.send(1, text("random chatter")).await;
        h.send(1, InboundEvent::UnknownCommand).await;
        h.send(1, InboundEvent::Unsupported).await;

        assert_eq!(h.state(1).await, ConversionState::Idle);
        let fallback = t_lang("fallback", Some("en"));
        assert_eq!(h.transport.texts(), vec![fallback.clone(), fallback.clone(), fallback]);
        Ok(())
    }

    /// A stale type button does not generate anything
    #[tokio::test]
    async fn test_type_button_without_text() -> Result<()> {
        let h = Harness::new();
        h.send(1, choose("txt")).await;
        h.send(1, InboundEvent::Generate).await;
        h.send(1, choose("txt")).await;

        assert_eq!(h.state(1).await, ConversionState::AwaitingText);
        assert!(h.generator.requests().is_empty());
        let no_pending = t_lang("no-pending-text", Some("en"));
        assert_eq!(h.transport.texts().iter().filter(|t| **t == no_pending).count(), 2);
        Ok(())
    }

    /// Non-text input while waiting for text re-prompts
    #[tokio::test]
    async fn test_unsupported_while_awaiting_text() -> Result<()> {
        let h = Harness::new();
        h.send(1, InboundEvent::Generate).await;
        h.send(1, InboundEvent::Unsupported).await;

        assert_eq!(h.state(1).await, ConversionState::AwaitingText);
        assert_eq!(
            h.transport.texts().last().cloned(),
            Some(t_lang("prompt-enter-text", Some("en")))
        );
        Ok(())
    }

    /// A failing generator resets to Idle with one generic message
    #[tokio::test]
    async fn test_generation_failure_resets_session() -> Result<()> {
        let transport = Arc::new(RecordingTransport::default());
        let flow = ConversionFlow::new(
            SessionStore::new(),
            transport.clone(),
            Arc::new(FailingGenerator),
        );
        let chat = ChatId(5);

        flow.handle_event(chat, InboundEvent::Generate, None).await?;
        flow.handle_event(chat, text("boom"), None).await?;
        let before = transport.sent().len();
        flow.handle_event(chat, choose("xlsx"), None).await?;

        assert_eq!(flow.sessions().state(chat).await?, ConversionState::Idle);
        let after = transport.sent();
        assert_eq!(after.len(), before + 1);
        match &after[before] {
            Sent::Text { text, .. } => {
                assert_eq!(text, &t_lang("error-generation", None));
                assert!(!text.contains("renderer exploded"));
            }
            other => panic!("expected error text, got {other:?}"),
        }
        Ok(())
    }

    /// Delivery failures are logged, reported once and not retried
    #[tokio::test]
    async fn test_delivery_failure_resets_session() -> Result<()> {
        let h = Harness::with_transport(RecordingTransport {
            fail_documents: true,
            ..Default::default()
        });
        h.send(1, InboundEvent::Generate).await;
        h.send(1, text("payload")).await;
        h.send(1, choose("md")).await;

        assert_eq!(h.state(1).await, ConversionState::Idle);
        assert_eq!(h.generator.requests().len(), 1);
        assert_eq!(
            h.transport.texts().last().cloned(),
            Some(t_lang("error-generation", Some("en")))
        );
        Ok(())
    }

    /// Two chats interleaved step by step keep their own text
    #[tokio::test]
    async fn test_interleaved_sessions_are_isolated() -> Result<()> {
        let h = Harness::new();
        h.send(1, InboundEvent::Generate).await;
        h.send(2, InboundEvent::Generate).await;
        h.send(1, text("alpha")).await;
        h.send(2, text("beta")).await;
        h.send(2, choose("txt")).await;

        assert_eq!(h.state(1).await.pending_text(), Some("alpha"));
        assert_eq!(h.state(2).await, ConversionState::Idle);

        h.send(1, choose("md")).await;

        let alpha = h.transport.documents(ChatId(1));
        let beta = h.transport.documents(ChatId(2));
        assert_eq!(alpha.len(), 1);
        assert_eq!(beta.len(), 1);
        assert_eq!(alpha[0].bytes, b"alpha".to_vec());
        assert!(alpha[0].filename.ends_with(".md"));
        assert_eq!(beta[0].bytes, b"beta".to_vec());
        Ok(())
    }

    /// Many chats running concurrently never see each other's text
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sessions_are_isolated() -> Result<()> {
        let h = Harness::new();
        let mut tasks = tokio::task::JoinSet::new();

        for chat in 0..32i64 {
            let flow = h.flow.clone();
            tasks.spawn(async move {
                let id = ChatId(chat);
                flow.handle_event(id, InboundEvent::Generate, Some("en")).await?;
                tokio::task::yield_now().await;
                flow.handle_event(id, text(&format!("text-{chat}")), Some("en"))
                    .await?;
                tokio::task::yield_now().await;
                flow.handle_event(id, choose("txt"), Some("en")).await
            });
        }
        while let Some(result) = tasks.join_next().await {
            result??;
        }

        for chat in 0..32i64 {
            let documents = h.transport.documents(ChatId(chat));
            assert_eq!(documents.len(), 1, "chat {chat}");
            assert_eq!(documents[0].bytes, format!("text-{chat}").into_bytes());
            assert_eq!(h.state(chat).await, ConversionState::Idle);
        }
        Ok(())
    }

    /// /count replies immediately and leaves the state alone
    #[tokio::test]
    async fn test_count_command() -> Result<()> {
        let h = Harness::new();
        h.send(1, InboundEvent::Generate).await;
        h.send(1, InboundEvent::Count("one two three\nfour".to_string()))
            .await;

        assert_eq!(h.state(1).await, ConversionState::AwaitingText);
        let reply = h.transport.texts().last().cloned().unwrap();
        assert!(reply.contains("Words: 4"));
        assert!(reply.contains("Lines: 2"));

        h.send(1, InboundEvent::Count("   ".to_string())).await;
        assert_eq!(
            h.transport.texts().last().cloned(),
            Some(t_lang("count-usage", Some("en")))
        );
        Ok(())
    }

    /// Uploaded documents are downloaded and counted
    #[tokio::test]
    async fn test_count_uploaded_documents() -> Result<()> {
        let mut uploads = HashMap::new();
        uploads.insert("notes".to_string(), b"alpha beta\ngamma\n".to_vec());
        uploads.insert("image".to_string(), vec![0x89, 0x50, 0xff, 0xfe]);
        let h = Harness::with_transport(RecordingTransport {
            uploads,
            ..Default::default()
        });

        h.send(
            1,
            InboundEvent::Document {
                file_id: "notes".to_string(),
                size: 17,
            },
        )
        .await;
        let reply = h.transport.texts().last().cloned().unwrap();
        assert!(reply.contains("Words: 3"));
        assert!(reply.contains("Lines: 2"));

        h.send(
            1,
            InboundEvent::Document {
                file_id: "image".to_string(),
                size: 4,
            },
        )
        .await;
        assert_eq!(
            h.transport.texts().last().cloned(),
            Some(t_lang("count-not-text", Some("en")))
        );

        h.send(
            1,
            InboundEvent::Document {
                file_id: "missing".to_string(),
                size: 4,
            },
        )
        .await;
        assert_eq!(
            h.transport.texts().last().cloned(),
            Some(t_lang("count-download-failed", Some("en")))
        );
        assert_eq!(h.state(1).await, ConversionState::Idle);
        Ok(())
    }

    /// Oversized uploads are refused before downloading
    #[tokio::test]
    async fn test_count_rejects_large_documents() -> Result<()> {
        let transport = Arc::new(RecordingTransport::default());
        let flow = ConversionFlow::new(
            SessionStore::new(),
            transport.clone(),
            Arc::new(DocumentGenerator::default()),
        )
        .with_max_count_file_size(10);

        flow.handle_event(
            ChatId(1),
            InboundEvent::Document {
                file_id: "big".to_string(),
                size: 11,
            },
            Some("en"),
        )
        .await?;

        let reply = transport.texts().last().cloned().unwrap();
        assert!(reply.contains("10 bytes"));
        Ok(())
    }

    /// Replies follow the user's language
    #[tokio::test]
    async fn test_bengali_user_gets_bengali_prompt() -> Result<()> {
        let transport = Arc::new(RecordingTransport::default());
        let flow = ConversionFlow::new(
            SessionStore::new(),
            transport.clone(),
            Arc::new(DocumentGenerator::default()),
        );

        flow.handle_event(ChatId(9), InboundEvent::Generate, Some("bn-BD"))
            .await?;

        assert_eq!(
            transport.texts().last().cloned(),
            Some(t_lang("prompt-enter-text", Some("bn")))
        );
        assert_ne!(
            t_lang("prompt-enter-text", Some("bn")),
            t_lang("prompt-enter-text", Some("en"))
        );
        Ok(())
    }
}
