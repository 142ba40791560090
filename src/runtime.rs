//! Chat runtime
//!
//! Owns the phase, the current session, the backend handle, and the view;
//! feeds events through the pure transition function and executes the
//! resulting effects. All handlers run to completion on one task —
//! suspension happens only at the upload await and at each chunk await of
//! the answer stream, so chunks are processed strictly in arrival order and
//! the rendered transcript is always a prefix of the final content.

use crate::chat::{transition, ChatEvent, ChatPhase, Effect, Role, TransitionError, Turn};
use crate::client::{ChunkStream, DocumentBackend};
use crate::render::markup;
use crate::session::{Session, SessionId};
use crate::stream::{EventDispatcher, FrameDecoder};
use crate::view::ChatView;
use futures::StreamExt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

const CLOSED_EARLY: &str = "the connection closed before the answer completed";

/// Cancels the in-flight streaming read, if any. Cloneable so a signal
/// handler or another task can request a reset while the runtime is
/// suspended mid-stream; the pump observes it at its next suspension point
/// and abandons the read without awaiting completion.
#[derive(Clone, Default)]
pub struct ResetHandle {
    slot: Arc<Mutex<Option<CancellationToken>>>,
}

impl ResetHandle {
    pub fn abort(&self) {
        let token = self.slot.lock().expect("reset slot poisoned").take();
        if let Some(token) = token {
            token.cancel();
        }
    }

    fn arm(&self, token: CancellationToken) {
        *self.slot.lock().expect("reset slot poisoned") = Some(token);
    }

    fn clear(&self) {
        self.slot.lock().expect("reset slot poisoned").take();
    }
}

pub struct ChatRuntime<V: ChatView> {
    backend: Arc<dyn DocumentBackend>,
    view: V,
    phase: ChatPhase,
    session: Option<Session>,
    reset_handle: ResetHandle,
}

impl<V: ChatView> ChatRuntime<V> {
    pub fn new(backend: Arc<dyn DocumentBackend>, view: V) -> Self {
        Self {
            backend,
            view,
            phase: ChatPhase::NoDocument,
            session: None,
            reset_handle: ResetHandle::default(),
        }
    }

    pub fn phase(&self) -> &ChatPhase {
        &self.phase
    }

    pub fn reset_handle(&self) -> ResetHandle {
        self.reset_handle.clone()
    }

    /// Validate and upload a document, entering `DocumentReady` on success.
    ///
    /// A fresh session identifier is generated before the network call; on
    /// failure it is discarded, never reused.
    pub async fn open_document(&mut self, path: &Path) {
        if !matches!(self.phase, ChatPhase::NoDocument) {
            self.view
                .status("A document is already loaded. Use /reset to start over.");
            return;
        }

        let mime = mime_guess::from_path(path).first_or_octet_stream();
        if mime != mime_guess::mime::APPLICATION_PDF {
            self.apply(ChatEvent::UploadFailed {
                message: "Invalid file type. Please upload a PDF.".to_string(),
            });
            return;
        }

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                self.apply(ChatEvent::UploadFailed {
                    message: format!("Could not read {}: {err}", path.display()),
                });
                return;
            }
        };

        let session_id = SessionId::generate();
        match self.backend.upload(&session_id, &filename, bytes).await {
            Ok(receipt) => {
                tracing::info!(session = %session_id, filename = %receipt.filename, "document accepted");
                self.session = Some(Session::new(session_id));
                self.apply(ChatEvent::DocumentAccepted {
                    filename: receipt.filename,
                    summary: receipt.initial_summary,
                });
            }
            Err(err) => {
                tracing::warn!(%err, "upload failed");
                self.apply(ChatEvent::UploadFailed {
                    message: err.to_string(),
                });
            }
        }
    }

    /// Submit one query and integrate the streamed answer. Returns once the
    /// stream ends, fails, or is abandoned by a reset.
    pub async fn submit_query(&mut self, text: &str) {
        let Some(query) = self.apply(ChatEvent::UserQuery {
            text: text.to_string(),
        }) else {
            return;
        };

        let Some(session_id) = self.session.as_ref().map(|s| s.id.clone()) else {
            // DocumentReady without a session would be a bug in this file.
            tracing::error!("query accepted with no session");
            return;
        };

        let token = CancellationToken::new();
        self.reset_handle.arm(token.clone());

        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => None,
            outcome = self.backend.query(&session_id, &query) => Some(outcome),
        };

        match outcome {
            Some(Ok(chunks)) => self.pump(chunks, &token).await,
            Some(Err(err)) => {
                // Transport failure before any frame: a single Failed event,
                // no Started or Delta.
                let mut dispatcher = EventDispatcher::new();
                if let Some(event) = dispatcher.fail(err.to_string()) {
                    self.apply(ChatEvent::Stream(event));
                }
            }
            None => {}
        }

        self.reset_handle.clear();
        if token.is_cancelled() {
            // The read was abandoned by an external reset request; finish
            // the reset on this task.
            self.apply(ChatEvent::Reset);
        }
    }

    /// Explicit reset from a quiescent state.
    pub fn reset(&mut self) {
        self.reset_handle.abort();
        self.apply(ChatEvent::Reset);
    }

    /// Replay the whole transcript through the view (the `/history`
    /// command).
    pub fn show_history(&mut self) {
        let Some(session) = &self.session else {
            self.view.status("No conversation yet.");
            return;
        };
        if session.transcript.is_empty() {
            self.view.status("No conversation yet.");
            return;
        }
        tracing::debug!(turns = session.transcript.len(), "replaying transcript");
        for turn in session.transcript.turns() {
            let rendered = markup(&turn.content);
            self.view.turn_committed(turn, &rendered);
        }
    }

    /// Drive one answer stream through a fresh decoder/dispatcher pair.
    /// Their state lives only as long as this call and is simply dropped on
    /// abandonment — no cleanup handshake with the server.
    async fn pump(&mut self, mut chunks: ChunkStream, cancel: &CancellationToken) {
        let mut decoder = FrameDecoder::new();
        let mut dispatcher = EventDispatcher::new();

        loop {
            // `biased` so an already-requested reset always wins over a
            // ready chunk: the abandoned stream must produce no further
            // observable effect.
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::debug!("answer stream abandoned by reset");
                    return;
                }
                next = chunks.next() => next,
            };

            match next {
                Some(Ok(bytes)) => {
                    for frame in decoder.feed(&bytes) {
                        if let Some(event) = dispatcher.dispatch(frame) {
                            self.apply(ChatEvent::Stream(event));
                        }
                        if dispatcher.is_closed() {
                            // Logically complete: stop reading and release
                            // the connection even if bytes keep arriving.
                            return;
                        }
                    }
                }
                Some(Err(err)) => {
                    if let Some(event) = dispatcher.fail(err.to_string()) {
                        self.apply(ChatEvent::Stream(event));
                    }
                    return;
                }
                None => {
                    for frame in decoder.finish() {
                        if let Some(event) = dispatcher.dispatch(frame) {
                            self.apply(ChatEvent::Stream(event));
                        }
                    }
                    if let Some(event) = dispatcher.fail(CLOSED_EARLY) {
                        self.apply(ChatEvent::Stream(event));
                    }
                    return;
                }
            }
        }
    }

    /// Feed one event through the transition function and execute its
    /// effects. Returns the query text when a streaming call should be
    /// issued (the one effect this method cannot execute itself).
    fn apply(&mut self, event: ChatEvent) -> Option<String> {
        let result = match transition(&self.phase, event) {
            Ok(result) => result,
            Err(err @ (TransitionError::Busy | TransitionError::EmptyQuery)) => {
                // Silent no-ops by design: no turn, no network call.
                tracing::debug!(%err, "event dropped");
                return None;
            }
            Err(TransitionError::NoDocument) => {
                self.view.status("Upload a document first.");
                return None;
            }
            Err(err) => {
                tracing::warn!(%err, "event rejected");
                return None;
            }
        };

        self.phase = result.next;
        let mut issue = None;
        for effect in result.effects {
            if let Effect::IssueQuery { text } = effect {
                issue = Some(text);
            } else {
                self.perform(effect);
            }
        }
        issue
    }

    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::ShowDocument { filename, summary } => {
                self.view.document_loaded(&filename, &markup(&summary));
            }
            Effect::AppendTurn { role, content } => {
                let turn = match role {
                    Role::User => Turn::user(content),
                    Role::Assistant => Turn::assistant(content),
                };
                let rendered = markup(&turn.content);
                if let Some(session) = &mut self.session {
                    session.transcript.append(turn.clone());
                } else {
                    tracing::warn!("turn appended with no session");
                }
                self.view.turn_committed(&turn, &rendered);
            }
            Effect::OpenAnswer => {
                if let Some(session) = &mut self.session {
                    session.transcript.append(Turn::assistant(""));
                }
                self.view.answer_updated("");
            }
            Effect::ExtendAnswer { text } => {
                let rendered = match &mut self.session {
                    Some(session) => match session.transcript.extend_last(&text) {
                        Ok(turn) => markup(&turn.content),
                        Err(err) => {
                            tracing::warn!(%err, "dropping delta with no open answer turn");
                            return;
                        }
                    },
                    None => return,
                };
                self.view.answer_updated(&rendered);
            }
            Effect::CommitAnswer => self.view.answer_committed(),
            Effect::SetPending(pending) => self.view.set_pending(pending),
            Effect::SetInputEnabled(enabled) => self.view.set_input_enabled(enabled),
            Effect::ShowStatus { message } => self.view.status(&message),
            Effect::AbortStream => self.reset_handle.abort(),
            Effect::ClearSession => {
                self.session = None;
                self.view.clear();
            }
            Effect::IssueQuery { .. } => {
                // Extracted in `apply`; reaching here is a wiring bug.
                tracing::error!("IssueQuery effect reached perform");
            }
        }
    }

    #[cfg(test)]
    fn transcript_turns(&self) -> Vec<Turn> {
        self.session
            .as_ref()
            .map(|s| s.transcript.turns().to_vec())
            .unwrap_or_default()
    }
}
