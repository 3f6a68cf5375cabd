use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::CompletionGateway;
use crate::domain::{DomainError, ExchangeId, GatewayResult, RenderState, Turn};

use super::conversation::{Conversation, IgnoreReason, OutboundPrompt, ReplyAction};
use super::typewriter::{RevealEvent, TypewriterEngine, DEFAULT_REVEAL_PERIOD};

const COMMAND_BUFFER: usize = 32;

/// Result of a submit as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted(ExchangeId),
    Ignored(IgnoreReason),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted(_))
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub reveal_period: Duration,
    pub conversation: Conversation,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            reveal_period: DEFAULT_REVEAL_PERIOD,
            conversation: Conversation::new(),
        }
    }
}

impl SessionOptions {
    pub fn with_reveal_period(mut self, period: Duration) -> Self {
        self.reveal_period = period;
        self
    }

    pub fn with_conversation(mut self, conversation: Conversation) -> Self {
        self.conversation = conversation;
        self
    }
}

enum Command {
    Submit {
        text: String,
        reply: oneshot::Sender<SubmitOutcome>,
    },
    SetInput {
        text: String,
    },
    PressEnter {
        shift: bool,
        reply: oneshot::Sender<SubmitOutcome>,
    },
    Transcript {
        reply: oneshot::Sender<Vec<Turn>>,
    },
}

/// Async driver for a [`Conversation`].
///
/// One task owns the conversation, the typewriter and its timer, so all
/// transitions happen in order on a single execution context. Gateway calls
/// run on their own task and report back through a channel; after teardown
/// the channel is gone and a late result is simply dropped.
pub struct ChatSession {
    conversation: Conversation,
    engine: TypewriterEngine,
    gateway: Arc<dyn CompletionGateway>,
    commands: mpsc::Receiver<Command>,
    replies_tx: mpsc::UnboundedSender<(ExchangeId, GatewayResult)>,
    replies_rx: mpsc::UnboundedReceiver<(ExchangeId, GatewayResult)>,
    render_tx: watch::Sender<RenderState>,
    cancel: CancellationToken,
}

impl ChatSession {
    pub fn spawn(gateway: Arc<dyn CompletionGateway>, options: SessionOptions) -> ChatSessionHandle {
        let (commands_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        let (render_tx, render_rx) = watch::channel(options.conversation.render());
        let cancel = CancellationToken::new();

        let session = ChatSession {
            conversation: options.conversation,
            engine: TypewriterEngine::new(options.reveal_period),
            gateway,
            commands,
            replies_tx,
            replies_rx,
            render_tx,
            cancel: cancel.clone(),
        };

        info!(
            "Chat session started (gateway={}, reveal={}ms)",
            session.gateway.name(),
            session.engine.period().as_millis()
        );
        let task = tokio::spawn(session.run());

        ChatSessionHandle {
            commands: commands_tx,
            render: render_rx,
            cancel,
            task: Some(task),
        }
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },

                Some((id, result)) = self.replies_rx.recv() => self.handle_reply(id, result),

                event = self.engine.next_event(), if self.engine.is_active() => {
                    self.handle_reveal(event)
                }
            }
            self.publish();
        }

        self.engine.cancel();
        self.conversation.teardown();
        self.publish();
        info!("Chat session closed");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Submit { text, reply } => {
                let outcome = self.conversation.submit(&text);
                let outcome = self.dispatch(outcome);
                self.publish();
                let _ = reply.send(outcome);
            }
            Command::SetInput { text } => {
                self.conversation.set_input(text);
            }
            Command::PressEnter { shift, reply } => {
                let outcome = self.conversation.press_enter(shift);
                let outcome = self.dispatch(outcome);
                self.publish();
                let _ = reply.send(outcome);
            }
            Command::Transcript { reply } => {
                let _ = reply.send(self.conversation.transcript().to_vec());
            }
        }
    }

    fn dispatch(&mut self, outcome: Result<OutboundPrompt, IgnoreReason>) -> SubmitOutcome {
        let outbound = match outcome {
            Ok(outbound) => outbound,
            Err(reason) => return SubmitOutcome::Ignored(reason),
        };

        let OutboundPrompt { id, prompt } = outbound;
        let gateway = Arc::clone(&self.gateway);
        let replies = self.replies_tx.clone();
        tokio::spawn(async move {
            let result = gateway.complete(&prompt).await;
            if replies.send((id, result)).is_err() {
                debug!("Session gone, dropping result for {}", id);
            }
        });

        SubmitOutcome::Accepted(id)
    }

    fn handle_reply(&mut self, id: ExchangeId, result: GatewayResult) {
        match self.conversation.on_gateway_result(id, result) {
            ReplyAction::Reveal(text) => self.engine.retarget(text),
            ReplyAction::Failed(kind) => {
                warn!("Exchange {} failed ({}), showing fallback", id, kind);
            }
            ReplyAction::Discarded => {}
        }
    }

    fn handle_reveal(&mut self, event: RevealEvent) {
        match event {
            RevealEvent::Progress { revealed } => self.conversation.on_reveal_progress(revealed),
            RevealEvent::Completed { text } => {
                self.conversation.on_reveal_progress(text.chars().count());
                self.conversation.on_reveal_complete();
            }
        }
    }

    fn publish(&self) {
        let next = self.conversation.render();
        self.render_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

/// Caller side of a running [`ChatSession`].
///
/// Dropping the handle tears the session down.
pub struct ChatSessionHandle {
    commands: mpsc::Sender<Command>,
    render: watch::Receiver<RenderState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ChatSessionHandle {
    /// Submit `text` as a user turn. Resolves once the session has decided.
    pub async fn submit(&self, text: impl Into<String>) -> Result<SubmitOutcome, DomainError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Submit {
            text: text.into(),
            reply,
        })
        .await?;
        rx.await
            .map_err(|_| DomainError::session_closed("submit was not answered"))
    }

    pub async fn set_input(&self, text: impl Into<String>) -> Result<(), DomainError> {
        self.send(Command::SetInput { text: text.into() }).await
    }

    pub async fn press_enter(&self, shift: bool) -> Result<SubmitOutcome, DomainError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::PressEnter { shift, reply }).await?;
        rx.await
            .map_err(|_| DomainError::session_closed("enter was not answered"))
    }

    pub async fn transcript(&self) -> Result<Vec<Turn>, DomainError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Transcript { reply }).await?;
        rx.await
            .map_err(|_| DomainError::session_closed("transcript was not answered"))
    }

    pub fn subscribe(&self) -> watch::Receiver<RenderState> {
        self.render.clone()
    }

    pub fn render_state(&self) -> RenderState {
        self.render.borrow().clone()
    }

    /// Wait until the session is idle again.
    pub async fn wait_idle(&self) -> Result<RenderState, DomainError> {
        let mut render = self.render.clone();
        let state = render
            .wait_for(RenderState::is_idle)
            .await
            .map_err(|_| DomainError::session_closed("render channel closed"))?;
        Ok(state.clone())
    }

    /// Cancel any reveal in progress and stop the session task.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Chat session task ended abnormally: {}", e);
            }
        }
    }

    async fn send(&self, command: Command) -> Result<(), DomainError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| DomainError::session_closed("session task has stopped"))
    }
}

impl Drop for ChatSessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::application::FALLBACK_MESSAGE;
    use crate::domain::{GatewayError, Phase};

    struct SlowEcho {
        delay: Duration,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionGateway for SlowEcho {
        async fn complete(&self, prompt: &str) -> GatewayResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(format!("echo {prompt}"))
        }

        fn name(&self) -> &str {
            "slow-echo"
        }
    }

    struct Failing;

    #[async_trait]
    impl CompletionGateway for Failing {
        async fn complete(&self, _prompt: &str) -> GatewayResult {
            Err(GatewayError::upstream("provider rejected the request"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn options() -> SessionOptions {
        SessionOptions::default()
            .with_conversation(Conversation::with_transcript(Vec::new()))
            .with_reveal_period(Duration::from_millis(30))
    }

    #[tokio::test(start_paused = true)]
    async fn reply_streams_then_commits() {
        let gateway = Arc::new(SlowEcho {
            delay: Duration::from_millis(500),
            calls: AtomicUsize::new(0),
        });
        let handle = ChatSession::spawn(gateway.clone(), options());
        let mut render = handle.subscribe();

        let outcome = handle.submit("hi").await.unwrap();
        assert!(outcome.is_accepted());

        let thinking = render.wait_for(|s| s.thinking).await.unwrap().clone();
        assert_eq!(thinking.latest_turn, Some(Turn::user("hi")));
        assert!(!thinking.input_enabled);

        let streaming = render
            .wait_for(|s| s.streaming && !s.revealed.is_empty())
            .await
            .unwrap()
            .clone();
        assert!("echo hi".starts_with(&streaming.revealed));

        let idle = handle.wait_idle().await.unwrap();
        assert_eq!(idle.latest_turn, Some(Turn::assistant("echo hi")));
        assert!(idle.input_enabled);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn submit_while_busy_is_ignored() {
        let gateway = Arc::new(SlowEcho {
            delay: Duration::from_secs(2),
            calls: AtomicUsize::new(0),
        });
        let handle = ChatSession::spawn(gateway.clone(), options());

        let first = handle.submit("one").await.unwrap();
        let second = handle.submit("two").await.unwrap();

        assert!(first.is_accepted());
        assert_eq!(
            second,
            SubmitOutcome::Ignored(IgnoreReason::Busy(Phase::Thinking))
        );

        handle.wait_idle().await.unwrap();
        let transcript = handle.transcript().await.unwrap();
        assert_eq!(
            transcript,
            vec![Turn::user("one"), Turn::assistant("echo one")]
        );
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failure_goes_straight_back_to_idle() {
        let handle = ChatSession::spawn(Arc::new(Failing), options());
        let mut render = handle.subscribe();

        handle.submit("test").await.unwrap();
        let state = render.wait_for(|s| s.turn_count == 2).await.unwrap().clone();

        assert!(state.is_idle());
        assert!(!state.streaming);
        assert_eq!(
            state.latest_turn,
            Some(Turn::assistant(FALLBACK_MESSAGE))
        );

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_mid_call_drops_late_result() {
        let gateway = Arc::new(SlowEcho {
            delay: Duration::from_secs(1),
            calls: AtomicUsize::new(0),
        });
        let handle = ChatSession::spawn(gateway, options());
        let render = handle.subscribe();

        handle.submit("bye").await.unwrap();
        handle.shutdown().await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let last = render.borrow().clone();
        assert!(last.is_idle());
        assert_eq!(last.turn_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn enter_submits_input_buffer() {
        let gateway = Arc::new(SlowEcho {
            delay: Duration::from_millis(10),
            calls: AtomicUsize::new(0),
        });
        let handle = ChatSession::spawn(gateway, options());

        handle.set_input("typed text").await.unwrap();
        assert_eq!(
            handle.press_enter(true).await.unwrap(),
            SubmitOutcome::Ignored(IgnoreReason::ModifiedEnter)
        );
        assert!(handle.press_enter(false).await.unwrap().is_accepted());

        let idle = handle.wait_idle().await.unwrap();
        assert_eq!(idle.latest_turn, Some(Turn::assistant("echo typed text")));
        assert_eq!(idle.input, "");

        handle.shutdown().await;
    }
}
