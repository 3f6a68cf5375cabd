use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::domain::char_prefix;

/// Reveal period used for real replies.
pub const DEFAULT_REVEAL_PERIOD: Duration = Duration::from_millis(30);

/// Something the reveal produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealEvent {
    /// One more character is visible.
    Progress { revealed: usize },
    /// The whole target is visible. Emitted once per target.
    Completed { text: String },
}

/// Character-by-character reveal of a fixed target string.
///
/// Holds no timer; every call to [`Typewriter::tick`] reveals exactly one
/// character, left to right. See [`TypewriterEngine`] for the timed version.
///
/// ```
/// use chat_widget::{RevealEvent, Typewriter};
///
/// let mut tw = Typewriter::new();
/// assert!(tw.retarget("hi").is_none());
/// assert_eq!(tw.tick(), Some(RevealEvent::Progress { revealed: 1 }));
/// assert_eq!(tw.visible_text(), "h");
/// assert_eq!(tw.tick(), Some(RevealEvent::Completed { text: "hi".into() }));
/// assert_eq!(tw.tick(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Typewriter {
    target: String,
    total: usize,
    revealed: usize,
    running: bool,
}

impl Typewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start revealing `target` from scratch, discarding the previous target.
    ///
    /// An empty target has nothing to reveal and completes right away; the
    /// completion is returned here instead of from a later tick.
    pub fn retarget(&mut self, target: impl Into<String>) -> Option<RevealEvent> {
        self.target = target.into();
        self.total = self.target.chars().count();
        self.revealed = 0;

        if self.total == 0 {
            self.running = false;
            return Some(RevealEvent::Completed {
                text: String::new(),
            });
        }

        self.running = true;
        None
    }

    /// Reveal one more character. Returns `None` once stopped.
    pub fn tick(&mut self) -> Option<RevealEvent> {
        if !self.running {
            return None;
        }

        if self.revealed < self.total {
            self.revealed += 1;
        }

        if self.revealed == self.total {
            self.running = false;
            return Some(RevealEvent::Completed {
                text: self.target.clone(),
            });
        }

        Some(RevealEvent::Progress {
            revealed: self.revealed,
        })
    }

    /// Stop without completing. The revealed prefix stays as it is.
    pub fn cancel(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn visible_text(&self) -> &str {
        char_prefix(&self.target, self.revealed)
    }
}

/// A [`Typewriter`] driven by its own cancelable interval.
///
/// The interval only exists while a reveal is in progress. [`retarget`] and
/// [`cancel`] drop it, so a superseded reveal can never report completion.
/// [`next_event`] is cancel-safe and can sit in a `tokio::select!` loop.
///
/// [`retarget`]: TypewriterEngine::retarget
/// [`cancel`]: TypewriterEngine::cancel
/// [`next_event`]: TypewriterEngine::next_event
pub struct TypewriterEngine {
    typewriter: Typewriter,
    period: Duration,
    ticker: Option<Interval>,
    ready: Option<RevealEvent>,
}

impl TypewriterEngine {
    pub fn new(period: Duration) -> Self {
        Self {
            typewriter: Typewriter::new(),
            period: period.max(Duration::from_millis(1)),
            ticker: None,
            ready: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Cancel any pending tick and start revealing `target`.
    pub fn retarget(&mut self, target: impl Into<String>) {
        self.ticker = None;
        self.ready = self.typewriter.retarget(target);

        if self.ready.is_none() {
            // First character shows one period after the reveal starts.
            let mut ticker = interval_at(Instant::now() + self.period, self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.ticker = Some(ticker);
        }
    }

    /// Stop immediately and release the timer. No completion follows.
    pub fn cancel(&mut self) {
        self.ticker = None;
        self.ready = None;
        self.typewriter.cancel();
    }

    /// `true` while an event is still to come.
    pub fn is_active(&self) -> bool {
        self.ticker.is_some() || self.ready.is_some()
    }

    pub fn visible_text(&self) -> &str {
        self.typewriter.visible_text()
    }

    pub fn revealed_count(&self) -> usize {
        self.typewriter.revealed_count()
    }

    /// Wait for the next reveal event. Never resolves while inactive.
    pub async fn next_event(&mut self) -> RevealEvent {
        if let Some(event) = self.ready.take() {
            return event;
        }

        let Some(ticker) = self.ticker.as_mut() else {
            return std::future::pending().await;
        };
        ticker.tick().await;

        match self.typewriter.tick() {
            Some(event @ RevealEvent::Completed { .. }) => {
                self.ticker = None;
                event
            }
            Some(event) => event,
            None => {
                self.ticker = None;
                std::future::pending().await
            }
        }
    }
}

impl Default for TypewriterEngine {
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_PERIOD)
    }
}
