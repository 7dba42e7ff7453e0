//! Filter messages and progress
//!
//! Filters report progress and informational text through a
//! [`MessageHandler`]. Handlers must be `Send + Sync` because workers of the
//! parallel primitives report progress directly.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Minimum time between two progress messages unless a handler asks otherwise
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Category of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Informational text
    Info,
    /// Non-fatal problem
    Warning,
    /// Fatal problem
    Error,
    /// Diagnostic detail
    Debug,
    /// Progress update
    Progress,
}

/// One message emitted during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Category
    pub kind: MessageKind,
    /// Text
    pub text: String,
}

impl Message {
    /// Create a message
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Informational message
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Info, text)
    }

    /// Warning message
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Warning, text)
    }

    /// Error message
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, text)
    }

    /// Debug message
    pub fn debug(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Debug, text)
    }

    /// Progress message
    pub fn progress(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Progress, text)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.text)
    }
}

/// Receiver of filter messages
pub trait MessageHandler: Send + Sync {
    /// Handle one message
    fn handle(&self, message: Message);

    /// How often this handler wants progress messages
    fn progress_interval(&self) -> Duration {
        DEFAULT_PROGRESS_INTERVAL
    }
}

impl<F> MessageHandler for F
where
    F: Fn(Message) + Send + Sync,
{
    fn handle(&self, message: Message) {
        self(message)
    }
}

/// Handler that drops every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMessageHandler;

impl MessageHandler for NullMessageHandler {
    fn handle(&self, _message: Message) {}
}

/// Handler that forwards messages to `tracing`
#[derive(Debug, Clone)]
pub struct TracingMessageHandler {
    source: String,
    progress_interval: Duration,
}

impl TracingMessageHandler {
    /// Forward messages tagged with `source` (usually a filter name)
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Throttle progress to one message per `interval`
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }
}

impl Default for TracingMessageHandler {
    fn default() -> Self {
        Self::new("tessera")
    }
}

impl MessageHandler for TracingMessageHandler {
    fn handle(&self, message: Message) {
        let source = self.source.as_str();
        match message.kind {
            MessageKind::Info | MessageKind::Progress => {
                info!(target: "tessera::filter", source, "{}", message.text)
            }
            MessageKind::Warning => warn!(target: "tessera::filter", source, "{}", message.text),
            MessageKind::Error => error!(target: "tessera::filter", source, "{}", message.text),
            MessageKind::Debug => debug!(target: "tessera::filter", source, "{}", message.text),
        }
    }

    fn progress_interval(&self) -> Duration {
        self.progress_interval
    }
}

/// Handler that stores every message, for inspection after a run
#[derive(Debug, Default)]
pub struct MessageCollector {
    messages: Mutex<Vec<Message>>,
}

impl MessageCollector {
    /// Empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the messages received so far
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    /// Messages of one kind
    pub fn of_kind(&self, kind: MessageKind) -> Vec<Message> {
        self.messages
            .lock()
            .iter()
            .filter(|m| m.kind == kind)
            .cloned()
            .collect()
    }

    /// Take all messages, leaving the collector empty
    pub fn take(&self) -> Vec<Message> {
        std::mem::take(&mut *self.messages.lock())
    }
}

impl MessageHandler for MessageCollector {
    fn handle(&self, message: Message) {
        self.messages.lock().push(message);
    }
}

/// Thread-safe progress counter with throttled reporting
///
/// Workers call [`advance`](Self::advance) with the number of items they
/// finished. At most one progress message is emitted per interval; the
/// final message from [`finish`](Self::finish) is always emitted.
pub struct ProgressReporter<'a> {
    handler: &'a dyn MessageHandler,
    label: String,
    total: usize,
    done: AtomicUsize,
    interval: Duration,
    last_report: Mutex<Option<Instant>>,
}

impl<'a> ProgressReporter<'a> {
    /// Create a reporter for `total` items
    pub fn new(
        handler: &'a dyn MessageHandler,
        label: impl Into<String>,
        total: usize,
        interval: Duration,
    ) -> Self {
        Self {
            handler,
            label: label.into(),
            total,
            done: AtomicUsize::new(0),
            interval,
            last_report: Mutex::new(None),
        }
    }

    /// Create a reporter throttled to the handler's progress interval
    pub fn for_handler(handler: &'a dyn MessageHandler, label: impl Into<String>, total: usize) -> Self {
        Self::new(handler, label, total, handler.progress_interval())
    }

    /// Items finished so far
    pub fn done(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    /// Percentage finished, 100 for an empty total
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            return 100;
        }
        (self.done().min(self.total) * 100) / self.total
    }

    /// Record `count` finished items
    pub fn advance(&self, count: usize) {
        self.done.fetch_add(count, Ordering::Relaxed);
        let now = Instant::now();
        {
            let mut last = self.last_report.lock();
            if let Some(at) = *last {
                if now.duration_since(at) < self.interval {
                    return;
                }
            }
            *last = Some(now);
        }
        self.emit();
    }

    /// Emit the final message
    pub fn finish(&self) {
        self.emit();
    }

    fn emit(&self) {
        self.handler.handle(Message::progress(format!(
            "{}: {}% ({}/{})",
            self.label,
            self.percent(),
            self.done().min(self.total),
            self.total
        )));
    }
}

impl fmt::Debug for ProgressReporter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("label", &self.label)
            .field("total", &self.total)
            .field("done", &self.done())
            .finish()
    }
}
