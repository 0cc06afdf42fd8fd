use tokio::sync::mpsc;

/// Hint emitted by the controller after it mutates session state.
///
/// The controller never schedules rendering or scrolling itself; the presentation
/// layer decides how to debounce or coalesce these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewHint {
    /// Some observable field changed, a fresh snapshot is available.
    StateChanged,
    /// The timeline grew or was replaced, the viewport should follow its tail.
    ScrollToBottom,
}

pub type ViewHintReceiver = mpsc::UnboundedReceiver<ViewHint>;

/// Sending half of the hint channel.
///
/// A dropped receiver means the owning screen is gone; hints are discarded silently.
#[derive(Debug, Clone)]
pub(crate) struct ViewHintSender {
    tx: mpsc::UnboundedSender<ViewHint>,
}

impl ViewHintSender {
    pub(crate) fn channel() -> (Self, ViewHintReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub(crate) fn emit(&self, hint: ViewHint) {
        let _ = self.tx.send(hint);
    }

    pub(crate) fn state_changed(&self) {
        self.emit(ViewHint::StateChanged);
    }

    pub(crate) fn timeline_changed(&self) {
        self.emit(ViewHint::StateChanged);
        self.emit(ViewHint::ScrollToBottom);
    }
}
