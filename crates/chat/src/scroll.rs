use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::events::ViewHint;

/// Delay between a scroll hint and the viewport request, so the new row is laid out first.
pub const SCROLL_TO_BOTTOM_DELAY: Duration = Duration::from_millis(80);

/// Handle the presentation layer attaches to the end of the rendered timeline.
pub trait ScrollTarget: Send + Sync + 'static {
    fn scroll_to_end(&self);
}

/// Turns `ScrollToBottom` hints into deferred viewport requests.
///
/// Every hint gets its own timer. Scrolling to the tail is idempotent, so bursts
/// are not coalesced.
pub struct ScrollScheduler {
    target: Arc<dyn ScrollTarget>,
}

impl ScrollScheduler {
    pub fn new(target: Arc<dyn ScrollTarget>) -> Self {
        Self { target }
    }

    /// Schedules a scroll for `ScrollToBottom` and ignores other hints.
    pub fn observe(&self, hint: ViewHint) -> Option<JoinHandle<()>> {
        match hint {
            ViewHint::ScrollToBottom => Some(self.schedule()),
            ViewHint::StateChanged => None,
        }
    }

    pub fn schedule(&self) -> JoinHandle<()> {
        let target = self.target.clone();
        tokio::spawn(async move {
            tokio::time::sleep(SCROLL_TO_BOTTOM_DELAY).await;
            target.scroll_to_end();
        })
    }
}
