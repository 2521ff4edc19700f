use std::io::{self, IsTerminal, Write};

use taskman_core::service::{Notifier, NotifyEvent};

/// Rings the terminal bell on stderr. Silent when stderr is not a terminal.
pub(crate) struct BellNotifier {
    enabled: bool,
}

impl BellNotifier {
    pub(crate) fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Notifier for BellNotifier {
    fn notify(&self, event: NotifyEvent) {
        log::debug!("notify: {event:?}");
        let mut stderr = io::stderr();
        if !self.enabled || !stderr.is_terminal() {
            return;
        }
        // Best effort; the result is not checked.
        let _ = stderr.write_all(b"\x07").and_then(|()| stderr.flush());
    }
}
