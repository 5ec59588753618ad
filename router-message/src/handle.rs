//! Per-consumer view onto a shared [`MessageContent`] (spec §3 "Message
//! handle"). Fan-out multicast hands each outgoing link its own handle
//! over the same content; each handle tracks its own read position and
//! its own per-egress annotation overrides, independent of any other
//! handle reading the same message.

use crate::content::{MessageContent, Q2Signal};
use crate::window::{StreamDataWindow, WindowResult};
use bytes::Bytes;
use std::sync::Arc;

/// One egress link's cursor and delivery state over a shared message.
pub struct MessageHandle {
    content: Arc<MessageContent>,
    consumer_id: u64,
    position: usize,
    tag_sent: bool,
    send_complete: bool,
    to_override: Option<String>,
    resend_released: bool,
    window: StreamDataWindow,
}

impl MessageHandle {
    pub fn new(content: Arc<MessageContent>) -> Self {
        let consumer_id = content.register_consumer();
        Self {
            content,
            consumer_id,
            position: 0,
            tag_sent: false,
            send_complete: false,
            to_override: None,
            resend_released: false,
            window: StreamDataWindow::new(),
        }
    }

    pub fn content(&self) -> &Arc<MessageContent> {
        &self.content
    }

    pub fn set_to_override(&mut self, to: Option<String>) {
        self.to_override = to;
    }

    pub fn to_override(&self) -> Option<&str> {
        self.to_override.as_deref()
    }

    pub fn set_resend_released(&mut self, v: bool) {
        self.resend_released = v;
    }

    pub fn resend_released(&self) -> bool {
        self.resend_released
    }

    /// Whether the stream's initial `HEADERS` (carrying the delivery's
    /// identity) has already gone out on this handle.
    pub fn tag_sent(&self) -> bool {
        self.tag_sent
    }

    pub fn mark_tag_sent(&mut self) {
        self.tag_sent = true;
    }

    pub fn send_complete(&self) -> bool {
        self.send_complete
    }

    pub fn mark_send_complete(&mut self) {
        self.send_complete = true;
    }

    /// Synchronize the window against the content's current state and
    /// try to release up to `want` more body bytes.
    pub fn poll_window(&mut self, want: usize) -> WindowResult {
        self.window.set_available(self.content.total_available_bytes());
        if self.content.is_aborted() {
            self.window.abort();
        }
        if self.content.receive_complete() {
            if self
                .content
                .locator(crate::field::Section::Footer)
                .is_some()
            {
                self.window.mark_footer_ready();
            } else {
                self.window.mark_complete();
            }
        }
        self.window.release(want)
    }

    /// Read whatever the window has released since the last call,
    /// advancing this handle's cursor and telling the content it can
    /// reclaim anything strictly behind the new position. Returns
    /// `(None, Unchanged)` if nothing new is available yet.
    pub fn read_released(&mut self) -> (Option<Bytes>, Q2Signal) {
        let released = self.window.released();
        if released <= self.position {
            return (None, Q2Signal::Unchanged);
        }
        let len = released - self.position;
        let Some(bytes) = self.content.read_range(self.position, len) else {
            return (None, Q2Signal::Unchanged);
        };
        self.position += len;
        let signal = self.content.report_consumer_position(self.consumer_id, self.position);
        (Some(bytes), signal)
    }
}

impl Drop for MessageHandle {
    fn drop(&mut self) {
        self.content.unregister_consumer(self.consumer_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_released_bytes_in_order() {
        let content = MessageContent::new();
        content.receive(b"hello world");
        content.mark_receive_complete();

        let mut handle = MessageHandle::new(content);
        assert_eq!(handle.poll_window(5), WindowResult::BodyOk(5));
        assert_eq!(handle.read_released().0.as_deref(), Some(&b"hello"[..]));
        assert_eq!(handle.read_released().0, None);

        assert_eq!(handle.poll_window(100), WindowResult::BodyOk(6));
        assert_eq!(handle.read_released().0.as_deref(), Some(&b" world"[..]));
        assert_eq!(handle.poll_window(1), WindowResult::NoMore);
    }

    #[test]
    fn overrides_are_independent_of_content() {
        let content = MessageContent::new();
        let mut handle = MessageHandle::new(content);
        handle.set_to_override(Some("amqp://mesh/other".to_string()));
        handle.set_resend_released(true);
        assert_eq!(handle.to_override(), Some("amqp://mesh/other"));
        assert!(handle.resend_released());
    }

    #[test]
    fn dropping_a_handle_releases_its_floor() {
        let content = MessageContent::new();
        content.receive(b"hello world");
        content.mark_receive_complete();

        let mut handle = MessageHandle::new(content.clone());
        handle.poll_window(11);
        handle.read_released();
        drop(handle);

        // with the only consumer gone, nothing constrains reclamation
        // and a fresh handle can still read from the start since the
        // whole body fit in one buffer that was never eligible to free.
        let mut fresh = MessageHandle::new(content);
        assert_eq!(fresh.poll_window(11), WindowResult::BodyOk(11));
    }
}
