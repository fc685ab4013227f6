use crate::integration::events::ControlEvent;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Called after every event so an idle UI knows to repaint
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Sending half of the event channel. Never blocks.
#[derive(Clone)]
pub struct EventSink {
    tx: Sender<ControlEvent>,
    waker: Arc<RwLock<Option<Waker>>>,
}

/// Receiving half of the event channel, drained by the control surface
#[derive(Clone)]
pub struct EventStream {
    rx: Receiver<ControlEvent>,
}

pub fn event_channel() -> (EventSink, EventStream) {
    let (tx, rx) = unbounded();
    (
        EventSink {
            tx,
            waker: Arc::new(RwLock::new(None)),
        },
        EventStream { rx },
    )
}

impl EventSink {
    pub fn emit(&self, event: ControlEvent) {
        trace!("event: {:?}", event);
        if self.tx.send(event).is_err() {
            // receiver gone, nothing left to notify
            return;
        }
        if let Some(waker) = self.waker.read().as_ref() {
            waker();
        }
    }

    pub fn set_waker<F>(&self, waker: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.waker.write() = Some(Arc::new(waker));
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("pending", &self.tx.len())
            .finish()
    }
}

impl EventStream {
    /// Everything queued right now, in order
    pub fn drain(&self) -> Vec<ControlEvent> {
        self.rx.try_iter().collect()
    }

    pub fn try_recv(&self) -> Option<ControlEvent> {
        self.rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<ControlEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_events_arrive_in_order() {
        let (sink, stream) = event_channel();
        sink.emit(ControlEvent::status("one"));
        sink.emit(ControlEvent::ConversationStateChanged(true));

        assert_eq!(
            stream.drain(),
            vec![
                ControlEvent::Status("one".into()),
                ControlEvent::ConversationStateChanged(true)
            ]
        );
        assert!(stream.try_recv().is_none());
    }

    #[test]
    fn test_waker_called_per_event() {
        let (sink, _stream) = event_channel();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        sink.set_waker(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        sink.emit(ControlEvent::HistoryCleared);
        sink.emit(ControlEvent::HistoryCleared);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_emit_after_receiver_dropped() {
        let (sink, stream) = event_channel();
        drop(stream);
        sink.emit(ControlEvent::HistoryCleared);
    }
}
