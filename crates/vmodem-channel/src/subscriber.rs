use std::sync::{Arc, Mutex};

use vmodem_frame::AtResponsePtr;

use crate::conversation::Conversation;
use crate::sync::lock;

/// Receives responses no conversation claimed. Returns `false` to unsubscribe.
pub type ResponseSink = Box<dyn FnMut(&AtResponsePtr) -> bool + Send>;

/// A service that listens to the modem.
///
/// Registered through [`AtChannel::add_subscriber`](crate::AtChannel::add_subscriber),
/// which keeps only a weak reference: a dropped subscriber is unsubscribed
/// the next time a response is delivered.
pub trait ResponseSubscriber: Send + Sync {
    /// The subscriber's own conversation, offered every response first.
    fn conversation(&self) -> Option<&Conversation> {
        None
    }

    /// A response that neither the engine's nor this subscriber's
    /// conversation claimed.
    fn handle_unsolicited(&self, response: &AtResponsePtr);
}

pub(crate) fn weak_sink<T>(subscriber: &Arc<T>) -> ResponseSink
where
    T: ResponseSubscriber + 'static,
{
    let subscriber = Arc::downgrade(subscriber);
    Box::new(move |response| {
        let Some(subscriber) = subscriber.upgrade() else {
            return false;
        };
        let claimed = subscriber
            .conversation()
            .is_some_and(|conversation| conversation.send(response));
        if !claimed {
            subscriber.handle_unsolicited(response);
        }
        true
    })
}

/// Ordered sink list; sinks returning `false` are dropped right after the call.
#[derive(Default)]
pub(crate) struct Subscribers {
    sinks: Mutex<Vec<ResponseSink>>,
}

impl Subscribers {
    pub(crate) fn add(&self, sink: ResponseSink) {
        lock(&self.sinks).push(sink);
    }

    /// Sinks must not register new sinks from inside the call.
    pub(crate) fn broadcast(&self, response: &AtResponsePtr) {
        lock(&self.sinks).retain_mut(|sink| sink(response));
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.sinks).len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use vmodem_frame::{AtResponse, ResponseKind};

    use super::*;

    fn ring() -> AtResponsePtr {
        Arc::new(AtResponse::Ring)
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<ResponseKind>>,
        conversation: Option<Conversation>,
    }

    impl ResponseSubscriber for Recorder {
        fn conversation(&self) -> Option<&Conversation> {
            self.conversation.as_ref()
        }

        fn handle_unsolicited(&self, response: &AtResponsePtr) {
            lock(&self.seen).push(response.kind());
        }
    }

    #[test]
    fn sinks_run_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let subscribers = Subscribers::default();
        for id in 0..3 {
            let order = Arc::clone(&order);
            subscribers.add(Box::new(move |_| {
                lock(&order).push(id);
                true
            }));
        }

        subscribers.broadcast(&ring());
        assert_eq!(*lock(&order), vec![0, 1, 2]);
    }

    #[test]
    fn sink_returning_false_is_pruned() {
        let calls = Arc::new(AtomicUsize::new(0));
        let subscribers = Subscribers::default();
        {
            let calls = Arc::clone(&calls);
            subscribers.add(Box::new(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                false
            }));
        }
        subscribers.add(Box::new(|_| true));

        subscribers.broadcast(&ring());
        subscribers.broadcast(&ring());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(subscribers.len(), 1);
    }

    #[test]
    fn weak_subscriber_receives_until_dropped() {
        let recorder = Arc::new(Recorder::default());
        let subscribers = Subscribers::default();
        subscribers.add(weak_sink(&recorder));

        subscribers.broadcast(&ring());
        assert_eq!(*lock(&recorder.seen), vec![ResponseKind::Ring]);

        drop(recorder);
        subscribers.broadcast(&ring());
        assert_eq!(subscribers.len(), 0);
    }

    #[test]
    fn subscriber_conversation_claims_first() {
        let (host, _modem) = vmodem_transport::HostChannel::pair().unwrap();
        let pipe = crate::RequestPipe::new(host);
        let recorder = Arc::new(Recorder {
            conversation: Some(Conversation::new()),
            ..Recorder::default()
        });
        let mut sink = weak_sink(&recorder);

        let waiter = {
            let recorder = Arc::clone(&recorder);
            std::thread::spawn(move || {
                let conversation = recorder.conversation.as_ref().unwrap();
                conversation.converse(&pipe, "AT+CSQ", |r| r.holds(ResponseKind::Csq))
            })
        };
        while !recorder.conversation.as_ref().unwrap().is_armed() {
            std::thread::yield_now();
        }

        assert!(sink(&ring()));
        assert!(sink(&Arc::new(AtResponse::Ok)));
        let csq = vmodem_frame::ResponseDecoder::new()
            .decode_to_vec(b"+CSQ: 22,99,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1\r")
            .unwrap();
        assert!(sink(&csq[0]));

        assert_eq!(waiter.join().unwrap().unwrap().kind(), ResponseKind::Csq);
        assert_eq!(
            *lock(&recorder.seen),
            vec![ResponseKind::Ring, ResponseKind::Ok]
        );
    }
}
