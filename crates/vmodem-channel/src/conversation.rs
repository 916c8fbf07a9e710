//! Single-slot request/reply rendezvous.
//!
//! A conversation holds at most one armed filter. The reader thread offers
//! every parsed response to [`Conversation::send`]; the first response the
//! filter accepts is handed to the waiting caller and disarms the slot.

use std::sync::mpsc::{self, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};
use vmodem_frame::{AtResponse, AtResponsePtr};

use crate::config::DEFAULT_CONVERSATION_TIMEOUT;
use crate::error::{ChannelError, Result};
use crate::pipe::RequestPipe;
use crate::sync::lock;

type Filter = Box<dyn Fn(&AtResponse) -> bool + Send>;

#[derive(Default)]
struct Slot {
    filter: Option<Filter>,
    reply: Option<SyncSender<AtResponsePtr>>,
}

pub struct Conversation {
    slot: Mutex<Slot>,
    timeout: Duration,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_CONVERSATION_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            slot: Mutex::new(Slot::default()),
            timeout,
        }
    }

    /// Default timeout of [`converse`](Self::converse).
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send `request` and wait for the first response `filter` accepts.
    pub fn converse<F>(&self, pipe: &RequestPipe, request: &str, filter: F) -> Result<AtResponsePtr>
    where
        F: Fn(&AtResponse) -> bool + Send + 'static,
    {
        self.converse_with_timeout(pipe, request, filter, self.timeout)
    }

    /// [`converse`](Self::converse) with an explicit timeout.
    ///
    /// A reply arriving after the timeout is not returned here; it is
    /// offered to subscribers like any unsolicited response.
    pub fn converse_with_timeout<F>(
        &self,
        pipe: &RequestPipe,
        request: &str,
        filter: F,
        timeout: Duration,
    ) -> Result<AtResponsePtr>
    where
        F: Fn(&AtResponse) -> bool + Send + 'static,
    {
        let (reply, waiter) = mpsc::sync_channel(1);
        {
            let mut slot = lock(&self.slot);
            if slot.filter.is_some() {
                return Err(ChannelError::ConversationBusy);
            }
            slot.filter = Some(Box::new(filter));
            slot.reply = Some(reply);
        }

        if let Err(err) = pipe.send(request) {
            self.disarm();
            return Err(err);
        }

        match waiter.recv_timeout(timeout) {
            Ok(response) => {
                debug!(request, response = response.what(), "conversation complete");
                Ok(response)
            }
            Err(RecvTimeoutError::Timeout) => {
                self.disarm();
                // Claimed between the deadline and the disarm.
                if let Ok(response) = waiter.try_recv() {
                    return Ok(response);
                }
                warn!(request, ?timeout, "no response");
                Err(ChannelError::Timeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(ChannelError::ShutDown),
        }
    }

    /// Offer `response` to the armed filter. Returns whether it was claimed.
    pub fn send(&self, response: &AtResponsePtr) -> bool {
        let mut slot = lock(&self.slot);
        let claimed = slot.filter.as_ref().is_some_and(|filter| filter(response));
        if claimed {
            slot.filter = None;
            if let Some(reply) = slot.reply.take() {
                let _ = reply.try_send(Arc::clone(response));
            }
        }
        claimed
    }

    /// Whether a caller is currently waiting.
    pub fn is_armed(&self) -> bool {
        lock(&self.slot).filter.is_some()
    }

    fn disarm(&self) {
        let mut slot = lock(&self.slot);
        slot.filter = None;
        slot.reply = None;
    }
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("armed", &self.is_armed())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::thread;
    use std::time::Instant;

    use vmodem_frame::{ResponseDecoder, ResponseKind};
    use vmodem_transport::HostChannel;

    use super::*;

    fn response(wire: &[u8]) -> AtResponsePtr {
        let mut decoder = ResponseDecoder::new();
        let mut responses = decoder.decode_to_vec(wire).unwrap();
        assert_eq!(responses.len(), 1);
        responses.remove(0)
    }

    /// Reads one request line from the modem side of the pair.
    fn read_request(modem: &mut HostChannel) -> String {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        while modem.read(&mut byte).unwrap() == 1 && byte[0] != b'\r' {
            line.push(byte[0]);
        }
        String::from_utf8(line).unwrap()
    }

    #[test]
    fn send_without_armed_filter_is_unclaimed() {
        let conversation = Conversation::new();
        assert!(!conversation.send(&response(b"RING\r")));
    }

    #[test]
    fn matching_reply_is_returned() {
        let (host, mut modem) = HostChannel::pair().unwrap();
        let pipe = RequestPipe::new(host);
        let conversation = Arc::new(Conversation::new());

        let reader = {
            let conversation = Arc::clone(&conversation);
            thread::spawn(move || {
                assert_eq!(read_request(&mut modem), "AT+CFUN?");
                // Not the filter's kind: stays unclaimed.
                assert!(!conversation.send(&response(b"RING\r")));
                while !conversation.send(&response(b"+CFUN: 1\r")) {
                    thread::yield_now();
                }
            })
        };

        let reply = conversation
            .converse(&pipe, "AT+CFUN?", |r| r.holds(ResponseKind::Cfun))
            .unwrap();
        reader.join().unwrap();

        assert_eq!(reply.kind(), ResponseKind::Cfun);
        assert!(!conversation.is_armed());
    }

    #[test]
    fn parse_error_releases_the_waiter() {
        let (host, mut modem) = HostChannel::pair().unwrap();
        let pipe = RequestPipe::new(host);
        let conversation = Arc::new(Conversation::new());

        let reader = {
            let conversation = Arc::clone(&conversation);
            thread::spawn(move || {
                read_request(&mut modem);
                let bad = response(b"+CFUN: x\r");
                while !conversation.send(&bad) {
                    thread::yield_now();
                }
            })
        };

        let reply = conversation
            .converse(&pipe, "AT+CFUN?", |r| r.holds(ResponseKind::Cfun))
            .unwrap();
        reader.join().unwrap();
        assert!(reply.is_parse_error());
    }

    #[test]
    fn timeout_then_late_reply_is_unclaimed() {
        let (host, _modem) = HostChannel::pair().unwrap();
        let pipe = RequestPipe::new(host);
        let conversation = Conversation::with_timeout(Duration::from_millis(50));

        let started = Instant::now();
        let err = conversation
            .converse(&pipe, "AT+CSQ", |r| r.holds(ResponseKind::Csq))
            .unwrap_err();

        assert!(matches!(err, ChannelError::Timeout(t) if t == Duration::from_millis(50)));
        assert!(err.is_no_response());
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(!conversation.is_armed());
        assert!(!conversation.send(&response(b"+CSQ: 22,99,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1\r")));
    }

    #[test]
    fn closed_pipe_disarms_immediately() {
        let (host, _modem) = HostChannel::pair().unwrap();
        let pipe = RequestPipe::new(host);
        pipe.close();
        let conversation = Conversation::new();

        let err = conversation.converse(&pipe, "AT", |r| r.is_ok()).unwrap_err();
        assert!(matches!(err, ChannelError::PipeClosed));
        assert!(!conversation.is_armed());
    }

    #[test]
    fn second_waiter_is_rejected() {
        let (host, _modem) = HostChannel::pair().unwrap();
        let pipe = RequestPipe::new(host);
        let conversation = Arc::new(Conversation::with_timeout(Duration::from_secs(2)));

        let first = {
            let conversation = Arc::clone(&conversation);
            let pipe = pipe.clone();
            thread::spawn(move || conversation.converse(&pipe, "AT+CSQ", |r| r.holds(ResponseKind::Csq)))
        };
        while !conversation.is_armed() {
            thread::yield_now();
        }

        let err = conversation.converse(&pipe, "AT", |r| r.is_ok()).unwrap_err();
        assert!(matches!(err, ChannelError::ConversationBusy));

        assert!(conversation.send(&response(b"+CSQ: 22,99,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1\r")));
        assert_eq!(first.join().unwrap().unwrap().kind(), ResponseKind::Csq);
    }
}
