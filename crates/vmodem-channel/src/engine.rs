//! The channel engine.
//!
//! One request thread drains the requester queue and owns the host channel:
//! it opens the channel on demand, starts a reader thread for it and runs
//! the init sequence before handing out a [`RequestPipe`]. The reader thread
//! parses modem output, offers each response to the engine's conversation
//! and broadcasts whatever is left to the subscribers.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};
use vmodem_frame::{AtResponse, AtResponsePtr, FrameError, ResponseReader};
use vmodem_transport::{HostChannel, HostChannelFactory};

use crate::config::{ChannelConfig, FatalPolicy};
use crate::conversation::Conversation;
use crate::error::{ChannelError, FatalKind, Result};
use crate::init::{CommandSequence, InitSequence};
use crate::pipe::RequestPipe;
use crate::subscriber::{weak_sink, ResponseSink, ResponseSubscriber, Subscribers};
use crate::sync::lock;

/// A unit of work run on the request thread. Returns `false` when the
/// channel should be closed and reopened for the next requester.
pub type Requester = Box<dyn FnOnce(&RequestPipe) -> bool + Send>;

struct Shared {
    queue: Mutex<VecDeque<Option<Requester>>>,
    queue_ready: Condvar,
    subscribers: Subscribers,
    conversation: Arc<Conversation>,
    config: ChannelConfig,
}

impl Shared {
    fn push(&self, requester: Option<Requester>) {
        lock(&self.queue).push_back(requester);
        self.queue_ready.notify_one();
    }

    /// Blocks until a requester is queued; `None` means shut down.
    fn next_requester(&self) -> Option<Requester> {
        let mut queue = lock(&self.queue);
        loop {
            if let Some(item) = queue.pop_front() {
                return item;
            }
            queue = self
                .queue_ready
                .wait(queue)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn dispatch(&self, response: &AtResponsePtr) {
        if self.conversation.send(response) {
            debug!(response = response.what(), "claimed by conversation");
            return;
        }
        debug!(response = response.what(), "unsolicited response");
        self.subscribers.broadcast(response);
    }

    fn fatal(&self, kind: FatalKind, detail: &dyn fmt::Display) {
        error!(kind = %kind, detail = %detail, policy = ?self.config.fatal_policy, "fatal modem channel condition");
        if self.config.fatal_policy == FatalPolicy::Abort {
            std::process::abort();
        }
    }
}

/// AT command channel to one modem.
///
/// Requesters run strictly in submission order, one at a time. Dropping
/// the channel runs the requesters already queued, then closes the host
/// channel and joins both threads.
pub struct AtChannel {
    shared: Arc<Shared>,
    request_thread: Option<JoinHandle<()>>,
}

impl AtChannel {
    /// Channel with the standard init sequence and default configuration.
    pub fn new<F>(factory: F) -> Result<Self>
    where
        F: HostChannelFactory + 'static,
    {
        Self::with_config(factory, CommandSequence::standard(), ChannelConfig::default())
    }

    pub fn with_config<F, I>(factory: F, init: I, config: ChannelConfig) -> Result<Self>
    where
        F: HostChannelFactory + 'static,
        I: InitSequence + 'static,
    {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            queue_ready: Condvar::new(),
            subscribers: Subscribers::default(),
            conversation: Arc::new(Conversation::with_timeout(config.conversation_timeout)),
            config,
        });

        let request_thread = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("vmodem-requests".to_string())
                .spawn(move || run_requests(&shared, &factory, &init))?
        };

        Ok(Self {
            shared,
            request_thread: Some(request_thread),
        })
    }

    /// Queue `requester` to run on the request thread.
    pub fn queue_requester<R>(&self, requester: R)
    where
        R: FnOnce(&RequestPipe) -> bool + Send + 'static,
    {
        self.shared.push(Some(Box::new(requester)));
    }

    /// Register a sink for unsolicited responses; it stays registered until
    /// it returns `false`.
    ///
    /// Sinks run on the reader thread and must not wait on requests.
    pub fn add_response_sink<S>(&self, sink: S)
    where
        S: FnMut(&AtResponsePtr) -> bool + Send + 'static,
    {
        self.add_boxed_sink(Box::new(sink));
    }

    /// Register `subscriber` without keeping it alive.
    pub fn add_subscriber<T>(&self, subscriber: &Arc<T>)
    where
        T: ResponseSubscriber + 'static,
    {
        self.add_boxed_sink(weak_sink(subscriber));
    }

    fn add_boxed_sink(&self, sink: ResponseSink) {
        self.shared.subscribers.add(sink);
    }

    /// The engine's own conversation, offered every response before the
    /// subscribers.
    pub fn conversation(&self) -> &Arc<Conversation> {
        &self.shared.conversation
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.shared.config
    }

    /// Queue a requester that sends `command` on the engine's conversation
    /// and wait for the response `filter` accepts.
    ///
    /// A requester whose command got no response at all reports the channel
    /// as broken, so the next requester reopens it.
    pub fn request<F>(&self, command: &str, filter: F) -> Result<AtResponsePtr>
    where
        F: Fn(&AtResponse) -> bool + Send + 'static,
    {
        let (reply, result) = mpsc::sync_channel(1);
        let conversation = Arc::clone(&self.shared.conversation);
        let command = command.to_string();

        self.queue_requester(move |pipe| {
            let outcome = conversation.converse(pipe, &command, filter);
            let healthy = !matches!(&outcome, Err(err) if err.breaks_channel());
            let _ = reply.send(outcome);
            healthy
        });

        result.recv().unwrap_or(Err(ChannelError::ShutDown))
    }
}

impl Drop for AtChannel {
    fn drop(&mut self) {
        self.shared.push(None);
        if let Some(handle) = self.request_thread.take() {
            if handle.join().is_err() {
                error!("request thread panicked");
            }
        }
    }
}

impl fmt::Debug for AtChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtChannel")
            .field("config", &self.shared.config)
            .field("conversation", &self.shared.conversation)
            .finish_non_exhaustive()
    }
}

/// An open host channel with its reader thread.
struct Link {
    pipe: RequestPipe,
    stop: Arc<AtomicBool>,
    broken: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    transport: &'static str,
}

impl Link {
    fn spawn(channel: HostChannel, shared: &Arc<Shared>) -> Result<Self> {
        let transport = channel.transport_name();
        let reader_channel = channel.try_clone()?;
        let stop = Arc::new(AtomicBool::new(false));
        let broken = Arc::new(AtomicBool::new(false));

        let reader = {
            let shared = Arc::clone(shared);
            let stop = Arc::clone(&stop);
            let broken = Arc::clone(&broken);
            thread::Builder::new()
                .name("vmodem-reader".to_string())
                .spawn(move || read_responses(reader_channel, &shared, &stop, &broken))?
        };

        Ok(Self {
            pipe: RequestPipe::new(channel),
            stop,
            broken,
            reader: Some(reader),
            transport,
        })
    }

    fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }

    fn close(mut self) {
        self.pipe.close();
        self.stop.store(true, Ordering::Release);
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                error!("reader thread panicked");
            }
        }
        info!(transport = self.transport, "modem channel closed");
    }
}

fn run_requests(shared: &Arc<Shared>, factory: &dyn HostChannelFactory, init: &dyn InitSequence) {
    debug!("request thread started");
    let mut link: Option<Link> = None;

    while let Some(requester) = shared.next_requester() {
        if let Some(stale) = link.take_if(|link| link.is_broken()) {
            stale.close();
        }
        if link.is_none() {
            link = open_link(shared, factory, init);
        }
        let Some(active) = link.as_ref() else {
            warn!("modem channel unavailable, dropping requester");
            continue;
        };

        if !requester(&active.pipe) {
            warn!("requester reported a channel failure");
            if let Some(failed) = link.take() {
                failed.close();
            }
        }
    }

    if let Some(link) = link.take() {
        link.close();
    }
    debug!("request thread exiting");
}

fn open_link(
    shared: &Arc<Shared>,
    factory: &dyn HostChannelFactory,
    init: &dyn InitSequence,
) -> Option<Link> {
    let config = &shared.config;
    let attempts = config.open_attempts.max(1);

    let mut attempt = 1;
    let channel = loop {
        match factory.open() {
            Ok(channel) => break channel,
            Err(err) if attempt < attempts => {
                warn!(attempt, attempts, error = %err, "can't open host channel, retrying");
                thread::sleep(config.open_backoff);
                attempt += 1;
            }
            Err(err) => {
                shared.fatal(FatalKind::OpenFailed, &err);
                return None;
            }
        }
    };

    let link = match Link::spawn(channel, shared) {
        Ok(link) => link,
        Err(err) => {
            shared.fatal(FatalKind::OpenFailed, &err);
            return None;
        }
    };

    if let Err(err) = init.run(&link.pipe, &shared.conversation) {
        shared.fatal(FatalKind::InitSequence, &err);
        link.close();
        return None;
    }

    info!(transport = link.transport, "modem channel open");
    Some(link)
}

fn read_responses(channel: HostChannel, shared: &Shared, stop: &AtomicBool, broken: &AtomicBool) {
    let config = &shared.config;
    let mut reader = ResponseReader::with_config(channel, config.reader.clone());
    debug!("reader thread started");

    while !stop.load(Ordering::Acquire) {
        match reader.get_ref().wait_readable(config.read_poll_interval) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(error = %err, "can't poll host channel");
                thread::sleep(config.read_error_backoff);
                continue;
            }
        }

        match reader.read_responses(|response| shared.dispatch(&response)) {
            Ok(_) => {}
            Err(FrameError::ConnectionClosed) => {
                warn!("modem closed the host channel");
                broken.store(true, Ordering::Release);
                break;
            }
            Err(err) if err.is_stream_failure() => {
                broken.store(true, Ordering::Release);
                shared.fatal(FatalKind::UnparseableStream, &err);
                break;
            }
            Err(err) => {
                warn!(error = %err, "can't read from host channel");
                thread::sleep(config.read_error_backoff);
            }
        }
    }

    debug!("reader thread exiting");
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use vmodem_frame::ResponseKind;

    use super::*;

    /// Reply to one request line; `None` hangs up.
    type Script = fn(&str) -> Option<&'static str>;

    fn standard_modem(request: &str) -> Option<&'static str> {
        match request {
            "AT+CFUN?" => Some("+CFUN: 1\rOK\r"),
            "AT+CSQ" => Some("+CSQ: 22,99,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1\rOK\r"),
            "AT+COPS?" => Some(
                "+COPS: 0,0,Android Virtual Operator\r+COPS: 0,1,Android\r+COPS: 0,2,310260\rOK\r",
            ),
            "AT+CIMI" => Some("310260000000001\rOK\r"),
            "AT+SILENT" => Some(""),
            "AT+HANGUP" => None,
            "AT+GARBAGE" => Some("+NOPE: 1\r"),
            _ => Some("OK\r"),
        }
    }

    /// In-process modem: every open hands out a fresh socket pair and
    /// serves the far end from a thread.
    struct FakeModem {
        opens: Arc<AtomicUsize>,
        ends: Arc<Mutex<Vec<HostChannel>>>,
    }

    impl FakeModem {
        fn factory(script: Script) -> (Self, impl HostChannelFactory + 'static) {
            let opens = Arc::new(AtomicUsize::new(0));
            let ends = Arc::new(Mutex::new(Vec::new()));
            let modem = Self {
                opens: Arc::clone(&opens),
                ends: Arc::clone(&ends),
            };
            let factory = move || -> vmodem_transport::Result<HostChannel> {
                let (host, modem) = HostChannel::pair()?;
                lock(&ends).push(modem.try_clone()?);
                opens.fetch_add(1, Ordering::SeqCst);
                thread::spawn(move || serve(modem, script));
                Ok(host)
            };
            (modem, factory)
        }

        fn opens(&self) -> usize {
            self.opens.load(Ordering::SeqCst)
        }

        /// Push unsolicited output on the most recent connection.
        fn inject(&self, wire: &[u8]) {
            let ends = lock(&self.ends);
            let mut end = ends.last().unwrap();
            end.write_all(wire).unwrap();
        }
    }

    fn serve(mut modem: HostChannel, script: Script) {
        let mut line = Vec::new();
        let mut buf = [0u8; 64];
        loop {
            let n = match modem.read(&mut buf) {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            for &byte in &buf[..n] {
                if byte != b'\r' {
                    line.push(byte);
                    continue;
                }
                let request = String::from_utf8_lossy(&line).into_owned();
                line.clear();
                match script(&request) {
                    Some(reply) => {
                        if modem.write_all(reply.as_bytes()).is_err() {
                            return;
                        }
                    }
                    None => {
                        let _ = modem.shutdown();
                        return;
                    }
                }
            }
        }
    }

    fn test_config() -> ChannelConfig {
        ChannelConfig {
            conversation_timeout: Duration::from_millis(300),
            open_attempts: 2,
            open_backoff: Duration::from_millis(1),
            read_poll_interval: Duration::from_millis(10),
            ..ChannelConfig::default()
        }
    }

    fn channel(script: Script) -> (AtChannel, FakeModem) {
        let (modem, factory) = FakeModem::factory(script);
        let channel =
            AtChannel::with_config(factory, CommandSequence::standard(), test_config()).unwrap();
        (channel, modem)
    }

    fn kind_sink(channel: &AtChannel) -> mpsc::Receiver<ResponseKind> {
        let (tx, rx) = mpsc::channel();
        channel.add_response_sink(move |response| tx.send(response.kind()).is_ok());
        rx
    }

    fn wait_for(rx: &mpsc::Receiver<ResponseKind>, kind: ResponseKind) -> Vec<ResponseKind> {
        let mut seen = Vec::new();
        loop {
            let next = rx.recv_timeout(Duration::from_secs(2)).unwrap();
            seen.push(next);
            if next == kind {
                return seen;
            }
        }
    }

    #[test]
    fn opens_lazily_and_answers_requests() {
        let (channel, modem) = channel(standard_modem);
        assert_eq!(modem.opens(), 0);

        let reply = channel
            .request("AT+CFUN?", |r| r.holds(ResponseKind::Cfun))
            .unwrap();
        match &*reply {
            AtResponse::Cfun(cfun) => assert_eq!(cfun.state, vmodem_frame::response::RadioState::On),
            other => panic!("unexpected reply {other:?}"),
        }
        assert_eq!(modem.opens(), 1);
    }

    #[test]
    fn multiline_and_text_replies() {
        let (channel, _modem) = channel(standard_modem);

        let cops = channel
            .request("AT+COPS?", |r| r.holds(ResponseKind::Cops))
            .unwrap();
        assert!(matches!(&*cops, AtResponse::Cops(cops) if cops.current().is_some()));

        let imsi = channel
            .request("AT+CIMI", |r| r.holds(ResponseKind::Text))
            .unwrap();
        assert_eq!(*imsi, AtResponse::Text("310260000000001".to_string()));
    }

    #[test]
    fn claimed_replies_are_not_broadcast() {
        let (channel, _modem) = channel(standard_modem);
        let kinds = kind_sink(&channel);

        channel.request("AT", |r| r.is_ok()).unwrap();
        channel
            .request("AT+CSQ", |r| r.holds(ResponseKind::Csq))
            .unwrap();

        // The OK trailing the signal report is the next unsolicited response.
        let seen = wait_for(&kinds, ResponseKind::Ok);
        assert!(!seen.contains(&ResponseKind::Csq), "{seen:?}");
    }

    #[test]
    fn unsolicited_responses_reach_subscribers_in_order() {
        let (channel, modem) = channel(standard_modem);
        let first = kind_sink(&channel);
        let second = kind_sink(&channel);
        channel.request("AT", |r| r.is_ok()).unwrap();

        modem.inject(b"RING\r+CREG: 1,\"00C3\",\"0000001A\",7\r");

        for rx in [&first, &second] {
            let seen = wait_for(rx, ResponseKind::Creg);
            assert_eq!(&seen[seen.len() - 2..], [ResponseKind::Ring, ResponseKind::Creg]);
        }
    }

    #[test]
    fn sink_returning_false_is_unsubscribed() {
        let (channel, modem) = channel(standard_modem);
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let calls = Arc::clone(&calls);
            channel.add_response_sink(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                false
            });
        }
        let kinds = kind_sink(&channel);
        channel.request("AT", |r| r.is_ok()).unwrap();

        modem.inject(b"RING\r");
        wait_for(&kinds, ResponseKind::Ring);
        modem.inject(b"RING\r");
        wait_for(&kinds, ResponseKind::Ring);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn timed_out_reply_goes_to_subscribers() {
        let (channel, modem) = channel(standard_modem);
        let kinds = kind_sink(&channel);

        let err = channel
            .request("AT+SILENT", |r| r.holds(ResponseKind::Cgla))
            .unwrap_err();
        assert!(matches!(err, ChannelError::Timeout(_)));

        modem.inject(b"+CGLA: 4,9000\r");
        wait_for(&kinds, ResponseKind::Cgla);
    }

    #[test]
    fn requesters_run_in_submission_order() {
        let (channel, _modem) = channel(standard_modem);
        let order = Arc::new(Mutex::new(Vec::new()));
        for id in 0..10 {
            let order = Arc::clone(&order);
            channel.queue_requester(move |_| {
                lock(&order).push(id);
                true
            });
        }
        channel.request("AT", |r| r.is_ok()).unwrap();
        assert_eq!(*lock(&order), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn failed_requester_forces_reopen_and_stale_pipe_is_closed() {
        let (channel, modem) = channel(standard_modem);
        let (tx, stale) = mpsc::channel();
        channel.queue_requester(move |pipe| {
            let _ = tx.send(pipe.clone());
            false
        });

        channel.request("AT", |r| r.is_ok()).unwrap();

        assert_eq!(modem.opens(), 2);
        let stale = stale.recv().unwrap();
        assert!(matches!(stale.send("AT"), Err(ChannelError::PipeClosed)));
    }

    #[test]
    fn hangup_is_followed_by_reopen() {
        let (channel, modem) = channel(standard_modem);

        let err = channel
            .request("AT+HANGUP", |r| r.is_ok())
            .unwrap_err();
        assert!(err.is_no_response());

        channel.request("AT", |r| r.is_ok()).unwrap();
        assert_eq!(modem.opens(), 2);
    }

    #[test]
    fn unparseable_stream_resets_the_channel() {
        let (channel, modem) = channel(standard_modem);

        let err = channel
            .request("AT+GARBAGE", |r| r.is_ok())
            .unwrap_err();
        assert!(matches!(err, ChannelError::Timeout(_)));

        channel.request("AT", |r| r.is_ok()).unwrap();
        assert_eq!(modem.opens(), 2);
    }

    #[test]
    fn open_failure_drops_the_requester() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let factory = {
            let attempts = Arc::clone(&attempts);
            move || -> vmodem_transport::Result<HostChannel> {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(vmodem_transport::TransportError::InvalidSpec("no modem".to_string()))
            }
        };
        let channel =
            AtChannel::with_config(factory, CommandSequence::standard(), test_config()).unwrap();

        let err = channel.request("AT", |r| r.is_ok()).unwrap_err();
        assert!(matches!(err, ChannelError::ShutDown));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn init_failure_drops_the_requester() {
        let (modem, factory) = FakeModem::factory(|request| match request {
            "AT+CMEE=1" => Some("ERROR\r"),
            _ => Some("OK\r"),
        });
        let channel =
            AtChannel::with_config(factory, CommandSequence::standard(), test_config()).unwrap();

        let err = channel.request("AT", |r| r.is_ok()).unwrap_err();
        assert!(matches!(err, ChannelError::ShutDown));
        assert_eq!(modem.opens(), 1);
    }

    #[test]
    fn weak_subscriber_is_not_kept_alive() {
        struct Counter(AtomicUsize);

        impl ResponseSubscriber for Counter {
            fn handle_unsolicited(&self, _response: &AtResponsePtr) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let (channel, modem) = channel(standard_modem);
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        channel.add_subscriber(&counter);
        let kinds = kind_sink(&channel);
        channel.request("AT", |r| r.is_ok()).unwrap();

        modem.inject(b"RING\r");
        wait_for(&kinds, ResponseKind::Ring);
        assert_eq!(Arc::strong_count(&counter), 1);
        assert!(counter.0.load(Ordering::SeqCst) >= 1);

        drop(counter);
        modem.inject(b"RING\r");
        wait_for(&kinds, ResponseKind::Ring);
        assert_eq!(channel.shared.subscribers.len(), 1);
    }

    #[test]
    fn drop_runs_queued_requesters_then_joins() {
        let (channel, _modem) = channel(standard_modem);
        let ran = Arc::new(AtomicBool::new(false));
        {
            let ran = Arc::clone(&ran);
            channel.queue_requester(move |pipe| {
                ran.store(true, Ordering::SeqCst);
                pipe.send("AT").is_ok()
            });
        }
        drop(channel);
        assert!(ran.load(Ordering::SeqCst));
    }
}
