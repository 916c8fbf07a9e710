//! Emulated modem: a scripted modem on a Unix socket driven through an
//! [`AtChannel`].
//!
//! Run with:
//!   cargo run --example emulated-modem
//!
//! Or keep only the modem running and talk to it with the CLI:
//!   cargo run --example emulated-modem -- serve
//!   cargo run --features cli -- send unix:/tmp/vmodem-emulated/modem.sock AT+CSQ

use std::fs;
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use vmodem::channel::{AtChannel, IdAllocator, ResponseSubscriber};
use vmodem::frame::{AtResponse, AtResponsePtr, ResponseKind};
use vmodem::transport::HostChannelSpec;

fn reply(request: &str) -> &'static str {
    match request {
        "AT+CFUN?" => "+CFUN: 1\r\nOK\r\n",
        "AT+CSQ" => "+CSQ: 22,99,-1,-1,-1,-1,-1,-1,-1,-1,-1,-1\r\nOK\r\n",
        "AT+CREG?" => "+CREG: 2,1,\"00C3\",\"0000001A\",7\r\nOK\r\n",
        "AT+COPS?" => "+COPS: 0,0,\"Example Mobile\"\r+COPS: 0,1,\"Example\"\r+COPS: 0,2,\"310260\"\rOK\r",
        "AT+CIMI" => "310260000000001\r\nOK\r\n",
        "ATD" => "OK\r\nRING\r\n",
        _ => "OK\r\n",
    }
}

fn serve_one(mut stream: UnixStream) {
    let mut request = Vec::new();
    let mut byte = [0u8; 1];
    while let Ok(1) = stream.read(&mut byte) {
        if byte[0] != b'\r' {
            request.push(byte[0]);
            continue;
        }
        let text = String::from_utf8_lossy(&request).into_owned();
        request.clear();
        eprintln!("[modem] <- {text}");
        if stream.write_all(reply(&text).as_bytes()).is_err() {
            break;
        }
    }
    eprintln!("[modem] driver disconnected");
}

fn serve(listener: UnixListener) {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                thread::spawn(move || serve_one(stream));
            }
            Err(e) => {
                eprintln!("[modem] accept failed: {e}");
                break;
            }
        }
    }
}

/// Tracks incoming calls: every `RING` takes a call id.
#[derive(Default)]
struct CallTracker {
    ids: Mutex<IdAllocator>,
    calls: Mutex<Vec<u32>>,
}

impl ResponseSubscriber for CallTracker {
    fn handle_unsolicited(&self, response: &AtResponsePtr) {
        if !response.holds(ResponseKind::Ring) {
            eprintln!("[driver] unsolicited {response}");
            return;
        }
        let Ok(mut ids) = self.ids.lock() else {
            return;
        };
        let id = ids.get();
        eprintln!("[driver] incoming call, id {id}");
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(id);
        }
    }
}

fn bind(sock_path: &Path) -> std::io::Result<UnixListener> {
    let _ = fs::remove_file(sock_path);
    UnixListener::bind(sock_path)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sock_dir = std::env::temp_dir().join("vmodem-emulated");
    fs::create_dir_all(&sock_dir)?;
    let sock_path = sock_dir.join("modem.sock");
    let listener = bind(&sock_path)?;
    eprintln!("[modem] listening on {}", sock_path.display());

    if std::env::args().nth(1).as_deref() == Some("serve") {
        serve(listener);
        return Ok(());
    }
    thread::spawn(move || serve(listener));

    let channel = AtChannel::new(HostChannelSpec::Socket(sock_path.clone()))?;
    let tracker = Arc::new(CallTracker::default());
    channel.add_subscriber(&tracker);

    let csq = channel.request("AT+CSQ", |r: &AtResponse| r.holds(ResponseKind::Csq))?;
    if let AtResponse::Csq(csq) = csq.as_ref() {
        eprintln!("[driver] gsm signal strength {}", csq.gsm.signal_strength);
    }

    let imsi = channel.request("AT+CIMI", |r: &AtResponse| r.holds(ResponseKind::Text))?;
    eprintln!("[driver] imsi {imsi:?}");

    let operators = channel.request("AT+COPS?", |r: &AtResponse| r.holds(ResponseKind::Cops))?;
    eprintln!("[driver] operators {operators:?}");

    channel.request("ATD", AtResponse::is_final)?;
    thread::sleep(Duration::from_millis(200));

    if let Ok(mut calls) = tracker.calls.lock() {
        if let Ok(mut ids) = tracker.ids.lock() {
            for id in calls.drain(..) {
                ids.put(id);
                eprintln!("[driver] call {id} ended");
            }
        }
    }

    drop(channel);
    let _ = fs::remove_dir_all(&sock_dir);
    Ok(())
}
