//! Recognizes one complete response at the start of a byte span.
//!
//! Commands are matched against a table keyed by sigil (`+`, `%`, `^`).
//! Single-line commands end at the next `\r`; multi-line commands run up to
//! and including a `\rOK\r` trailer and keep every `+TAG:` header in their
//! payload. Anything else is a fixed token (`RING`, `OK`, `ERROR`, the SMS
//! prompt) or free text terminated by `\rOK\r`.

use std::borrow::Cow;

use tracing::{debug, warn};

use crate::parser::Parser;
use crate::response::{
    AtResponse, Ccss, Cds, Cfun, Cgcontrdp, Cgdcont, Cgfpccfg, Cgla, Clcc, Clck, Clip, Clir,
    CmeError, Cmgs, Cmgw, CmsError, Cmt, Cmut, Cops, Cpin, Cpinr, Crsm, Csca, Cscb, Csim, Csq,
    Ctec, Ctzv, Cusatd, Cusate, Cusatp, Cusatt, Ccfcu, Ccwa, Mbau, Registration, ResponseKind,
    Wrmp, Wsos,
};

const RING: &[u8] = b"RING\r";
const SMS_PROMPT: &[u8] = b"> \r";
const OK: &[u8] = b"OK\r";
const ERROR: &[u8] = b"ERROR\r";
const CMT_HEADER: &[u8] = b"+CMT:";
const CDS_HEADER: &[u8] = b"+CDS:";

/// Terminates multi-line commands and free text.
pub const OK_TRAILER: &[u8] = b"\rOK\r";

/// What the grammar made of the start of a span.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// A response spanning the first `consumed` bytes.
    Complete {
        consumed: usize,
        response: AtResponse,
    },
    /// The span may be the start of a response; wait for more bytes.
    Incomplete,
    /// The span cannot be the start of any response.
    Failed,
}

struct Command {
    kind: ResponseKind,
    multiline: bool,
    parse: fn(&str) -> Option<AtResponse>,
}

impl Command {
    fn tag(&self) -> &'static [u8] {
        self.kind.as_str().as_bytes()
    }

    fn apply(&self, payload: &[u8]) -> AtResponse {
        let text = String::from_utf8_lossy(payload);
        match (self.parse)(&text) {
            Some(response) => response,
            None => {
                warn!(tag = self.kind.as_str(), payload = %text.escape_debug(), "can't parse response");
                AtResponse::ParseError(self.kind)
            }
        }
    }
}

static PLUS_COMMANDS: &[Command] = &[
    Command { kind: ResponseKind::Cpin, multiline: false, parse: |s| Cpin::parse(s).map(AtResponse::Cpin) },
    Command { kind: ResponseKind::Cpinr, multiline: false, parse: |s| Cpinr::parse(s).map(AtResponse::Cpinr) },
    Command { kind: ResponseKind::Crsm, multiline: false, parse: |s| Crsm::parse(s).map(AtResponse::Crsm) },
    Command { kind: ResponseKind::Cfun, multiline: false, parse: |s| Cfun::parse(s).map(AtResponse::Cfun) },
    Command { kind: ResponseKind::Creg, multiline: false, parse: |s| Registration::parse(s).map(AtResponse::Creg) },
    Command { kind: ResponseKind::Cereg, multiline: false, parse: |s| Registration::parse(s).map(AtResponse::Cereg) },
    Command { kind: ResponseKind::Cgreg, multiline: false, parse: |s| Registration::parse(s).map(AtResponse::Cgreg) },
    Command { kind: ResponseKind::Ctec, multiline: false, parse: |s| Ctec::parse(s).map(AtResponse::Ctec) },
    Command { kind: ResponseKind::Cops, multiline: true, parse: |s| Cops::parse(s).map(AtResponse::Cops) },
    Command { kind: ResponseKind::Wrmp, multiline: false, parse: |s| Wrmp::parse(s).map(AtResponse::Wrmp) },
    Command { kind: ResponseKind::Ccss, multiline: false, parse: |s| Ccss::parse(s).map(AtResponse::Ccss) },
    Command { kind: ResponseKind::Csq, multiline: false, parse: |s| Csq::parse(s).map(AtResponse::Csq) },
    Command { kind: ResponseKind::Clcc, multiline: true, parse: |s| Clcc::parse(s).map(AtResponse::Clcc) },
    Command { kind: ResponseKind::Ccfcu, multiline: true, parse: |s| Ccfcu::parse(s).map(AtResponse::Ccfcu) },
    Command { kind: ResponseKind::Ccwa, multiline: false, parse: |s| Ccwa::parse(s).map(AtResponse::Ccwa) },
    Command { kind: ResponseKind::Cusatd, multiline: false, parse: |s| Cusatd::parse(s).map(AtResponse::Cusatd) },
    Command { kind: ResponseKind::Cusatp, multiline: false, parse: |s| Some(AtResponse::Cusatp(Cusatp { cmd: s.to_string() })) },
    Command { kind: ResponseKind::Cusate, multiline: false, parse: |s| Some(AtResponse::Cusate(Cusate { response: s.to_string() })) },
    Command { kind: ResponseKind::Cusatt, multiline: false, parse: |s| Cusatt::parse(s).map(AtResponse::Cusatt) },
    Command { kind: ResponseKind::Cusatend, multiline: false, parse: |_| Some(AtResponse::Cusatend) },
    Command { kind: ResponseKind::Cgdcont, multiline: true, parse: |s| Cgdcont::parse(s).map(AtResponse::Cgdcont) },
    Command { kind: ResponseKind::Cgcontrdp, multiline: false, parse: |s| Cgcontrdp::parse(s).map(AtResponse::Cgcontrdp) },
    Command { kind: ResponseKind::Clck, multiline: false, parse: |s| Clck::parse(s).map(AtResponse::Clck) },
    Command { kind: ResponseKind::Csim, multiline: false, parse: |s| Csim::parse(s).map(AtResponse::Csim) },
    Command { kind: ResponseKind::Cgla, multiline: false, parse: |s| Cgla::parse(s).map(AtResponse::Cgla) },
    Command { kind: ResponseKind::Cchc, multiline: false, parse: |_| Some(AtResponse::Cchc) },
    Command { kind: ResponseKind::Clip, multiline: false, parse: |s| Clip::parse(s).map(AtResponse::Clip) },
    Command { kind: ResponseKind::Clir, multiline: false, parse: |s| Clir::parse(s).map(AtResponse::Clir) },
    Command { kind: ResponseKind::Cmut, multiline: false, parse: |s| Cmut::parse(s).map(AtResponse::Cmut) },
    Command { kind: ResponseKind::Wsos, multiline: false, parse: |s| Wsos::parse(s).map(AtResponse::Wsos) },
    Command { kind: ResponseKind::Csca, multiline: false, parse: |s| Csca::parse(s).map(AtResponse::Csca) },
    Command { kind: ResponseKind::Cscb, multiline: false, parse: |s| Cscb::parse(s).map(AtResponse::Cscb) },
    Command { kind: ResponseKind::Cmgs, multiline: false, parse: |s| Cmgs::parse(s).map(AtResponse::Cmgs) },
    Command { kind: ResponseKind::Cmgw, multiline: false, parse: |s| Cmgw::parse(s).map(AtResponse::Cmgw) },
    Command { kind: ResponseKind::CmeError, multiline: false, parse: |s| CmeError::parse(s).map(AtResponse::CmeError) },
    Command { kind: ResponseKind::CmsError, multiline: false, parse: |s| CmsError::parse(s).map(AtResponse::CmsError) },
];

static PERCENT_COMMANDS: &[Command] = &[
    Command { kind: ResponseKind::Ctzv, multiline: false, parse: |s| Ctzv::parse(s).map(AtResponse::Ctzv) },
    Command { kind: ResponseKind::Cgfpccfg, multiline: false, parse: |s| Cgfpccfg::parse(s).map(AtResponse::Cgfpccfg) },
];

static CARET_COMMANDS: &[Command] = &[
    Command { kind: ResponseKind::Mbau, multiline: false, parse: |s| Mbau::parse(s).map(AtResponse::Mbau) },
];

/// Recognize the response at the start of `input`.
///
/// `input` must not start with line noise (`\r`, `\n`); the dispatcher
/// strips that before calling.
pub fn parse(input: &[u8]) -> ParseOutcome {
    if input.is_empty() {
        return ParseOutcome::Incomplete;
    }

    if input.starts_with(RING) {
        return ParseOutcome::Complete {
            consumed: RING.len(),
            response: AtResponse::Ring,
        };
    }

    for (header, kind) in [(CMT_HEADER, ResponseKind::Cmt), (CDS_HEADER, ResponseKind::Cds)] {
        if input.starts_with(header) {
            return parse_pdu_message(input, header.len(), kind);
        }
        if input.len() < header.len() && header.starts_with(input) {
            return ParseOutcome::Incomplete;
        }
    }

    match input[0] {
        b'+' => return parse_command(input, PLUS_COMMANDS),
        b'%' => return parse_command(input, PERCENT_COMMANDS),
        b'^' => return parse_command(input, CARET_COMMANDS),
        _ => {}
    }

    for (token, response) in [
        (SMS_PROMPT, AtResponse::SmsPrompt),
        (OK, AtResponse::Ok),
        (ERROR, AtResponse::Error),
    ] {
        if input.starts_with(token) {
            return ParseOutcome::Complete {
                consumed: token.len(),
                response,
            };
        }
    }

    if let Some(pos) = find(input, OK_TRAILER) {
        return ParseOutcome::Complete {
            consumed: pos + OK_TRAILER.len(),
            response: AtResponse::Text(String::from_utf8_lossy(&input[..pos]).into_owned()),
        };
    }

    ParseOutcome::Incomplete
}

fn parse_command(input: &[u8], table: &[Command]) -> ParseOutcome {
    let rest = &input[1..];
    let mut maybe_incomplete = false;

    for command in table {
        let tag = command.tag();

        if rest.len() <= tag.len() {
            // A tag cut short by the end of the read.
            if tag.starts_with(rest) {
                maybe_incomplete = true;
            }
            continue;
        }
        if !rest.starts_with(tag) {
            continue;
        }

        let skip = match rest[tag.len()] {
            b':' => 1 + tag.len() + 1,
            b'\r' => 1 + tag.len(),
            _ => continue,
        };

        return if command.multiline {
            match find(&input[skip..], OK_TRAILER) {
                Some(pos) => {
                    let end = skip + pos;
                    ParseOutcome::Complete {
                        consumed: end + OK_TRAILER.len(),
                        response: command.apply(&input[..=end]),
                    }
                }
                None => ParseOutcome::Incomplete,
            }
        } else {
            match input[skip..].iter().position(|&b| b == b'\r') {
                Some(pos) => {
                    let end = skip + pos;
                    ParseOutcome::Complete {
                        consumed: end + 1,
                        response: command.apply(trim_start(&input[skip..end])),
                    }
                }
                None => ParseOutcome::Incomplete,
            }
        };
    }

    if maybe_incomplete {
        ParseOutcome::Incomplete
    } else {
        debug!(head = %preview(input), "no grammar for tagged response");
        ParseOutcome::Failed
    }
}

/// `+CMT:` / `+CDS:` carry a size line and a hex PDU line.
fn parse_pdu_message(input: &[u8], header_len: usize, kind: ResponseKind) -> ParseOutcome {
    let start = header_len
        + input[header_len..]
            .iter()
            .take_while(|&&b| b <= b' ')
            .count();
    let body = &input[start..];

    let Some(size_end) = body.iter().position(|&b| b == b'\r') else {
        return ParseOutcome::Incomplete;
    };
    let size_line = String::from_utf8_lossy(&body[..size_end]);
    let mut size = 0;
    if !Parser::new(&size_line).int(&mut size).full_match() {
        warn!(tag = kind.as_str(), size = %size_line.escape_debug(), "can't parse PDU size");
        return ParseOutcome::Failed;
    }

    let pdu_start = size_end
        + 1
        + body[size_end + 1..]
            .iter()
            .take_while(|&&b| b == b'\n')
            .count();
    let Some(pdu_len) = body[pdu_start..].iter().position(|&b| b == b'\r') else {
        return ParseOutcome::Incomplete;
    };
    let pdu_line = String::from_utf8_lossy(&body[pdu_start..pdu_start + pdu_len]);

    let response = match kind {
        ResponseKind::Cmt => Cmt::parse(&size_line, &pdu_line).map(AtResponse::Cmt),
        _ => Cds::parse(&size_line, &pdu_line).map(AtResponse::Cds),
    };

    match response {
        Some(response) => ParseOutcome::Complete {
            consumed: start + pdu_start + pdu_len + 1,
            response,
        },
        None => {
            warn!(tag = kind.as_str(), pdu = %pdu_line.escape_debug(), "can't parse PDU");
            ParseOutcome::Failed
        }
    }
}

fn trim_start(bytes: &[u8]) -> &[u8] {
    let blanks = bytes.iter().take_while(|&&b| b <= b' ').count();
    &bytes[blanks..]
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Printable head of a span for diagnostics.
pub(crate) fn preview(bytes: &[u8]) -> Cow<'_, str> {
    const PREVIEW_LEN: usize = 32;
    String::from_utf8_lossy(&bytes[..bytes.len().min(PREVIEW_LEN)])
}
