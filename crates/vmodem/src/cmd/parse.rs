use std::fs;
use std::io::{self, Read};

use tracing::{debug, warn};
use vmodem_frame::{AtResponsePtr, FrameError, ResponseReader};

use crate::cmd::ParseArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_responses, OutputFormat};

pub fn run(args: ParseArgs, format: OutputFormat) -> CliResult<i32> {
    let mut capture = match &args.file {
        Some(path) => fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .map_err(|err| io_error("failed reading stdin", err))?;
            buf
        }
    };
    if args.lf {
        normalize_line_feeds(&mut capture);
    }

    let (responses, outcome) = parse_capture(&capture);
    print_responses(&responses, format);
    outcome.map_err(|err| frame_error("parse failed", err))?;

    Ok(SUCCESS)
}

/// Run `capture` through the response reader.
///
/// Responses decoded before a stream failure are returned alongside it. An
/// incomplete response at the end of the capture is not an error.
fn parse_capture(capture: &[u8]) -> (Vec<AtResponsePtr>, Result<(), FrameError>) {
    let mut reader = ResponseReader::new(capture);
    let mut responses = Vec::new();

    loop {
        match reader.read_responses(|response| responses.push(response)) {
            Ok(_) => {}
            Err(FrameError::ConnectionClosed) => break,
            Err(err) => return (responses, Err(err)),
        }
    }

    let trailing = reader.unconsumed().len();
    if trailing > 0 {
        warn!(bytes = trailing, "capture ends inside a response");
    }
    debug!(count = responses.len(), "capture parsed");
    (responses, Ok(()))
}

/// Rewrite bare `\n` as `\r`, leaving `\r\n` pairs alone.
fn normalize_line_feeds(capture: &mut [u8]) {
    let mut prev = 0u8;
    for byte in capture.iter_mut() {
        let current = *byte;
        if current == b'\n' && prev != b'\r' {
            *byte = b'\r';
        }
        prev = current;
    }
}
