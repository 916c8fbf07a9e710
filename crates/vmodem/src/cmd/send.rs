use std::sync::{Arc, Mutex};

use tracing::debug;
use vmodem_channel::{AtChannel, ChannelConfig, CommandSequence};
use vmodem_frame::{AtResponse, AtResponsePtr, ResponseKind};

use crate::cmd::{parse_channel, parse_duration, parse_kind, SendArgs};
use crate::exit::{channel_error, CliResult, DATA_INVALID, FAILURE, SUCCESS};
use crate::output::{print_responses, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let spec = parse_channel(&args.channel)?;
    let timeout = parse_duration(&args.timeout)?;
    let expect = args.expect.as_deref().map(parse_kind).transpose()?;

    let init = if args.no_init {
        CommandSequence::default()
    } else {
        CommandSequence::standard()
    };
    let config = ChannelConfig {
        conversation_timeout: timeout,
        ..ChannelConfig::default()
    };
    let channel = AtChannel::with_config(spec, init, config)
        .map_err(|err| channel_error("channel setup failed", err))?;

    // Intermediate lines are not claimed by the conversation and arrive here.
    let unclaimed = Arc::new(Mutex::new(Vec::new()));
    {
        let unclaimed = Arc::clone(&unclaimed);
        channel.add_response_sink(move |response| {
            if let Ok(mut seen) = unclaimed.lock() {
                seen.push(Arc::clone(response));
            }
            true
        });
    }

    let reply = channel
        .request(&args.command, reply_filter(expect))
        .map_err(|err| channel_error("send failed", err))?;
    debug!(command = %args.command, reply = %reply, "reply received");

    let mut responses = match unclaimed.lock() {
        Ok(mut seen) => std::mem::take(&mut *seen),
        Err(_) => Vec::new(),
    };
    responses.push(Arc::clone(&reply));
    print_responses(&responses, format);

    Ok(exit_code(&reply))
}

/// With an expected tag the reply is that response or the final result
/// that ends the command early; otherwise it is the final result.
fn reply_filter(expect: Option<ResponseKind>) -> impl Fn(&AtResponse) -> bool + Send + 'static {
    move |response: &AtResponse| match expect {
        Some(kind) => response.holds(kind) || response.is_final(),
        None => {
            response.is_final()
                || response.is_parse_error()
                || matches!(response, AtResponse::Text(_))
        }
    }
}

fn exit_code(reply: &AtResponsePtr) -> i32 {
    match reply.as_ref() {
        AtResponse::ParseError(_) => DATA_INVALID,
        AtResponse::Error | AtResponse::CmeError(_) | AtResponse::CmsError(_) => FAILURE,
        _ => SUCCESS,
    }
}
