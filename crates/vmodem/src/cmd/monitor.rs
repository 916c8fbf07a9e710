use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::info;
use vmodem_channel::{AtChannel, ChannelConfig, CommandSequence};
use vmodem_frame::AtResponse;

use crate::cmd::{parse_channel, MonitorArgs};
use crate::exit::{channel_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_response, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let spec = parse_channel(&args.channel)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let init = if args.no_init {
        CommandSequence::default()
    } else {
        CommandSequence::standard()
    };
    let channel = AtChannel::with_config(spec.clone(), init, ChannelConfig::default())
        .map_err(|err| channel_error("channel setup failed", err))?;

    let printed = Arc::new(AtomicUsize::new(0));
    {
        let running = running.clone();
        let printed = printed.clone();
        let count = args.count;
        channel.add_response_sink(move |response| {
            if !running.load(Ordering::SeqCst) {
                return false;
            }
            print_response(response, format);
            let total = printed.fetch_add(1, Ordering::SeqCst) + 1;
            if count.is_some_and(|count| total >= count) {
                running.store(false, Ordering::SeqCst);
                return false;
            }
            true
        });
    }

    // The engine opens the host channel for its first requester.
    channel
        .request("AT", AtResponse::is_final)
        .map_err(|err| channel_error("modem did not answer", err))?;
    info!(channel = %spec, "monitoring");

    while running.load(Ordering::SeqCst) {
        thread::sleep(POLL_INTERVAL);
    }

    info!(printed = printed.load(Ordering::SeqCst), "monitor stopped");
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
