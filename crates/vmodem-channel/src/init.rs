//! Commands run on every freshly opened channel before any requester.

use tracing::{debug, info};
use vmodem_frame::AtResponse;

use crate::conversation::Conversation;
use crate::error::{ChannelError, Result};
use crate::pipe::RequestPipe;

/// The handshake the emulated modem expects after every (re)open.
pub const STANDARD_INIT_COMMANDS: [&str; 15] = [
    "ATE0Q0V1", // no echo, verbose result codes
    "AT+CMEE=1", // numeric +CME ERROR
    "AT+CREG=2", // voice registration reports with location
    "AT+CGREG=2", // GPRS registration reports
    "AT+CEREG=2", // EPS registration reports
    "AT+CCWA=1", // call waiting notifications
    "AT+CMOD=0", // single voice mode
    "AT+CMUT=0", // unmute
    "AT+CSSN=0,1", // supplementary service notifications
    "AT+COLP=0", // no connected line presentation
    "AT+CSCS=\"HEX\"", // hex character set
    "AT+CUSD=1", // unsolicited USSD
    "AT+CGEREP=1,0", // GPRS event reporting
    "AT+CMGF=0", // SMS PDU mode
    "AT+CFUN?", // current radio power state
];

/// Runs once per opened channel, after the reader thread is up.
pub trait InitSequence: Send + Sync {
    fn run(&self, pipe: &RequestPipe, conversation: &Conversation) -> Result<()>;
}

impl<F> InitSequence for F
where
    F: Fn(&RequestPipe, &Conversation) -> Result<()> + Send + Sync,
{
    fn run(&self, pipe: &RequestPipe, conversation: &Conversation) -> Result<()> {
        self(pipe, conversation)
    }
}

/// Commands sent in order, each of which must be answered with `OK`.
#[derive(Debug, Clone, Default)]
pub struct CommandSequence {
    commands: Vec<String>,
}

impl CommandSequence {
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    /// [`STANDARD_INIT_COMMANDS`].
    pub fn standard() -> Self {
        Self::new(STANDARD_INIT_COMMANDS)
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }
}

impl InitSequence for CommandSequence {
    fn run(&self, pipe: &RequestPipe, conversation: &Conversation) -> Result<()> {
        for command in &self.commands {
            // Intermediate lines such as `+CFUN: 1` stay unsolicited.
            let response = conversation.converse(pipe, command, AtResponse::is_final)?;
            if !response.is_ok() {
                return Err(ChannelError::InitFailed {
                    command: command.clone(),
                    response: response.to_string(),
                });
            }
            debug!(command = command.as_str(), "init step done");
        }
        info!(steps = self.commands.len(), "init sequence complete");
        Ok(())
    }
}
