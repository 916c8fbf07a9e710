use std::sync::{Arc, Mutex};

use tracing::warn;
use vmodem_frame::RequestWriter;
use vmodem_transport::HostChannel;

use crate::error::{ChannelError, Result};
use crate::sync::lock;

/// Write capability for one open host channel.
///
/// Clones share the same writer. Once the channel it was issued for is
/// closed every clone fails with [`ChannelError::PipeClosed`]; a stale pipe
/// never writes to a newer connection.
#[derive(Clone)]
pub struct RequestPipe {
    writer: Arc<Mutex<Option<RequestWriter<HostChannel>>>>,
}

impl RequestPipe {
    pub fn new(channel: HostChannel) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Some(RequestWriter::new(channel)))),
        }
    }

    /// Send `request` as one `\r`-terminated line.
    pub fn send(&self, request: &str) -> Result<()> {
        let mut writer = lock(&self.writer);
        let Some(writer) = writer.as_mut() else {
            return Err(ChannelError::PipeClosed);
        };
        writer.send(request).map_err(|err| {
            warn!(request, error = %err, "can't send request");
            ChannelError::Frame(err)
        })
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.writer).is_none()
    }

    /// Invalidate every clone and release the descriptor.
    pub(crate) fn close(&self) {
        lock(&self.writer).take();
    }
}

impl std::fmt::Debug for RequestPipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipe")
            .field("closed", &self.is_closed())
            .finish()
    }
}
