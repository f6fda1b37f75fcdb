//! Real-time playback on the tokio clock
//!
//! Without an output device attached, a preview "renders" by holding the
//! buffer for its duration and then reporting completion.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::engine::PcmBuffer;
use crate::error::Result;
use crate::services::{Playback, PlaybackSink};

/// Sink whose playbacks last exactly as long as the buffer
#[derive(Debug, Clone, Copy, Default)]
pub struct TimedPlaybackSink;

/// A running timed playback; stopping (or dropping) it cancels the render
#[derive(Debug)]
pub struct TimedPlayback {
    render: JoinHandle<()>,
}

impl Playback for TimedPlayback {
    fn stop(&mut self) {
        self.render.abort();
    }
}

impl Drop for TimedPlayback {
    fn drop(&mut self) {
        self.render.abort();
    }
}

#[async_trait]
impl PlaybackSink for TimedPlaybackSink {
    async fn start(&self, buffer: PcmBuffer, done: oneshot::Sender<()>) -> Result<Box<dyn Playback>> {
        let duration = Duration::from_secs_f64(buffer.duration_secs());
        let render = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            drop(buffer);
            // The receiver is gone if the manager already moved on.
            let _ = done.send(());
        });

        Ok(Box::new(TimedPlayback { render }))
    }
}
