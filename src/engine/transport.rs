//! Playback state machine
//!
//! At most one asset plays at a time. The manager only remembers the index
//! of the playing asset; the registry keeps ownership of the audio.
//!
//! ```text
//! Idle --start(i)--> Playing(i)
//! Playing(i) --stop / natural end--> Idle
//! Playing(i) --start(j)--> Playing(j)   (i is stopped first)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use log::debug;
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::engine::PcmBuffer;
use crate::error::Result;
use crate::services::{Playback, PlaybackSink};

/// Current playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing is playing (default state)
    #[default]
    Idle,
    /// The asset at this registry index is playing
    Playing(usize),
}

impl PlaybackState {
    /// Index of the playing asset, if any
    pub fn playing_index(&self) -> Option<usize> {
        match self {
            PlaybackState::Idle => None,
            PlaybackState::Playing(index) => Some(*index),
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "Idle"),
            PlaybackState::Playing(index) => write!(f, "Playing({})", index),
        }
    }
}

struct ActivePlayback {
    index: usize,
    playback: Box<dyn Playback>,
    done: Mutex<oneshot::Receiver<()>>,
    // Latched once the sink reported the end of rendering
    finished: AtomicBool,
}

impl ActivePlayback {
    /// Check whether the sink has signalled completion (or went away
    /// without signalling)
    fn has_finished(&self) -> bool {
        if self.finished.load(Ordering::Acquire) {
            return true;
        }

        let ended = match self.done.lock() {
            Ok(mut done) => !matches!(done.try_recv(), Err(TryRecvError::Empty)),
            Err(_) => true,
        };
        if ended {
            self.finished.store(true, Ordering::Release);
        }
        ended
    }
}

/// Enforces exclusive preview playback
#[derive(Default)]
pub struct PlaybackManager {
    active: Option<ActivePlayback>,
}

impl PlaybackManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    ///
    /// A playback whose sink already signalled completion reads as `Idle`
    /// here, before any call to [`poll`](Self::poll).
    pub fn state(&self) -> PlaybackState {
        match &self.active {
            Some(active) if !active.has_finished() => PlaybackState::Playing(active.index),
            _ => PlaybackState::Idle,
        }
    }

    /// Check if the asset at `index` is the one playing
    pub fn is_playing(&self, index: usize) -> bool {
        self.state() == PlaybackState::Playing(index)
    }

    /// Start playing `buffer` as asset `index`
    ///
    /// A playback already in progress is stopped before the sink is asked
    /// to start the new one. If the sink fails the manager stays `Idle`.
    pub async fn start(
        &mut self,
        index: usize,
        buffer: PcmBuffer,
        sink: &dyn PlaybackSink,
    ) -> Result<()> {
        self.stop();

        let (done_tx, done_rx) = oneshot::channel();
        let playback = sink.start(buffer, done_tx).await?;

        debug!("[PLAYBACK] Started asset {}", index);
        self.active = Some(ActivePlayback {
            index,
            playback,
            done: Mutex::new(done_rx),
            finished: AtomicBool::new(false),
        });
        Ok(())
    }

    /// Stop any playback and return to `Idle`
    ///
    /// # Returns
    /// The index that was playing, if any. A playback that already ended
    /// on its own is cleared without being stopped.
    pub fn stop(&mut self) -> Option<usize> {
        let mut active = self.active.take()?;
        if active.has_finished() {
            debug!("[PLAYBACK] Asset {} finished", active.index);
            return None;
        }

        active.playback.stop();
        debug!("[PLAYBACK] Stopped asset {}", active.index);
        Some(active.index)
    }

    /// Clear a playback that finished on its own
    pub fn poll(&mut self) -> PlaybackState {
        if let Some(active) = &self.active {
            if active.has_finished() {
                debug!("[PLAYBACK] Asset {} finished", active.index);
                self.active = None;
            }
        }
        self.state()
    }

    /// Suspend until the current playback ends on its own
    ///
    /// # Returns
    /// The index that finished, or None if nothing was playing
    pub async fn wait_for_end(&mut self) -> Option<usize> {
        let active = self.active.as_mut()?;

        if !active.has_finished() {
            let done = match active.done.get_mut() {
                Ok(done) => done,
                Err(poisoned) => poisoned.into_inner(),
            };
            // A dropped sender counts as the end of playback.
            let _ = done.await;
        }

        let index = active.index;
        debug!("[PLAYBACK] Asset {} finished", index);
        self.active = None;
        Some(index)
    }
}

impl fmt::Debug for PlaybackManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackManager")
            .field("state", &self.state())
            .finish()
    }
}
