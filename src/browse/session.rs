//! Browsing session state machine
//!
//! The contract every front end drives:
//!
//! ```text
//! Browsing --select_song--> SongSelected --begin_export--> Exporting
//!    ^                         |    ^                          |
//!    +---------back------------+    +-----finish_export--------+
//! ```
//!
//! Track flags survive an export and are only reset by selecting a song.
//! While `Exporting`, the only valid transition is `finish_export`.

use std::fmt;

use log::debug;

use super::catalog::{Catalog, CatalogEntry};
use super::selection::SelectionState;
use crate::config::ExportConfig;
use crate::error::{Result, TrackportError};
use crate::export::{ExportEngine, ExportJob, ExportResult, ProgressSink, SampleSource};
use crate::output::OutputFactory;
use crate::volume::Volume;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No song selected (default state)
    #[default]
    Browsing,
    /// A song is current and its tracks can be marked
    SongSelected,
    /// An export job owns the song cursor
    Exporting,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Browsing => write!(f, "Browsing"),
            SessionState::SongSelected => write!(f, "SongSelected"),
            SessionState::Exporting => write!(f, "Exporting"),
        }
    }
}

/// One browsing session over an opened volume
pub struct Session {
    catalog: Catalog,
    selection: SelectionState,
    state: SessionState,
}

impl Session {
    /// Start a session over an existing catalog
    pub fn new(catalog: Catalog) -> Self {
        Session {
            catalog,
            selection: SelectionState::new(),
            state: SessionState::Browsing,
        }
    }

    /// Build the catalog of `volume` and start browsing it
    pub fn open(volume: &dyn Volume) -> Result<Self> {
        Ok(Self::new(Catalog::build(volume)?))
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Make catalog entry `index` current, unmarking every track
    ///
    /// Returns `Ok(false)` and changes nothing when `index` is out of range.
    pub fn select_song(&mut self, index: usize) -> Result<bool> {
        self.ensure_idle("select a song")?;
        if !self.selection.select_song(&self.catalog, index) {
            debug!("[SESSION] Ignoring stale song index {}", index);
            return Ok(false);
        }
        self.state = SessionState::SongSelected;
        debug!("[SESSION] Song {} selected", index);
        Ok(true)
    }

    /// Return to the song list
    pub fn back(&mut self) -> Result<()> {
        self.ensure_idle("go back")?;
        if self.state == SessionState::SongSelected {
            self.selection.clear();
            self.state = SessionState::Browsing;
            debug!("[SESSION] Back to song list");
        }
        Ok(())
    }

    /// Flip one track's export flag
    pub fn toggle(&mut self, channel: usize) -> Result<()> {
        self.ensure_idle("change the track selection")?;
        self.selection.toggle(channel);
        Ok(())
    }

    /// Mark every track of the current song
    pub fn select_all(&mut self) -> Result<()> {
        self.ensure_idle("change the track selection")?;
        self.selection.select_all();
        Ok(())
    }

    /// Unmark every track of the current song
    pub fn select_none(&mut self) -> Result<()> {
        self.ensure_idle("change the track selection")?;
        self.selection.select_none();
        Ok(())
    }

    /// Validate the selection and enter `Exporting`
    pub fn begin_export(&mut self, config: &ExportConfig) -> Result<ExportJob> {
        self.ensure_idle("start an export")?;
        let job = ExportJob::begin(
            &self.selection,
            &self.catalog,
            &config.destination,
            config.format,
        )?;
        self.state = SessionState::Exporting;
        debug!("[SESSION] Exporting {} track(s)", job.channels().len());
        Ok(job)
    }

    /// Leave `Exporting`; the track flags are kept
    pub fn finish_export(&mut self) -> Result<()> {
        if self.state != SessionState::Exporting {
            return Err(TrackportError::InvalidTransition {
                from: self.state.to_string(),
                action: "finish an export",
            });
        }
        self.state = SessionState::SongSelected;
        debug!("[SESSION] Export finished");
        Ok(())
    }

    /// Export the marked tracks of the current song
    ///
    /// Runs synchronously. The session is back in `SongSelected` when this
    /// returns, whether or not any track succeeded. The destination
    /// directory must already exist.
    pub fn export(
        &mut self,
        config: &ExportConfig,
        output: &dyn OutputFactory,
        sink: &mut dyn ProgressSink,
    ) -> Result<ExportResult> {
        config.validate()?;
        let job = self.begin_export(config)?;
        let engine = ExportEngine::from_config(config);

        let result = match self.catalog.song_mut(job.song_index()) {
            Some(song) => {
                let mut source = SampleSource::new(song);
                Ok(engine.run(&job, &mut source, output, sink))
            }
            None => Err(TrackportError::SongNotFound {
                index: job.song_index(),
            }),
        };

        self.finish_export()?;
        result
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Catalog entry of the current song
    pub fn current_song(&self) -> Option<&CatalogEntry> {
        self.selection
            .current_song()
            .and_then(|index| self.catalog.get(index))
    }

    pub fn is_exporting(&self) -> bool {
        self.state == SessionState::Exporting
    }

    fn ensure_idle(&self, action: &'static str) -> Result<()> {
        if self.state == SessionState::Exporting {
            return Err(TrackportError::SessionBusy { action });
        }
        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("selection", &self.selection)
            .field("songs", &self.catalog.len())
            .finish()
    }
}
