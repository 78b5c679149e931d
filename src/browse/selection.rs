//! Track selection state
//!
//! Which song is current and which of its tracks are marked for export.
//! Pure in-memory state; nothing here touches the volume.

use super::catalog::Catalog;

/// Current song and per-track export flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    current_song: Option<usize>,
    track_flags: Vec<bool>,
}

impl SelectionState {
    /// Nothing selected
    pub fn new() -> Self {
        Self::default()
    }

    /// Make catalog entry `index` current with every track unmarked
    ///
    /// Out-of-range indices leave the state untouched and return `false`.
    pub fn select_song(&mut self, catalog: &Catalog, index: usize) -> bool {
        let Some(entry) = catalog.get(index) else {
            return false;
        };
        self.current_song = Some(index);
        self.track_flags = vec![false; entry.channel_count];
        true
    }

    /// Forget the current song
    pub fn clear(&mut self) {
        self.current_song = None;
        self.track_flags.clear();
    }

    /// Flip the flag of one track; out-of-range channels are ignored
    pub fn toggle(&mut self, channel: usize) {
        if let Some(flag) = self.track_flags.get_mut(channel) {
            *flag = !*flag;
        }
    }

    /// Mark every track
    pub fn select_all(&mut self) {
        self.track_flags.fill(true);
    }

    /// Unmark every track
    pub fn select_none(&mut self) {
        self.track_flags.fill(false);
    }

    /// Marked tracks, ascending, zero-based
    pub fn selected_channels(&self) -> Vec<usize> {
        self.track_flags
            .iter()
            .enumerate()
            .filter_map(|(channel, &flag)| flag.then_some(channel))
            .collect()
    }

    /// Catalog index of the current song
    pub fn current_song(&self) -> Option<usize> {
        self.current_song
    }

    /// Per-track flags of the current song
    pub fn track_flags(&self) -> &[bool] {
        &self.track_flags
    }

    /// Whether `channel` is marked
    pub fn is_selected(&self, channel: usize) -> bool {
        self.track_flags.get(channel).copied().unwrap_or(false)
    }

    /// Number of marked tracks
    pub fn selected_count(&self) -> usize {
        self.track_flags.iter().filter(|&&flag| flag).count()
    }
}

/// Display label for a zero-based channel, e.g. `Track 01`
pub fn track_label(channel: usize) -> String {
    format!("Track {:02}", channel + 1)
}
