/// One input audio track contributing to the concatenated mix.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    /// Display name (file stem, case preserved).
    pub name: String,
    /// Decoded duration in seconds, non-negative.
    pub duration_sec: f64,
}

impl Track {
    pub fn new(name: impl Into<String>, duration_sec: f64) -> Self {
        Self {
            name: name.into(),
            duration_sec,
        }
    }
}

/// A track plus its cumulative start offset in the mix.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineEntry {
    pub track: Track,
    pub start_sec: f64,
}

/// Ordered sequence of tracks with derived start offsets.
///
/// Entry order is exactly the order the tracks were supplied in; the builder
/// never reorders. Callers wanting deterministic output sort before building
/// (the scanner sorts audio files by name).
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
    total_duration_sec: f64,
}

impl Timeline {
    /// Build a timeline from tracks in supplied order.
    ///
    /// `start[0] = 0`, `start[i] = start[i-1] + duration[i-1]`; the total is
    /// the sum of all durations (0 for an empty input).
    pub fn build(tracks: Vec<Track>) -> Self {
        let mut entries = Vec::with_capacity(tracks.len());
        let mut cursor = 0.0f64;
        for track in tracks {
            let start_sec = cursor;
            cursor += track.duration_sec;
            entries.push(TimelineEntry { track, start_sec });
        }
        Self {
            entries,
            total_duration_sec: cursor,
        }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn total_duration_sec(&self) -> f64 {
        self.total_duration_sec
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
