use std::ops::Index;
use std::path::Path;

use csv::Writer;
use satellite::SatelliteState;
use serde::{Deserialize, Serialize};
use time::Epoch;

const HEADER: [&str; 15] = [
    "t_sec",
    "epoch_utc",
    "position[x]",
    "position[y]",
    "position[z]",
    "velocity[x]",
    "velocity[y]",
    "velocity[z]",
    "attitude[w]",
    "attitude[x]",
    "attitude[y]",
    "attitude[z]",
    "spin[x]",
    "spin[y]",
    "spin[z]",
];

/// Append-only record of every accepted step of a run. Entries are never
/// mutated after insertion; a failed run keeps everything accepted before
/// the failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ephemeris {
    base: Epoch,
    entries: Vec<SatelliteState>,
}

impl Ephemeris {
    pub fn new(base: Epoch) -> Self {
        Self { base, entries: Vec::new() }
    }

    pub fn with_capacity(base: Epoch, capacity: usize) -> Self {
        Self {
            base,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Epoch of elapsed second zero.
    pub fn base(&self) -> Epoch {
        self.base
    }

    pub fn push(&mut self, state: SatelliteState) {
        debug_assert!(
            self.entries
                .last()
                .is_none_or(|last| state.epoch > last.epoch),
            "ephemeris entries must be pushed in increasing epoch order"
        );
        self.entries.push(state);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&SatelliteState> {
        self.entries.last()
    }

    pub fn get(&self, index: usize) -> Option<&SatelliteState> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[SatelliteState] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &SatelliteState> {
        self.entries.iter()
    }

    /// Seconds of entry `index` past the base epoch.
    pub fn elapsed(&self, index: usize) -> Option<f64> {
        self.entries.get(index).map(|entry| entry.epoch - self.base)
    }

    /// Writes every entry as one CSV row.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), csv::Error> {
        let mut writer = Writer::from_path(path)?;
        writer.write_record(HEADER)?;
        for entry in &self.entries {
            Self::write_entry(&mut writer, self.base, entry)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes one row per `cadence` seconds, each tick taking the closest
    /// entry at or before it. With a 0.1 s integration step and the default
    /// 1.0 s cadence this reproduces a classic once-a-second ephemeris file.
    pub fn write_csv_sampled(
        &self,
        path: impl AsRef<Path>,
        cadence: f64,
    ) -> Result<(), csv::Error> {
        debug_assert!(cadence > 0.0, "export cadence must be positive");
        let mut writer = Writer::from_path(path)?;
        writer.write_record(HEADER)?;
        if let Some(last) = self.entries.last() {
            let span = last.epoch - self.base;
            let tiny = 1e-9 * cadence;
            let mut index = 0;
            let mut tick = 0.0;
            while tick <= span + tiny {
                while index + 1 < self.entries.len()
                    && self.entries[index + 1].epoch - self.base <= tick + tiny
                {
                    index += 1;
                }
                Self::write_entry(&mut writer, self.base, &self.entries[index])?;
                tick += cadence;
            }
        }
        writer.flush()?;
        Ok(())
    }

    fn write_entry<W: std::io::Write>(
        writer: &mut Writer<W>,
        base: Epoch,
        entry: &SatelliteState,
    ) -> Result<(), csv::Error> {
        let q = entry.attitude.into_inner();
        writer.write_record(&[
            (entry.epoch - base).to_string(),
            entry.epoch.to_string(),
            entry.position.x.to_string(),
            entry.position.y.to_string(),
            entry.position.z.to_string(),
            entry.velocity.x.to_string(),
            entry.velocity.y.to_string(),
            entry.velocity.z.to_string(),
            q.w.to_string(),
            q.i.to_string(),
            q.j.to_string(),
            q.k.to_string(),
            entry.spin.x.to_string(),
            entry.spin.y.to_string(),
            entry.spin.z.to_string(),
        ])?;
        Ok(())
    }
}

impl Index<usize> for Ephemeris {
    type Output = SatelliteState;

    fn index(&self, index: usize) -> &Self::Output {
        &self.entries[index]
    }
}
