//! Lifecycle events emitted by the simulation and the append-only JSONL
//! history log collaborators can tail.

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use uuid::Uuid;

/// Returns the current wall-clock timestamp for event records.
#[must_use]
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// One lifecycle event. Emitted from `World::update`, appended to the
/// history log, and passed to registered subscribers.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event")]
pub enum LiveEvent {
    Birth {
        id: u64,
        parent_id: Option<u64>,
        species: String,
        generation: u32,
        lineage_id: Uuid,
        tick: u64,
        timestamp: String,
    },
    Death {
        id: u64,
        species: String,
        age: u64,
        cause: String,
        tick: u64,
        timestamp: String,
    },
    Mating {
        parent_a: u64,
        parent_b: u64,
        child: u64,
        species: String,
        tick: u64,
        timestamp: String,
    },
    GenerationAdvanced {
        population: String,
        generation: u32,
        size: usize,
        tick: u64,
        timestamp: String,
    },
    SpeciesFormed {
        species_id: u64,
        name: String,
        founder: u64,
        tick: u64,
        timestamp: String,
    },
    SpeciesExtinct {
        species_id: u64,
        name: String,
        peak_population: usize,
        tick: u64,
        timestamp: String,
    },
}

impl LiveEvent {
    /// Tick the event was emitted on.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        match self {
            Self::Birth { tick, .. }
            | Self::Death { tick, .. }
            | Self::Mating { tick, .. }
            | Self::GenerationAdvanced { tick, .. }
            | Self::SpeciesFormed { tick, .. }
            | Self::SpeciesExtinct { tick, .. } => *tick,
        }
    }
}

/// Append-only JSONL event log. `new_dummy()` builds a no-op logger for
/// tests and embedded use.
pub struct HistoryLogger {
    live_file: Option<BufWriter<File>>,
}

impl HistoryLogger {
    pub fn new_at(dir: &str) -> anyhow::Result<Self> {
        if !std::path::Path::new(dir).exists() {
            std::fs::create_dir_all(dir)?;
        }
        let file_path = format!("{dir}/live.jsonl");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        Ok(Self {
            live_file: Some(BufWriter::new(file)),
        })
    }

    #[must_use]
    pub const fn new_dummy() -> Self {
        Self { live_file: None }
    }

    pub fn log_event(&mut self, event: &LiveEvent) -> anyhow::Result<()> {
        if let Some(ref mut file) = self.live_file {
            let json = serde_json::to_string(event)?;
            writeln!(file, "{json}")?;
            file.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_logger_swallows_events() {
        let mut logger = HistoryLogger::new_dummy();
        let event = LiveEvent::Death {
            id: 1,
            species: "Valko".to_string(),
            age: 10,
            cause: "starvation".to_string(),
            tick: 5,
            timestamp: timestamp_now(),
        };
        assert!(logger.log_event(&event).is_ok());
    }

    #[test]
    fn test_events_serialize_with_tag() {
        let event = LiveEvent::SpeciesFormed {
            species_id: 2,
            name: "Torluma".to_string(),
            founder: 9,
            tick: 40,
            timestamp: timestamp_now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"SpeciesFormed\""));
        assert_eq!(event.tick(), 40);
    }
}
