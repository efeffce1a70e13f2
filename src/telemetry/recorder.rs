//! JSONL frame recorder with file rotation.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use super::FrameRecord;
use crate::config::TelemetryConfig;
use crate::error::{Result, RoverError};

const FILE_PREFIX: &str = "frames_";
const FILE_EXTENSION: &str = "jsonl";

/// Writes frame records to `frames_<utc>_<seq>.jsonl` files in `log_dir`.
pub struct FrameRecorder {
    log_dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    sequence: u32,
}

impl FrameRecorder {
    /// Creates the log directory if needed. No file is opened until the
    /// first record.
    pub fn new<P: AsRef<Path>>(
        log_dir: P,
        max_records_per_file: usize,
        max_files_to_keep: usize,
    ) -> Result<Self> {
        let log_dir = log_dir.as_ref().to_path_buf();
        fs::create_dir_all(&log_dir).map_err(|e| {
            RoverError::Telemetry(format!(
                "Failed to create log directory {}: {}",
                log_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            log_dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            current_path: None,
            records_in_file: 0,
            sequence: 0,
        })
    }

    /// Recorder for the telemetry config, `None` when disabled.
    pub fn from_config(config: &TelemetryConfig) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        let recorder = Self::new(
            &config.log_dir,
            config.max_records_per_file,
            config.max_files_to_keep,
        )?;
        info!("Recording frames to {}", recorder.log_dir.display());
        Ok(Some(recorder))
    }

    /// Appends one record, rotating first if the current file is full.
    pub fn record(&mut self, record: &FrameRecord) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let line = serde_json::to_string(record)
            .map_err(|e| RoverError::Telemetry(format!("Failed to serialize record: {}", e)))?;

        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}", line)?;
            writer.flush()?;
        }
        self.records_in_file += 1;
        Ok(())
    }

    /// File currently being written.
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let name = format!(
            "{}{}_{:06}.{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%dT%H%M%S"),
            self.sequence,
            FILE_EXTENSION
        );
        self.sequence = self.sequence.wrapping_add(1);

        let path = self.log_dir.join(name);
        let file = File::create(&path).map_err(|e| {
            RoverError::Telemetry(format!("Failed to create {}: {}", path.display(), e))
        })?;
        debug!("Opened frame log {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.records_in_file = 0;

        self.prune()
    }

    /// Deletes the oldest frame logs beyond `max_files_to_keep`.
    fn prune(&self) -> Result<()> {
        let mut files = recorded_files(&self.log_dir)?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed old frame log {}", path.display()),
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        Ok(())
    }
}

impl Drop for FrameRecorder {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.flush() {
                warn!("Failed to flush frame log: {}", e);
            }
        }
    }
}

/// Frame log files in `dir`.
fn recorded_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.starts_with(FILE_PREFIX))
            && path.extension().and_then(|e| e.to_str()) == Some(FILE_EXTENSION);
        if is_log {
            files.push(path);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::{ActuatorState, DriveMode};
    use crate::packet::format;
    use tempfile::TempDir;

    fn record_with(claw: i32) -> FrameRecord {
        let state = ActuatorState {
            claw,
            ..ActuatorState::neutral()
        };
        let (drive, arm) = format(&state);
        FrameRecord::new(
            Utc::now(),
            Some("Test Pad"),
            (DriveMode::default(), DriveMode::default()),
            (&drive, &arm),
            state,
        )
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_records_are_json_lines() {
        let dir = TempDir::new().unwrap();
        let mut recorder = FrameRecorder::new(dir.path(), 100, 5).unwrap();

        recorder.record(&record_with(1)).unwrap();
        recorder.record(&record_with(-1)).unwrap();

        let lines = read_lines(recorder.current_path().unwrap());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["arm"], "ArmCommand_0_0_0_1_0_0");
        assert_eq!(lines[1]["actuators"]["claw"], -1);
    }

    #[test]
    fn test_rotates_after_max_records() {
        let dir = TempDir::new().unwrap();
        let mut recorder = FrameRecorder::new(dir.path(), 2, 10).unwrap();

        for claw in 0..5 {
            recorder.record(&record_with(claw)).unwrap();
        }

        let mut files = recorded_files(dir.path()).unwrap();
        files.sort();
        assert_eq!(files.len(), 3);
        assert_eq!(read_lines(&files[0]).len(), 2);
        assert_eq!(read_lines(&files[1]).len(), 2);
        assert_eq!(read_lines(&files[2]).len(), 1);
        assert_eq!(recorder.current_path(), Some(files[2].as_path()));
    }

    #[test]
    fn test_keeps_only_newest_files() {
        let dir = TempDir::new().unwrap();
        let mut recorder = FrameRecorder::new(dir.path(), 1, 2).unwrap();

        for claw in 0..4 {
            recorder.record(&record_with(claw)).unwrap();
        }

        let mut files = recorded_files(dir.path()).unwrap();
        files.sort();
        assert_eq!(files.len(), 2);
        assert_eq!(read_lines(&files[0])[0]["actuators"]["claw"], 2);
        assert_eq!(read_lines(&files[1])[0]["actuators"]["claw"], 3);
    }

    #[test]
    fn test_ignores_unrelated_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        let mut recorder = FrameRecorder::new(dir.path(), 1, 1).unwrap();

        recorder.record(&record_with(0)).unwrap();
        recorder.record(&record_with(1)).unwrap();

        assert!(dir.path().join("notes.txt").exists());
        assert_eq!(recorded_files(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let mut recorder = FrameRecorder::new(&nested, 10, 10).unwrap();
        recorder.record(&record_with(0)).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_disabled_config_yields_no_recorder() {
        let config = TelemetryConfig {
            enabled: false,
            log_dir: "./unused".to_string(),
            max_records_per_file: 10,
            max_files_to_keep: 10,
        };
        assert!(FrameRecorder::from_config(&config).unwrap().is_none());
    }
}
