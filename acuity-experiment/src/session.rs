use acuity_core::TrialRecord;
use log::warn;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("could not create session output: {0}")]
    Create(#[source] io::Error),
    #[error("could not encode trial record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("could not write trial record after retry: {0}")]
    Write(#[source] io::Error),
    #[error("session record is already finalized")]
    Sealed,
}

/// Append-only log of trial outcomes.
///
/// Each record is written as one JSON line and flushed immediately, so a
/// crash loses at most the in-flight trial. A failed write is retried once
/// after a short backoff; a second failure aborts the session while the
/// already flushed lines remain valid.
pub struct SessionRecord {
    records: Vec<TrialRecord>,
    sink: Box<dyn Write + Send>,
    sealed: bool,
    retry_backoff: Duration,
}

impl SessionRecord {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            records: Vec::new(),
            sink,
            sealed: false,
            retry_backoff: Duration::from_millis(250),
        }
    }

    pub fn create(path: &Path) -> Result<Self, PersistError> {
        let file = File::create(path).map_err(PersistError::Create)?;
        Ok(Self::new(Box::new(BufWriter::new(file))))
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn append(&mut self, record: TrialRecord) -> Result<(), PersistError> {
        if self.sealed {
            return Err(PersistError::Sealed);
        }
        let line = serde_json::to_string(&record)?;
        if let Err(first) = self.write_line(&line) {
            warn!("trial record write failed, retrying once: {first}");
            std::thread::sleep(self.retry_backoff);
            self.write_line(&line).map_err(PersistError::Write)?;
        }
        self.records.push(record);
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.sink, "{line}")?;
        self.sink.flush()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    /// Hits over all scored outcomes for one block; `None` when the block
    /// produced no scored trials (passive blocks, or never entered).
    pub fn block_accuracy(&self, block: &str) -> Option<f64> {
        let scored: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.block == block && r.outcome.is_scored())
            .collect();
        if scored.is_empty() {
            return None;
        }
        let hits = scored.iter().filter(|r| r.outcome.is_correct()).count();
        Some(hits as f64 / scored.len() as f64)
    }

    /// Seals the record once the scheduler reaches its terminal state.
    /// Idempotent; later appends fail with `Sealed`.
    pub fn finalize(&mut self) -> Result<(), PersistError> {
        self.sink.flush().map_err(PersistError::Write)?;
        self.sealed = true;
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acuity_core::{Eye, LogMar, TrialOutcome};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Fails the first `failures` write calls, then succeeds.
    struct FlakyWriter {
        failures: usize,
        inner: SharedBuf,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.inner.write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn record(block: &str, outcome: TrialOutcome) -> TrialRecord {
        TrialRecord {
            participant: "p01".into(),
            eye: Some(Eye::Left),
            block: block.into(),
            trial_index: 1,
            logmar: LogMar::new(0.5),
            target: 'K',
            outcome,
            response_latency_ms: Some(512),
        }
    }

    #[test]
    fn appends_one_json_line_per_trial() {
        let buf = SharedBuf::default();
        let mut session = SessionRecord::new(Box::new(buf.clone()));
        session.append(record("practice", TrialOutcome::Hit)).unwrap();
        session.append(record("practice", TrialOutcome::Miss)).unwrap();

        let written = buf.0.lock().unwrap().clone();
        let text = String::from_utf8(written).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: TrialRecord = serde_json::from_str(line).unwrap();
            assert_eq!(parsed.participant, "p01");
        }
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn block_accuracy_ignores_passive_outcomes() {
        let mut session = SessionRecord::new(Box::new(io::sink()));
        session
            .append(record("left_eye_response", TrialOutcome::Hit))
            .unwrap();
        session
            .append(record("left_eye_response", TrialOutcome::Miss))
            .unwrap();
        session
            .append(record("left_eye_response", TrialOutcome::FalseResponse))
            .unwrap();
        session
            .append(record("left_eye_no_response", TrialOutcome::NoResponse))
            .unwrap();

        let acc = session.block_accuracy("left_eye_response").unwrap();
        assert!((acc - 1.0 / 3.0).abs() < 1e-9);
        assert!(session.block_accuracy("left_eye_no_response").is_none());
        assert!(session.block_accuracy("right_eye_response").is_none());
    }

    #[test]
    fn single_write_failure_is_retried() {
        let buf = SharedBuf::default();
        let writer = FlakyWriter {
            failures: 1,
            inner: buf.clone(),
        };
        let mut session =
            SessionRecord::new(Box::new(writer)).with_retry_backoff(Duration::from_millis(1));
        session.append(record("practice", TrialOutcome::Hit)).unwrap();
        assert_eq!(session.len(), 1);
        assert!(!buf.0.lock().unwrap().is_empty());
    }

    #[test]
    fn second_write_failure_aborts_but_keeps_flushed_trials() {
        let buf = SharedBuf::default();
        let writer = FlakyWriter {
            failures: 0,
            inner: buf.clone(),
        };
        let mut session =
            SessionRecord::new(Box::new(writer)).with_retry_backoff(Duration::from_millis(1));
        session.append(record("practice", TrialOutcome::Hit)).unwrap();

        // Replace nothing; simulate a persistent failure by exhausting a
        // writer that always fails from now on.
        let broken = FlakyWriter {
            failures: usize::MAX,
            inner: buf.clone(),
        };
        session.sink = Box::new(broken);
        let err = session.append(record("practice", TrialOutcome::Miss));
        assert!(matches!(err, Err(PersistError::Write(_))));
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn finalize_seals_the_record() {
        let mut session = SessionRecord::new(Box::new(io::sink()));
        session.append(record("practice", TrialOutcome::Hit)).unwrap();
        session.finalize().unwrap();
        assert!(session.is_sealed());
        let err = session.append(record("practice", TrialOutcome::Hit));
        assert!(matches!(err, Err(PersistError::Sealed)));
        // Finalize twice is fine.
        session.finalize().unwrap();
    }

    #[test]
    fn records_survive_a_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        let mut session = SessionRecord::create(&path).unwrap();
        session.append(record("practice", TrialOutcome::Hit)).unwrap();
        session
            .append(record("left_eye_response", TrialOutcome::FalseResponse))
            .unwrap();
        session.finalize().unwrap();
        drop(session);

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<TrialRecord> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].outcome, TrialOutcome::FalseResponse);
    }
}
