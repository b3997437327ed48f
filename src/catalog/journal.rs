//! JSON-lines journal of catalog mutations.
//!
//! Writes happen on a dedicated thread fed through a channel, one event per
//! line, flushed after every event. The caller waits for the writer's answer,
//! so a mutation only counts once its line is on disk. Replaying the file in
//! order rebuilds the catalog.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread;

use log::{error, warn};
use rocket::serde::{Deserialize, Serialize};

use super::{CatalogEntry, EntryId, StatsDelta};
use crate::error::ArenaError;

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", tag = "event")]
pub enum CatalogEvent {
    Created(CatalogEntry),
    Deleted { id: EntryId },
    Stats { deltas: Vec<StatsDelta> },
}

/// Read every event from a journal file, skipping blank lines.
///
/// A line cut short by a failed write is skipped with a warning; any other
/// malformed line is an error.
pub fn load_events(path: &Path) -> Result<Vec<CatalogEvent>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let reader = BufReader::new(file);
    let mut events = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| e.to_string())?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CatalogEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) if e.is_eof() => {
                warn!("{path:?} line {}: skipping torn write: {e}", number + 1);
            }
            Err(e) => return Err(format!("{path:?} line {}: {e}", number + 1)),
        }
    }
    Ok(events)
}

type Ack = Sender<io::Result<()>>;

#[derive(Debug)]
pub struct JournalWriter {
    // Taken by close() so the writer thread sees the channel hang up.
    sender: Mutex<Option<Sender<(Vec<u8>, Ack)>>>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl JournalWriter {
    /// Append to `path`, creating it if needed.
    pub fn new(path: PathBuf) -> io::Result<Self> {
        // Open up front so a bad path is reported to the caller, not just logged.
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self::from_sink(file))
    }

    /// Journal into any unbuffered sink.
    pub fn from_sink<W>(mut sink: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<(Vec<u8>, Ack)>();
        let handle = thread::spawn(move || {
            let mut torn = false;
            for (line, ack) in rx {
                let result = append_line(&mut sink, &line, &mut torn);
                if let Err(e) = &result {
                    error!("Catalog journal: write failed: {e}");
                }
                // the caller may have given up waiting
                let _ = ack.send(result);
            }
            let _ = sink.flush();
        });

        JournalWriter {
            sender: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Write one event and wait until it is flushed.
    pub fn append(&self, event: &CatalogEvent) -> Result<(), ArenaError> {
        let mut line = serde_json::to_vec(event).map_err(|e| {
            ArenaError::Persistence(format!("cannot encode journal event: {e}"))
        })?;
        line.push(b'\n');

        let (ack_tx, ack_rx) = mpsc::channel();
        {
            let guard = lock(&self.sender);
            let tx = guard
                .as_ref()
                .ok_or_else(|| ArenaError::Persistence("catalog journal is closed".to_string()))?;
            tx.send((line, ack_tx)).map_err(|_| writer_stopped())?;
        }
        match ack_rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ArenaError::Persistence(format!(
                "catalog journal write failed: {e}"
            ))),
            Err(_) => Err(writer_stopped()),
        }
    }

    /// Hang up the channel and wait until everything queued is on disk.
    pub fn close(&self) {
        lock(&self.sender).take();
        let handle = lock(&self.handle).take();
        if let Some(h) = handle {
            if h.join().is_err() {
                error!("Catalog journal writer thread panicked");
            }
        }
    }
}

impl Drop for JournalWriter {
    fn drop(&mut self) {
        self.close();
    }
}

// After a failure part of the line may be on disk; start the next one on a
// fresh line so replay sees the fragment on its own.
fn append_line<W: Write>(sink: &mut W, line: &[u8], torn: &mut bool) -> io::Result<()> {
    if *torn {
        sink.write_all(b"\n")?;
        *torn = false;
    }
    let result = sink.write_all(line).and_then(|()| sink.flush());
    if result.is_err() {
        *torn = true;
    }
    result
}

fn writer_stopped() -> ArenaError {
    ArenaError::Persistence("catalog journal writer has stopped".to_string())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(g) => g,
        Err(e) => e.into_inner(),
    }
}
