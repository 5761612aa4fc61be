//! Persistent ledger store backed by a single append-only file

use statedb_core::{LedgerError, LedgerResult, LedgerStore, Records, SyncMode, Tx};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::store::{encode_frame, RecordReader};

/// File-backed ledger store.
///
/// The file is opened for read + append and never created here; creating the
/// log is a bootstrap step (see [`FileLedgerStore::create`]).
pub struct FileLedgerStore {
    path: PathBuf,
    file: File,
    /// Committed length of the file in bytes
    len: u64,
    sync_mode: SyncMode,
    /// Set once a partial frame could not be discarded. Appends are refused
    /// from then on, since `len` no longer matches the file.
    poisoned: Option<String>,
    #[cfg(test)]
    faults: Faults,
}

/// Write failures injected by tests
#[cfg(test)]
#[derive(Default)]
struct Faults {
    /// Write this many bytes of the next frame, then fail
    short_write: Option<usize>,
    fail_truncate: bool,
}

impl FileLedgerStore {
    /// Open an existing ledger file
    pub fn open<P: AsRef<Path>>(path: P, sync_mode: SyncMode) -> LedgerResult<Self> {
        let path = path.as_ref();
        let unavailable = |e: io::Error| LedgerError::StoreUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(path)
            .map_err(unavailable)?;
        let len = file.metadata().map_err(unavailable)?.len();

        info!("Opened ledger at {} ({} bytes)", path.display(), len);

        Ok(Self {
            path: path.to_path_buf(),
            file,
            len,
            sync_mode,
            poisoned: None,
            #[cfg(test)]
            faults: Faults::default(),
        })
    }

    /// Create an empty ledger file. Fails if one already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> LedgerResult<()> {
        let path = path.as_ref();
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => {
                file.sync_all()?;
                info!("Created empty ledger at {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(LedgerError::AlreadyExists(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes of committed records
    pub fn size_bytes(&self) -> u64 {
        self.len
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        #[cfg(test)]
        if let Some(n) = self.faults.short_write.take() {
            self.file.write_all(&frame[..n.min(frame.len())])?;
            return Err(io::Error::new(io::ErrorKind::WriteZero, "short write"));
        }

        self.file.write_all(frame)?;
        self.file.flush()?;
        if self.sync_mode == SyncMode::Sync {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Cut the file back to `len` after a failed write
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        #[cfg(test)]
        if self.faults.fail_truncate {
            return Err(io::Error::new(io::ErrorKind::Other, "truncate refused"));
        }

        self.file.set_len(len)
    }

    fn poisoned_error(&self, reason: &str) -> LedgerError {
        LedgerError::StorePoisoned {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl LedgerStore for FileLedgerStore {
    fn records(&mut self) -> LedgerResult<Records<'_>> {
        let mut reader = self.file.try_clone()?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(Box::new(RecordReader::new(BufReader::new(reader))))
    }

    fn append(&mut self, tx: &Tx) -> LedgerResult<()> {
        if let Some(reason) = &self.poisoned {
            return Err(self.poisoned_error(reason));
        }

        let frame = encode_frame(tx)?;
        let start = self.len;

        if let Err(e) = self.write_frame(&frame) {
            if let Err(te) = self.truncate_to(start) {
                let reason = format!(
                    "append failed ({}) and the partial frame at offset {} could not be discarded ({})",
                    e, start, te
                );
                error!("Ledger {} poisoned: {}", self.path.display(), reason);
                let err = self.poisoned_error(&reason);
                self.poisoned = Some(reason);
                return Err(err);
            }

            warn!(
                "Discarded partial frame in {} at offset {}: {}",
                self.path.display(),
                start,
                e
            );
            return Err(LedgerError::AppendFailed(e.to_string()));
        }

        self.len = start + frame.len() as u64;
        debug!("Appended {} at offset {}", tx, start);
        Ok(())
    }
}
