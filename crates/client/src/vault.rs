//! Durable store of bid secrets.
//!
//! The vault is a single JSON file mapping commitment hex to the opening
//! of that commitment. Every write replaces the whole file through a
//! temporary file in the same directory, so a crash leaves either the old
//! or the new mapping on disk. Every operation holds an in-process mutex
//! and an exclusive `<vault>.lock` file for its duration.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use auction_types::{Blinding, Commitment, SecretRecord, TxId};

const VAULT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("IOError: vault {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "IOError: vault {} is locked by another process (remove {} if no bidder is running)",
        .path.display(),
        .lock.display()
    )]
    Locked { path: PathBuf, lock: PathBuf },

    #[error("IOError: vault {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("IOError: vault {} has unsupported version {version}", .path.display())]
    UnsupportedVersion { path: PathBuf, version: u32 },
}

/// One stored secret as seen by the operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaultEntry {
    pub commitment: Commitment,
    pub record: SecretRecord,
    /// Transaction that revealed this bid, if any
    pub revealed_tx: Option<TxId>,
}

#[derive(Debug, Serialize, Deserialize)]
struct VaultFile {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, StoredSecret>,
}

impl Default for VaultFile {
    fn default() -> Self {
        Self {
            version: VAULT_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize)]
struct StoredSecret {
    #[serde_as(as = "DisplayFromStr")]
    amount: u64,
    blinding: Blinding,
    #[serde(default)]
    revealed_tx: Option<TxId>,
}

impl StoredSecret {
    fn record(&self) -> SecretRecord {
        SecretRecord {
            amount: self.amount,
            blinding: self.blinding.clone(),
        }
    }
}

/// Handle to a vault file.
#[derive(Debug)]
pub struct SecretVault {
    path: PathBuf,
    lock_path: PathBuf,
    local: Mutex<()>,
}

impl SecretVault {
    /// Open the vault at `path`, creating its directory if needed.
    ///
    /// A missing file is an empty vault; an existing file must parse.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, VaultError> {
        let path = path.into();
        let lock_path = lock_path_for(&path);
        let vault = Self {
            path,
            lock_path,
            local: Mutex::new(()),
        };

        fs::create_dir_all(vault.dir()).map_err(|source| VaultError::Io {
            path: vault.path.clone(),
            source,
        })?;
        vault.with_lock(|| vault.load().map(|_| ()))?;
        Ok(vault)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Store the opening of `commitment`.
    pub fn put(&self, commitment: &Commitment, record: &SecretRecord) -> Result<(), VaultError> {
        self.with_lock(|| {
            let mut file = self.load()?;
            let key = commitment.to_string();
            match file.entries.get(&key) {
                Some(existing)
                    if existing.amount == record.amount && existing.blinding == record.blinding =>
                {
                    return Ok(());
                }
                Some(_) => warn!(%commitment, "Overwriting vault entry"),
                None => {}
            }

            file.entries.insert(
                key,
                StoredSecret {
                    amount: record.amount,
                    blinding: record.blinding.clone(),
                    revealed_tx: None,
                },
            );
            self.store(&file)?;
            debug!(%commitment, "Secret stored");
            Ok(())
        })
    }

    /// Opening of `commitment`, if this vault holds it.
    pub fn get(&self, commitment: &Commitment) -> Result<Option<SecretRecord>, VaultError> {
        Ok(self.entry(commitment)?.map(|entry| entry.record))
    }

    pub fn entry(&self, commitment: &Commitment) -> Result<Option<VaultEntry>, VaultError> {
        self.with_lock(|| {
            let file = self.load()?;
            Ok(file
                .entries
                .get(&commitment.to_string())
                .map(|stored| VaultEntry {
                    commitment: *commitment,
                    record: stored.record(),
                    revealed_tx: stored.revealed_tx,
                }))
        })
    }

    /// Record that `commitment` was revealed by `tx_id`. The secret is kept.
    ///
    /// Returns `false` if the vault has no entry for `commitment`.
    pub fn mark_revealed(&self, commitment: &Commitment, tx_id: &TxId) -> Result<bool, VaultError> {
        self.with_lock(|| {
            let mut file = self.load()?;
            let Some(stored) = file.entries.get_mut(&commitment.to_string()) else {
                return Ok(false);
            };
            stored.revealed_tx = Some(*tx_id);
            self.store(&file)?;
            debug!(%commitment, tx = %tx_id, "Secret marked revealed");
            Ok(true)
        })
    }

    /// All entries, ordered by commitment.
    pub fn entries(&self) -> Result<Vec<VaultEntry>, VaultError> {
        self.with_lock(|| {
            let file = self.load()?;
            file.entries
                .iter()
                .map(|(key, stored)| -> Result<VaultEntry, VaultError> {
                    let commitment =
                        Commitment::from_str(key).map_err(|err| self.corrupt(err.to_string()))?;
                    Ok(VaultEntry {
                        commitment,
                        record: stored.record(),
                        revealed_tx: stored.revealed_tx,
                    })
                })
                .collect()
        })
    }

    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T, VaultError>) -> Result<T, VaultError> {
        let _local = self.local.lock();
        let _file = LockFile::acquire(&self.path, &self.lock_path)?;
        f()
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn corrupt(&self, reason: String) -> VaultError {
        VaultError::Corrupt {
            path: self.path.clone(),
            reason,
        }
    }

    fn load(&self) -> Result<VaultFile, VaultError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(VaultFile::default()),
            Err(source) => {
                return Err(VaultError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let file: VaultFile =
            serde_json::from_slice(&bytes).map_err(|err| self.corrupt(err.to_string()))?;
        if file.version != VAULT_VERSION {
            return Err(VaultError::UnsupportedVersion {
                path: self.path.clone(),
                version: file.version,
            });
        }
        Ok(file)
    }

    fn store(&self, file: &VaultFile) -> Result<(), VaultError> {
        let io_err = |source: io::Error| VaultError::Io {
            path: self.path.clone(),
            source,
        };

        // Temp files are created with mode 0600 on unix.
        let mut tmp = NamedTempFile::new_in(self.dir()).map_err(io_err)?;
        serde_json::to_writer_pretty(tmp.as_file_mut(), file)
            .map_err(|err| io_err(err.into()))?;
        tmp.as_file_mut().write_all(b"\n").map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|err| io_err(err.error))?;
        sync_dir(self.dir()).map_err(io_err)
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| OsString::from("vault"));
    name.push(".lock");
    path.with_file_name(name)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// Exclusive lock file, removed on drop.
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    fn acquire(vault: &Path, lock: &Path) -> Result<Self, VaultError> {
        match OpenOptions::new().write(true).create_new(true).open(lock) {
            Ok(mut file) => {
                // Dropping the guard on a failed write removes the lock again.
                let guard = Self {
                    path: lock.to_path_buf(),
                };
                write_owner(&mut file).map_err(|source| VaultError::Io {
                    path: lock.to_path_buf(),
                    source,
                })?;
                Ok(guard)
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Err(VaultError::Locked {
                path: vault.to_path_buf(),
                lock: lock.to_path_buf(),
            }),
            Err(source) => Err(VaultError::Io {
                path: lock.to_path_buf(),
                source,
            }),
        }
    }
}

/// Owner pid, for operators clearing a stale lock.
fn write_owner<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", std::process::id())?;
    out.flush()
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), %err, "Failed to release vault lock");
        }
    }
}
