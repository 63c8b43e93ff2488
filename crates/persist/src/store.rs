//! File-backed scene persistence.
//!
//! Layout inside the store directory:
//! ```text
//! scene.meta.json   - schema version, save sequence number, payload hash
//! scene.cbor.zst    - CBOR+zstd compressed list of placed objects
//! ```
//!
//! Both files are written to a temporary name and renamed into place.

use crate::collaborator::{to_payload, LoadCallback, Persistence, SharedSubscribers, Snapshot, Subscribers, Subscription};
use propyard_common::PlacedObject;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Current on-disk schema version.
pub const SCENE_SCHEMA_VERSION: u32 = 1;

const META_FILE: &str = "scene.meta.json";
const DATA_FILE: &str = "scene.cbor.zst";

/// Errors from file-backed persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
}

/// Contents of `scene.meta.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneMeta {
    pub schema_version: u32,
    /// Sequence number of the save that produced the data file.
    pub seq: u64,
    pub object_count: usize,
    /// Hex SHA-256 of `scene.cbor.zst`.
    pub sha256: String,
}

/// Synchronous access to one scene directory.
#[derive(Debug, Clone)]
pub struct SceneFile {
    root: PathBuf,
}

impl SceneFile {
    /// Open a scene directory, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read and check the metadata. `None` if nothing was ever saved.
    pub fn read_meta(&self) -> Result<Option<SceneMeta>, StoreError> {
        let path = self.root.join(META_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let meta: SceneMeta = serde_json::from_reader(std::fs::File::open(&path)?)?;
        if meta.schema_version != SCENE_SCHEMA_VERSION {
            return Err(StoreError::SchemaMismatch {
                file_version: meta.schema_version,
                expected_version: SCENE_SCHEMA_VERSION,
            });
        }
        Ok(Some(meta))
    }

    /// Load the stored list, verifying the payload hash. `None` if nothing was ever saved.
    pub fn read(&self) -> Result<Option<(SceneMeta, Vec<PlacedObject>)>, StoreError> {
        let Some(meta) = self.read_meta()? else {
            return Ok(None);
        };
        let compressed = std::fs::read(self.root.join(DATA_FILE))?;
        let actual = sha256_hex(&compressed);
        if actual != meta.sha256 {
            return Err(StoreError::IntegrityMismatch {
                expected: meta.sha256,
                actual,
            });
        }
        let cbor_bytes = zstd_decompress(&compressed)?;
        let objects: Vec<PlacedObject> = cbor_deserialize(&cbor_bytes)?;
        Ok(Some((meta, objects)))
    }

    /// Replace the stored list.
    pub fn write(&self, seq: u64, objects: &[PlacedObject]) -> Result<SceneMeta, StoreError> {
        let cbor_bytes = cbor_serialize(objects)?;
        let compressed = zstd_compress(&cbor_bytes)?;
        let meta = SceneMeta {
            schema_version: SCENE_SCHEMA_VERSION,
            seq,
            object_count: objects.len(),
            sha256: sha256_hex(&compressed),
        };
        self.replace(DATA_FILE, &compressed)?;
        self.replace(META_FILE, &serde_json::to_vec_pretty(&meta)?)?;
        Ok(meta)
    }

    fn replace(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let tmp = self.root.join(format!("{name}.tmp"));
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, self.root.join(name))?;
        Ok(())
    }
}

/// Admits only strictly increasing save sequence numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceGuard {
    last: u64,
}

impl SequenceGuard {
    pub fn starting_after(last: u64) -> Self {
        Self { last }
    }

    pub fn admit(&mut self, seq: u64) -> bool {
        if seq <= self.last {
            return false;
        }
        self.last = seq;
        true
    }

    pub fn last(&self) -> u64 {
        self.last
    }
}

enum Job {
    Save { seq: u64, objects: Vec<PlacedObject> },
    /// Deliver the stored state to one subscriber, if it is still subscribed.
    Load { subscriber: u64 },
    /// Deliver the stored state to every subscriber.
    Broadcast,
    Flush { done: Sender<()> },
}

/// File backend. All disk work happens on one writer thread.
///
/// Saves are sequenced and the sequence number doubles as the revision;
/// a save that reaches the writer after a newer one is dropped. Own saves are not echoed to subscribers: they hear the stored
/// state when they subscribe and on [`FileStore::refresh`]. Dropping the
/// store drains the queue and joins the writer.
pub struct FileStore {
    root: PathBuf,
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    next_seq: AtomicU64,
    subscribers: SharedSubscribers,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let file = SceneFile::open(path)?;
        let last_seq = match file.read_meta() {
            Ok(meta) => meta.map_or(0, |m| m.seq),
            // A bad meta file must not block new saves; reads will keep reporting it.
            Err(e) => {
                tracing::warn!(error = %e, root = %file.root().display(), "unreadable scene metadata");
                0
            }
        };
        let root = file.root().to_path_buf();
        let subscribers = SharedSubscribers::default();
        let (tx, rx) = mpsc::channel::<Job>();

        let worker_subscribers = Arc::clone(&subscribers);
        let worker = std::thread::Builder::new()
            .name("propyard-store".into())
            .spawn(move || {
                let mut guard = SequenceGuard::starting_after(last_seq);
                for job in rx {
                    run_job(&file, &worker_subscribers, &mut guard, job);
                }
                tracing::debug!("store writer exiting");
            })?;

        tracing::info!(root = %root.display(), last_seq, "opened file store");
        Ok(Self {
            root,
            jobs: Some(tx),
            worker: Some(worker),
            next_seq: AtomicU64::new(last_seq + 1),
            subscribers,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Block until every job queued so far has been processed.
    pub fn flush(&self) {
        let (done, wait) = mpsc::channel();
        if self.send(Job::Flush { done }) {
            let _ = wait.recv();
        }
    }

    /// Re-read the file and deliver it to every subscriber, e.g. after
    /// another process changed it.
    pub fn refresh(&self) {
        self.send(Job::Broadcast);
    }

    pub fn subscriber_count(&self) -> usize {
        Subscribers::len(&self.subscribers)
    }

    fn send(&self, job: Job) -> bool {
        let Some(jobs) = &self.jobs else {
            return false;
        };
        if jobs.send(job).is_err() {
            tracing::error!(root = %self.root.display(), "store writer is gone");
            return false;
        }
        true
    }
}

fn run_job(file: &SceneFile, subscribers: &SharedSubscribers, guard: &mut SequenceGuard, job: Job) {
    match job {
        Job::Save { seq, objects } => {
            if !guard.admit(seq) {
                tracing::debug!(seq, last = guard.last(), "dropping stale save");
                return;
            }
            match file.write(seq, &objects) {
                Ok(meta) => tracing::debug!(seq, count = meta.object_count, "scene saved"),
                Err(e) => tracing::error!(seq, error = %e, "scene save failed"),
            }
        }
        Job::Load { subscriber } => {
            let Some(callback) = Subscribers::get(subscribers, subscriber) else {
                return;
            };
            if let Some(snapshot) = load_snapshot(file) {
                callback(snapshot);
            }
        }
        Job::Broadcast => {
            if let Some(snapshot) = load_snapshot(file) {
                Subscribers::notify(subscribers, &snapshot);
            }
        }
        Job::Flush { done } => {
            let _ = done.send(());
        }
    }
}

/// The stored list as a subscriber delivery. Failures are logged and yield nothing.
fn load_snapshot(file: &SceneFile) -> Option<Snapshot> {
    match file.read() {
        Ok(Some((meta, objects))) => {
            tracing::debug!(seq = meta.seq, count = objects.len(), "scene loaded");
            Some(Snapshot {
                revision: meta.seq,
                payload: to_payload(&objects),
            })
        }
        Ok(None) => Some(Snapshot {
            revision: 0,
            payload: serde_json::Value::Array(Vec::new()),
        }),
        Err(e) => {
            tracing::error!(error = %e, "scene load failed");
            None
        }
    }
}

impl Persistence for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    fn save(&self, objects: Vec<PlacedObject>) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.send(Job::Save { seq, objects });
        seq
    }

    fn subscribe(&self, callback: LoadCallback) -> Subscription {
        let subscription = Subscribers::add(&self.subscribers, callback);
        self.send(Job::Load {
            subscriber: subscription.id(),
        });
        subscription
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        drop(self.jobs.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("store writer panicked");
            }
        }
    }
}

fn cbor_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::CborEncode(e.to_string()))?;
    Ok(buf)
}

fn cbor_deserialize<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, StoreError> {
    ciborium::from_reader(data).map_err(|e| StoreError::CborDecode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), 3)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
