use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, error};
use snafu::ResultExt;
use tempfile::NamedTempFile;

use crate::dataset::Dataset;
use crate::error::{DrillError, IoSnafu, JsonSnafu, PersistSnafu, Result};

pub trait Store: Send {
    /// Returns an initialized dataset.
    fn load(&self) -> Result<Dataset>;
    /// Once this returns, the stored data reflects `dataset` even after a crash.
    fn save(&self, dataset: &Dataset) -> Result<()>;
}

/// Keeps the dataset in one JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Store for JsonStore {
    fn load(&self) -> Result<Dataset> {
        let path = &self.path;
        if !path.exists() {
            debug!("{} not found, starting empty", path.display());
            return Ok(Dataset::new());
        }
        let file = File::open(path).context(IoSnafu { path })?;
        let mut dataset: Dataset =
            serde_json::from_reader(BufReader::new(file)).context(JsonSnafu { path })?;
        dataset.init()?;
        Ok(dataset)
    }

    fn save(&self, dataset: &Dataset) -> Result<()> {
        let path = &self.path;
        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).context(IoSnafu { path: parent })?;

        let temp = NamedTempFile::new_in(parent).context(IoSnafu { path: parent })?;
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer(&mut writer, dataset).context(JsonSnafu { path })?;
        writer.flush().context(IoSnafu { path })?;
        drop(writer);
        temp.as_file().sync_all().context(IoSnafu { path })?;
        temp.persist(path).context(PersistSnafu { path })?;
        Ok(())
    }
}

/// Saves dataset snapshots on a separate thread, in submission order.
///
/// A failed save stops the thread; the error is returned by the next
/// [`BackgroundWriter::check`], [`BackgroundWriter::settle`],
/// [`BackgroundWriter::submit`] or [`BackgroundWriter::finish`].
pub struct BackgroundWriter {
    sender: Option<Sender<Dataset>>,
    handle: Option<JoinHandle<Result<()>>>,
    failed: Arc<AtomicBool>,
    /// One message per snapshot written.
    acks: Receiver<()>,
    pending: usize,
}

impl BackgroundWriter {
    pub fn spawn<S: Store + 'static>(store: S) -> Self {
        let (sender, receiver) = mpsc::channel::<Dataset>();
        let (ack, acks) = mpsc::channel();
        let failed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&failed);
        let handle = thread::spawn(move || {
            for snapshot in receiver {
                if let Err(e) = store.save(&snapshot) {
                    error!("save failed: {e}");
                    flag.store(true, Ordering::SeqCst);
                    return Err(e);
                }
                debug!("snapshot saved");
                let _ = ack.send(());
            }
            Ok(())
        });
        Self {
            sender: Some(sender),
            handle: Some(handle),
            failed,
            acks,
            pending: 0,
        }
    }

    pub fn submit(&mut self, snapshot: Dataset) -> Result<()> {
        self.check()?;
        let sent = match &self.sender {
            Some(sender) => sender.send(snapshot).is_ok(),
            None => false,
        };
        if !sent {
            return self.join();
        }
        self.pending += 1;
        Ok(())
    }

    /// Blocks until every submitted snapshot is written, failing if one was not.
    pub fn settle(&mut self) -> Result<()> {
        while self.pending > 0 {
            if self.acks.recv().is_err() {
                self.join()?;
                return Err(DrillError::WriterGone);
            }
            self.pending -= 1;
        }
        Ok(())
    }

    /// Fails if an earlier save failed.
    pub fn check(&mut self) -> Result<()> {
        if self.failed.load(Ordering::SeqCst) {
            return self.join();
        }
        Ok(())
    }

    /// Waits for every submitted snapshot to be written.
    pub fn finish(mut self) -> Result<()> {
        self.join()
    }

    fn join(&mut self) -> Result<()> {
        self.sender.take();
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| DrillError::WriterGone)?,
            None if self.failed.load(Ordering::SeqCst) => Err(DrillError::WriterGone),
            None => Ok(()),
        }
    }
}

impl Drop for BackgroundWriter {
    fn drop(&mut self) {
        if self.handle.is_none() {
            return;
        }
        if let Err(e) = self.join() {
            error!("pending saves lost: {e}");
        }
    }
}
