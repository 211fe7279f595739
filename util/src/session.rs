//! Session management
//!
//! A session owns a timestamped directory under `$ARM_SW_ROOT` which holds
//! the log file and any data archived during the execution.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use erased_serde::Serialize;
use log::{info, warn};
use std::fs;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

// Internal imports
use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// A chrono format string which diplays a timestamp. See
/// https://docs.rs/chrono/0.4.11/chrono/format/strftime/index.html for more
/// information.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// How long the save thread blocks waiting for data before checking the stop
/// flag.
const SAVE_POLL_PERIOD: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

type SaveRequest = (PathBuf, Box<dyn Serialize + Send>);

/// A struct storing information about the current session
pub struct Session {
    /// The time at which the session was started
    pub epoch: DateTime<Utc>,

    /// The root directory for this session
    pub session_root: PathBuf,

    /// The root directory for this session's archives
    pub arch_root: PathBuf,

    /// The path to the session's log file
    pub log_file_path: PathBuf,

    save_thread: SaveThread,
}

/// Handle on the background thread writing saved data to disk.
struct SaveThread {
    sender: Sender<SaveRequest>,
    stop: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors associated with the session module.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable (ARM_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot create the session directory: {0}")]
    CannotCreateDir(std::io::Error),

    #[error(
        "Cannot initialise the session epoch, have you already initialised the \
         session? (conquer_once error: {0})"
    )]
    CannotInitEpoch(conquer_once::TryInitError),

    #[error("Cannot get the epoch time, did you forget to initialise the session?")]
    CannotGetEpoch,
}

/// Errors raised while writing saved data to disk.
#[derive(Error, Debug)]
enum SaveError {
    #[error("Unrecognised file extension {0:?}")]
    UnknownExtension(Option<String>),

    #[error("Couldn't find parent directory")]
    NoParent,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Couldn't serialize data: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start a new session within the given directory.
    ///
    /// This will create a new session directory named `{exec_name}_{timestamp}`
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        // Set the session epoch
        SESSION_EPOCH
            .try_init_once(Utc::now)
            .map_err(SessionError::CannotInitEpoch)?;

        let epoch = match SESSION_EPOCH.get() {
            Some(e) => *e,
            None => return Err(SessionError::CannotGetEpoch),
        };

        // Get the root directory
        let root = crate::host::get_arm_sw_root().map_err(|_| SessionError::SwRootNotSet)?;

        // Create the session path
        let mut path: PathBuf = root;
        path.push(sessions_dir);
        path.push(format!("{}_{}", exec_name, epoch.format(TIMESTAMP_FORMAT)));
        fs::create_dir_all(&path).map_err(SessionError::CannotCreateDir)?;

        // Create the archive dir
        let arch_path = path.join("arch");
        fs::create_dir_all(&arch_path).map_err(SessionError::CannotCreateDir)?;

        let log_file_path = path.join(format!("{}.log", exec_name));

        let save_thread = SaveThread::spawn(path.clone());

        Ok(Session {
            epoch,
            session_root: path,
            arch_root: arch_path,
            log_file_path,
            save_thread,
        })
    }

    /// Exit the session, waiting for the save thread to finish any pending actions
    pub fn exit(self) {
        info!("Stopping save thread");

        self.save_thread.join();

        info!("Save thread exited");
    }

    /// Saves the given data to the given session-relative path in a background thread.
    ///
    /// Only `.json` paths are currently supported.
    pub fn save<P: AsRef<Path>, T: Serialize + Send + 'static>(&self, path: P, data: T) {
        if let Err(e) = self
            .save_thread
            .sender
            .send((path.as_ref().to_path_buf(), Box::new(data)))
        {
            warn!(
                "Could not send data to be saved to path {:?}: {}",
                path.as_ref(),
                e
            )
        }
    }
}

impl SaveThread {
    /// Spawn the save thread, writing data relative to `session_root`.
    fn spawn(session_root: PathBuf) -> Self {
        let (sender, receiver) = channel();
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let handle = thread::spawn(move || save_thread(thread_stop, session_root, receiver));

        Self {
            sender,
            stop,
            handle,
        }
    }

    /// Stop the thread once the queue is drained and wait for it to exit.
    fn join(self) {
        self.stop.store(true, Ordering::Relaxed);

        if self.handle.join().is_err() {
            warn!("The save thread panicked, some data may not have been saved");
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the number of seconds elapsed since the start of the session.
///
/// Returns `NAN` if the session has not been started yet.
pub fn get_elapsed_seconds() -> f64 {
    match SESSION_EPOCH.get() {
        Some(e) => time::duration_to_seconds(Utc::now() - *e).unwrap_or(std::f64::NAN),
        None => std::f64::NAN,
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn save_thread(stop: Arc<AtomicBool>, session_root: PathBuf, receiver: Receiver<SaveRequest>) {
    loop {
        match receiver.recv_timeout(SAVE_POLL_PERIOD) {
            Ok((path, data)) => {
                let full_path = session_root.join(&path);
                if let Err(e) = write_data(&full_path, &*data) {
                    warn!("Couldn't save data to {:?}: {}", full_path, e);
                }
            }
            // If there's no data check if we should stop
            Err(RecvTimeoutError::Timeout) => {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Write a single piece of data to disk, choosing the format from the path extension.
fn write_data(full_path: &Path, data: &(dyn Serialize + Send)) -> Result<(), SaveError> {
    match full_path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            // Create the parent path if needed
            let parent = full_path.parent().ok_or(SaveError::NoParent)?;
            fs::create_dir_all(parent)?;

            let file = OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .open(full_path)?;

            serde_json::to_writer_pretty(&file, data)?;

            Ok(())
        }
        ext => Err(SaveError::UnknownExtension(ext.map(String::from))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_write_data_json() {
        let path = std::env::temp_dir()
            .join("arm_util_session_test")
            .join("nested")
            .join("data.json");
        let _ = fs::remove_file(&path);

        let data: Vec<f64> = vec![0.0, 1.5];
        write_data(&path, &data).unwrap();

        let read: Vec<f64> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, data);
    }

    #[test]
    fn test_save_thread_join_drains_queue() {
        let root = std::env::temp_dir().join("arm_util_session_join_test");
        let path = root.join("arch").join("value.json");
        let _ = fs::remove_file(&path);

        let saver = SaveThread::spawn(root);
        saver
            .sender
            .send((PathBuf::from("arch/value.json"), Box::new(42u32)))
            .unwrap();
        saver.join();

        let read: u32 = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, 42);
    }

    #[test]
    fn test_save_thread_join_after_exit() {
        let saver = SaveThread::spawn(std::env::temp_dir().join("arm_util_session_join_test"));

        // Stop the thread first, join must still return once it has gone
        saver.stop.store(true, Ordering::Relaxed);
        thread::sleep(SAVE_POLL_PERIOD * 4);

        saver.join();
    }

    #[test]
    fn test_write_data_unknown_extension() {
        let path = std::env::temp_dir().join("arm_util_session_test").join("data.bin");
        let data = 1u32;
        assert!(matches!(
            write_data(&path, &data),
            Err(SaveError::UnknownExtension(Some(_)))
        ));
    }
}
