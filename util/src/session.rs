//! Execution sessions
//!
//! Every run of an executable gets its own session directory holding the log
//! file and the CSV archives. The session epoch is shared by the whole process
//! and is the reference for all elapsed times in logs and archives.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fs;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use conquer_once::{OnceCell, TryInitError};
use thiserror::Error;

use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

/// Instant at which the first session of this process was created.
static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

/// strftime format of the timestamp in session directory names.
const DIR_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Paths belonging to the current session.
#[derive(Clone, Debug)]
pub struct Session {
    /// Directory name, `{exec_name}_{timestamp}`
    pub name: String,

    pub session_root: PathBuf,

    /// All archive paths are relative to this directory
    pub arch_root: PathBuf,

    pub log_file_path: PathBuf
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable PICAR_SW_ROOT is not set")]
    SwRootNotSet,

    #[error("Cannot create the session directory {0:?}: {1}")]
    CannotCreateDir(PathBuf, std::io::Error),

    #[error("Cannot initialise the session epoch: {0}")]
    CannotInitEpoch(TryInitError),

    #[error("The session epoch is not available")]
    EpochUnavailable
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start a new session in `$PICAR_SW_ROOT/{sessions_dir}`.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        let root = crate::host::get_picar_sw_root()
            .map_err(|_| SessionError::SwRootNotSet)?;

        Self::in_dir(root.join(sessions_dir), exec_name)
    }

    /// Start a new session inside the given directory.
    ///
    /// The epoch is set by the first session created in the process, later
    /// sessions reuse it.
    pub fn in_dir<P: AsRef<Path>>(sessions_dir: P, exec_name: &str) -> Result<Self, SessionError> {
        let epoch = init_epoch()?;

        let name = format!("{}_{}", exec_name, epoch.format(DIR_TIMESTAMP_FORMAT));
        let session_root = sessions_dir.as_ref().join(&name);
        let arch_root = session_root.join("arch");

        fs::create_dir_all(&arch_root)
            .map_err(|e| SessionError::CannotCreateDir(arch_root.clone(), e))?;

        Ok(Session {
            log_file_path: session_root.join(format!("{}.log", exec_name)),
            name,
            session_root,
            arch_root
        })
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Seconds elapsed since the session epoch, or `None` if no session has been
/// created.
pub fn elapsed_seconds() -> Option<f64> {
    SESSION_EPOCH.get()
        .and_then(|e| time::duration_to_seconds(Utc::now() - *e))
}

/// The session epoch, or `None` if no session has been created.
pub fn epoch() -> Option<&'static DateTime<Utc>> {
    SESSION_EPOCH.get()
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn init_epoch() -> Result<&'static DateTime<Utc>, SessionError> {
    match SESSION_EPOCH.try_init_once(Utc::now) {
        Ok(()) | Err(TryInitError::AlreadyInit) => (),
        Err(e) => return Err(SessionError::CannotInitEpoch(e))
    }

    SESSION_EPOCH.get().ok_or(SessionError::EpochUnavailable)
}
