//! Recording session bookkeeping.
//!
//! A session is created when recording starts and dropped when it stops.
//! Its directory name ties the video to the acquisition software's own
//! recording: `<base>_experiment_<n>_recording_<m>`, where `<base>` is the
//! last component of the path the acquisition software reported.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use rpicamera_protocol::StartArgs;

use crate::config::RecordingSettings;
use crate::error::ServerResult;

/// Suffix appended to the video base name for the parameter file.
pub const PARAMS_SUFFIX: &str = "_params.json";

/// Timestamp format used when a `Start` request carries no path.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// One active recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub experiment: u32,
    pub recording: u32,
    /// Recording directory.
    pub rec_path: PathBuf,
    /// Video file inside `rec_path`.
    pub video_path: PathBuf,
    /// Parameter file inside `rec_path`.
    pub params_path: PathBuf,
}

/// Builds session paths and owns the active session.
#[derive(Debug)]
pub struct SessionManager {
    data_path: PathBuf,
    active: Option<Session>,
}

impl SessionManager {
    /// Creates a manager that records under `data_path`.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            active: None,
        }
    }

    /// Returns the data directory.
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Returns the active session, if any.
    pub fn active(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    /// Derives the session paths for a start request without touching the
    /// filesystem.
    pub fn plan(&self, args: &StartArgs, output: &RecordingSettings) -> Session {
        let base = match args.path.as_deref() {
            Some(path) => last_path_component(path).to_string(),
            None => Local::now().format(TIMESTAMP_FORMAT).to_string(),
        };
        let rec_path = self.data_path.join(session_dir_name(
            &base,
            args.experiment,
            args.recording,
        ));
        let video_path =
            rec_path.join(format!("{}.{}", output.filename, output.format.extension()));
        let params_path = rec_path.join(format!("{}{}", output.filename, PARAMS_SUFFIX));

        Session {
            experiment: args.experiment,
            recording: args.recording,
            rec_path,
            video_path,
            params_path,
        }
    }

    /// Plans a session and creates its directory.
    ///
    /// The session is not active until [`activate`](Self::activate) is called.
    pub fn prepare(&self, args: &StartArgs, output: &RecordingSettings) -> ServerResult<Session> {
        let session = self.plan(args, output);
        if !session.rec_path.exists() {
            fs::create_dir_all(&session.rec_path)?;
            debug!(path = %session.rec_path.display(), "Created recording directory");
        }
        info!(path = %session.rec_path.display(), "Saving data to recording directory");
        Ok(session)
    }

    /// Makes `session` the active session.
    pub fn activate(&mut self, session: Session) -> &Session {
        self.active.insert(session)
    }

    /// Drops the active session, returning it.
    pub fn discard(&mut self) -> Option<Session> {
        self.active.take()
    }
}

/// Returns the directory name for a recording.
pub fn session_dir_name(base: &str, experiment: u32, recording: u32) -> String {
    format!("{base}_experiment_{experiment}_recording_{recording}")
}

/// Returns the last component of a `/` or `\` separated path.
///
/// Trailing separators are ignored. A path made only of separators gives
/// an empty string, never a separator.
pub fn last_path_component(path: &str) -> &str {
    path.split(['/', '\\'])
        .rev()
        .find(|part| !part.is_empty())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn start(experiment: u32, recording: u32, path: Option<&str>) -> StartArgs {
        StartArgs {
            experiment,
            recording,
            path: path.map(str::to_string),
        }
    }

    #[test]
    fn last_component_of_paths() {
        assert_eq!(last_path_component("/data/20240101_1200"), "20240101_1200");
        assert_eq!(last_path_component("/data/20240101_1200/"), "20240101_1200");
        assert_eq!(last_path_component(r"C:\data\2024-01-01_12-00-00"), "2024-01-01_12-00-00");
        assert_eq!(last_path_component("plain"), "plain");
        assert_eq!(last_path_component("/"), "");
        assert_eq!(last_path_component("///"), "");
        assert_eq!(last_path_component(r"\\"), "");
        assert_eq!(last_path_component(""), "");
    }

    #[test]
    fn plan_with_separator_only_path_stays_in_data_dir() {
        let manager = SessionManager::new("/rec");
        for path in ["/", "///", r"\\"] {
            let session = manager.plan(&start(0, 1, Some(path)), &RecordingSettings::default());
            assert_eq!(
                session.rec_path,
                PathBuf::from("/rec/_experiment_0_recording_1"),
                "path {path:?}"
            );
            assert!(session.params_path.starts_with("/rec"));
        }
    }

    #[test]
    fn plan_builds_expected_paths() {
        let manager = SessionManager::new("/rec");
        let session = manager.plan(
            &start(2, 3, Some("/data/20240101_1200")),
            &RecordingSettings::default(),
        );

        assert_eq!(
            session.rec_path,
            PathBuf::from("/rec/20240101_1200_experiment_2_recording_3")
        );
        assert_eq!(
            session.video_path,
            PathBuf::from("/rec/20240101_1200_experiment_2_recording_3/rpicamera_video.h264")
        );
        assert_eq!(
            session.params_path,
            PathBuf::from(
                "/rec/20240101_1200_experiment_2_recording_3/rpicamera_video_params.json"
            )
        );
        assert_eq!(session.experiment, 2);
        assert_eq!(session.recording, 3);
    }

    #[test]
    fn plan_without_path_uses_timestamp() {
        let manager = SessionManager::new("/rec");
        let session = manager.plan(&start(0, 1, None), &RecordingSettings::default());
        let name = session.rec_path.file_name().unwrap().to_string_lossy().to_string();

        assert!(name.ends_with("_experiment_0_recording_1"));
        let stamp = name.trim_end_matches("_experiment_0_recording_1");
        assert!(chrono::NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn prepare_creates_directory_once() {
        let dir = tempdir().unwrap();
        let manager = SessionManager::new(dir.path());
        let args = start(1, 1, Some("a"));

        let first = manager.prepare(&args, &RecordingSettings::default()).unwrap();
        assert!(first.rec_path.is_dir());
        let second = manager.prepare(&args, &RecordingSettings::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn prepare_reports_io_errors() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let manager = SessionManager::new(&blocker);
        let result = manager.prepare(&start(0, 1, Some("x")), &RecordingSettings::default());
        assert!(matches!(result, Err(crate::ServerError::Io(_))));
    }

    #[test]
    fn activate_and_discard() {
        let mut manager = SessionManager::new("/rec");
        assert!(manager.active().is_none());

        let session = manager.plan(&start(0, 1, Some("x")), &RecordingSettings::default());
        manager.activate(session.clone());
        assert_eq!(manager.active(), Some(&session));

        assert_eq!(manager.discard(), Some(session));
        assert!(manager.active().is_none());
        assert!(manager.discard().is_none());
    }
}
