//! Motion detection session management.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tokio::sync::mpsc;

use vigilcam_common::clock::SessionClock;
use vigilcam_common::config::AppConfig;
use vigilcam_common::error::{VigilError, VigilResult};
use vigilcam_model::{MotionStatus, RegionCommand, VectorGrid};
use vigilcam_motion::{
    frame_preview_crop, process_frame, FrameDecision, MotionFrame, PreviewCrop, RecordAction,
    RecordingState,
};

use crate::persist;
use crate::stats::StatsWriter;
use crate::store;

/// Seconds to ignore motion after session start while the sensor AGC
/// settles.
const SETTLE_SECS: u32 = 3;

/// Recording collaborator driven by detection side effects.
pub trait RecordingControl: Send {
    /// Begin a motion recording, scheduled to stop at `stop_deadline`
    /// unless extended.
    fn start(&mut self, stop_deadline: Instant) -> VigilResult<()>;

    /// Push the scheduled stop of the running recording out to
    /// `stop_deadline`.
    fn extend(&mut self, stop_deadline: Instant) -> VigilResult<()>;

    /// Save a preview image cropped to the detected motion.
    fn save_preview(&mut self, crop: PreviewCrop) -> VigilResult<()>;
}

/// Operator display collaborator for short informational messages.
pub trait OperatorNotify: Send {
    fn inform(&mut self, message: &str);
}

struct Inner {
    frame: MotionFrame,
    config: AppConfig,
    recording: RecordingState,
    control: Box<dyn RecordingControl>,
    notify: Box<dyn OperatorNotify>,
    regions_profile: String,
    frame_count: u64,
    settled_at: Instant,
}

/// One camera's motion detection state and its collaborators.
///
/// All mutation runs under one lock: the frame classification pass and
/// every region command serialize against each other. Stats output
/// happens after the lock is released.
pub struct MotionSession {
    inner: Mutex<Inner>,
    stats: Mutex<Option<StatsWriter<BufWriter<File>>>>,
    clock: SessionClock,
}

/// Cloneable handle for feeding command lines to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<String>,
}

impl SessionHandle {
    /// Queue one command line.
    pub async fn send_line(&self, line: impl Into<String>) -> VigilResult<()> {
        self.tx
            .send(line.into())
            .await
            .map_err(|_| VigilError::region("Session command channel closed"))
    }
}

impl MotionSession {
    /// Create a session. The vector grid geometry comes from the camera
    /// config; a stats writer is opened when stats are enabled.
    pub fn new(
        config: AppConfig,
        control: Box<dyn RecordingControl>,
        notify: Box<dyn OperatorNotify>,
    ) -> VigilResult<Self> {
        let mut frame = MotionFrame::new();
        frame.configure_resolution(config.camera.video_width, config.camera.video_height);

        let stats = if config.motion.stats {
            std::fs::create_dir_all(&config.config_dir)?;
            Some(StatsWriter::create(&stats_path(&config))?)
        } else {
            None
        };

        let clock = SessionClock::start();
        tracing::info!(
            epoch_wall = %clock.epoch_wall(),
            grid_width = frame.width,
            grid_height = frame.height,
            "Motion session started"
        );

        Ok(Self {
            inner: Mutex::new(Inner {
                frame,
                config,
                recording: RecordingState::Idle,
                control,
                notify,
                regions_profile: "default".to_string(),
                frame_count: 0,
                settled_at: clock.deadline_in(SETTLE_SECS),
            }),
            stats: Mutex::new(stats),
            clock,
        })
    }

    /// Classify one encoder vector grid and drive the recording
    /// collaborator. Returns the frame's motion status.
    pub fn process_frame(&self, vectors: &VectorGrid) -> VigilResult<MotionStatus> {
        // The session lock is released before stats I/O.
        let (status, record) = {
            let mut guard = lock(&self.inner);
            let inner = &mut *guard;
            if self.clock.now() < inner.settled_at {
                return Ok(MotionStatus::NONE);
            }
            inner.frame_count += 1;

            let decision = process_frame(
                &mut inner.frame,
                vectors,
                &inner.config.motion,
                &inner.config.camera,
                inner.recording,
            );
            self.apply_decision(inner, decision);

            let record = (inner.config.motion.stats
                && inner.config.motion.enable
                && decision.status.detected)
                .then(|| {
                    (
                        inner.frame.width,
                        inner.frame.height,
                        inner.frame_count,
                        inner.config.camera.video_fps,
                        inner.frame.frame_vector,
                    )
                });
            (decision.status, record)
        };

        if let Some((w, h, count, fps, cvec)) = record {
            if let Some(stats) = lock(&self.stats).as_mut() {
                stats.write_frame(w, h, count, fps, &cvec)?;
            }
        }
        Ok(status)
    }

    /// Drive the recording collaborator. Collaborator failures are logged
    /// and never abort the frame; a failed start leaves the session idle
    /// so the next detect retries, and a failed preview save keeps the
    /// previous preview.
    fn apply_decision(&self, inner: &mut Inner, decision: FrameDecision) {
        let Some(action) = decision.action else {
            return;
        };
        let deadline = self
            .clock
            .deadline_in(inner.config.motion.post_capture_secs);
        match action {
            RecordAction::Start => {
                tracing::info!(status = decision.status.label(), "Motion record start");
                match inner.control.start(deadline) {
                    Ok(()) => {
                        inner.recording = RecordingState::MotionRecord;
                        save_staged_preview(inner);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Recording start failed");
                    }
                }
            }
            RecordAction::Extend { restage_preview } => {
                tracing::debug!(status = decision.status.label(), "Motion record extend");
                if let Err(e) = inner.control.extend(deadline) {
                    tracing::warn!(error = %e, "Recording extend failed");
                }
                if restage_preview {
                    save_staged_preview(inner);
                }
            }
        }
    }

    /// Parse and apply one command line. Malformed lines are dropped.
    pub fn handle_command_line(&self, line: &str) {
        match RegionCommand::parse(line) {
            Some(cmd) => self.handle_command(cmd),
            None => {
                if !line.trim().is_empty() && !line.trim_start().starts_with('#') {
                    tracing::debug!(line, "Ignored malformed motion command");
                }
            }
        }
    }

    /// Apply one region command.
    pub fn handle_command(&self, cmd: RegionCommand) {
        let mut inner = lock(&self.inner);
        dispatch(&mut inner, cmd);
    }

    /// Rebuild the grids after an encoder resolution change. Regions keep
    /// their normalized rectangles and re-derive pixel rectangles.
    pub fn configure_resolution(&self, video_width: u32, video_height: u32) {
        let mut inner = lock(&self.inner);
        inner.frame.configure_resolution(video_width, video_height);
    }

    /// End the startup settle window immediately. Synthetic vector
    /// sources (simulation, tests) have no AGC to wait out.
    pub fn force_settled(&self) {
        let mut inner = lock(&self.inner);
        inner.settled_at = self.clock.now();
    }

    /// Mark an operator-initiated recording
    /// running (detects are ignored while it is).
    pub fn set_manual_recording(&self, active: bool) {
        let mut inner = lock(&self.inner);
        inner.recording = if active {
            RecordingState::Manual
        } else {
            RecordingState::Idle
        };
    }

    /// The recording collaborator reports that the current recording
    /// finished.
    pub fn recording_finished(&self) {
        let mut inner = lock(&self.inner);
        if inner.recording == RecordingState::MotionRecord {
            inner.recording = RecordingState::Idle;
        }
    }

    pub fn recording_state(&self) -> RecordingState {
        lock(&self.inner).recording
    }

    /// Name of the most recently loaded region profile.
    pub fn regions_profile(&self) -> String {
        lock(&self.inner).regions_profile.clone()
    }

    /// Number of regions currently in the store.
    pub fn region_count(&self) -> usize {
        lock(&self.inner).frame.regions.len()
    }

    /// Spawn the async command intake loop. Lines sent through the
    /// returned handle are applied in order.
    pub fn spawn_command_loop(
        self: &Arc<Self>,
        buffer: usize,
    ) -> (SessionHandle, tokio::task::JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<String>(buffer);
        let session = Arc::clone(self);
        let task = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                session.handle_command_line(&line);
            }
            tracing::debug!("Motion command channel closed");
        });
        (SessionHandle { tx }, task)
    }
}

fn stats_path(config: &AppConfig) -> PathBuf {
    config.config_dir.join("motion-stats.csv")
}

fn staged_crop(inner: &Inner) -> Option<PreviewCrop> {
    frame_preview_crop(
        &inner.frame.preview_frame_vector,
        &inner.frame.preview_motion_area,
        inner.frame.width,
        inner.frame.height,
        &inner.config.camera,
        inner.config.motion.area_min_side,
    )
}

fn save_staged_preview(inner: &mut Inner) {
    if let Some(crop) = staged_crop(inner) {
        if let Err(e) = inner.control.save_preview(crop) {
            tracing::warn!(error = %e, "Preview save failed, keeping previous preview");
        }
    }
}

/// Lock that shrugs off poisoning: region state stays usable even if a
/// previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn dispatch(inner: &mut Inner, cmd: RegionCommand) {
    match cmd {
        RegionCommand::ShowRegions(on) => inner.frame.show_regions = on,
        RegionCommand::ShowVectors(on) => inner.frame.show_vectors = on,
        RegionCommand::AddRegion { xf0, yf0, dxf, dyf } => {
            store::add_region(&mut inner.frame, xf0, yf0, dxf, dyf);
        }
        RegionCommand::SelectRegion(select) => {
            store::select_region(&mut inner.frame, select);
        }
        RegionCommand::MoveCoarse { axis, positive } => {
            if !store::move_coarse(&mut inner.frame, axis, positive) {
                inner.notify.inform("Select a region first.");
            }
        }
        RegionCommand::MoveFine { axis, positive } => {
            if !store::move_fine(&mut inner.frame, axis, positive) {
                inner.notify.inform("Select a region first.");
            }
        }
        RegionCommand::MoveRegion {
            index,
            dxf0,
            dyf0,
            ddxf,
            ddyf,
        } => {
            store::move_region(&mut inner.frame, index, dxf0, dyf0, ddxf, ddyf);
        }
        RegionCommand::AssignRegion {
            index,
            xf0,
            yf0,
            dxf,
            dyf,
        } => {
            store::assign_region(&mut inner.frame, index, xf0, yf0, dxf, dyf);
        }
        RegionCommand::DeleteRegions(target) => {
            if !store::delete_regions(&mut inner.frame, target) {
                inner.notify.inform("Select a region first.");
            }
        }
        RegionCommand::SetLimits { magnitude, count } => {
            store::set_limits(&mut inner.config.motion, &inner.frame, magnitude, count);
        }
        RegionCommand::SetBurst { count, frames } => {
            store::set_burst(&mut inner.config.motion, &inner.frame, count, frames);
        }
        RegionCommand::SaveRegions(name) => {
            match persist::save_regions(&inner.frame.regions, &inner.config.config_dir, &name) {
                Ok(path) => {
                    inner.notify.inform("Saved motion regions to:");
                    inner
                        .notify
                        .inform(&persist::profile_from_file_name(
                            path.file_name()
                                .and_then(|n| n.to_str())
                                .unwrap_or_default(),
                        ));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to save motion regions");
                    inner.notify.inform("Cannot save motion regions.");
                }
            }
        }
        RegionCommand::LoadRegions { name, show } => load_regions(inner, &name, show),
        RegionCommand::ListRegions => match persist::list_regions(&inner.config.config_dir) {
            Ok(profiles) => {
                inner.notify.inform("Motion regions list:");
                for profile in profiles {
                    inner.notify.inform(&profile);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list motion regions");
            }
        },
    }
}

/// Replace the store with a persisted profile.
///
/// The file is replayed as command lines after clearing the store, so a
/// failure partway leaves a partial load. The region display state is
/// restored afterwards (or forced on when `show` is set).
fn load_regions(inner: &mut Inner, name: &str, show: bool) {
    let lines = match persist::read_regions(&inner.config.config_dir, name) {
        Ok(lines) => lines,
        Err(e) => {
            tracing::warn!(error = %e, profile = name, "Failed to open motion regions");
            inner.notify.inform("Cannot open motion regions name:");
            inner
                .notify
                .inform(&persist::profile_from_file_name(&persist::profile_file_name(name)));
            return;
        }
    };

    let save_show = show || inner.frame.show_regions;

    store::delete_regions(&mut inner.frame, vigilcam_model::DeleteTarget::All);
    for line in &lines {
        if let Some(cmd) = RegionCommand::parse(line) {
            dispatch(inner, cmd);
        }
    }
    inner.frame.show_regions = save_show;
    inner.regions_profile = persist::profile_from_file_name(&persist::profile_file_name(name));
    tracing::info!(
        profile = %inner.regions_profile,
        regions = inner.frame.regions.len(),
        "Loaded motion regions"
    );
    inner.notify.inform("Loaded motion regions name:");
    let profile = inner.regions_profile.clone();
    inner.notify.inform(&profile);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vigilcam_model::MotionVector;

    #[derive(Default)]
    struct RecordingSpy {
        starts: Arc<AtomicUsize>,
        extends: Arc<AtomicUsize>,
        previews: Arc<AtomicUsize>,
    }

    impl RecordingControl for RecordingSpy {
        fn start(&mut self, _stop_deadline: Instant) -> VigilResult<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn extend(&mut self, _stop_deadline: Instant) -> VigilResult<()> {
            self.extends.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn save_preview(&mut self, _crop: PreviewCrop) -> VigilResult<()> {
            self.previews.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Control whose configured calls fail; attempts are still counted.
    #[derive(Default)]
    struct FlakyControl {
        fail_start: bool,
        fail_preview: bool,
        start_attempts: Arc<AtomicUsize>,
        previews: Arc<AtomicUsize>,
    }

    impl RecordingControl for FlakyControl {
        fn start(&mut self, _stop_deadline: Instant) -> VigilResult<()> {
            self.start_attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                Err(VigilError::recording("h264 writer unavailable"))
            } else {
                Ok(())
            }
        }
        fn extend(&mut self, _stop_deadline: Instant) -> VigilResult<()> {
            Ok(())
        }
        fn save_preview(&mut self, _crop: PreviewCrop) -> VigilResult<()> {
            self.previews.fetch_add(1, Ordering::SeqCst);
            if self.fail_preview {
                Err(VigilError::recording("preview save failed"))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct NotifySpy {
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl OperatorNotify for NotifySpy {
        fn inform(&mut self, message: &str) {
            lock(&self.messages).push(message.to_string());
        }
    }

    fn test_config(dir_tag: &str) -> AppConfig {
        let dir = std::env::temp_dir().join(dir_tag);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let mut config = AppConfig::default();
        config.config_dir = dir;
        config.camera.video_width = 304;
        config.camera.video_height = 224;
        config.motion.confirm_gap_secs = 0;
        config
    }

    fn test_session(dir_tag: &str) -> (MotionSession, Arc<AtomicUsize>, Arc<Mutex<Vec<String>>>) {
        let spy = RecordingSpy::default();
        let starts = Arc::clone(&spy.starts);
        let notify = NotifySpy::default();
        let messages = Arc::clone(&notify.messages);
        let session =
            MotionSession::new(test_config(dir_tag), Box::new(spy), Box::new(notify)).unwrap();
        (session, starts, messages)
    }

    fn moving_grid() -> VectorGrid {
        let mut grid = VectorGrid::for_video(304, 224);
        for y in 6..9 {
            for x in 9..12 {
                grid.set(x, y, MotionVector::new(10, 0));
            }
        }
        grid
    }

    #[test]
    fn test_settle_window_suppresses_detection() {
        let (session, starts, _) = test_session("vigilcam_test_settle");
        session.handle_command_line("add_region 0.0 0.0 1.0 1.0");
        let status = session.process_frame(&moving_grid()).unwrap();
        assert_eq!(status, MotionStatus::NONE);
        assert_eq!(starts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_detection_starts_then_extends_recording() {
        let spy = RecordingSpy::default();
        let starts = Arc::clone(&spy.starts);
        let extends = Arc::clone(&spy.extends);
        let previews = Arc::clone(&spy.previews);
        let session = MotionSession::new(
            test_config("vigilcam_test_detect"),
            Box::new(spy),
            Box::new(NotifySpy::default()),
        )
        .unwrap();
        session.force_settled();
        session.handle_command_line("add_region 0.0 0.0 1.0 1.0");

        let status = session.process_frame(&moving_grid()).unwrap();
        assert!(status.detected);
        assert_eq!(session.recording_state(), RecordingState::MotionRecord);
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(previews.load(Ordering::SeqCst), 1);

        session.process_frame(&moving_grid()).unwrap();
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(extends.load(Ordering::SeqCst), 1);

        session.recording_finished();
        assert_eq!(session.recording_state(), RecordingState::Idle);
    }

    #[test]
    fn test_manual_recording_swallows_detects() {
        let spy = RecordingSpy::default();
        let starts = Arc::clone(&spy.starts);
        let session = MotionSession::new(
            test_config("vigilcam_test_manual"),
            Box::new(spy),
            Box::new(NotifySpy::default()),
        )
        .unwrap();
        session.force_settled();
        session.set_manual_recording(true);
        session.handle_command_line("add_region 0.0 0.0 1.0 1.0");

        let status = session.process_frame(&moving_grid()).unwrap();
        assert!(status.detected);
        assert_eq!(starts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_preview_save_failure_does_not_abort_frame() {
        let control = FlakyControl {
            fail_preview: true,
            ..FlakyControl::default()
        };
        let previews = Arc::clone(&control.previews);
        let session = MotionSession::new(
            test_config("vigilcam_test_preview_fail"),
            Box::new(control),
            Box::new(NotifySpy::default()),
        )
        .unwrap();
        session.force_settled();
        session.handle_command_line("add_region 0.0 0.0 1.0 1.0");

        let status = session.process_frame(&moving_grid()).unwrap();
        assert!(status.detected);
        assert_eq!(previews.load(Ordering::SeqCst), 1);
        // The recording itself started fine.
        assert_eq!(session.recording_state(), RecordingState::MotionRecord);
    }

    #[test]
    fn test_start_failure_leaves_session_idle_and_retries() {
        let control = FlakyControl {
            fail_start: true,
            ..FlakyControl::default()
        };
        let start_attempts = Arc::clone(&control.start_attempts);
        let session = MotionSession::new(
            test_config("vigilcam_test_start_fail"),
            Box::new(control),
            Box::new(NotifySpy::default()),
        )
        .unwrap();
        session.force_settled();
        session.handle_command_line("add_region 0.0 0.0 1.0 1.0");

        assert!(session.process_frame(&moving_grid()).is_ok());
        assert_eq!(session.recording_state(), RecordingState::Idle);

        // Still idle, so the next detect is another start, not an extend
        // against a recording that never began.
        assert!(session.process_frame(&moving_grid()).is_ok());
        assert_eq!(start_attempts.load(Ordering::SeqCst), 2);
        assert_eq!(session.recording_state(), RecordingState::Idle);
    }

    #[test]
    fn test_stats_not_written_when_detection_disabled() {
        let mut config = test_config("vigilcam_test_stats_gate");
        config.motion.stats = true;
        config.motion.enable = false;
        let stats_file = config.config_dir.join("motion-stats.csv");
        let session = MotionSession::new(
            config,
            Box::new(RecordingSpy::default()),
            Box::new(NotifySpy::default()),
        )
        .unwrap();
        session.force_settled();
        session.handle_command_line("add_region 0.0 0.0 1.0 1.0");

        let status = session.process_frame(&moving_grid()).unwrap();
        assert!(status.detected);
        assert_eq!(std::fs::read_to_string(stats_file).unwrap(), "");
    }

    #[test]
    fn test_command_dispatch_mutates_store() {
        let (session, _, _) = test_session("vigilcam_test_dispatch");
        session.handle_command_line("add_region 0.1 0.1 0.3 0.3");
        session.handle_command_line("add_region 0.5 0.5 0.3 0.3");
        assert_eq!(session.region_count(), 2);
        session.handle_command_line("delete_regions 0");
        assert_eq!(session.region_count(), 1);
    }

    #[test]
    fn test_malformed_command_is_dropped_whole() {
        let (session, _, _) = test_session("vigilcam_test_malformed");
        session.handle_command_line("add_region 0.1 0.1 0.3");
        session.handle_command_line("add_region 0.1 0.1 0.3 1.5");
        session.handle_command_line("bogus 1 2 3");
        assert_eq!(session.region_count(), 0);
    }

    #[test]
    fn test_nudge_without_selection_informs_operator() {
        let (session, _, messages) = test_session("vigilcam_test_inform");
        session.handle_command_line("move_coarse x +");
        let messages = lock(&messages);
        assert_eq!(messages.as_slice(), ["Select a region first."]);
    }

    #[test]
    fn test_save_load_round_trip_preserves_regions() {
        let (session, _, _) = test_session("vigilcam_test_roundtrip");
        session.handle_command_line("add_region 0.125 0.250 0.500 0.250");
        session.handle_command_line("save_regions porch");
        session.handle_command_line("delete_regions all");
        assert_eq!(session.region_count(), 0);

        session.handle_command_line("load_regions porch");
        assert_eq!(session.region_count(), 1);
        assert_eq!(session.regions_profile(), "porch");
    }

    #[test]
    fn test_load_missing_profile_notifies() {
        let (session, _, messages) = test_session("vigilcam_test_load_missing");
        session.handle_command_line("add_region 0.1 0.1 0.3 0.3");
        session.handle_command_line("load_regions nowhere");
        // Store untouched on open failure.
        assert_eq!(session.region_count(), 1);
        assert!(lock(&messages)
            .iter()
            .any(|m| m.contains("Cannot open motion regions")));
    }

    #[test]
    fn test_load_regions_show_forces_display_on() {
        let (session, _, _) = test_session("vigilcam_test_load_show");
        session.handle_command_line("add_region 0.1 0.1 0.3 0.3");
        session.handle_command_line("save_regions default");
        session.handle_command_line("show_regions off");
        session.handle_command_line("load_regions_show default");
        assert!(lock(&session.inner).frame.show_regions);
    }

    #[tokio::test]
    async fn test_command_loop_applies_lines_in_order() {
        let (session, _, _) = test_session("vigilcam_test_loop");
        let session = Arc::new(session);
        let (handle, task) = session.spawn_command_loop(16);

        handle.send_line("add_region 0.1 0.1 0.3 0.3").await.unwrap();
        handle.send_line("add_region 0.5 0.5 0.3 0.3").await.unwrap();
        handle.send_line("delete_regions all").await.unwrap();
        drop(handle);
        task.await.unwrap();

        assert_eq!(session.region_count(), 0);
    }
}
