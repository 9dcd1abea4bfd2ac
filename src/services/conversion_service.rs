use crate::constants::{DEFAULT_PROBE_TOOL, DEFAULT_TRANSCODE_TOOL, NO_OUTPUT_NOTICE};
use crate::conversion::{build_probe_args, build_transcode_args, ProgressParser};
use crate::events::{AppEvent, EventSender};
use crate::metadata::parse_probe_output;
use crate::presets::{match_presets, PresetId};
use crate::process::{CommandRunner, Invocation, ProcessError};
use crate::services::file_service::resolve_output_path;
use crate::state::{ConversionStatus, Selection};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Why a `convert()` call did nothing. State is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertRejected {
    #[error("No input file selected")]
    NoInput,
    #[error("Media info is still being read")]
    MetadataPending,
    #[error("No preset selected")]
    NoPreset,
    #[error("Choose a preset to convert again")]
    NotReady,
    #[error("A conversion is already in progress")]
    AlreadyConverting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub probe: String,
    pub transcode: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            probe: DEFAULT_PROBE_TOOL.to_string(),
            transcode: DEFAULT_TRANSCODE_TOOL.to_string(),
        }
    }
}

/// Results coming back from background tasks, tagged with the selection that
/// started them.
#[derive(Debug)]
enum TaskMessage {
    ProbeFinished {
        selection_id: Uuid,
        result: Result<String, ProcessError>,
    },
    TranscodeOutput {
        selection_id: Uuid,
        line: String,
    },
    TranscodeFinished {
        selection_id: Uuid,
        output_path: PathBuf,
        result: Result<String, ProcessError>,
    },
}

impl TaskMessage {
    fn selection_id(&self) -> Uuid {
        match self {
            Self::ProbeFinished { selection_id, .. }
            | Self::TranscodeOutput { selection_id, .. }
            | Self::TranscodeFinished { selection_id, .. } => *selection_id,
        }
    }
}

/// Owns the current selection and drives probe and transcode runs.
///
/// All state changes happen on the caller's thread: child processes run on
/// the tokio runtime and report back through a channel that is drained by
/// [`pump`](Self::pump) or [`next_update`](Self::next_update). Results for a
/// selection that has since been replaced are dropped.
pub struct ConversionService {
    runner: Arc<dyn CommandRunner>,
    runtime: Handle,
    tools: ToolPaths,
    selection_id: Uuid,
    selection: Selection,
    progress_parser: Option<ProgressParser>,
    /// Selection that owns the running transcode. Survives `reset` and
    /// `select_input` until that child has exited.
    transcode_in_flight: Option<Uuid>,
    task_tx: mpsc::UnboundedSender<TaskMessage>,
    task_rx: mpsc::UnboundedReceiver<TaskMessage>,
    event_sender: EventSender,
}

impl ConversionService {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        runtime: Handle,
        tools: ToolPaths,
        event_sender: EventSender,
    ) -> Self {
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        Self {
            runner,
            runtime,
            tools,
            selection_id: Uuid::new_v4(),
            selection: Selection::default(),
            progress_parser: None,
            transcode_in_flight: None,
            task_tx,
            task_rx,
            event_sender,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn status(&self) -> &ConversionStatus {
        &self.selection.status
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// True while a probe for the current selection or any transcode is running.
    pub fn is_busy(&self) -> bool {
        self.selection.status.is_fetching() || self.is_transcoding()
    }

    /// True until the transcode child has exited, even if its selection was
    /// replaced.
    pub fn is_transcoding(&self) -> bool {
        self.transcode_in_flight.is_some()
    }

    pub fn can_convert(&self) -> bool {
        !self.is_transcoding() && self.selection.can_start_conversion()
    }

    /// Replaces the selection with `path` and starts probing it.
    pub fn select_input(&mut self, path: PathBuf) {
        self.selection_id = Uuid::new_v4();
        self.selection = Selection::for_input(path.clone());
        self.progress_parser = None;
        tracing::debug!("Selection {} -> {}", self.selection_id, self.selection.status.label());

        self.send_event(AppEvent::InputSelected {
            selection_id: self.selection_id,
            path: path.clone(),
        });

        let invocation = Invocation::new(self.tools.probe.as_str(), build_probe_args(&path));
        let runner = self.runner.clone();
        let task_tx = self.task_tx.clone();
        let selection_id = self.selection_id;

        self.runtime.spawn(async move {
            let result = runner.run(invocation, None).await;
            let _ = task_tx.send(TaskMessage::ProbeFinished {
                selection_id,
                result,
            });
        });
    }

    /// Chooses among the offered presets. Choosing after a finished attempt
    /// makes the selection ready for another one.
    pub fn select_preset(&mut self, id: PresetId) -> bool {
        if self.selection.status.is_converting() || !self.selection.select_preset(id) {
            return false;
        }

        if self.selection.status.is_finished() {
            self.selection.status = ConversionStatus::Ready;
            tracing::debug!("Selection {} -> Ready", self.selection_id);
        }
        true
    }

    /// Starts transcoding the selected input with the selected preset and
    /// returns the destination path.
    pub fn convert(&mut self) -> Result<PathBuf, ConvertRejected> {
        if self.is_transcoding() || self.selection.status.is_converting() {
            return Err(ConvertRejected::AlreadyConverting);
        }
        let input = self
            .selection
            .input_file
            .clone()
            .ok_or(ConvertRejected::NoInput)?;
        if self.selection.status.is_fetching() {
            return Err(ConvertRejected::MetadataPending);
        }
        if !self.selection.status.accepts_conversion() {
            return Err(ConvertRejected::NotReady);
        }
        let preset = self
            .selection
            .selected_preset
            .ok_or(ConvertRejected::NoPreset)?;

        let output_path = resolve_output_path(&input, preset.output_extension);
        let invocation = Invocation::new(
            self.tools.transcode.as_str(),
            build_transcode_args(preset, &input, &output_path),
        );
        let command = invocation.display_command();

        self.selection.output_file = Some(output_path.clone());
        self.selection.log.clear();
        self.selection.append_log(&format!("$ {}", command));
        self.selection.status = ConversionStatus::transition_to_converting();
        self.transcode_in_flight = Some(self.selection_id);
        self.progress_parser = Some(ProgressParser::new(
            self.selection
                .metadata
                .as_ref()
                .and_then(|metadata| metadata.duration_seconds()),
        ));

        tracing::info!("Converting {} with preset {}", input.display(), preset.id);
        self.send_event(AppEvent::ConversionStarted {
            selection_id: self.selection_id,
            command,
        });

        let runner = self.runner.clone();
        let task_tx = self.task_tx.clone();
        let selection_id = self.selection_id;
        let destination = output_path.clone();

        self.runtime.spawn(async move {
            let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
            let forward_tx = task_tx.clone();

            let forward = async move {
                while let Some(line) = line_rx.recv().await {
                    let _ = forward_tx.send(TaskMessage::TranscodeOutput { selection_id, line });
                }
            };
            let (result, ()) = tokio::join!(runner.run(invocation, Some(line_tx)), forward);

            let _ = task_tx.send(TaskMessage::TranscodeFinished {
                selection_id,
                output_path: destination,
                result,
            });
        });

        Ok(output_path)
    }

    /// Drops the selection and ignores anything still in flight for it.
    pub fn reset(&mut self) {
        self.selection_id = Uuid::new_v4();
        self.selection = Selection::default();
        self.progress_parser = None;
        self.send_event(AppEvent::SelectionCleared);
    }

    /// Applies every finished task result without blocking. Returns how many
    /// belonged to the current selection.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.task_rx.try_recv() {
            if self.apply(message) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next task result and applies it. Returns false when the
    /// result was stale.
    pub async fn next_update(&mut self) -> bool {
        match self.task_rx.recv().await {
            Some(message) => self.apply(message),
            None => false,
        }
    }

    fn apply(&mut self, message: TaskMessage) -> bool {
        if let TaskMessage::TranscodeFinished { selection_id, .. } = &message {
            if self.transcode_in_flight == Some(*selection_id) {
                self.transcode_in_flight = None;
            }
        }

        if message.selection_id() != self.selection_id {
            tracing::debug!(
                "Discarding result for superseded selection {}",
                message.selection_id()
            );
            return false;
        }

        match message {
            TaskMessage::ProbeFinished { result, .. } => self.finish_probe(result),
            TaskMessage::TranscodeOutput { line, .. } => self.record_transcode_line(&line),
            TaskMessage::TranscodeFinished {
                output_path,
                result,
                ..
            } => self.finish_conversion(output_path, result),
        }
        true
    }

    fn finish_probe(&mut self, result: Result<String, ProcessError>) {
        if !self.selection.status.is_fetching() {
            return;
        }

        match result {
            Ok(output) => {
                let metadata = parse_probe_output(&output);
                let matched = match_presets(Some(&metadata));
                let format_summary = metadata.format_summary();

                self.selection.metadata = Some(metadata);
                self.selection.apply_presets(matched);
                self.selection.status = ConversionStatus::Ready;

                self.send_event(AppEvent::MetadataLoaded {
                    selection_id: self.selection_id,
                    format_summary,
                    preset_count: self.selection.presets.len(),
                    is_fallback: self.selection.is_fallback,
                });
            }
            Err(e) => {
                tracing::warn!("Probe failed, offering every preset: {}", e);
                let error = e.diagnostic().to_string();

                self.selection.apply_presets(match_presets(None));
                self.selection.append_log(&error);
                self.selection.probe_error = Some(error.clone());
                self.selection.status = ConversionStatus::Ready;

                self.send_event(AppEvent::MetadataFailed {
                    selection_id: self.selection_id,
                    error,
                });
            }
        }
        tracing::debug!("Selection {} -> Ready", self.selection_id);
    }

    fn record_transcode_line(&mut self, line: &str) {
        if !self.selection.status.is_converting() {
            return;
        }
        let Some(progress) = self
            .progress_parser
            .as_ref()
            .and_then(|parser| parser.parse_line(line))
        else {
            return;
        };

        self.selection.status.update_progress(progress.clone());
        self.send_event(AppEvent::ConversionProgress {
            selection_id: self.selection_id,
            progress,
        });
    }

    fn finish_conversion(&mut self, output_path: PathBuf, result: Result<String, ProcessError>) {
        if !self.selection.status.is_converting() {
            return;
        }
        self.progress_parser = None;

        match result {
            Ok(output) => {
                let output = output.trim();
                self.selection
                    .append_log(if output.is_empty() { NO_OUTPUT_NOTICE } else { output });
                self.selection.complete_conversion(output_path.clone());

                tracing::info!("Conversion finished: {}", output_path.display());
                self.send_event(AppEvent::ConversionCompleted {
                    selection_id: self.selection_id,
                    output_path,
                });
            }
            Err(e) => {
                let error = e.diagnostic().to_string();
                self.selection.append_log(&error);
                self.selection.fail_conversion(error.clone());

                tracing::error!("Conversion failed: {}", e);
                self.send_event(AppEvent::ConversionFailed {
                    selection_id: self.selection_id,
                    error,
                });
            }
        }
    }

    fn send_event(&self, event: AppEvent) {
        if let Err(e) = self.event_sender.send(event) {
            tracing::warn!("Failed to send conversion event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{create_event_channel, EventReceiver};
    use crate::presets::catalog;
    use crate::process::testing::FakeRunner;
    use std::fs::File;

    const MP4_PROBE: &str = "\
Input #0, mp4,mov,m4a, from 'clip.mp4':
  Duration: 00:00:20.00, start: 0.000000, bitrate: 2000 kb/s
  Stream #0:0(und): Video: h264 (High), yuv420p, 1280x720, 25 fps
  Stream #0:1(und): Audio: aac (LC), 44100 Hz, stereo
";

    fn service_with(runner: &FakeRunner) -> (ConversionService, EventReceiver) {
        let (tx, rx) = create_event_channel();
        let service = ConversionService::new(
            Arc::new(runner.clone()),
            Handle::current(),
            ToolPaths::default(),
            tx,
        );
        (service, rx)
    }

    async fn run_until_finished(service: &mut ConversionService) {
        for _ in 0..100 {
            if service.status().is_finished() {
                return;
            }
            service.next_update().await;
        }
        panic!("conversion never finished: {:?}", service.status());
    }

    fn drain(events: &mut EventReceiver) -> Vec<AppEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = events.try_recv() {
            drained.push(event);
        }
        drained
    }

    #[tokio::test]
    async fn test_select_input_probes_and_offers_presets() {
        let runner = FakeRunner::new();
        runner.respond("ffprobe", "clip.mp4", Ok(MP4_PROBE.to_string()));
        let (mut service, mut events) = service_with(&runner);

        service.select_input(PathBuf::from("/videos/clip.mp4"));
        assert!(service.status().is_fetching());
        assert!(service.is_busy());
        assert!(service.next_update().await);

        let selection = service.selection();
        assert_eq!(selection.status, ConversionStatus::Ready);
        let metadata = selection.metadata.as_ref().unwrap();
        assert_eq!(metadata.format_summary(), "M4A, MOV, MP4");
        assert_eq!(metadata.duration.as_deref(), Some("00:00:20.00"));
        assert!(!selection.is_fallback);
        assert!(selection.presets.iter().any(|p| p.output_extension == "mp4"));
        assert_eq!(selection.selected_preset, selection.presets.first().copied());

        let calls = runner.calls();
        assert_eq!(calls[0].args, vec!["-hide_banner", "/videos/clip.mp4"]);

        let events = drain(&mut events);
        assert!(matches!(events[0], AppEvent::InputSelected { .. }));
        assert!(matches!(
            events[1],
            AppEvent::MetadataLoaded { is_fallback: false, .. }
        ));
    }

    #[tokio::test]
    async fn test_probe_failure_falls_back_to_full_catalog() {
        let runner = FakeRunner::new();
        runner.respond(
            "ffprobe",
            "broken.bin",
            Err(ProcessError::Exit {
                program: "ffprobe".to_string(),
                code: 1,
                message: "broken.bin: Invalid data found when processing input".to_string(),
            }),
        );
        let (mut service, _events) = service_with(&runner);

        service.select_input(PathBuf::from("/tmp/broken.bin"));
        service.next_update().await;

        let selection = service.selection();
        assert_eq!(selection.status, ConversionStatus::Ready);
        assert!(selection.metadata.is_none());
        assert!(selection.is_fallback);
        assert_eq!(selection.presets.len(), catalog().len());
        assert_eq!(
            selection.probe_error.as_deref(),
            Some("broken.bin: Invalid data found when processing input")
        );
        assert!(service.can_convert());
    }

    #[tokio::test]
    async fn test_convert_end_to_end_avoids_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        File::create(&input).unwrap();

        let runner = FakeRunner::new();
        runner.respond("ffprobe", "clip.mp4", Ok(MP4_PROBE.to_string()));
        runner.respond("ffmpeg", "clip.mp4", Ok("  muxing overhead: 0.1%\n".to_string()));
        let (mut service, mut events) = service_with(&runner);

        service.select_input(input.clone());
        service.next_update().await;
        assert!(service.select_preset(PresetId("remux-mp4")));

        let output = service.convert().unwrap();
        assert_eq!(output, dir.path().join("clip (1).mp4"));
        assert!(service.status().is_converting());
        run_until_finished(&mut service).await;

        assert!(matches!(
            service.status(),
            ConversionStatus::Succeeded { output_path, .. } if output_path == &output
        ));
        assert!(service.selection().log.ends_with("muxing overhead: 0.1%"));
        assert!(service.selection().log.starts_with("$ ffmpeg -hide_banner -y -i"));

        let transcode = runner
            .calls()
            .into_iter()
            .find(|call| call.program == "ffmpeg")
            .unwrap();
        assert_eq!(transcode.args[..3], ["-hide_banner", "-y", "-i"]);
        assert_eq!(transcode.args.last(), Some(&output.to_string_lossy().to_string()));

        let events = drain(&mut events);
        assert!(events.iter().any(|e| matches!(e, AppEvent::ConversionCompleted { .. })));
    }

    #[tokio::test]
    async fn test_silent_success_records_notice() {
        let runner = FakeRunner::new();
        runner.respond("ffprobe", "quiet.mov", Ok(String::new()));
        runner.respond("ffmpeg", "quiet.mov", Ok("   \n".to_string()));
        let (mut service, _events) = service_with(&runner);

        service.select_input(PathBuf::from("/nonexistent-dir/quiet.mov"));
        service.next_update().await;
        // Empty probe output is uninformative, not a failure.
        assert!(service.selection().probe_error.is_none());
        assert_eq!(service.selection().metadata.as_ref().unwrap().primary_format, "Unknown");

        service.convert().unwrap();
        run_until_finished(&mut service).await;
        assert!(service.selection().log.ends_with(NO_OUTPUT_NOTICE));
    }

    #[tokio::test]
    async fn test_second_convert_is_rejected_while_converting() {
        let runner = FakeRunner::new();
        runner.respond("ffprobe", "clip.mp4", Ok(MP4_PROBE.to_string()));
        let gate = runner.respond_gated("ffmpeg", "clip.mp4", Ok("done".to_string()));
        let (mut service, _events) = service_with(&runner);

        service.select_input(PathBuf::from("/nonexistent-dir/clip.mp4"));
        service.next_update().await;

        service.convert().unwrap();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(service.convert(), Err(ConvertRejected::AlreadyConverting));
        assert!(!service.select_preset(PresetId("gif")));
        assert_eq!(runner.calls_to("ffmpeg"), 1);

        gate.notify_one();
        run_until_finished(&mut service).await;
        assert_eq!(runner.calls_to("ffmpeg"), 1);

        // A finished attempt can be retried explicitly.
        assert!(service.select_preset(PresetId("gif")));
        assert_eq!(service.status(), &ConversionStatus::Ready);
    }

    #[tokio::test]
    async fn test_convert_preconditions() {
        let runner = FakeRunner::new();
        let gate = runner.respond_gated("ffprobe", "slow.mkv", Ok(String::new()));
        let (mut service, _events) = service_with(&runner);

        assert_eq!(service.convert(), Err(ConvertRejected::NoInput));

        service.select_input(PathBuf::from("/nonexistent-dir/slow.mkv"));
        assert_eq!(service.convert(), Err(ConvertRejected::MetadataPending));
        assert!(service.status().is_fetching());

        gate.notify_one();
        service.next_update().await;
        assert!(service.convert().is_ok());
        assert_eq!(runner.calls_to("ffmpeg"), 0);
    }

    #[tokio::test]
    async fn test_newer_selection_supersedes_in_flight_probe() {
        let runner = FakeRunner::new();
        let slow = runner.respond_gated(
            "ffprobe",
            "old.avi",
            Ok("Input #0, avi, from 'old.avi':".to_string()),
        );
        runner.respond("ffprobe", "new.mp4", Ok(MP4_PROBE.to_string()));
        let (mut service, _events) = service_with(&runner);

        service.select_input(PathBuf::from("/v/old.avi"));
        service.select_input(PathBuf::from("/v/new.mp4"));

        assert!(service.next_update().await);
        slow.notify_one();
        assert!(!service.next_update().await);

        let selection = service.selection();
        assert_eq!(selection.input_file, Some(PathBuf::from("/v/new.mp4")));
        assert_eq!(
            selection.metadata.as_ref().map(|m| m.primary_format.as_str()),
            Some("MP4")
        );
    }

    #[tokio::test]
    async fn test_missing_transcoder_fails_attempt() {
        let runner = FakeRunner::new();
        runner.respond("ffprobe", "clip.mp4", Ok(MP4_PROBE.to_string()));
        let (mut service, mut events) = service_with(&runner);

        service.select_input(PathBuf::from("/nonexistent-dir/clip.mp4"));
        service.next_update().await;
        service.convert().unwrap();
        run_until_finished(&mut service).await;

        let ConversionStatus::Failed { error } = service.status() else {
            panic!("expected a failed attempt: {:?}", service.status());
        };
        assert!(error.contains("No such file or directory"));
        assert!(service.selection().log.ends_with(error));
        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, AppEvent::ConversionFailed { .. })));
    }

    #[tokio::test]
    async fn test_transcode_failure_records_diagnostic() {
        let runner = FakeRunner::new();
        runner.respond("ffprobe", "clip.mp4", Ok(MP4_PROBE.to_string()));
        runner.respond(
            "ffmpeg",
            "clip.mp4",
            Err(ProcessError::Exit {
                program: "ffmpeg".to_string(),
                code: 234,
                message: "Unknown encoder 'libx265'".to_string(),
            }),
        );
        let (mut service, _events) = service_with(&runner);

        service.select_input(PathBuf::from("/nonexistent-dir/clip.mp4"));
        service.next_update().await;
        assert!(service.select_preset(PresetId("hevc-mp4")));
        service.convert().unwrap();
        run_until_finished(&mut service).await;

        assert!(matches!(
            service.status(),
            ConversionStatus::Failed { error } if error == "Unknown encoder 'libx265'"
        ));
        assert_eq!(
            service.selection().output_file,
            Some(PathBuf::from("/nonexistent-dir/clip.mp4"))
        );
    }

    #[tokio::test]
    async fn test_progress_lines_are_reported() {
        let runner = FakeRunner::new();
        runner.respond("ffprobe", "clip.mp4", Ok(MP4_PROBE.to_string()));
        runner.respond_with_lines(
            "ffmpeg",
            "clip.mp4",
            &[
                "Stream mapping:",
                "frame=  250 fps= 50 q=-1.0 size=    2048kB time=00:00:10.00 bitrate=1677.7kbits/s speed=2.0x",
            ],
            Ok(String::new()),
        );
        let (mut service, mut events) = service_with(&runner);

        service.select_input(PathBuf::from("/nonexistent-dir/clip.mp4"));
        service.next_update().await;
        service.convert().unwrap();
        run_until_finished(&mut service).await;

        let progress: Vec<_> = drain(&mut events)
            .into_iter()
            .filter_map(|event| match event {
                AppEvent::ConversionProgress { progress, .. } => Some(progress),
                _ => None,
            })
            .collect();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].percentage, Some(50.0));
        assert_eq!(progress[0].current_frame, 250);
    }

    #[tokio::test]
    async fn test_finished_attempt_is_not_rerun_without_choosing_a_preset() {
        let runner = FakeRunner::new();
        runner.respond("ffprobe", "clip.mp4", Ok(MP4_PROBE.to_string()));
        runner.respond("ffmpeg", "clip.mp4", Ok("done".to_string()));
        let (mut service, _events) = service_with(&runner);

        service.select_input(PathBuf::from("/nonexistent-dir/clip.mp4"));
        service.next_update().await;
        service.convert().unwrap();
        run_until_finished(&mut service).await;

        assert!(!service.can_convert());
        assert_eq!(service.convert(), Err(ConvertRejected::NotReady));
        assert!(matches!(service.status(), ConversionStatus::Succeeded { .. }));
        assert_eq!(runner.calls_to("ffmpeg"), 1);

        assert!(service.select_preset(PresetId("remux-mp4")));
        assert!(service.can_convert());
        service.convert().unwrap();
        run_until_finished(&mut service).await;
        assert_eq!(runner.calls_to("ffmpeg"), 2);
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_conversion() {
        let runner = FakeRunner::new();
        runner.respond("ffprobe", "clip.mp4", Ok(MP4_PROBE.to_string()));
        let gate = runner.respond_gated("ffmpeg", "clip.mp4", Ok(String::new()));
        let (mut service, _events) = service_with(&runner);

        service.select_input(PathBuf::from("/nonexistent-dir/clip.mp4"));
        service.next_update().await;
        service.convert().unwrap();
        service.reset();
        assert_eq!(service.status(), &ConversionStatus::Idle);
        assert!(service.is_busy());

        gate.notify_one();
        assert!(!service.next_update().await);
        assert_eq!(service.status(), &ConversionStatus::Idle);
        assert!(service.selection().input_file.is_none());
        assert!(!service.is_busy());
    }

    #[tokio::test]
    async fn test_running_transcode_blocks_convert_after_reselecting() {
        let runner = FakeRunner::new();
        runner.respond("ffprobe", "clip.mp4", Ok(MP4_PROBE.to_string()));
        let gate = runner.respond_gated("ffmpeg", "clip.mp4", Ok(String::new()));
        let (mut service, _events) = service_with(&runner);

        service.select_input(PathBuf::from("/nonexistent-dir/clip.mp4"));
        service.next_update().await;
        service.convert().unwrap();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(runner.calls_to("ffmpeg"), 1);

        service.reset();
        service.select_input(PathBuf::from("/nonexistent-dir/clip.mp4"));
        assert!(service.next_update().await);
        assert_eq!(service.status(), &ConversionStatus::Ready);

        // The first child still owns clip.mp4.
        assert!(service.is_transcoding());
        assert!(!service.can_convert());
        assert_eq!(service.convert(), Err(ConvertRejected::AlreadyConverting));
        assert_eq!(service.status(), &ConversionStatus::Ready);
        assert_eq!(runner.calls_to("ffmpeg"), 1);

        gate.notify_one();
        assert!(!service.next_update().await);
        assert!(!service.is_transcoding());
        assert_eq!(service.status(), &ConversionStatus::Ready);

        gate.notify_one();
        assert!(service.convert().is_ok());
        run_until_finished(&mut service).await;
        assert_eq!(runner.calls_to("ffmpeg"), 2);
    }
}
