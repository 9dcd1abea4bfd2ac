use crate::config::AppConfig;
use crate::constants::{MAX_LOG_LINES, MEDIA_EXTENSIONS};
use crate::events::{create_event_channel, AppEvent, EventReceiver};
use crate::presets::PresetId;
use crate::process::{tool_version, CommandRunner, ProcessError, TokioCommandRunner};
use crate::services::ConversionService;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq)]
pub enum ToolStatus {
    Checking,
    Available { version: String },
    Missing { error: String },
}

pub struct ConverterApp {
    pub service: ConversionService,
    pub config: AppConfig,
    pub tool_status: ToolStatus,
    pub activity: VecDeque<String>,
    pub notice: Option<String>,
    events: EventReceiver,
    version_rx: Option<oneshot::Receiver<Result<String, ProcessError>>>,
}

impl ConverterApp {
    pub fn new(runtime: Handle, config: AppConfig) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(TokioCommandRunner::new());
        let (event_sender, events) = create_event_channel();
        let service = ConversionService::new(
            runner.clone(),
            runtime.clone(),
            config.tool_paths(),
            event_sender,
        );

        let (version_tx, version_rx) = oneshot::channel();
        let transcode_tool = service.tools().transcode.clone();
        runtime.spawn(async move {
            let _ = version_tx.send(tool_version(runner.as_ref(), &transcode_tool).await);
        });

        Self {
            service,
            config,
            tool_status: ToolStatus::Checking,
            activity: VecDeque::new(),
            notice: None,
            events,
            version_rx: Some(version_rx),
        }
    }

    pub fn browse_input(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("Media", MEDIA_EXTENSIONS);

        if let Some(ref dir) = self.config.last_input_dir {
            dialog = dialog.set_directory(dir);
        }

        if let Some(path) = dialog.pick_file() {
            self.select_input(path);
        }
    }

    pub fn select_input(&mut self, path: PathBuf) {
        self.notice = None;
        self.config.update_last_input_dir(&path);
        self.save_config();
        self.service.select_input(path);
    }

    pub fn select_preset(&mut self, id: PresetId) {
        self.service.select_preset(id);
    }

    pub fn start_conversion(&mut self) {
        match self.service.convert() {
            Ok(_) => self.notice = None,
            Err(rejected) => {
                tracing::debug!("Convert ignored: {}", rejected);
                self.notice = Some(rejected.to_string());
            }
        }
    }

    pub fn clear(&mut self) {
        self.notice = None;
        self.service.reset();
    }

    /// Called once per frame: applies finished background work and collects
    /// pushed events.
    pub fn update_status(&mut self) {
        self.service.pump();

        while let Ok(event) = self.events.try_recv() {
            if matches!(event, AppEvent::SelectionCleared) {
                self.activity.clear();
            }
            if let Some(summary) = event.summary() {
                self.push_activity(summary);
            }
        }

        self.poll_tool_version();
    }

    pub fn is_busy(&self) -> bool {
        self.service.is_busy() || self.version_rx.is_some()
    }

    fn poll_tool_version(&mut self) {
        let Some(rx) = self.version_rx.as_mut() else {
            return;
        };

        let status = match rx.try_recv() {
            Ok(Ok(version)) => ToolStatus::Available { version },
            Ok(Err(e)) => {
                tracing::error!("Transcoder check failed: {}", e);
                ToolStatus::Missing {
                    error: format!(
                        "{} not found or not working. Please install FFmpeg. ({})",
                        self.service.tools().transcode,
                        e.diagnostic()
                    ),
                }
            }
            Err(oneshot::error::TryRecvError::Empty) => return,
            Err(oneshot::error::TryRecvError::Closed) => ToolStatus::Missing {
                error: "Transcoder check did not complete".to_string(),
            },
        };

        self.tool_status = status;
        self.version_rx = None;
    }

    fn push_activity(&mut self, line: String) {
        self.activity.push_back(line);
        while self.activity.len() > MAX_LOG_LINES {
            self.activity.pop_front();
        }
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save() {
            tracing::warn!("Failed to save config: {}", e);
        }
    }
}
