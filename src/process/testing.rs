//! Scripted [`CommandRunner`] for tests.

use super::{CommandRunner, Invocation, LineSender, ProcessError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

struct ScriptedResponse {
    program: String,
    needle: String,
    result: Result<String, ProcessError>,
    output_lines: Vec<String>,
    gate: Option<Arc<Notify>>,
}

/// Answers invocations from a script instead of spawning processes.
///
/// A response matches when the program name is equal and any argument
/// contains the needle. Gated responses wait for their [`Notify`] before
/// resolving, which keeps a task in flight for as long as a test needs.
#[derive(Clone, Default)]
pub struct FakeRunner {
    responses: Arc<Mutex<Vec<ScriptedResponse>>>,
    calls: Arc<Mutex<Vec<Invocation>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, program: &str, needle: &str, result: Result<String, ProcessError>) {
        self.push(program, needle, result, Vec::new(), None);
    }

    pub fn respond_with_lines(
        &self,
        program: &str,
        needle: &str,
        lines: &[&str],
        result: Result<String, ProcessError>,
    ) {
        let lines = lines.iter().map(|line| line.to_string()).collect();
        self.push(program, needle, result, lines, None);
    }

    /// Registers a response that resolves only after the returned handle is
    /// notified.
    pub fn respond_gated(
        &self,
        program: &str,
        needle: &str,
        result: Result<String, ProcessError>,
    ) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.push(program, needle, result, Vec::new(), Some(gate.clone()));
        gate
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn calls_to(&self, program: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.program == program)
            .count()
    }

    fn push(
        &self,
        program: &str,
        needle: &str,
        result: Result<String, ProcessError>,
        output_lines: Vec<String>,
        gate: Option<Arc<Notify>>,
    ) {
        self.responses.lock().unwrap().push(ScriptedResponse {
            program: program.to_string(),
            needle: needle.to_string(),
            result,
            output_lines,
            gate,
        });
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(
        &self,
        invocation: Invocation,
        line_sink: Option<LineSender>,
    ) -> Result<String, ProcessError> {
        self.calls.lock().unwrap().push(invocation.clone());

        let scripted = {
            let responses = self.responses.lock().unwrap();
            responses
                .iter()
                .find(|response| {
                    response.program == invocation.program
                        && invocation
                            .args
                            .iter()
                            .any(|arg| arg.contains(&response.needle))
                })
                .map(|response| {
                    (
                        response.result.clone(),
                        response.output_lines.clone(),
                        response.gate.clone(),
                    )
                })
        };

        let Some((result, output_lines, gate)) = scripted else {
            return Err(ProcessError::Launch {
                program: invocation.program,
                message: "No such file or directory (os error 2)".to_string(),
            });
        };

        if let Some(sink) = line_sink {
            for line in output_lines {
                let _ = sink.send(line);
            }
        }

        if let Some(gate) = gate {
            gate.notified().await;
        }

        result
    }
}
