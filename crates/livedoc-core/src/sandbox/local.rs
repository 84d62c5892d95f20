//! Local process backend.
//!
//! Each sandbox is a temporary directory. Snippets are written into it and
//! run by the matching interpreter with the directory as working dir.
//! Processes are killed when the call is dropped (for instance on timeout).

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;

use super::backend::{SandboxBackend, SandboxHandle};
use crate::domain::{ExecutionResult, ServiceError, Snippet};

/// Interpreter used for a snippet language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interpreter {
    pub program: &'static str,
    pub args: &'static [&'static str],
    pub extension: &'static str,
}

/// Interpreter for a language name, if the local backend supports it.
pub fn interpreter_for(language: &str) -> Option<Interpreter> {
    let (program, args, extension): (&'static str, &'static [&'static str], &'static str) =
        match language.to_ascii_lowercase().as_str() {
            "python" | "py" | "python3" => ("python3", &[], "py"),
            "javascript" | "js" | "node" => ("node", &[], "js"),
            "ruby" | "rb" => ("ruby", &[], "rb"),
            "php" => ("php", &[], "php"),
            "bash" | "sh" | "shell" => ("bash", &[], "sh"),
            _ => return None,
        };
    Some(Interpreter {
        program,
        args,
        extension,
    })
}

/// Runs snippets as child processes on the local machine.
#[derive(Debug, Default)]
pub struct LocalProcessBackend {
    workdirs: Mutex<HashMap<String, TempDir>>,
}

impl LocalProcessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sandboxes.
    pub fn live_sandboxes(&self) -> usize {
        self.workdirs().len()
    }

    fn workdirs(&self) -> MutexGuard<'_, HashMap<String, TempDir>> {
        self.workdirs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn workdir(&self, handle: &SandboxHandle) -> Result<PathBuf, ServiceError> {
        self.workdirs()
            .get(&handle.id)
            .map(|dir| dir.path().to_path_buf())
            .ok_or_else(|| ServiceError::Unavailable(format!("unknown sandbox {}", handle.id)))
    }
}

#[async_trait]
impl SandboxBackend for LocalProcessBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn create(&self) -> Result<SandboxHandle, ServiceError> {
        let dir = tempfile::Builder::new()
            .prefix("livedoc-sandbox-")
            .tempdir()
            .map_err(|e| ServiceError::Unavailable(format!("cannot create workdir: {e}")))?;
        let id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(sandbox_id = %id, path = %dir.path().display(), "local sandbox created");
        self.workdirs().insert(id.clone(), dir);
        Ok(SandboxHandle { id })
    }

    async fn run(
        &self,
        handle: &SandboxHandle,
        snippet: &Snippet,
    ) -> Result<ExecutionResult, ServiceError> {
        let Some(interpreter) = interpreter_for(&snippet.language) else {
            return Ok(ExecutionResult::failed(format!(
                "unsupported language: {}",
                snippet.language
            )));
        };

        let workdir = self.workdir(handle)?;
        let script = workdir.join(format!(
            "{}.{}",
            file_stem(&snippet.id),
            interpreter.extension
        ));
        tokio::fs::write(&script, &snippet.code)
            .await
            .map_err(|e| ServiceError::Transport(format!("cannot write snippet: {e}")))?;

        let output = Command::new(interpreter.program)
            .args(interpreter.args)
            .arg(&script)
            .current_dir(&workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ExecutionResult::failed(format!(
                    "interpreter not found: {}",
                    interpreter.program
                )));
            }
            Err(e) => return Err(ServiceError::Transport(e.to_string())),
        };

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Ok(ExecutionResult::completed(
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            (!stderr.is_empty()).then_some(stderr),
        ))
    }

    async fn destroy(&self, handle: &SandboxHandle) -> Result<(), ServiceError> {
        if let Some(dir) = self.workdirs().remove(&handle.id) {
            let path = dir.path().to_path_buf();
            dir.close()
                .map_err(|e| ServiceError::Transport(format!("cannot remove workdir: {e}")))?;
            tracing::debug!(sandbox_id = %handle.id, path = %path.display(), "local sandbox removed");
        }
        Ok(())
    }
}

fn file_stem(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
