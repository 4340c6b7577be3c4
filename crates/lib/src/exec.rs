//! Script execution layer: hand a generated script to the external interpreter.
//! No shell is used; the script is passed as one element of the argument list to avoid a second
//! injection layer.

use std::process::Command;

/// Outcome of one interpreter run: exit code (None when killed by a signal) and captured stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    pub exit_code: Option<i32>,
    pub stderr: String,
}

impl ScriptOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("exec failed: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Runs a script and reports exit status plus stderr. Replaced by a fake in tests.
pub trait ScriptRunner: Send + Sync {
    fn run(&self, script: &str) -> Result<ScriptOutput, ExecError>;
}

/// Runs `program args... <script>` directly (e.g. `osascript -e <script>`).
#[derive(Debug, Clone)]
pub struct Interpreter {
    program: String,
    args: Vec<String>,
}

impl Interpreter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `osascript -e <script>`.
    pub fn osascript() -> Self {
        Self::new("osascript", vec!["-e".to_string()])
    }
}

impl ScriptRunner for Interpreter {
    fn run(&self, script: &str) -> Result<ScriptOutput, ExecError> {
        log::debug!("running script via {} ({} bytes)", self.program, script.len());
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(script)
            .output()?;
        Ok(ScriptOutput {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
