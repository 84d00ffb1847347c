//! External command execution shared by all adapters.
//!
//! Commands are configured as a program plus argument templates. Templates
//! may contain `{name}` placeholders that are filled in per call.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::AdapterError;

/// Placeholder values for one invocation
pub type Vars = BTreeMap<&'static str, String>;

/// A program and its argument templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Arguments with every `{name}` placeholder substituted
    pub fn expand_args(&self, vars: &Vars) -> Vec<String> {
        self.args.iter().map(|arg| expand(arg, vars)).collect()
    }
}

/// Substitute `{name}` placeholders in one left-to-right pass.
///
/// Unknown names are left verbatim. Substituted values are never scanned
/// again, so a path containing `{width}` stays intact.
pub fn expand(template: &str, vars: &Vars) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find('}').and_then(|close| {
            vars.get(&after[..close]).map(|value| (close, value))
        }) {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Captured result of a finished command
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Run a command to completion, capturing stdout.
///
/// The child is killed if it outlives `limit`.
pub async fn run(
    spec: &CommandSpec,
    vars: &Vars,
    limit: Duration,
) -> Result<CommandOutput, AdapterError> {
    let args = spec.expand_args(vars);
    debug!(program = %spec.program, ?args, "Running command");

    let child = Command::new(&spec.program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| AdapterError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

    let output = timeout(limit, child.wait_with_output())
        .await
        .map_err(|_| AdapterError::Timeout {
            program: spec.program.clone(),
            timeout: limit,
        })??;

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        return Err(AdapterError::CommandFailed {
            program: spec.program.clone(),
            code: output.status.code().unwrap_or(-1),
            stderr,
        });
    }

    Ok(CommandOutput {
        stdout: output.stdout,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Vars {
        let mut vars = Vars::new();
        vars.insert("width", "5".to_string());
        vars.insert("output", "/tmp/board.png".to_string());
        vars
    }

    #[test]
    fn test_expand_placeholders() {
        assert_eq!(expand("--w={width}", &vars()), "--w=5");
        assert_eq!(expand("{output}", &vars()), "/tmp/board.png");
        assert_eq!(expand("{unknown}", &vars()), "{unknown}");
        assert_eq!(expand("plain", &vars()), "plain");
    }

    #[test]
    fn test_expanded_values_are_not_rescanned() {
        let mut vars = vars();
        vars.insert("output", "/data/{width}/board.png".to_string());

        assert_eq!(
            expand("--out={output} --w={width}", &vars),
            "--out=/data/{width}/board.png --w=5"
        );
        assert_eq!(expand("{{width}}", &vars), "{5}");
        assert_eq!(expand("{ {width", &vars), "{ {width");
    }

    #[test]
    fn test_expand_args() {
        let spec = CommandSpec::new("render").with_args(["-w", "{width}", "-o", "{output}"]);
        assert_eq!(
            spec.expand_args(&vars()),
            vec!["-w", "5", "-o", "/tmp/board.png"]
        );
    }

    #[test]
    fn test_command_spec_from_yaml() {
        let spec: CommandSpec = serde_yaml::from_str("program: ffmpeg\nargs: [\"-i\", \"{device}\"]").unwrap();
        assert_eq!(spec.program, "ffmpeg");
        assert_eq!(spec.args, vec!["-i", "{device}"]);

        let bare: CommandSpec = serde_yaml::from_str("program: xdg-open").unwrap();
        assert!(bare.args.is_empty());
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let spec = CommandSpec::new("calibcat-definitely-not-installed");
        let result = run(&spec, &Vars::new(), Duration::from_secs(5)).await;
        assert!(matches!(result, Err(AdapterError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captures_stdout() {
        let spec = CommandSpec::new("sh").with_args(["-c", "printf {word}"]);
        let mut vars = Vars::new();
        vars.insert("word", "frame".to_string());

        let output = run(&spec, &vars, Duration::from_secs(5)).await.unwrap();
        assert_eq!(output.stdout, b"frame");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_reports_failure() {
        let spec = CommandSpec::new("sh").with_args(["-c", "echo broken >&2; exit 3"]);
        let result = run(&spec, &Vars::new(), Duration::from_secs(5)).await;

        match result {
            Err(AdapterError::CommandFailed { code, stderr, .. }) => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "broken");
            }
            other => panic!("Expected CommandFailed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_times_out() {
        let spec = CommandSpec::new("sleep").with_args(["5"]);
        let result = run(&spec, &Vars::new(), Duration::from_millis(50)).await;
        assert!(matches!(result, Err(AdapterError::Timeout { .. })));
    }
}
