use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use thiserror::Error;

/// A failure to run one of the external programs the pipeline relies on.
#[derive(Error, Debug)]
pub enum Error {
    /// The program could not be started at all.
    #[error("failed to run `{program}`")]
    Spawn {
        /// The program that was invoked.
        program: String,
        /// The underlying spawn failure.
        #[source]
        source: std::io::Error,
    },
    /// The program ran but exited unsuccessfully.
    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        /// The program that was invoked.
        program: String,
        /// The exit status, rendered.
        status: String,
        /// Trimmed standard error output.
        stderr: String,
    },
}

/// Runs `program` with `args`, optionally inside `dir`, returning its standard output
/// or the error, depending on the exit status.
pub(crate) fn run<P, I, S>(program: P, args: I, dir: Option<&Path>) -> Result<Vec<u8>, Error>
where
    P: AsRef<OsStr>,
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let program = program.as_ref();
    let name = program.to_string_lossy().into_owned();
    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = dir {
        command.current_dir(dir);
    }

    tracing::debug!(program = %name, dir = ?dir, "running external command");

    let output = command.output().map_err(|source| Error::Spawn {
        program: name.clone(),
        source,
    })?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(Error::Failed {
            program: name,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}
