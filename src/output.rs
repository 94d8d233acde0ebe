use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;
use tracing::{debug, info};

const JOB_NAME: &str = "invoice";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO Error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("Could not run TeX engine '{engine}': {source}")]
    Spawn { engine: String, source: io::Error },

    #[error(
        "{engine} failed ({status}), partial output kept in {}\n{output}",
        scratch.display()
    )]
    Subprocess {
        engine: String,
        status: ExitStatus,
        output: String,
        scratch: PathBuf,
    },
}

/// Writes rendered text to `path`, or stdout without one.
pub fn write(rendered: &str, path: Option<&Path>) -> Result<(), OutputError> {
    match path {
        Some(path) => {
            fs::write(path, rendered)?;
            info!(path = %path.display(), "wrote invoice");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", rendered)?;
        }
    }
    Ok(())
}

/// Scratch directory the TeX engine runs in for invoice `number`.
pub fn scratch_dir(number: &str) -> PathBuf {
    env::temp_dir().join(format!("invoicer-{}-{}", number, std::process::id()))
}

/// Typesets LaTeX source with `engine` and copies the PDF to `path`.
///
/// The source is piped to the engine on stdin. On failure the scratch
/// directory is left behind with the log for inspection.
pub fn typeset(
    source: &str,
    engine: &str,
    scratch: &Path,
    path: &Path,
) -> Result<(), OutputError> {
    fs::create_dir_all(scratch)?;
    debug!(engine, scratch = %scratch.display(), "running TeX engine");

    let spawn_error = |source| OutputError::Spawn {
        engine: engine.to_string(),
        source,
    };
    let mut child = Command::new(engine)
        .arg("-interaction=nonstopmode")
        .arg(format!("-jobname={}", JOB_NAME))
        .current_dir(scratch)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_error)?;

    if let Some(mut stdin) = child.stdin.take() {
        // An engine that exits early reports through its status instead.
        match stdin.write_all(source.as_bytes()) {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
            result => result?,
        }
    }
    let output = child.wait_with_output()?;

    if !output.status.success() {
        let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
        captured.push_str(&String::from_utf8_lossy(&output.stderr));
        return Err(OutputError::Subprocess {
            engine: engine.to_string(),
            status: output.status,
            output: captured,
            scratch: scratch.to_path_buf(),
        });
    }

    fs::copy(scratch.join(format!("{}.pdf", JOB_NAME)), path)?;
    fs::remove_dir_all(scratch)?;
    info!(path = %path.display(), "wrote invoice");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = env::temp_dir()
            .join(format!("invoicer-output-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn writes_file() -> Result<(), OutputError> {
        let dir = scratch("write");
        fs::create_dir_all(&dir)?;
        let path = dir.join("invoice.txt");

        write("INVOICE 00001", Some(&path))?;
        assert_eq!(fs::read_to_string(&path)?, "INVOICE 00001");

        fs::remove_dir_all(dir)?;
        Ok(())
    }

    #[test]
    fn missing_engine_is_spawn_error() {
        let dir = scratch("spawn");
        let result = typeset(
            "\\relax",
            "invoicer-no-such-tex-engine",
            &dir,
            &dir.join("out.pdf"),
        );
        assert!(matches!(result, Err(OutputError::Spawn { .. })));
        let _ = fs::remove_dir_all(dir);
    }

    #[cfg(unix)]
    #[test]
    fn failing_engine_keeps_scratch() {
        let dir = scratch("fail");
        // `false` ignores its arguments and exits non-zero.
        let result = typeset("\\relax", "false", &dir, &dir.join("out.pdf"));

        match result {
            Err(OutputError::Subprocess { scratch, .. }) => {
                assert_eq!(scratch, dir);
                assert!(dir.exists());
            }
            other => panic!("expected subprocess failure, got {:?}", other),
        }
        let _ = fs::remove_dir_all(dir);
    }

    #[cfg(unix)]
    #[test]
    fn successful_engine_copies_pdf() -> Result<(), OutputError> {
        use std::os::unix::fs::PermissionsExt;

        let dir = scratch("engine");
        fs::create_dir_all(&dir)?;
        // Stands in for pdflatex: writes stdin to <jobname>.pdf in its cwd.
        let engine = dir.join("fake-tex");
        fs::write(&engine, "#!/bin/sh\ncat > \"${2#-jobname=}.pdf\"\n")?;
        fs::set_permissions(&engine, fs::Permissions::from_mode(0o755))?;

        let work = dir.join("work");
        let target = dir.join("out.pdf");
        typeset("%PDF-1.4", engine.to_str().unwrap(), &work, &target)?;

        assert_eq!(fs::read_to_string(&target)?, "%PDF-1.4");
        assert!(!work.exists());

        fs::remove_dir_all(dir)?;
        Ok(())
    }
}
