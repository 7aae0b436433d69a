use crate::logger::Logger;

use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Locate an external program on PATH. The pipeline leans on prodigal,
/// vsearch and the BLAST suite; all of them must be installed separately.
pub fn find_executable(program: &str, logger: &Logger) -> PathBuf {
    logger.information(&format!("find_executable: {}", program));

    if let Ok(output) = Command::new("which").arg(program).output() {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if fs::metadata(&path).is_ok() {
                logger.information(&format!("find_executable: using {} from PATH: {}", program, path));
                return PathBuf::from(path);
            }
        }
    }

    logger.error(&format!("find_executable: could not find {} on PATH", program));
    std::process::exit(1);
}

/// Run a prepared command, logging the rendered command line first, and
/// exit the pipeline if the program cannot be spawned or fails.
pub fn run_checked(cmd: &mut Command, logger: &Logger, context: &str) {
    logger.information(&format!("{}: running: {}", context, render_cmd(cmd)));

    let status = match cmd.status() {
        Ok(st) => st,
        Err(e) => {
            logger.error(&format!("{}: failed to run {}: {}", context, render_cmd(cmd), e));
            std::process::exit(1);
        }
    };

    if !status.success() {
        logger.error(&format!("{}: command failed with status {}", context, status));
        std::process::exit(1);
    }
}

/// Best-effort version string for the run report; `None` when the tool
/// refuses to report one.
pub fn get_version(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .stderr(Stdio::piped())
        .stdout(Stdio::piped())
        .output()
        .ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let combined = if stdout.trim().is_empty() { stderr } else { stdout };
    let first_line = combined.lines().next()?.trim().to_string();
    if first_line.is_empty() {
        None
    } else {
        Some(first_line)
    }
}

fn shell_escape(arg: &OsStr) -> String {
    let s = arg.to_string_lossy();
    if s.chars().all(|c| c.is_ascii_alphanumeric() || "_-./:".contains(c)) {
        s.into_owned()
    } else {
        let esc = s.replace('\'', "'\\''");
        format!("'{}'", esc)
    }
}

pub fn render_cmd(cmd: &Command) -> String {
    let mut s = String::new();
    s.push_str(&shell_escape(cmd.get_program()));
    for a in cmd.get_args() {
        s.push(' ');
        s.push_str(&shell_escape(a));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_cmd_quotes_awkward_arguments() {
        let mut cmd = Command::new("blastp");
        cmd.arg("-query").arg("consensus file.pep").arg("-evalue").arg("1e-5");
        assert_eq!(render_cmd(&cmd), "blastp -query 'consensus file.pep' -evalue 1e-5");
    }
}
