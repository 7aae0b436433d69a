use crate::logger::Logger;

use std::fmt;
use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::process;

/// Returns the final component of a path as a plain string, e.g.
/// "/data/genomes/E2348_69.fasta" -> "E2348_69.fasta". Strings with no
/// separator (including backslash paths) come back unchanged.
pub fn get_seq_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Genome name used in output filenames: basename without its extension.
pub fn genome_label(path: &str) -> String {
    let base = get_seq_name(path);
    match base.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem.to_string(),
        _ => base,
    }
}

pub fn mkdir(path: &Path, logger: &Logger, context: &str) {
    fs::create_dir_all(path).log_or_exit(logger, |e| {
        format!("{context}: failed to create directory {}: {}", path.display(), e)
    });
}

pub fn open_file_read(path: &Path, logger: &Logger, context: &str) -> File {
    File::open(path).log_or_exit(logger, |e| {
        format!("{context}: failed to open for reading {}: {}", path.display(), e)
    })
}

pub fn open_file_write(path: &Path, logger: &Logger, context: &str) -> File {
    File::create(path).log_or_exit(logger, |e| {
        format!("{context}: failed to open for writing {}: {}", path.display(), e)
    })
}

pub fn open_bufread(path: &Path, logger: &Logger, context: &str) -> BufReader<File> {
    let file = open_file_read(path, logger, context);
    BufReader::new(file)
}

pub fn open_bufwrite(path: &Path, logger: &Logger, context: &str) -> BufWriter<File> {
    let file = open_file_write(path, logger, context);
    BufWriter::new(file)
}

// log_or_exit functionality
pub trait LogResultExt<T> {
    fn log_or_exit<F>(self, logger: &Logger, make_msg: F) -> T
    where
        F: FnOnce(&dyn fmt::Display) -> String;
}

impl<T, E> LogResultExt<T> for Result<T, E>
where
    E: fmt::Display,
{
    fn log_or_exit<F>(self, logger: &Logger, make_msg: F) -> T
    where
        F: FnOnce(&dyn fmt::Display) -> String,
    {
        match self {
            Ok(v) => v,
            Err(e) => {
                logger.error(&make_msg(&e));
                process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_name_from_full_path() {
        assert_eq!(get_seq_name("/path/to/test.fasta"), "test.fasta");
    }

    #[test]
    fn seq_name_from_tilde_path() {
        assert_eq!(get_seq_name("~/test.fasta"), "test.fasta");
    }

    #[test]
    fn seq_name_empty() {
        assert_eq!(get_seq_name(""), "");
    }

    #[test]
    fn seq_name_backslashes_unchanged() {
        assert_eq!(get_seq_name("\\wrong\\way"), "\\wrong\\way");
    }

    #[test]
    fn genome_label_strips_extension() {
        assert_eq!(genome_label("/data/H10407_all.fasta"), "H10407_all");
        assert_eq!(genome_label("no_extension"), "no_extension");
    }
}
