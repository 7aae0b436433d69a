use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::logger::Logger;
use crate::read_fasta::Fasta;

pub fn write_fasta_records(
    records: &[Fasta],
    out_path: &Path,
    logger: &Logger,
) -> Result<(), std::io::Error> {
    let mut writer = BufWriter::new(File::create(out_path)?);

    for fasta in records {
        writeln!(writer, ">{}", fasta.id)?;
        writeln!(writer, "{}", fasta.seq)?;
    }

    logger.information(&format!(
        "write_fasta_records: wrote {} sequences to {}",
        records.len(),
        out_path.display()
    ));
    Ok(())
}

/// Same as `write_fasta_records` but with sequences wrapped at 60 columns,
/// for files handed to external tools that expect line-wrapped FASTA.
pub fn write_wrapped_fasta(
    records: &[Fasta],
    out_path: &Path,
    logger: &Logger,
) -> Result<(), std::io::Error> {
    let mut writer = BufWriter::new(File::create(out_path)?);

    for fasta in records {
        writeln!(writer, ">{}", fasta.id)?;
        for chunk in fasta.seq.as_bytes().chunks(60) {
            writer.write_all(chunk)?;
            writer.write_all(b"\n")?;
        }
    }

    logger.information(&format!(
        "write_wrapped_fasta: wrote {} sequences to {}",
        records.len(),
        out_path.display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn wrapped_output_splits_long_sequences() {
        let logger = Logger;
        let dir = tempdir().unwrap();
        let path = dir.path().join("wrapped.fasta");
        let records = vec![Fasta {
            id: "Cluster0".to_string(),
            desc: String::new(),
            seq: "A".repeat(130),
        }];

        write_wrapped_fasta(&records, &path, &logger).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], ">Cluster0");
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[3].len(), 10);
    }
}
