use crate::logger::Logger;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug)]
pub struct Fasta {
    pub id: String,
    pub desc: String,
    pub seq: String,
}

/// Read a FASTA file into memory. Multi-line sequences are joined; text
/// before the first `>` header is ignored, so a non-FASTA file yields an
/// empty set rather than an error.
pub fn read_fasta(path: &Path, logger: &Logger) -> Result<Vec<Fasta>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read_fasta: error reading {}", path.display()))?;

    let mut records: Vec<Fasta> = Vec::new();
    let mut current: Option<Fasta> = None;

    for line in contents.lines() {
        if let Some(header) = line.strip_prefix('>') {
            if let Some(record) = current.take() {
                records.push(record);
            }
            let (id, desc) = match header.split_once(' ') {
                Some((id, desc)) => (id.to_string(), desc.to_string()),
                None => (header.to_string(), String::new()),
            };
            current = Some(Fasta { id, desc, seq: String::new() });
        } else if let Some(record) = current.as_mut() {
            record.seq.push_str(line.trim());
        }
    }
    if let Some(record) = current.take() {
        records.push(record);
    }

    logger.information(&format!(
        "read_fasta: loaded {} sequences from {}",
        records.len(),
        path.display()
    ));
    Ok(records)
}

/// Prefix every header with `centroid_` ahead of clustering, writing the
/// renamed records to `out_path`. Returns the new headers, `>` included.
pub fn rename_centroid_headers(records: &[Fasta], out_path: &Path, logger: &Logger) -> Result<Vec<String>> {
    let renamed: Vec<Fasta> = records
        .iter()
        .map(|record| Fasta {
            id: format!("centroid_{}", record.id),
            desc: record.desc.clone(),
            seq: record.seq.clone(),
        })
        .collect();

    crate::write_fasta::write_fasta_records(&renamed, out_path, logger)
        .with_context(|| format!("rename_centroid_headers: failed to write {}", out_path.display()))?;

    Ok(renamed.iter().map(|record| format!(">{}", record.id)).collect())
}

/// Hands out sequential cluster identifiers for centroid sequences.
pub struct ClusterNamer {
    next: usize,
}

impl ClusterNamer {
    pub fn new() -> Self {
        ClusterNamer { next: 0 }
    }

    pub fn next_id(&mut self) -> String {
        let id = format!("Cluster{}", self.next);
        self.next += 1;
        id
    }
}

/// Replace centroid headers with sequential `Cluster<N>` identifiers, in
/// file order, so every downstream report keys on the same gene names.
pub fn assign_cluster_ids(records: &[Fasta]) -> Vec<Fasta> {
    let mut namer = ClusterNamer::new();
    records
        .iter()
        .map(|record| Fasta {
            id: namer.next_id(),
            desc: record.id.clone(),
            seq: record.seq.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_headers_and_joined_sequences() {
        let logger = Logger;
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "test.fasta", ">Cluster0 some description\nATGACG\nAGCTTTCCG\n>Cluster1\nATGAAT\n");

        let records = read_fasta(&path, &logger).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "Cluster0");
        assert_eq!(records[0].desc, "some description");
        assert_eq!(records[0].seq, "ATGACGAGCTTTCCG");
        assert_eq!(records[1].id, "Cluster1");
        assert_eq!(records[1].seq, "ATGAAT");
    }

    #[test]
    fn non_fasta_input_yields_no_records() {
        let logger = Logger;
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "notfasta", "not a fasta file\n");
        assert!(read_fasta(&path, &logger).unwrap().is_empty());
    }

    #[test]
    fn centroid_renaming_prefixes_every_header() {
        let logger = Logger;
        let dir = tempdir().unwrap();
        let records = vec![
            Fasta { id: "gi|22123922|ref|NC_004088.1|_3285".to_string(), desc: String::new(), seq: "ATGCGGGTTGGCCCGGGTTG".to_string() },
            Fasta { id: "gi|22123922|ref|NC_004088.1|_1575".to_string(), desc: String::new(), seq: "ATGAATCC".to_string() },
        ];
        let out = dir.path().join("renamed.fasta");

        let headers = rename_centroid_headers(&records, &out, &logger).unwrap();
        assert_eq!(
            headers,
            vec![
                ">centroid_gi|22123922|ref|NC_004088.1|_3285",
                ">centroid_gi|22123922|ref|NC_004088.1|_1575"
            ]
        );
        let written = fs::read_to_string(&out).unwrap();
        assert!(written.starts_with(">centroid_gi|22123922|ref|NC_004088.1|_3285\n"));
    }

    #[test]
    fn cluster_ids_are_sequential_in_file_order() {
        let records = vec![
            Fasta { id: "centroid_a".to_string(), desc: String::new(), seq: "ATG".to_string() },
            Fasta { id: "centroid_b".to_string(), desc: String::new(), seq: "TGA".to_string() },
            Fasta { id: "centroid_c".to_string(), desc: String::new(), seq: "GGG".to_string() },
        ];
        let renamed = assign_cluster_ids(&records);
        let ids: Vec<&str> = renamed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["Cluster0", "Cluster1", "Cluster2"]);
        assert_eq!(renamed[1].desc, "centroid_b");
    }
}
