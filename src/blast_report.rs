use std::collections::HashMap;
use std::io::BufRead;
use std::io::Write;
use std::path::Path;

use crate::logger::Logger;
use crate::util::open_bufwrite;

/// Standard 12-column tabular alignment output (-outfmt 6 / -m 8):
/// query, subject, identity, length, mismatches, gaps, q-start, q-end,
/// s-start, s-end, evalue, bit-score.
pub const REPORT_FIELDS: usize = 12;

/// Self-alignment scores of a reference set, keyed by gene identifier.
/// The order of first appearance in the report is kept alongside the
/// lookup map, and defines the row order of every matrix built from it.
#[derive(Debug, Clone, Default)]
pub struct SelfScores {
    pub order: Vec<String>,
    pub scores: HashMap<String, String>,
}

impl SelfScores {
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}

fn split_report_line(line: &str, line_number: usize) -> Result<Vec<&str>, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < REPORT_FIELDS {
        return Err(format!(
            "line {}: expected {} tab-separated fields, found {}: {}",
            line_number,
            REPORT_FIELDS,
            fields.len(),
            line
        ));
    }
    Ok(fields)
}

/// Collect the self-alignment score (query == subject) for every gene in a
/// tabular report. Later rows for the same query overwrite earlier ones.
/// An empty report yields an empty mapping.
pub fn parse_self_scores<R: BufRead>(reader: R) -> Result<SelfScores, String> {
    let mut self_scores = SelfScores::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("parse_self_scores: read error: {}", e))?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let fields = split_report_line(&line, index + 1)
            .map_err(|e| format!("parse_self_scores: {}", e))?;

        if fields[0] == fields[1] {
            let gene = fields[0].to_string();
            if !self_scores.scores.contains_key(&gene) {
                self_scores.order.push(gene.clone());
            }
            self_scores.scores.insert(gene, fields[11].to_string());
        }
    }

    Ok(self_scores)
}

/// Collect the single best-scoring row per query from a cross-genome
/// report. Rows whose score does not parse sort below every numeric score,
/// and a tie keeps the earlier row (reports list the best hit first).
pub fn parse_best_hits<R: BufRead>(reader: R) -> Result<HashMap<String, String>, String> {
    let mut best: HashMap<String, String> = HashMap::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("parse_best_hits: read error: {}", e))?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let fields = split_report_line(&line, index + 1)
            .map_err(|e| format!("parse_best_hits: {}", e))?;

        let query = fields[0];
        let score = fields[11];

        match best.get(query) {
            Some(current) => {
                let current_score = current.parse::<f64>().unwrap_or(f64::NEG_INFINITY);
                let new_score = score.parse::<f64>().unwrap_or(f64::NEG_INFINITY);
                if new_score > current_score {
                    best.insert(query.to_string(), score.to_string());
                }
            }
            None => {
                best.insert(query.to_string(), score.to_string());
            }
        }
    }

    Ok(best)
}

/// Write a per-genome score table (gene, best score) in reference row
/// order. Genes with no hit in this genome are left out; assembly fills
/// them with the missing sentinel.
pub fn write_score_table(
    table: &HashMap<String, String>,
    reference: &SelfScores,
    out_path: &Path,
    logger: &Logger,
) -> Result<(), String> {
    let mut writer = open_bufwrite(out_path, logger, "write_score_table");

    for gene in &reference.order {
        if let Some(score) = table.get(gene) {
            writeln!(writer, "{}\t{}", gene, score)
                .map_err(|e| format!("write_score_table: write error: {}", e))?;
        }
    }

    logger.information(&format!("write_score_table: wrote {}", out_path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn self_scores_from_report() {
        let report = "Cluster0\tCluster0\t100.00\t15\t0\t0\t1\t15\t1\t15\t1e-07\t30.2\n\
                      Cluster1\tCluster1\t100.00\t15\t0\t0\t1\t15\t1\t15\t1e-07\t40.5\n\
                      Cluster2\tCluster2\t100.00\t15\t0\t0\t1\t15\t1\t15\t1e-07\t60.6";
        let parsed = parse_self_scores(Cursor::new(report)).unwrap();
        assert_eq!(parsed.order, vec!["Cluster0", "Cluster1", "Cluster2"]);
        assert_eq!(parsed.scores["Cluster0"], "30.2");
        assert_eq!(parsed.scores["Cluster1"], "40.5");
        assert_eq!(parsed.scores["Cluster2"], "60.6");
    }

    #[test]
    fn single_row_scenario() {
        let report = "Cluster0\tCluster0\t100.00\t15\t0\t0\t1\t15\t1\t15\t1e-07\t30.2";
        let parsed = parse_self_scores(Cursor::new(report)).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.scores["Cluster0"], "30.2");
    }

    #[test]
    fn too_few_fields_is_an_error() {
        let report = "Cluster0\tCluster0\t100.00\t15\t0\t0\t1\t15\t1\t15\t1e-07";
        let err = parse_self_scores(Cursor::new(report)).unwrap_err();
        assert!(err.contains("expected 12 tab-separated fields"), "{}", err);

        let err = parse_best_hits(Cursor::new(report)).unwrap_err();
        assert!(err.contains("expected 12 tab-separated fields"), "{}", err);
    }

    #[test]
    fn empty_report_yields_empty_mapping() {
        let parsed = parse_self_scores(Cursor::new("")).unwrap();
        assert!(parsed.is_empty());
        let best = parse_best_hits(Cursor::new("")).unwrap();
        assert!(best.is_empty());
    }

    #[test]
    fn cross_genome_rows_are_ignored_for_self_scores() {
        let report = "Cluster0\tCluster1\t95.00\t15\t0\t0\t1\t15\t1\t15\t1e-07\t28.0";
        let parsed = parse_self_scores(Cursor::new(report)).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn duplicate_self_rows_last_wins() {
        let report = "Cluster0\tCluster0\t100.00\t15\t0\t0\t1\t15\t1\t15\t1e-07\t30.2\n\
                      Cluster0\tCluster0\t100.00\t15\t0\t0\t1\t15\t1\t15\t1e-07\t33.3";
        let parsed = parse_self_scores(Cursor::new(report)).unwrap();
        assert_eq!(parsed.order, vec!["Cluster0"]);
        assert_eq!(parsed.scores["Cluster0"], "33.3");
    }

    #[test]
    fn best_hit_keeps_highest_score_per_query() {
        let report = "Cluster0\tgenomeA_12\t90.00\t15\t1\t0\t1\t15\t1\t15\t1e-05\t25.1\n\
                      Cluster0\tgenomeA_44\t99.00\t15\t0\t0\t1\t15\t1\t15\t1e-07\t30.2\n\
                      Cluster1\tgenomeA_7\t88.00\t15\t2\t0\t1\t15\t1\t15\t1e-04\t15.3";
        let best = parse_best_hits(Cursor::new(report)).unwrap();
        assert_eq!(best["Cluster0"], "30.2");
        assert_eq!(best["Cluster1"], "15.3");
    }

    #[test]
    fn best_hit_tie_keeps_first_row() {
        let report = "Cluster0\tgenomeA_12\t90.00\t15\t1\t0\t1\t15\t1\t15\t1e-05\t30.2\n\
                      Cluster0\tgenomeA_44\t99.00\t15\t0\t0\t1\t15\t1\t15\t1e-07\t30.20";
        let best = parse_best_hits(Cursor::new(report)).unwrap();
        assert_eq!(best["Cluster0"], "30.2");
    }

    #[test]
    fn parse_is_idempotent_over_the_same_report() {
        let report = "Cluster0\tCluster0\t100.00\t15\t0\t0\t1\t15\t1\t15\t1e-07\t30.2\n\
                      Cluster1\tCluster1\t100.00\t15\t0\t0\t1\t15\t1\t15\t1e-07\t40.5";
        let first = parse_self_scores(Cursor::new(report)).unwrap();
        let second = parse_self_scores(Cursor::new(report)).unwrap();
        assert_eq!(first.order, second.order);
        assert_eq!(first.scores, second.scores);
    }
}
