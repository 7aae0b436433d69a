use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::blast_report::SelfScores;
use crate::logger::Logger;
use crate::util::{open_bufread, open_bufwrite};

/// One matrix cell. Raw scores stay verbatim strings until normalization so
/// that a non-numeric token from the aligner is surfaced instead of being
/// silently coerced; a gene with no alignment in a genome is the `0`
/// sentinel, which is not the same thing as a score of 0.0.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Score(String),
    Missing,
    Ratio(f64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Score(s) => write!(f, "{}", s),
            Cell::Missing => write!(f, "0"),
            Cell::Ratio(v) => write!(f, "{}", v),
        }
    }
}

/// Genes-by-genomes score matrix. Row order comes from the reference
/// self-score report, column order from the genome list handed to
/// `assemble`; neither is ever reordered afterwards.
#[derive(Debug, Clone)]
pub struct BsrMatrix {
    pub genomes: Vec<String>,
    pub genes: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Merge per-genome score tables into one matrix. The reference establishes
/// the gene set and row order; each table contributes one column in the
/// order supplied. Gene/genome pairs with no score become `Cell::Missing`.
pub fn assemble(
    reference: &SelfScores,
    tables: &[(String, HashMap<String, String>)],
) -> BsrMatrix {
    let genomes: Vec<String> = tables.iter().map(|(name, _)| name.clone()).collect();
    let mut rows = Vec::with_capacity(reference.order.len());

    for gene in &reference.order {
        let mut row = Vec::with_capacity(tables.len());
        for (_, table) in tables {
            match table.get(gene) {
                Some(score) => row.push(Cell::Score(score.clone())),
                None => row.push(Cell::Missing),
            }
        }
        rows.push(row);
    }

    BsrMatrix {
        genomes,
        genes: reference.order.clone(),
        rows,
    }
}

/// Divide every raw score by the reference self-score of its gene, yielding
/// BSR values. The missing sentinel legitimately divides to 0.0; any other
/// cell whose score (or whose self-score) does not parse as a number is an
/// error rather than a silent zero. Ratios above 1.0 are preserved.
pub fn normalize(matrix: &BsrMatrix, reference: &SelfScores) -> Result<BsrMatrix, String> {
    let mut rows = Vec::with_capacity(matrix.rows.len());

    for (gene, row) in matrix.genes.iter().zip(&matrix.rows) {
        let self_score = reference
            .scores
            .get(gene)
            .ok_or_else(|| format!("normalize: no self score for gene {}", gene))?;
        let denominator: f64 = self_score.parse().map_err(|_| {
            format!("normalize: non-numeric self score '{}' for gene {}", self_score, gene)
        })?;

        let mut normalized = Vec::with_capacity(row.len());
        for (genome, cell) in matrix.genomes.iter().zip(row) {
            let value = match cell {
                Cell::Score(raw) => {
                    let score: f64 = raw.parse().map_err(|_| {
                        format!(
                            "normalize: non-numeric score '{}' for gene {} in genome {}",
                            raw, gene, genome
                        )
                    })?;
                    Cell::Ratio(score / denominator)
                }
                Cell::Missing => Cell::Ratio(0.0),
                Cell::Ratio(v) => Cell::Ratio(*v),
            };
            normalized.push(value);
        }
        rows.push(normalized);
    }

    Ok(BsrMatrix {
        genomes: matrix.genomes.clone(),
        genes: matrix.genes.clone(),
        rows,
    })
}

/// Write the matrix as tab-separated text: a header line with a blank
/// leading cell and one genome name per column, then one line per gene.
pub fn write_matrix(matrix: &BsrMatrix, out_path: &Path, logger: &Logger) -> Result<(), String> {
    let mut writer = open_bufwrite(out_path, logger, "write_matrix");

    writeln!(writer, "\t{}", matrix.genomes.join("\t"))
        .map_err(|e| format!("write_matrix: write error: {}", e))?;

    for (gene, row) in matrix.genes.iter().zip(&matrix.rows) {
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        writeln!(writer, "{}\t{}", gene, cells.join("\t"))
            .map_err(|e| format!("write_matrix: write error: {}", e))?;
    }

    logger.information(&format!(
        "write_matrix: wrote {} genes x {} genomes to {}",
        matrix.genes.len(),
        matrix.genomes.len(),
        out_path.display()
    ));
    Ok(())
}

/// A matrix re-read from disk for the partition and comparison stages.
/// Cells stay as the original tokens so reported values keep their source
/// formatting (a `0.80` compares as 0.8 but is reported as `0.80`).
/// `rows[i][0]` is the gene name.
#[derive(Debug, Clone)]
pub struct TextMatrix {
    pub genomes: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read a matrix file written by `write_matrix` (or by an earlier run).
/// Fields are split on any whitespace: archived matrices are often
/// space-padded rather than strictly tab-delimited.
pub fn read_matrix(path: &Path, logger: &Logger) -> Result<TextMatrix, String> {
    let reader = open_bufread(path, logger, "read_matrix");
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line.map_err(|e| format!("read_matrix: read error: {}", e))?,
        None => {
            return Ok(TextMatrix {
                genomes: Vec::new(),
                rows: Vec::new(),
            })
        }
    };

    // The header's leading cell is blank, so splitting leaves genome names only.
    let genomes: Vec<String> = header.split_whitespace().map(|s| s.to_string()).collect();

    let mut rows = Vec::new();
    for line in lines {
        let line = line.map_err(|e| format!("read_matrix: read error: {}", e))?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<String> = line.split_whitespace().map(|s| s.to_string()).collect();
        if fields.len() != genomes.len() + 1 {
            return Err(format!(
                "read_matrix: row '{}' has {} values, expected {} in {}",
                fields[0],
                fields.len() - 1,
                genomes.len(),
                path.display()
            ));
        }
        rows.push(fields);
    }

    Ok(TextMatrix { genomes, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blast_report::parse_self_scores;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn reference() -> SelfScores {
        let report = "Cluster0\tCluster0\t100.00\t15\t0\t0\t1\t15\t1\t15\t1e-07\t30.2\n\
                      Cluster1\tCluster1\t100.00\t15\t0\t0\t1\t15\t1\t15\t1e-07\t40.5\n\
                      Cluster2\tCluster2\t100.00\t15\t0\t0\t1\t15\t1\t15\t1e-07\t60.6";
        parse_self_scores(Cursor::new(report)).unwrap()
    }

    fn table(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn missing_genes_become_the_zero_sentinel() {
        let tables = vec![
            (
                "sample1".to_string(),
                table(&[("Cluster0", "30.2"), ("Cluster1", "40.5"), ("Cluster2", "60.6")]),
            ),
            (
                "sample2".to_string(),
                table(&[("Cluster0", "15.2"), ("Cluster2", "30.6")]),
            ),
        ];
        let matrix = assemble(&reference(), &tables);

        assert_eq!(matrix.genes, vec!["Cluster0", "Cluster1", "Cluster2"]);
        assert_eq!(matrix.genomes, vec!["sample1", "sample2"]);
        assert_eq!(matrix.rows[1][1], Cell::Missing);
        assert_eq!(matrix.rows[1][1].to_string(), "0");
        assert_eq!(matrix.rows[0][1], Cell::Score("15.2".to_string()));
    }

    #[test]
    fn non_numeric_scores_are_preserved_verbatim() {
        let tables = vec![(
            "sample2".to_string(),
            table(&[("Cluster0", "15.2"), ("Cluster1", "ABCDE")]),
        )];
        let matrix = assemble(&reference(), &tables);
        assert_eq!(matrix.rows[1][0], Cell::Score("ABCDE".to_string()));
        assert_eq!(matrix.rows[2][0], Cell::Missing);
    }

    #[test]
    fn an_empty_table_fills_a_column_of_sentinels() {
        let tables = vec![("sample2".to_string(), HashMap::new())];
        let matrix = assemble(&reference(), &tables);
        for row in &matrix.rows {
            assert_eq!(row[0], Cell::Missing);
        }
    }

    #[test]
    fn normalize_divides_by_the_self_score() {
        let tables = vec![
            (
                "sample1".to_string(),
                table(&[("Cluster0", "30.2"), ("Cluster1", "40.5"), ("Cluster2", "60.6")]),
            ),
            (
                "sample2".to_string(),
                table(&[("Cluster0", "15.2"), ("Cluster2", "30.6")]),
            ),
        ];
        let matrix = assemble(&reference(), &tables);
        let bsr = normalize(&matrix, &reference()).unwrap();

        assert_eq!(bsr.rows[0], vec![Cell::Ratio(1.0), Cell::Ratio(0.5033112582781457)]);
        assert_eq!(bsr.rows[1], vec![Cell::Ratio(1.0), Cell::Ratio(0.0)]);
        assert_eq!(bsr.rows[2], vec![Cell::Ratio(1.0), Cell::Ratio(0.504950495049505)]);
    }

    #[test]
    fn self_score_over_itself_is_one() {
        let reference = reference();
        let tables = vec![(
            "self".to_string(),
            table(&[("Cluster0", "30.2"), ("Cluster1", "40.5"), ("Cluster2", "60.6")]),
        )];
        let bsr = normalize(&assemble(&reference, &tables), &reference).unwrap();
        for row in &bsr.rows {
            assert_eq!(row[0], Cell::Ratio(1.0));
        }
    }

    #[test]
    fn normalize_rejects_non_numeric_cells() {
        let tables = vec![(
            "sample2".to_string(),
            table(&[("Cluster0", "15.2"), ("Cluster1", "ABCDE")]),
        )];
        let matrix = assemble(&reference(), &tables);
        let err = normalize(&matrix, &reference()).unwrap_err();
        assert!(err.contains("non-numeric score 'ABCDE'"), "{}", err);
    }

    #[test]
    fn ratios_above_one_are_not_clamped() {
        let tables = vec![("sample1".to_string(), table(&[("Cluster0", "60.4")]))];
        let bsr = normalize(&assemble(&reference(), &tables), &reference()).unwrap();
        assert_eq!(bsr.rows[0][0], Cell::Ratio(2.0));
    }

    #[test]
    fn matrix_roundtrips_through_text() {
        let logger = Logger;
        let dir = tempdir().unwrap();
        let path = dir.path().join("BSR_matrix_values.txt");

        let tables = vec![
            ("sample1".to_string(), table(&[("Cluster0", "30.2"), ("Cluster1", "40.5"), ("Cluster2", "60.6")])),
            ("sample2".to_string(), table(&[("Cluster0", "15.2")])),
        ];
        let bsr = normalize(&assemble(&reference(), &tables), &reference()).unwrap();
        write_matrix(&bsr, &path, &logger).unwrap();

        let text = read_matrix(&path, &logger).unwrap();
        assert_eq!(text.genomes, vec!["sample1", "sample2"]);
        assert_eq!(text.rows.len(), 3);
        assert_eq!(text.rows[0][0], "Cluster0");
        assert_eq!(text.rows[1], vec!["Cluster1", "1", "0"]);
    }

    #[test]
    fn read_matrix_rejects_short_rows() {
        let logger = Logger;
        let dir = tempdir().unwrap();
        let path = dir.path().join("truncated.txt");
        std::fs::write(&path, "\tsample1\tsample2\nCluster0\t30.2\t15.2\nCluster2\t60.6\n").unwrap();

        let err = read_matrix(&path, &logger).unwrap_err();
        assert!(err.contains("Cluster2"), "{}", err);
    }

    #[test]
    fn read_matrix_accepts_space_padded_files() {
        let logger = Logger;
        let dir = tempdir().unwrap();
        let path = dir.path().join("padded.txt");
        std::fs::write(
            &path,
            "        E2348_69_all    H10407_all\nIpaH3   0.03    0.03\nLT      0.00    1.00\n",
        )
        .unwrap();

        let text = read_matrix(&path, &logger).unwrap();
        assert_eq!(text.genomes, vec!["E2348_69_all", "H10407_all"]);
        assert_eq!(text.rows[1], vec!["LT", "0.00", "1.00"]);
    }
}
