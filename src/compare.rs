use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::logger::Logger;
use crate::matrix::TextMatrix;
use crate::read_fasta::Fasta;
use crate::util::{open_bufread, open_bufwrite};
use crate::write_fasta;

/// Classify genes as present in one genome group and absent from the
/// other. A gene qualifies for group1 when its best value there reaches
/// `upper` (inclusive) while its best value in group2 stays below `lower`,
/// and symmetrically for group2. Returns the qualifying values, verbatim as
/// they appear in the matrices, in group1 row order. Genes present in only
/// one matrix are skipped.
pub fn compare_values(
    group1: &TextMatrix,
    group2: &TextMatrix,
    upper: f64,
    lower: f64,
) -> Result<(Vec<String>, Vec<String>), String> {
    let group2_rows: HashMap<&str, &Vec<String>> = group2
        .rows
        .iter()
        .map(|row| (row[0].as_str(), row))
        .collect();

    let mut hits1 = Vec::new();
    let mut hits2 = Vec::new();

    for row1 in &group1.rows {
        let gene = row1[0].as_str();
        let Some(row2) = group2_rows.get(gene).copied() else {
            continue;
        };

        let Some((max1, token1)) = row_max(row1, gene)? else {
            continue;
        };
        let Some((max2, token2)) = row_max(row2, gene)? else {
            continue;
        };

        if max1 >= upper && max2 < lower {
            hits1.push(token1.to_string());
        }
        if max2 >= upper && max1 < lower {
            hits2.push(token2.to_string());
        }
    }

    Ok((hits1, hits2))
}

/// Best value in a data row, returned with its original token. `None` when
/// the row has no data columns (an empty group).
fn row_max<'a>(row: &'a [String], gene: &str) -> Result<Option<(f64, &'a str)>, String> {
    let mut best: Option<(f64, &str)> = None;

    for token in &row[1..] {
        let value: f64 = token.parse().map_err(|_| {
            format!("compare_values: non-numeric value '{}' for gene {}", token, gene)
        })?;
        if best.map_or(true, |(current, _)| value > current) {
            best = Some((value, token));
        }
    }

    Ok(best)
}

pub fn write_value_list(values: &[String], out_path: &Path, logger: &Logger) -> Result<(), String> {
    let mut writer = open_bufwrite(out_path, logger, "write_value_list");
    for value in values {
        writeln!(writer, "{}", value)
            .map_err(|e| format!("write_value_list: write error: {}", e))?;
    }
    logger.information(&format!("write_value_list: wrote {} values to {}", values.len(), out_path.display()));
    Ok(())
}

/// Read a combined two-condition matrix: no header line, one gene per row,
/// the two condition blocks interleaved at fixed offsets.
pub fn read_combined_matrix(path: &Path, logger: &Logger) -> Result<Vec<Vec<String>>, String> {
    let reader = open_bufread(path, logger, "read_combined_matrix");

    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|e| format!("read_combined_matrix: read error: {}", e))?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(line.split_whitespace().map(|s| s.to_string()).collect());
    }

    Ok(rows)
}

// Presence flags of the two condition blocks in a combined row:
// gene, value, flag, count, flag, value, flag, count, flag
//        block 1 ^                 block 2 ^
const CONDITION1_FLAG: usize = 2;
const CONDITION2_FLAG: usize = 6;

/// Find genes unique to either condition of a combined matrix: flagged
/// present in one condition's block and absent in the other's. Writes the
/// per-condition FASTA subsets for the genes that have a sequence in
/// `fasta`, and returns both gene-name lists in row order. The layout is
/// fixed to two conditions.
pub fn find_uniques(
    combined: &[Vec<String>],
    fasta: &[Fasta],
    out_dir: &Path,
    logger: &Logger,
) -> Result<(Vec<String>, Vec<String>), String> {
    let mut group1_genes = Vec::new();
    let mut group2_genes = Vec::new();

    for row in combined {
        if row.len() <= CONDITION2_FLAG {
            return Err(format!(
                "find_uniques: row '{}' has {} fields, expected a two-condition layout",
                row.first().map(|s| s.as_str()).unwrap_or(""),
                row.len()
            ));
        }

        let gene = row[0].clone();
        match (row[CONDITION1_FLAG].as_str(), row[CONDITION2_FLAG].as_str()) {
            ("1", "0") => group1_genes.push(gene),
            ("0", "1") => group2_genes.push(gene),
            _ => {}
        }
    }

    write_unique_seqs(&group1_genes, fasta, &out_dir.join("group1_unique_seqs.fasta"), logger)?;
    write_unique_seqs(&group2_genes, fasta, &out_dir.join("group2_unique_seqs.fasta"), logger)?;

    Ok((group1_genes, group2_genes))
}

fn write_unique_seqs(
    genes: &[String],
    fasta: &[Fasta],
    out_path: &Path,
    logger: &Logger,
) -> Result<(), String> {
    let by_id: HashMap<&str, &Fasta> = fasta.iter().map(|f| (f.id.as_str(), f)).collect();

    let records: Vec<Fasta> = genes
        .iter()
        .filter_map(|gene| by_id.get(gene.as_str()).map(|f| (*f).clone()))
        .collect();

    for gene in genes {
        if !by_id.contains_key(gene.as_str()) {
            logger.warning(&format!("find_uniques: no sequence for {} in the FASTA source", gene));
        }
    }

    write_fasta::write_fasta_records(&records, out_path, logger)
        .map_err(|e| format!("find_uniques: failed to write {}: {}", out_path.display(), e))
}
