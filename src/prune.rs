use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::logger::Logger;
use crate::matrix::TextMatrix;
use crate::util::{open_bufread, open_bufwrite};

/// Read a genome-group list file: one genome identifier per line, no
/// header. Blank lines are skipped; an empty file is an empty group.
pub fn read_group_list(path: &Path, logger: &Logger) -> Result<Vec<String>, String> {
    let reader = open_bufread(path, logger, "read_group_list");

    let mut names = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|e| format!("read_group_list: read error: {}", e))?;
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }

    logger.information(&format!(
        "read_group_list: {} genome names from {}",
        names.len(),
        path.display()
    ));
    Ok(names)
}

/// Column indices (0-based, header order) of the genomes named in a group
/// list. Callers drop these columns to build the complementary subset.
/// Names not present in the header are ignored.
pub fn filter_genomes(group: &[String], matrix: &TextMatrix) -> Vec<usize> {
    let wanted: HashSet<&str> = group.iter().map(|s| s.as_str()).collect();

    matrix
        .genomes
        .iter()
        .enumerate()
        .filter(|(_, genome)| wanted.contains(genome.as_str()))
        .map(|(index, _)| index)
        .collect()
}

/// Drop the given data columns from a matrix, keeping the gene-name column
/// and row order, and write the result to `<tag>_pruned.txt` under
/// `out_dir`.
pub fn filter_matrix(
    drop_indices: &[usize],
    matrix: &TextMatrix,
    tag: &str,
    out_dir: &Path,
    logger: &Logger,
) -> Result<TextMatrix, String> {
    let drop: HashSet<usize> = drop_indices.iter().copied().collect();

    let genomes: Vec<String> = matrix
        .genomes
        .iter()
        .enumerate()
        .filter(|(index, _)| !drop.contains(index))
        .map(|(_, genome)| genome.clone())
        .collect();

    let mut rows = Vec::with_capacity(matrix.rows.len());
    for row in &matrix.rows {
        let mut kept = vec![row[0].clone()];
        // row[0] is the gene name; data columns start at 1
        for (index, value) in row[1..].iter().enumerate() {
            if !drop.contains(&index) {
                kept.push(value.clone());
            }
        }
        rows.push(kept);
    }

    let pruned = TextMatrix { genomes, rows };

    let out_path = out_dir.join(format!("{}_pruned.txt", tag));
    write_text_matrix(&pruned, &out_path, logger)?;

    Ok(pruned)
}

/// Split a matrix into two per-group column subsets. Returns the pruned
/// matrices together with the group names actually matched against the
/// header; names with no matching column are dropped silently so a typo in
/// a group file cannot fail the whole run.
pub fn prune_matrix(
    matrix: &TextMatrix,
    group1: &[String],
    group2: &[String],
    out_dir: &Path,
    logger: &Logger,
) -> Result<(TextMatrix, TextMatrix, Vec<String>, Vec<String>), String> {
    let resolved1 = resolve_against_header(group1, matrix);
    let resolved2 = resolve_against_header(group2, matrix);

    for name in group1 {
        if !resolved1.contains(name) {
            logger.warning(&format!("prune_matrix: group1 name '{}' not in matrix header, ignoring", name));
        }
    }
    for name in group2 {
        if !resolved2.contains(name) {
            logger.warning(&format!("prune_matrix: group2 name '{}' not in matrix header, ignoring", name));
        }
    }

    let drop1 = complement_indices(&resolved1, matrix);
    let drop2 = complement_indices(&resolved2, matrix);

    let pruned1 = filter_matrix(&drop1, matrix, "group1", out_dir, logger)?;
    let pruned2 = filter_matrix(&drop2, matrix, "group2", out_dir, logger)?;

    Ok((pruned1, pruned2, resolved1, resolved2))
}

fn resolve_against_header(group: &[String], matrix: &TextMatrix) -> Vec<String> {
    let header: HashSet<&str> = matrix.genomes.iter().map(|s| s.as_str()).collect();
    group
        .iter()
        .filter(|name| header.contains(name.as_str()))
        .cloned()
        .collect()
}

fn complement_indices(keep: &[String], matrix: &TextMatrix) -> Vec<usize> {
    let keep: HashSet<&str> = keep.iter().map(|s| s.as_str()).collect();
    matrix
        .genomes
        .iter()
        .enumerate()
        .filter(|(_, genome)| !keep.contains(genome.as_str()))
        .map(|(index, _)| index)
        .collect()
}

pub fn write_text_matrix(matrix: &TextMatrix, out_path: &Path, logger: &Logger) -> Result<PathBuf, String> {
    let mut writer = open_bufwrite(out_path, logger, "write_text_matrix");

    writeln!(writer, "\t{}", matrix.genomes.join("\t"))
        .map_err(|e| format!("write_text_matrix: write error: {}", e))?;
    for row in &matrix.rows {
        writeln!(writer, "{}", row.join("\t"))
            .map_err(|e| format!("write_text_matrix: write error: {}", e))?;
    }

    logger.information(&format!("write_text_matrix: wrote {}", out_path.display()));
    Ok(out_path.to_path_buf())
}
