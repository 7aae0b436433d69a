use crate::external_tools::{find_executable, run_checked};
use crate::logger::Logger;
use crate::util::{genome_label, mkdir};

use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// One input genome and where its alignment database lives.
pub struct Genome {
    pub name: String,
    pub fasta: PathBuf,
    pub db_prefix: PathBuf,
}

pub enum AlignerKind {
    BlastPlus,
    Legacy,
}

pub struct AlignerTools {
    pub kind: AlignerKind,
    pub db_builder: PathBuf,
    pub genome_searcher: PathBuf,
    pub self_searcher: PathBuf,
}

pub fn resolve_aligner_tools(aligner: &str, logger: &Logger) -> AlignerTools {
    match aligner {
        "blastplus" => AlignerTools {
            kind: AlignerKind::BlastPlus,
            db_builder: find_executable("makeblastdb", logger),
            // consensus peptides vs nucleotide genome databases
            genome_searcher: find_executable("tblastn", logger),
            self_searcher: find_executable("blastp", logger),
        },
        "blastlegacy" => {
            let blastall = find_executable("blastall", logger);
            AlignerTools {
                kind: AlignerKind::Legacy,
                db_builder: find_executable("formatdb", logger),
                genome_searcher: blastall.clone(),
                self_searcher: blastall,
            }
        }
        other => {
            logger.error(&format!(
                "resolve_aligner_tools: unsupported aligner '{}', expected 'blastplus' or 'blastlegacy'",
                other
            ));
            std::process::exit(1);
        }
    }
}

/// Build the genome set from the explicit input paths. Column order in
/// every downstream matrix follows this list, so the order is preserved
/// exactly; duplicate genome labels would collapse two columns and are
/// fatal.
pub fn build_genome_set(genome_paths: &[String], db_dir: &Path, logger: &Logger) -> Vec<Genome> {
    let mut seen = HashSet::new();
    let mut genomes = Vec::with_capacity(genome_paths.len());

    for path in genome_paths {
        let name = genome_label(path);
        if !seen.insert(name.clone()) {
            logger.error(&format!("build_genome_set: duplicate genome label '{}'", name));
            std::process::exit(1);
        }
        genomes.push(Genome {
            db_prefix: db_dir.join(&name),
            name,
            fasta: PathBuf::from(path),
        });
    }

    genomes
}

/// Predict ORFs for one genome with prodigal, writing the nucleotide gene
/// sequences to `orfs_out`.
pub fn run_prodigal(prodigal: &Path, genome: &Genome, orfs_out: &Path, logger: &Logger) {
    let mut cmd = Command::new(prodigal);
    cmd.arg("-i").arg(&genome.fasta)
        .arg("-d").arg(orfs_out)
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    run_checked(&mut cmd, logger, "run_prodigal");
    logger.information(&format!("run_prodigal: {} -> {}", genome.name, orfs_out.display()));
}

/// Cluster the pooled ORFs into centroid sequences with vsearch.
pub fn run_clustering(
    vsearch: &Path,
    all_orfs: &Path,
    centroids_out: &Path,
    cluster_id: f64,
    logger: &Logger,
) {
    let mut cmd = Command::new(vsearch);
    cmd.arg("--cluster_fast").arg(all_orfs)
        .arg("--id").arg(cluster_id.to_string())
        .arg("--centroids").arg(centroids_out)
        .arg("--strand").arg("both")
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    run_checked(&mut cmd, logger, "run_clustering");
    logger.information(&format!("run_clustering: centroids at {}", centroids_out.display()));
}

/// Build one nucleotide database per genome. Databases already on disk are
/// reused.
pub fn create_genome_dbs(tools: &AlignerTools, genomes: &[Genome], logger: &Logger) {
    for genome in genomes {
        if genome.db_prefix.with_extension("nin").exists() {
            logger.information(&format!("create_genome_dbs: reusing database for {}", genome.name));
            continue;
        }

        let mut cmd = Command::new(&tools.db_builder);
        match tools.kind {
            AlignerKind::BlastPlus => {
                cmd.arg("-in").arg(&genome.fasta)
                    .args(["-dbtype", "nucl"])
                    .arg("-out").arg(&genome.db_prefix)
                    .stdout(Stdio::null());
            }
            AlignerKind::Legacy => {
                cmd.arg("-i").arg(&genome.fasta)
                    .args(["-p", "F"])
                    .arg("-n").arg(&genome.db_prefix);
            }
        }

        run_checked(&mut cmd, logger, "create_genome_dbs");
        logger.information(&format!("create_genome_dbs: {}", genome.name));
    }
}

/// Align the consensus peptides against every genome database. Searches
/// are fanned out across genomes with rayon; each search runs on a single
/// thread, and results come back in genome-list order regardless of
/// completion order.
pub fn run_blast_grid(
    tools: &AlignerTools,
    genomes: &[Genome],
    consensus_pep: &Path,
    evalue: &str,
    out_dir: &Path,
    logger: &Logger,
) -> Vec<(String, PathBuf)> {
    genomes
        .par_iter()
        .map(|genome| {
            let out_path = out_dir.join(format!("{}.blast.out", genome.name));

            let mut cmd = Command::new(&tools.genome_searcher);
            match tools.kind {
                AlignerKind::BlastPlus => {
                    cmd.arg("-query").arg(consensus_pep)
                        .arg("-db").arg(&genome.db_prefix)
                        .arg("-evalue").arg(evalue)
                        .args(["-num_threads", "1"])
                        .args(["-outfmt", "6"])
                        .arg("-out").arg(&out_path);
                }
                AlignerKind::Legacy => {
                    cmd.args(["-p", "tblastn"])
                        .arg("-d").arg(&genome.db_prefix)
                        .arg("-i").arg(consensus_pep)
                        .arg("-o").arg(&out_path)
                        .args(["-e", evalue])
                        .args(["-a", "1"])
                        .args(["-m", "8"]);
                }
            }

            run_checked(&mut cmd, logger, "run_blast_grid");
            logger.information(&format!("run_blast_grid: wrote {}", out_path.display()));
            (genome.name.clone(), out_path)
        })
        .collect()
}

/// Align the consensus peptides against themselves; the resulting report
/// supplies the self-scores used as the normalization denominators.
pub fn run_self_blast(
    tools: &AlignerTools,
    consensus_pep: &Path,
    db_dir: &Path,
    out_path: &Path,
    logger: &Logger,
) {
    mkdir(db_dir, logger, "run_self_blast");
    let db_prefix = db_dir.join("consensus");

    let mut build = Command::new(&tools.db_builder);
    match tools.kind {
        AlignerKind::BlastPlus => {
            build.arg("-in").arg(consensus_pep)
                .args(["-dbtype", "prot"])
                .arg("-out").arg(&db_prefix)
                .stdout(Stdio::null());
        }
        AlignerKind::Legacy => {
            build.arg("-i").arg(consensus_pep)
                .args(["-p", "T"])
                .arg("-n").arg(&db_prefix);
        }
    }
    run_checked(&mut build, logger, "run_self_blast");

    let mut search = Command::new(&tools.self_searcher);
    match tools.kind {
        AlignerKind::BlastPlus => {
            search.arg("-query").arg(consensus_pep)
                .arg("-db").arg(&db_prefix)
                .args(["-outfmt", "6"])
                .arg("-out").arg(out_path);
        }
        AlignerKind::Legacy => {
            search.args(["-p", "blastp"])
                .arg("-d").arg(&db_prefix)
                .arg("-i").arg(consensus_pep)
                .arg("-o").arg(out_path)
                .args(["-m", "8"]);
        }
    }
    run_checked(&mut search, logger, "run_self_blast");

    logger.information(&format!("run_self_blast: wrote {}", out_path.display()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn genome_set_preserves_input_order() {
        let logger = Logger;
        let dir = tempdir().unwrap();
        let paths = vec![
            "/data/E2348_69_all.fasta".to_string(),
            "/data/H10407_all.fasta".to_string(),
        ];

        let genomes = build_genome_set(&paths, dir.path(), &logger);
        let names: Vec<&str> = genomes.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["E2348_69_all", "H10407_all"]);
        assert_eq!(genomes[0].db_prefix, dir.path().join("E2348_69_all"));
    }
}
