use clap::Parser;
use std::path::{Path, PathBuf};

mod align;
mod args;
mod blast_report;
mod compare;
mod external_tools;
mod logger;
mod matrix;
mod prune;
mod read_fasta;
mod report;
mod translate;
mod util;
mod write_fasta;

use args::{Args, BsrStep};
use logger::Logger;
use report::OutputItem;
use util::{mkdir, open_bufread, LogResultExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let logger = Logger;

    // Validate steps and their inputs
    args::validate_step_sequence(&args.bsr_step, &logger);
    args::validate_step_inputs(&args, &logger);

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
    {
        logger.warning(&format!("Could not size the thread pool, using defaults: {}", e));
    }

    // Output dirs
    let main_output_dir = PathBuf::from(&args.output_dir);
    let orf_out_dir = main_output_dir.join("bsr_step1-gene-prediction");
    let cluster_out_dir = main_output_dir.join("bsr_step2-clustering");
    let blast_out_dir = main_output_dir.join("bsr_step3-blast-grid");
    let matrix_out_dir = main_output_dir.join("bsr_step4-matrix");
    let groups_out_dir = main_output_dir.join("bsr_step5-groups");
    mkdir(&main_output_dir, &logger, "main");

    // Files shared between steps
    let all_orfs_path = cluster_out_dir.join("all_orfs.fna");
    let tagged_orfs_path = cluster_out_dir.join("all_orfs.centroid_tagged.fna");
    let centroids_path = cluster_out_dir.join("centroids.fna");
    let consensus_fna_path = cluster_out_dir.join("consensus.fna");
    let consensus_pep_path = cluster_out_dir.join("consensus.pep");
    let self_report_path = blast_out_dir.join("consensus_self.blast.out");
    let db_dir = blast_out_dir.join("databases");
    let matrix_path = match &args.matrix {
        Some(path) => PathBuf::from(path),
        None => matrix_out_dir.join("BSR_matrix_values.txt"),
    };

    let genomes = align::build_genome_set(&args.genomes, &db_dir, &logger);
    let mut outputs: Vec<OutputItem> = Vec::new();

    if args.bsr_step.contains(&BsrStep::PredictGenes) {
        logger.information("─────────────────────────────");
        logger.information("Running Step 1: predict-genes");
        logger.information("─────────────────────────────");

        mkdir(&orf_out_dir, &logger, "predict-genes");
        mkdir(&cluster_out_dir, &logger, "predict-genes");
        let prodigal = external_tools::find_executable("prodigal", &logger);

        // Predict ORFs per genome, then pool them with genome-tagged IDs so
        // identical contig names in different genomes cannot collide
        let mut pooled: Vec<read_fasta::Fasta> = Vec::new();
        for genome in &genomes {
            let orfs_path = orf_out_dir.join(format!("{}.orfs.fna", genome.name));
            align::run_prodigal(&prodigal, genome, &orfs_path, &logger);

            let orfs = read_fasta::read_fasta(&orfs_path, &logger)?;
            for orf in orfs {
                pooled.push(read_fasta::Fasta {
                    id: format!("{}|{}", genome.name, orf.id),
                    desc: orf.desc,
                    seq: orf.seq,
                });
            }
        }

        write_fasta::write_wrapped_fasta(&pooled, &all_orfs_path, &logger)?;
        outputs.push(OutputItem {
            step: "predict-genes".into(),
            path: all_orfs_path.display().to_string(),
        });
    }

    if args.bsr_step.contains(&BsrStep::ClusterOrfs) {
        logger.information("────────────────────────────");
        logger.information("Running Step 2: cluster-orfs");
        logger.information("────────────────────────────");

        mkdir(&cluster_out_dir, &logger, "cluster-orfs");
        let vsearch = external_tools::find_executable("vsearch", &logger);

        let all_orfs = read_fasta::read_fasta(&all_orfs_path, &logger)?;
        read_fasta::rename_centroid_headers(&all_orfs, &tagged_orfs_path, &logger)?;

        align::run_clustering(&vsearch, &tagged_orfs_path, &centroids_path, args.cluster_id, &logger);

        // Stable cluster identifiers keyed on file order; every downstream
        // report and matrix row uses these names
        let centroids = read_fasta::read_fasta(&centroids_path, &logger)?;
        let clusters = read_fasta::assign_cluster_ids(&centroids);
        write_fasta::write_wrapped_fasta(&clusters, &consensus_fna_path, &logger)?;

        outputs.push(OutputItem {
            step: "cluster-orfs".into(),
            path: consensus_fna_path.display().to_string(),
        });
    }

    if args.bsr_step.contains(&BsrStep::TranslateConsensus) {
        logger.information("───────────────────────────────────");
        logger.information("Running Step 3: translate-consensus");
        logger.information("───────────────────────────────────");

        let clusters = read_fasta::read_fasta(&consensus_fna_path, &logger)?;
        let peptides = translate::translate_and_filter(&clusters, args.genetic_code, &logger)?;
        write_fasta::write_fasta_records(&peptides, &consensus_pep_path, &logger)?;

        outputs.push(OutputItem {
            step: "translate-consensus".into(),
            path: consensus_pep_path.display().to_string(),
        });
    }

    if args.bsr_step.contains(&BsrStep::BlastGrid) {
        logger.information("──────────────────────────");
        logger.information("Running Step 4: blast-grid");
        logger.information("──────────────────────────");

        mkdir(&blast_out_dir, &logger, "blast-grid");
        mkdir(&db_dir, &logger, "blast-grid");
        let tools = align::resolve_aligner_tools(&args.aligner, &logger);

        align::create_genome_dbs(&tools, &genomes, &logger);
        align::run_self_blast(&tools, &consensus_pep_path, &db_dir, &self_report_path, &logger);
        let reports = align::run_blast_grid(
            &tools,
            &genomes,
            &consensus_pep_path,
            &args.evalue,
            &blast_out_dir,
            &logger,
        );

        for (_, path) in &reports {
            outputs.push(OutputItem {
                step: "blast-grid".into(),
                path: path.display().to_string(),
            });
        }
    }

    if args.bsr_step.contains(&BsrStep::BuildMatrix) {
        logger.information("────────────────────────────");
        logger.information("Running Step 5: build-matrix");
        logger.information("────────────────────────────");

        mkdir(&matrix_out_dir, &logger, "build-matrix");

        let self_reader = open_bufread(&self_report_path, &logger, "build-matrix");
        let self_scores = blast_report::parse_self_scores(self_reader)
            .log_or_exit(&logger, |e| format!("build-matrix: {}", e));
        logger.information(&format!("build-matrix: {} reference genes", self_scores.len()));

        let mut tables = Vec::with_capacity(genomes.len());
        for genome in &genomes {
            let report_path = blast_out_dir.join(format!("{}.blast.out", genome.name));
            let reader = open_bufread(&report_path, &logger, "build-matrix");
            let best = blast_report::parse_best_hits(reader)
                .log_or_exit(&logger, |e| format!("build-matrix: {}: {}", report_path.display(), e));

            let table_path = matrix_out_dir.join(format!("{}.scores.txt", genome.name));
            blast_report::write_score_table(&best, &self_scores, &table_path, &logger)
                .log_or_exit(&logger, |e| format!("build-matrix: {}", e));

            tables.push((genome.name.clone(), best));
        }

        let raw = matrix::assemble(&self_scores, &tables);
        let bsr = matrix::normalize(&raw, &self_scores)
            .log_or_exit(&logger, |e| format!("build-matrix: {}", e));
        matrix::write_matrix(&bsr, &matrix_path, &logger)
            .log_or_exit(&logger, |e| format!("build-matrix: {}", e));

        outputs.push(OutputItem {
            step: "build-matrix".into(),
            path: matrix_path.display().to_string(),
        });
    }

    if args.bsr_step.contains(&BsrStep::Prune) {
        logger.information("─────────────────────");
        logger.information("Running Step 6: prune");
        logger.information("─────────────────────");

        mkdir(&groups_out_dir, &logger, "prune");

        let m = matrix::read_matrix(&matrix_path, &logger)
            .log_or_exit(&logger, |e| format!("prune: {}", e));
        let group1 = prune::read_group_list(Path::new(args.group1.as_ref().unwrap()), &logger)
            .log_or_exit(&logger, |e| format!("prune: {}", e));
        let group2 = prune::read_group_list(Path::new(args.group2.as_ref().unwrap()), &logger)
            .log_or_exit(&logger, |e| format!("prune: {}", e));

        let (_, _, resolved1, resolved2) =
            prune::prune_matrix(&m, &group1, &group2, &groups_out_dir, &logger)
                .log_or_exit(&logger, |e| format!("prune: {}", e));

        logger.information(&format!(
            "prune: matched {} group1 and {} group2 genomes against the matrix header",
            resolved1.len(),
            resolved2.len()
        ));
        outputs.push(OutputItem {
            step: "prune".into(),
            path: groups_out_dir.join("group1_pruned.txt").display().to_string(),
        });
        outputs.push(OutputItem {
            step: "prune".into(),
            path: groups_out_dir.join("group2_pruned.txt").display().to_string(),
        });
    }

    if args.bsr_step.contains(&BsrStep::Compare) {
        logger.information("───────────────────────");
        logger.information("Running Step 7: compare");
        logger.information("───────────────────────");

        let m1 = matrix::read_matrix(&groups_out_dir.join("group1_pruned.txt"), &logger)
            .log_or_exit(&logger, |e| format!("compare: {}", e));
        let m2 = matrix::read_matrix(&groups_out_dir.join("group2_pruned.txt"), &logger)
            .log_or_exit(&logger, |e| format!("compare: {}", e));

        let (hits1, hits2) = compare::compare_values(&m1, &m2, args.upper, args.lower)
            .log_or_exit(&logger, |e| format!("compare: {}", e));

        logger.information(&format!(
            "compare: {} genes present only in group1, {} present only in group2",
            hits1.len(),
            hits2.len()
        ));

        let out1 = groups_out_dir.join("group1_out.txt");
        let out2 = groups_out_dir.join("group2_out.txt");
        compare::write_value_list(&hits1, &out1, &logger)
            .log_or_exit(&logger, |e| format!("compare: {}", e));
        compare::write_value_list(&hits2, &out2, &logger)
            .log_or_exit(&logger, |e| format!("compare: {}", e));

        outputs.push(OutputItem { step: "compare".into(), path: out1.display().to_string() });
        outputs.push(OutputItem { step: "compare".into(), path: out2.display().to_string() });
    }

    if args.bsr_step.contains(&BsrStep::Uniques) {
        logger.information("───────────────────────");
        logger.information("Running Step 8: uniques");
        logger.information("───────────────────────");

        mkdir(&groups_out_dir, &logger, "uniques");

        let combined_path = Path::new(args.combined.as_ref().unwrap());
        let fasta_path = Path::new(args.fasta.as_ref().unwrap());

        let combined = compare::read_combined_matrix(combined_path, &logger)
            .log_or_exit(&logger, |e| format!("uniques: {}", e));
        let fasta = read_fasta::read_fasta(fasta_path, &logger)?;

        let (unique1, unique2) = compare::find_uniques(&combined, &fasta, &groups_out_dir, &logger)
            .log_or_exit(&logger, |e| format!("uniques: {}", e));

        logger.information(&format!(
            "uniques: {} genes unique to condition 1, {} unique to condition 2",
            unique1.len(),
            unique2.len()
        ));
        outputs.push(OutputItem {
            step: "uniques".into(),
            path: groups_out_dir.join("group1_unique_seqs.fasta").display().to_string(),
        });
        outputs.push(OutputItem {
            step: "uniques".into(),
            path: groups_out_dir.join("group2_unique_seqs.fasta").display().to_string(),
        });
    }

    // Run record
    let summary = report::RunSummary {
        params: report::RunParams {
            aligner: args.aligner.clone(),
            evalue: args.evalue.clone(),
            cluster_id: args.cluster_id,
            genetic_code: args.genetic_code,
            upper: args.upper,
            lower: args.lower,
            threads: args.threads,
        },
        tools: report::collect_tool_versions(&args.aligner),
        outputs,
    };
    report::write_run_summary(&main_output_dir.join("run_summary.json"), &summary)?;

    logger.success("BSR: all requested steps completed.");
    Ok(())
}
