use crate::Logger;

use clap::{Parser, ValueEnum};

// setting up the command line parameters
#[derive(Parser, Debug)]
#[command(name = "bsr")]
#[command(version = "1.0")]
#[command(about = "Compute BLAST Score Ratios (BSR) across bacterial genomes to compare gene content.", long_about = None)]
pub struct Args {
    /// Genome FASTA files to compare, comma separated. Column order in the
    /// BSR matrix follows this list exactly.
    #[arg(short = 'g', long = "genomes", value_delimiter = ',')]
    pub genomes: Vec<String>,

    /// Pipeline steps to run (comma separated). See possible values below.
    /// Example:
    ///   --bsr_step predict-genes,cluster-orfs,translate-consensus,blast-grid,build-matrix
    #[arg(
        short = 's',
        long = "bsr_step",
        value_enum,
        value_delimiter = ',',
        default_values = [
            "predict-genes",
            "cluster-orfs",
            "translate-consensus",
            "blast-grid",
            "build-matrix"
        ],
        long_help = "Run one or more pipeline steps in order. \
                     Accepts a comma separated list."
    )]
    pub bsr_step: Vec<BsrStep>,

    /// Aligner for the blast-grid step
    /// Options: blastplus, blastlegacy
    #[arg(long = "aligner", default_value = "blastplus")]
    pub aligner: String,

    /// BLAST e-value cutoff
    #[arg(short = 'e', long, default_value = "1e-5")]
    pub evalue: String,

    /// Identity threshold for clustering ORFs into centroids
    #[arg(long = "cluster_id", default_value_t = 0.9)]
    pub cluster_id: f64,

    /// 1.  The Standard Code
    /// 4.  The Mold, Protozoan, and Coelenterate Mitochondrial Code and the
    ///     Mycoplasma/Spiroplasma Code
    /// 11. The Bacterial, Archaeal and Plant Plastid Code
    #[arg(long, default_value_t = 11)]
    pub genetic_code: usize,

    /// Upper BSR threshold: a gene counts as present in a group when its
    /// best value there reaches this bound (inclusive)
    #[arg(long, default_value_t = 0.8)]
    pub upper: f64,

    /// Lower BSR threshold: a gene counts as absent from a group when its
    /// best value there stays below this bound
    #[arg(long, default_value_t = 0.4)]
    pub lower: f64,

    /// Genome-group list file for group 1, one genome name per line
    #[arg(long = "group1")]
    pub group1: Option<String>,

    /// Genome-group list file for group 2, one genome name per line
    #[arg(long = "group2")]
    pub group2: Option<String>,

    /// Existing BSR matrix file for the prune/compare steps, when the
    /// matrix-building steps are not part of this run
    #[arg(short = 'm', long = "matrix")]
    pub matrix: Option<String>,

    /// Combined two-condition matrix for the uniques step
    #[arg(long = "combined")]
    pub combined: Option<String>,

    /// FASTA source of candidate gene sequences for the uniques step
    #[arg(long = "fasta")]
    pub fasta: Option<String>,

    #[arg(short = 't', long, default_value_t = 4)]
    pub threads: usize,

    /// Output directory
    #[arg(short = 'o', long = "output_dir", default_value = "bsr_output")]
    pub output_dir: String,
}

/// Steps of the BSR pipeline, in execution order.
#[derive(Debug, Clone, ValueEnum, PartialEq, Eq)]
#[clap(rename_all = "kebab-case")]
pub enum BsrStep {
    #[value(name = "predict-genes", help = "Predict ORFs for every genome with prodigal and pool them")]
    PredictGenes,

    #[value(name = "cluster-orfs", help = "Cluster pooled ORFs into centroid sequences and assign cluster IDs")]
    ClusterOrfs,

    #[value(name = "translate-consensus", help = "Translate cluster centroids and keep peptides long enough to score")]
    TranslateConsensus,

    #[value(name = "blast-grid", help = "Align consensus peptides against every genome, plus the self-alignment")]
    BlastGrid,

    #[value(name = "build-matrix", help = "Parse alignment reports and write the normalized BSR matrix")]
    BuildMatrix,

    #[value(name = "prune", help = "Split the BSR matrix into per-group column subsets")]
    Prune,

    #[value(name = "compare", help = "Classify genes present in one group and absent from the other")]
    Compare,

    #[value(name = "uniques", help = "Find genes unique to either condition of a combined matrix")]
    Uniques,
}

/// Validate that steps are in pipeline order. Running a later step on the
/// outputs of an earlier run is fine; running steps out of order within one
/// invocation is not.
pub fn validate_step_sequence(steps: &[BsrStep], logger: &Logger) {
    use BsrStep::*;

    if steps.is_empty() {
        logger.error("No pipeline steps selected via --bsr_step.");
        std::process::exit(1);
    }

    let pipeline_order = [
        PredictGenes,
        ClusterOrfs,
        TranslateConsensus,
        BlastGrid,
        BuildMatrix,
        Prune,
        Compare,
        Uniques,
    ];

    let index_of = |step: &BsrStep| -> usize {
        pipeline_order
            .iter()
            .position(|s| s == step)
            .unwrap_or_else(|| {
                logger.error(&format!("Internal error: step {:?} not found in pipeline_order.", step));
                std::process::exit(1);
            })
    };

    let mut last_idx = 0usize;
    for step in steps {
        let idx = index_of(step);
        if idx < last_idx {
            logger.error(&format!(
                "Step {:?} appears out of order in --bsr_step. \
                 The allowed order is: predict-genes -> cluster-orfs -> \
                 translate-consensus -> blast-grid -> build-matrix -> \
                 prune -> compare -> uniques.",
                step
            ));
            std::process::exit(1);
        }
        last_idx = idx;
    }

    if steps.contains(&Compare) && !steps.contains(&Prune) {
        logger.error("The compare step reads the pruned matrices; select prune in the same run.");
        std::process::exit(1);
    }
}

/// Validate that the selected steps have the inputs they need. Abort with
/// clear error messages rather than failing mid-pipeline.
pub fn validate_step_inputs(args: &Args, logger: &Logger) {
    use BsrStep::*;

    let runs_alignment_pipeline = args
        .bsr_step
        .iter()
        .any(|s| matches!(s, PredictGenes | ClusterOrfs | TranslateConsensus | BlastGrid | BuildMatrix));

    if runs_alignment_pipeline && args.genomes.is_empty() {
        logger.error("No genomes given via --genomes, but matrix-building steps were selected.");
        std::process::exit(1);
    }

    if args.bsr_step.contains(&Prune) && (args.group1.is_none() || args.group2.is_none()) {
        logger.error("The prune step needs both --group1 and --group2 list files.");
        std::process::exit(1);
    }

    if args.bsr_step.contains(&Uniques) && (args.combined.is_none() || args.fasta.is_none()) {
        logger.error("The uniques step needs --combined and --fasta.");
        std::process::exit(1);
    }

    if args.upper < args.lower {
        logger.error(&format!(
            "Invalid thresholds: --upper {} is below --lower {}.",
            args.upper, args.lower
        ));
        std::process::exit(1);
    }
}
