use crate::external_tools::get_version;

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct RunParams {
    pub aligner: String,
    pub evalue: String,
    pub cluster_id: f64,
    pub genetic_code: usize,
    pub upper: f64,
    pub lower: f64,
    pub threads: usize,
}

#[derive(Serialize)]
pub struct OutputItem {
    pub step: String,
    pub path: String,
}

#[derive(Serialize)]
pub struct RunSummary {
    pub params: RunParams,
    pub tools: Vec<ToolInfo>,
    pub outputs: Vec<OutputItem>,
}

/// Versions of the external programs, for the run record. Tools that are
/// absent or refuse to report a version are listed as Unknown.
pub fn collect_tool_versions(aligner: &str) -> Vec<ToolInfo> {
    let mut tools = Vec::new();

    tools.push(ToolInfo {
        name: "prodigal".into(),
        version: get_version("prodigal", &["-v"]).unwrap_or_else(|| "Unknown".into()),
    });
    tools.push(ToolInfo {
        name: "vsearch".into(),
        version: get_version("vsearch", &["--version"]).unwrap_or_else(|| "Unknown".into()),
    });

    match aligner {
        "blastplus" => {
            tools.push(ToolInfo {
                name: "blastp".into(),
                version: get_version("blastp", &["-version"]).unwrap_or_else(|| "Unknown".into()),
            });
        }
        "blastlegacy" => {
            tools.push(ToolInfo {
                name: "blastall".into(),
                version: "Legacy BLAST (no version reporting)".into(),
            });
        }
        _ => {}
    }

    tools
}

pub fn write_run_summary(out_path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)
        .context("write_run_summary: failed to serialize summary")?;
    fs::write(out_path, json)
        .with_context(|| format!("write_run_summary: failed to write {}", out_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn summary_serializes_params_and_outputs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run_summary.json");

        let summary = RunSummary {
            params: RunParams {
                aligner: "blastplus".into(),
                evalue: "1e-5".into(),
                cluster_id: 0.9,
                genetic_code: 11,
                upper: 0.8,
                lower: 0.4,
                threads: 4,
            },
            tools: vec![ToolInfo { name: "prodigal".into(), version: "V2.6.3".into() }],
            outputs: vec![OutputItem {
                step: "build-matrix".into(),
                path: "bsr_output/step4-matrix/BSR_matrix_values.txt".into(),
            }],
        };

        write_run_summary(&path, &summary).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"aligner\": \"blastplus\""));
        assert!(written.contains("BSR_matrix_values.txt"));
    }
}
