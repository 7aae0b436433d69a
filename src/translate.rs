use crate::logger::Logger;
use crate::read_fasta::Fasta;

use anyhow::{bail, Result};
use std::collections::HashMap;

/// Peptides shorter than this are dropped from the consensus set; very
/// short ORFs produce unreliable alignment scores.
pub const MIN_PEPTIDE_LEN: usize = 50;

/// Translate a DNA sequence into amino acids, truncating at the first stop
/// codon. Characters outside A/C/G/T/N are an error; a trailing partial
/// codon is ignored.
pub fn translate_sequence(dna: &str, genetic_code: usize) -> Result<String> {
    let upper = dna.to_uppercase();

    if let Some(bad) = upper.chars().find(|c| !matches!(c, 'A' | 'C' | 'G' | 'T' | 'N')) {
        bail!("translate_sequence: non-nucleotide character '{}' in sequence", bad);
    }

    let code = genetic_code_table(genetic_code);
    let bytes = upper.as_bytes();
    let mut pep = String::new();

    for codon_start in (0..bytes.len()).step_by(3) {
        if codon_start + 3 > bytes.len() {
            break;
        }
        let codon = &upper[codon_start..codon_start + 3];
        let aa = code.get(codon).copied().unwrap_or('X');
        if aa == '*' {
            break;
        }
        pep.push(aa);
    }

    Ok(pep)
}

/// Translate gene sequences and keep the peptides long enough to score
/// reliably. Propagates the first malformed sequence as an error.
pub fn translate_and_filter(
    records: &[Fasta],
    genetic_code: usize,
    logger: &Logger,
) -> Result<Vec<Fasta>> {
    let mut peptides = Vec::new();

    for record in records {
        if record.seq.len() % 3 != 0 {
            logger.warning(&format!(
                "translate_and_filter: sequence for '{}' has length {} not divisible by 3",
                record.id,
                record.seq.len()
            ));
        }

        let pep = translate_sequence(&record.seq, genetic_code)?;
        if pep.len() >= MIN_PEPTIDE_LEN {
            peptides.push(Fasta {
                id: record.id.clone(),
                desc: record.desc.clone(),
                seq: pep,
            });
        }
    }

    logger.information(&format!(
        "translate_and_filter: kept {} of {} peptides",
        peptides.len(),
        records.len()
    ));
    Ok(peptides)
}

/// Drop peptides below the minimum length. Blank sequences count as empty.
pub fn filter_peptides(records: &[Fasta], min_len: usize) -> Vec<Fasta> {
    records
        .iter()
        .filter(|record| record.seq.trim().len() >= min_len)
        .cloned()
        .collect()
}

fn genetic_code_table(code_id: usize) -> HashMap<&'static str, char> {
    match code_id {
        4 => mold_mycoplasma_code(),
        // table 11 (bacterial) shares the standard codon assignments; it
        // differs only in start-codon policy, which does not matter here
        _ => standard_code(),
    }
}

fn standard_code() -> HashMap<&'static str, char> {
    HashMap::from([
        ("TTT", 'F'), ("TTC", 'F'), ("TTA", 'L'), ("TTG", 'L'),
        ("CTT", 'L'), ("CTC", 'L'), ("CTA", 'L'), ("CTG", 'L'),
        ("ATT", 'I'), ("ATC", 'I'), ("ATA", 'I'), ("ATG", 'M'),
        ("GTT", 'V'), ("GTC", 'V'), ("GTA", 'V'), ("GTG", 'V'),
        ("TCT", 'S'), ("TCC", 'S'), ("TCA", 'S'), ("TCG", 'S'),
        ("AGT", 'S'), ("AGC", 'S'),
        ("CCT", 'P'), ("CCC", 'P'), ("CCA", 'P'), ("CCG", 'P'),
        ("ACT", 'T'), ("ACC", 'T'), ("ACA", 'T'), ("ACG", 'T'),
        ("GCT", 'A'), ("GCC", 'A'), ("GCA", 'A'), ("GCG", 'A'),
        ("TAT", 'Y'), ("TAC", 'Y'), ("TAA", '*'), ("TAG", '*'), ("TGA", '*'),
        ("CAT", 'H'), ("CAC", 'H'), ("CAA", 'Q'), ("CAG", 'Q'),
        ("AAT", 'N'), ("AAC", 'N'), ("AAA", 'K'), ("AAG", 'K'),
        ("GAT", 'D'), ("GAC", 'D'), ("GAA", 'E'), ("GAG", 'E'),
        ("TGT", 'C'), ("TGC", 'C'), ("TGG", 'W'),
        ("CGT", 'R'), ("CGC", 'R'), ("CGA", 'R'), ("CGG", 'R'),
        ("AGA", 'R'), ("AGG", 'R'),
        ("GGT", 'G'), ("GGC", 'G'), ("GGA", 'G'), ("GGG", 'G'),
    ])
}

fn mold_mycoplasma_code() -> HashMap<&'static str, char> {
    let mut code = standard_code();
    code.insert("TGA", 'W');
    code
}
