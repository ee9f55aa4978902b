#![allow(dead_code)]

use epipattern::prelude::*;
use polars::prelude::*;
use rand::{
    Rng,
    SeedableRng,
};
use rand_chacha::ChaCha8Rng;

fn generate_sequence<R: Rng>(
    rng: &mut R,
    length: usize,
) -> Vec<u8> {
    let chars = [b'A', b'C', b'G', b'T'];
    (0..length).map(|_| chars[rng.gen_range(0..4)]).collect()
}

/// Generates bisulfite-like reads over random chromosomes.
///
/// Every CpG covered by a read receives a `Z` or `z` call on the cytosine
/// of its strand: the C for forward reads, the G for reverse reads. Each
/// site has its own methylation probability, so patterns repeat across
/// reads.
pub struct DemoReadBuilder {
    rng:        ChaCha8Rng,
    chr_length: usize,
    n_chr:      usize,
    n_reads:    usize,
    read_len:   (usize, usize),
}

impl DemoReadBuilder {
    pub fn new(
        seed: u64,
        n_chr: usize,
        chr_length: usize,
        n_reads: usize,
    ) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            chr_length,
            n_chr,
            n_reads,
            read_len: (50, 150),
        }
    }

    pub fn build(&mut self) -> ReadTable {
        let genomes = (0..self.n_chr)
            .map(|_| generate_sequence(&mut self.rng, self.chr_length))
            .collect::<Vec<_>>();
        let meth_prob = (0..self.chr_length)
            .map(|_| self.rng.gen::<f64>())
            .collect::<Vec<_>>();

        let mut builder = ReadTableBuilder::with_capacity(self.n_reads);
        for _ in 0..self.n_reads {
            let chr = self.rng.gen_range(0..self.n_chr);
            let len = self.rng.gen_range(self.read_len.0..=self.read_len.1);
            let start = self.rng.gen_range(0..self.chr_length - len);
            let strand = if self.rng.gen_bool(0.5) {
                Strand::Forward
            }
            else {
                Strand::Reverse
            };
            let genome = &genomes[chr];
            let seq = &genome[start..start + len];

            let call = (0..len)
                .map(|i| {
                    let g = start + i;
                    let is_site = match strand {
                        Strand::Reverse => {
                            genome[g] == b'G' && g > 0 && genome[g - 1] == b'C'
                        },
                        _ => {
                            genome[g] == b'C'
                                && g + 1 < genome.len()
                                && genome[g + 1] == b'G'
                        },
                    };
                    if !is_site {
                        b'.'
                    }
                    else if self.rng.gen_bool(meth_prob[g]) {
                        b'Z'
                    }
                    else {
                        b'z'
                    }
                })
                .collect::<Vec<_>>();

            builder.push_read(
                &format!("chr{}", chr),
                strand,
                start as PosType + 1,
                &call,
                seq,
            );
        }
        builder.build().expect("generated reads are valid")
    }
}

pub fn column_strings(
    df: &DataFrame,
    name: &str,
) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::String)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(String::from))
        .collect()
}

pub fn column_u32(
    df: &DataFrame,
    name: &str,
) -> Vec<u32> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .u32()
        .unwrap()
        .into_no_null_iter()
        .collect()
}

pub fn column_f64(
    df: &DataFrame,
    name: &str,
) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}
