//! Minimal file-replay consumer for `modes_demod`.
//!
//! Reads interleaved 8-bit I/Q samples from a file (or stdin, via `-`) and
//! feeds them through the synchronous pipeline, printing each validated
//! frame's raw hex string. Mirrors the teacher crate's `--ifile` flow, minus
//! everything downstream of demodulation (networking, interactive display,
//! aircraft tracking) that this crate does not own.

use std::env;
use std::fs::File;
use std::io::{self, BufReader, Read};

use modes_demod::{DemodConfig, Demodulator};

fn main() -> io::Result<()> {
    tracing_subscriber::fmt::init();

    let filename = env::args().nth(1).unwrap_or_else(|| "-".to_string());

    let mut reader: Box<dyn Read> = if filename == "-" {
        Box::new(io::stdin())
    } else {
        Box::new(BufReader::new(File::open(&filename)?))
    };

    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;

    let samples: Vec<(u8, u8)> = raw.chunks_exact(2).map(|c| (c[0], c[1])).collect();

    let demod = Demodulator::new(DemodConfig::default());
    let mut count = 0usize;
    demod
        .process_samples(&samples, |frame| {
            count += 1;
            println!("{}", frame.to_raw_string());
        })
        .expect("synchronous replay runs with no async worker active");

    eprintln!("{count} frames decoded");
    Ok(())
}
