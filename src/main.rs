use std::{env, process};

use anyhow::Context;
use log::info;

use matnet::{NetworkConfig, mnist};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <config.json> <labels-file> <images-file>", args[0]);
        process::exit(1);
    }

    let config = NetworkConfig::from_path(&args[1])?;
    let net = config.build().context("building network")?;
    let set = mnist::load_set(&args[2], &args[3]).context("loading dataset")?;

    let score = set.evaluate(&net);
    info!(
        "accuracy {}/{} ({:.2}%), {} skipped",
        score.hits,
        score.total,
        score.accuracy() * 100.,
        score.skipped
    );

    Ok(())
}
