use std::path::PathBuf;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rs_bigram_core::io::tokenize;
use rs_bigram_core::BigramModel;

const DEFAULT_CORPUS: &str = "the cat sat on the mat the cat ate food";

/// Trains a bigram model on a corpus and prints a seeded generation.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct CliArgs {
    /// Text file trained as a single sequence (built-in sentence if omitted)
    #[clap(value_parser)]
    corpus: Option<PathBuf>,

    #[clap(long, value_parser, default_value_t = 1337)]
    seed: u64,

    #[clap(long, value_parser, default_value_t = 20)]
    max_length: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    let text = match &args.corpus {
        Some(path) => std::fs::read_to_string(path)?,
        None => DEFAULT_CORPUS.to_owned(),
    };

    let mut model = BigramModel::new();
    model.train(&tokenize(&text));
    log::info!("{:?}", model.stats());

    println!("P(cat | the) = {}", model.bigram_probability("the", "cat"));
    println!("P(dog | the) = {}", model.bigram_probability("the", "dog"));

    // Same seed, same text
    let mut rng = StdRng::seed_from_u64(args.seed);
    match model.generate_text(args.max_length, &mut rng) {
        Ok(text) => println!("Generated text: {text}"),
        // A zero length is refused instead of being coerced
        Err(e) => println!("Generation refused: {e}"),
    }

    Ok(())
}
