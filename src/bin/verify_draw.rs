//! Recompute a keno draw from its revealed seeds

use clap::Parser;
use keno_rounds::FairnessEngine;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "verify-draw")]
#[command(about = "Recompute and verify a keno draw", long_about = None)]
struct Args {
    /// Revealed server seed
    #[arg(long)]
    server_seed: String,

    /// Client seed of the round
    #[arg(long)]
    client_seed: String,

    /// Round nonce
    #[arg(long)]
    nonce: u64,

    /// Claimed numbers, comma-separated
    #[arg(long, value_delimiter = ',')]
    numbers: Option<Vec<u8>>,

    /// Claimed server seed hash published at round open
    #[arg(long)]
    hash: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let engine = FairnessEngine::new();

    let draw = match engine.generate_draw(&args.server_seed, &args.client_seed, args.nonce) {
        Ok(draw) => draw,
        Err(e) => {
            eprintln!("❌ Could not derive the draw: {}", e);
            return ExitCode::from(2);
        }
    };
    let seed_hash = engine.hash_server_seed(&args.server_seed);

    println!("Server seed hash: {}", seed_hash);
    println!(
        "Draw:             {}",
        draw.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", ")
    );

    let mut ok = true;

    if let Some(ref hash) = args.hash {
        if engine.verify_commitment(&args.server_seed, hash) {
            println!("✅ Commitment matches");
        } else {
            println!("❌ Commitment mismatch: published {}", hash);
            ok = false;
        }
    }

    if let Some(ref numbers) = args.numbers {
        if engine.verify_draw(&args.server_seed, &args.client_seed, args.nonce, numbers) {
            println!("✅ Draw matches");
        } else {
            println!("❌ Draw mismatch: claimed {:?}", numbers);
            ok = false;
        }
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
