use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{debug, error, info};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use mmkernel::{
    codec::{decode_codes, encode_codes, CompressedDecoder},
    serialization::{proof_text, ProofText},
    CodeTok,
};

#[derive(Parser)]
#[clap(
    name = "mmkernel",
    about = "Tools for Metamath compressed proofs",
    version = env!("CARGO_PKG_VERSION")
)]
struct Args {
    /// Print more log messages, twice for tracing
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode proof codes as compressed numerals
    Encode {
        #[clap(value_name = "CODE", required = true)]
        codes: Vec<CodeTok>,
    },

    /// Decode compressed numerals into proof codes
    Decode {
        #[clap(value_name = "TEXT")]
        text: String,
    },

    /// Show statistics about a compressed proof, such as `( tze tpl ) ABZC`
    Inspect {
        #[clap(value_name = "PROOF")]
        proof: String,

        /// Number of mandatory hypotheses of the proven assertion
        #[clap(long, default_value_t = 0, value_name = "N")]
        hyps: usize,
    },
}

fn inspect(proof: &str, hyps: usize) -> Result<(), String> {
    let (_, text) = proof_text(proof).map_err(|e| match e {
        nom::Err::Error(e) | nom::Err::Failure(e) => e.to_string(),
        nom::Err::Incomplete(_) => "unexpected end of proof".to_owned(),
    })?;
    let (refs, codes) = match text {
        ProofText::Compressed(refs, codes) => (refs, codes),
        ProofText::Uncompressed(labels) => {
            println!("uncompressed proof of {} steps", labels.len());
            return Ok(());
        }
        ProofText::Incomplete => {
            println!("incomplete proof");
            return Ok(());
        }
    };

    let mut decoder = CompressedDecoder::new();
    let mut decoded = Vec::new();
    let mut invalid = 0;
    for (pos, c) in codes.chars().enumerate() {
        match decoder.push_char(c) {
            Ok(Some(code)) => decoded.push(code),
            Ok(None) => {}
            Err(err) => {
                invalid += 1;
                error!("{:?} at character {}: {}", c, pos, err);
                decoder = CompressedDecoder::new();
            }
        }
    }
    if let Err(err) = decoder.finish() {
        invalid += 1;
        error!("{}", err);
    }
    debug!("codes: {:?}", decoded);

    let first_backref = hyps + refs.len();
    let saves = decoded.iter().filter(|&&code| code == 0).count();
    let backrefs = decoded
        .iter()
        .filter(|&&code| code as usize > first_backref)
        .count();
    println!("refs:     {}", refs.len());
    println!("codes:    {}", decoded.len());
    println!("saves:    {}", saves);
    println!("backrefs: {}", backrefs);
    if invalid > 0 {
        return Err(format!("{} invalid numerals", invalid));
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    let res = match args.command {
        Command::Encode { codes } => {
            println!("{}", encode_codes(&codes));
            Ok(())
        }
        Command::Decode { text } => decode_codes(&text)
            .map(|codes| {
                let codes: Vec<_> = codes.iter().map(CodeTok::to_string).collect();
                println!("{}", codes.join(" "));
            })
            .map_err(|err| err.to_string()),
        Command::Inspect { proof, hyps } => {
            info!("inspecting proof with {} mandatory hypotheses", hyps);
            inspect(&proof, hyps)
        }
    };
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
