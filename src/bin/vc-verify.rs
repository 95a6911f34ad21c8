//! Verify the Linked Data Proof of a Verifiable Credential.
//!
//! # Usage
//!
//! ```console
//! $ vc-verify credential.json
//! verified
//! $ vc-verify --json --purpose authentication - < credential.json
//! {"verified":false,"reason":"...","failure":"authorization"}
//! ```
//!
//! Exits with status 0 when the credential verifies, 1 otherwise.
use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use vc_verify::{
    HttpLoader, VerificationOutcome, VerificationRelationship, Verifier, VerifierOptions,
};

#[derive(Parser)]
#[clap(name = "vc-verify", version)]
struct Args {
    /// Credential file, or `-` to read from standard input.
    credential: PathBuf,

    /// JSON file with verifier options.
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Resolution timeout in seconds.
    #[clap(short, long)]
    timeout: Option<u64>,

    /// Expected proof purpose.
    #[clap(short, long)]
    purpose: Option<VerificationRelationship>,

    /// Do not require the issuer to control the verification method.
    #[clap(long)]
    no_issuer_check: bool,

    /// Print the outcome as JSON.
    #[clap(long)]
    json: bool,
}

impl Args {
    fn options(&self) -> Result<VerifierOptions> {
        let mut options = match &self.config {
            Some(path) => {
                let data = fs::read_to_string(path)
                    .with_context(|| format!("unable to read {}", path.display()))?;
                serde_json::from_str(&data)
                    .with_context(|| format!("invalid options in {}", path.display()))?
            }
            None => VerifierOptions::default(),
        };
        if let Some(timeout) = self.timeout {
            options.resolution_timeout = Duration::from_secs(timeout);
        }
        if let Some(purpose) = self.purpose {
            options.expected_proof_purpose = purpose;
        }
        if self.no_issuer_check {
            options.check_issuer = false;
        }
        Ok(options)
    }

    fn read_credential(&self) -> Result<serde_json::Value> {
        let data = if self.credential.as_os_str() == "-" {
            let mut data = String::new();
            io::stdin()
                .read_to_string(&mut data)
                .context("unable to read standard input")?;
            data
        } else {
            fs::read_to_string(&self.credential)
                .with_context(|| format!("unable to read {}", self.credential.display()))?
        };
        serde_json::from_str(&data).context("credential is not valid JSON")
    }
}

async fn run(args: Args) -> Result<VerificationOutcome> {
    let options = args.options()?;
    let credential = args.read_credential()?;
    let verifier = Verifier::new(Arc::new(HttpLoader::new()?), options);
    Ok(verifier.verify_credential(&credential).await)
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    let json = args.json;
    let outcome = match run(args).await {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    if json {
        match serde_json::to_string(&outcome) {
            Ok(line) => println!("{line}"),
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else if outcome.verified {
        println!("verified");
    } else {
        println!(
            "not verified: {}",
            outcome.reason.as_deref().unwrap_or("unknown failure")
        );
    }
    if outcome.verified {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
