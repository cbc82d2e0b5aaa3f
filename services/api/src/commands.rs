use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use crewmatch::config::AppConfig;
use crewmatch::directory::EntityRef;
use crewmatch::error::AppError;
use crewmatch::identity::CredentialVerifier;
use crewmatch::matching::{CandidateMatcher, MatchError, MatchPolicy, MatchReport};
use serde::Serialize;

use crate::infra::load_directory;

#[derive(Args, Debug)]
pub(crate) struct VerifyArgs {
    /// Bearer token issued by either the legacy CMS or the current platform
    #[arg(long)]
    pub(crate) token: String,
}

#[derive(Args, Debug)]
pub(crate) struct MatchArgs {
    /// Opening reference: a legacy numeric id or a native id
    #[arg(long)]
    pub(crate) opening: String,
    /// Override the configured default radius in kilometres
    #[arg(long)]
    pub(crate) max_distance_km: Option<f64>,
    /// Directory snapshot to match against (defaults to DIRECTORY_SEED_PATH)
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOutput<'a> {
    #[serde(flatten)]
    claim: &'a crewmatch::identity::NormalizedClaim,
    account_role: &'static str,
}

pub(crate) fn run_verify(args: VerifyArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let verifier = CredentialVerifier::from_config(&config.auth);
    let claim = verifier.verify(&args.token)?;

    let output = VerifyOutput {
        claim: &claim,
        account_role: claim.account_role().label(),
    };
    print_json(&output);
    Ok(())
}

pub(crate) async fn run_match(args: MatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let report = match_from_seed(
        config.matching.policy,
        config.directory.seed_path.clone(),
        args,
    )
    .await?;
    print_json(&report);
    Ok(())
}

async fn match_from_seed(
    policy: MatchPolicy,
    configured_seed: Option<PathBuf>,
    args: MatchArgs,
) -> Result<MatchReport, AppError> {
    let MatchArgs {
        opening,
        max_distance_km,
        seed,
    } = args;

    let seed = seed.or(configured_seed);
    let directory = Arc::new(load_directory(seed.as_deref())?);
    let matcher = CandidateMatcher::new(directory, policy);

    let reference = EntityRef::parse(&opening)
        .ok_or_else(|| MatchError::OpeningNotFound(EntityRef::native(opening.clone())))?;
    Ok(matcher.match_candidates(&reference, max_distance_km).await?)
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => eprintln!("unable to render output: {err}"),
    }
}
