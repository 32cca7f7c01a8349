mod cli;
mod config;
mod error;
mod intake;
mod marketplace;
mod settlement;
mod store;
mod ui;
mod x402;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Command};
use config::MarketConfig;
use intake::PostParser;
use marketplace::{JobStatus, JobUpdate, LifecycleEngine, Reward};
use settlement::{PAY_RESOURCE, PaymentOutcome, SettlementOrchestrator};
use store::MemoryStore;
use x402::FacilitatorClient;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = MarketConfig::load()?;
    if let Some(network) = cli.network {
        config.network = network;
    }

    match cli.command {
        Command::Demo => run_demo(&config, cli.verbose).await?,
        Command::Parse { text, poster } => match PostParser::parse(&text, &poster, None) {
            Some(request) => println!("{}", serde_json::to_string_pretty(&request)?),
            None => println!(
                "no job: the text carries no reward between ${} and ${}",
                intake::MIN_REWARD_USD,
                intake::MAX_REWARD_USD
            ),
        },
        Command::Challenge { reward } => {
            let reward = Reward::parse(&reward)
                .ok_or_else(|| anyhow::anyhow!("invalid reward, expected e.g. \"25 USDT\""))?;
            let challenge =
                facilitator(&config).build_challenge(reward.amount, PAY_RESOURCE, None);
            println!("{}", serde_json::to_string_pretty(&challenge)?);
            println!("\nPAYMENT-REQUIRED: {}", challenge.to_header());
        }
    }

    Ok(())
}

fn facilitator(config: &MarketConfig) -> FacilitatorClient {
    FacilitatorClient::new(
        config.facilitator_url.clone(),
        config.pay_to.clone(),
        config.resource_base.clone(),
        config.network.clone(),
    )
}

/// Walk one job through post → claim → deliver → approve → payment challenge
/// against an in-memory store.
async fn run_demo(config: &MarketConfig, verbose: bool) -> Result<()> {
    let orchestrator =
        SettlementOrchestrator::new(LifecycleEngine::new(MemoryStore::new()), facilitator(config));
    let engine = orchestrator.engine();

    let request = PostParser::parse(
        "Design a launch banner for our project, $25 #design",
        "@poster",
        None,
    )
    .expect("demo post parses");
    let job = engine.create(request).await?;
    let id = job.id.clone().expect("created job has an id");
    println!("posted    {}", ui::job_line(&job));

    let job = engine
        .transition(
            &id,
            JobUpdate {
                status: Some(JobStatus::Claimed),
                worker: Some("@alice".into()),
                ..Default::default()
            },
            None,
        )
        .await?;
    println!("claimed   {}", ui::job_line(&job));

    let job = engine
        .transition(
            &id,
            JobUpdate {
                status: Some(JobStatus::Delivered),
                delivery_proof: Some("https://example.com/banner.png".into()),
                ..Default::default()
            },
            None,
        )
        .await?;
    println!("delivered {}", ui::job_line(&job));

    let job = engine
        .transition(&id, JobUpdate::status(JobStatus::Approved), None)
        .await?;
    println!("approved  {}", ui::job_line(&job));

    let progress = ui::SettlementProgress::start(&job.title);
    match orchestrator.request_payment(&id, None).await {
        Ok(PaymentOutcome::Required { challenge }) => {
            progress.payment_required();
            println!("\nPAYMENT-REQUIRED: {}", challenge.to_header());
            if verbose {
                println!("{}", serde_json::to_string_pretty(&challenge)?);
            }
        }
        Ok(PaymentOutcome::Settled { transaction, .. }) => progress.settled(&transaction),
        Err(e) => progress.failed(&e.to_string()),
    }

    Ok(())
}
