use anyhow::Context;
use clap::Parser;
use survey_desk::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    survey_desk::run(Cli::parse())
        .await
        .context("survey-desk failed")
}
