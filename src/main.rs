use std::process::ExitCode;

use anyhow::Context;
use mailprompt::Config;
use smtp::{Relay, SmtpDispatcher};
use tokio::io::BufReader;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

async fn send(config: &Config) -> anyhow::Result<()> {
    let dispatcher = SmtpDispatcher::new(Relay::default());
    let input = BufReader::new(tokio::io::stdin());

    mailprompt::run(config, input, tokio::io::stdout(), &dispatcher)
        .await
        .map_err(|e| {
            debug!(kind = ?e.kind(), "send failed");
            e
        })
        .context("could not send the mail")?;

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let dotenv = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match dotenv {
        Ok(path) => debug!(?path, "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(%e, "ignoring environment file"),
    }

    match send(&Config::from_env()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}
