// src/main.rs

use pipewright::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(err) => {
            eprintln!("pipewright error: {err:?}");
            std::process::exit(1);
        }
    }
}

/// `Ok(false)` when the batch finished with failed tasks.
async fn run_main() -> anyhow::Result<bool> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    let report = run(args).await?;
    Ok(report.is_none_or(|r| r.is_success()))
}
