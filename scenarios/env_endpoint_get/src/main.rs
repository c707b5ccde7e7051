use clap::Parser;
use http_gust_runner::prelude::*;

fn main() -> GustResult<()> {
    init_logging();

    let cli = HttpScenarioCli::parse();
    let max_failure_rate = cli.max_failure_rate;
    let handle = configure(cli.into_run_config(env!("CARGO_PKG_NAME")))?;

    log::info!(
        "Requesting {} targets with {} virtual users for {:?}",
        handle.targets().len(),
        handle.config().concurrency,
        handle.config().duration
    );

    let summary = run(handle)?;

    if let Some(max_failure_rate) = max_failure_rate {
        if !summary.passed(max_failure_rate) {
            anyhow::bail!(
                "Check failure rate {:.2}% is above the allowed {:.2}%",
                summary.check_failure_rate() * 100.0,
                max_failure_rate * 100.0
            );
        }
    }

    Ok(())
}
