use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context;
use gust_instruments::ReportConfig;
use gust_summary_model::{append_run_summary, CheckSummary, LatencySummary, RunSummary};

use crate::cli::ReporterOpt;
use crate::monitor::start_monitor;
use crate::progress::start_progress;
use crate::{
    context::{AgentContext, RunnerContext, UserValuesConstraint},
    definition::ScenarioDefinitionBuilder,
    executor::Executor,
    shutdown::{start_shutdown_listener, ShutdownSignalError},
};

/// Run a scenario until its duration has elapsed and return the summary of the run.
///
/// Each agent runs on its own thread and repeats its behaviour until the deadline. No new
/// behaviour cycle starts after the deadline, cycles that are in progress are allowed to finish.
///
/// Must not be called from within an async runtime, the runner creates its own.
pub fn run<RV: UserValuesConstraint, V: UserValuesConstraint>(
    definition: ScenarioDefinitionBuilder<RV, V>,
) -> anyhow::Result<RunSummary> {
    let definition = definition.build()?;

    log::info!(
        "Running scenario {} with {} agents for {:?}",
        definition.name,
        definition.agent_count,
        definition.duration
    );

    let run_id = definition
        .run_id
        .clone()
        .unwrap_or_else(|| nanoid::nanoid!());
    let started_at = chrono::Utc::now().timestamp();

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let shutdown_handle = start_shutdown_listener(&runtime);
    let executor = Arc::new(Executor::new(runtime, shutdown_handle.clone()));
    let report_config = match definition.reporter {
        ReporterOpt::InMemory => ReportConfig::default().enable_in_memory(),
        ReporterOpt::Noop => ReportConfig::default(),
    };
    let reporter = Arc::new(report_config.init());
    let mut runner_context = RunnerContext::new(
        executor,
        reporter.clone(),
        shutdown_handle.clone(),
        definition.runner_values,
    );

    if let Some(setup_fn) = definition.setup_fn {
        setup_fn(&mut runner_context)?;
    }

    // The deadline starts once setup has finished so that slow setup doesn't eat into the run.
    if !definition.no_progress {
        start_progress(definition.duration, shutdown_handle.new_listener());
    }

    {
        let shutdown_handle = shutdown_handle.clone();
        let duration = definition.duration;
        runner_context.executor().spawn(async move {
            tokio::time::sleep(duration).await;
            log::debug!("Run duration elapsed, stopping agents");
            shutdown_handle.shutdown();
        });
    }

    let runner_context = Arc::new(runner_context);

    // Ready to start spawning agents so start the resource monitor to report high usage by agents
    // which might lead to a misleading outcome.
    start_monitor(shutdown_handle.new_listener());

    let iterations = Arc::new(AtomicU64::new(0));
    let agents_completed = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::with_capacity(definition.agent_count);
    for agent_index in 0..definition.agent_count {
        let runner_context = runner_context.clone();
        let iterations = iterations.clone();
        let agents_completed = agents_completed.clone();

        let setup_agent_fn = definition.setup_agent_fn;
        let agent_behaviour_fn = definition.agent_behaviour;
        let teardown_agent_fn = definition.teardown_agent_fn;

        // For us to check if the agent should shut down between behaviour cycles
        let mut cycle_shutdown_receiver = shutdown_handle.new_listener();
        // For the behaviour implementation to listen for shutdown and respond appropriately
        let delegated_shutdown_listener = shutdown_handle.new_listener();

        let agent_id = format!("agent-{agent_index}");

        let handle = std::thread::Builder::new()
            .name(agent_id.clone())
            .spawn(move || {
                let mut context = AgentContext::new(
                    agent_id.clone(),
                    agent_index,
                    runner_context,
                    delegated_shutdown_listener,
                );
                if let Some(setup_agent_fn) = setup_agent_fn {
                    if let Err(e) = setup_agent_fn(&mut context) {
                        log::error!("Agent setup failed for agent {agent_id}: {e:?}");
                        return;
                    }
                }

                loop {
                    if cycle_shutdown_receiver.should_shutdown() {
                        log::debug!("Stopping agent {agent_id}");
                        break;
                    }

                    let result = agent_behaviour_fn(&mut context);
                    iterations.fetch_add(1, Ordering::Relaxed);
                    match result {
                        Ok(()) => {}
                        Err(e) if e.is::<ShutdownSignalError>() => {
                            // Expected when the deadline passes during a cycle, the check at the
                            // top of the loop will stop the agent.
                        }
                        Err(e) => {
                            log::error!("Agent behaviour failed for agent {agent_id}: {e:?}");
                        }
                    }
                }

                agents_completed.fetch_add(1, Ordering::Relaxed);

                if let Some(teardown_agent_fn) = teardown_agent_fn {
                    if let Err(e) = teardown_agent_fn(&mut context) {
                        log::error!("Agent teardown failed for agent {agent_id}: {e:?}");
                    }
                }
            });

        match handle {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                // Stop the agents that did start rather than leaving them running without a joiner.
                shutdown_handle.shutdown();
                for handle in handles {
                    let _ = handle.join();
                }
                return Err(e).context("Failed to spawn thread for agent");
            }
        }
    }

    for handle in handles {
        handle
            .join()
            .map_err(|e| anyhow::anyhow!("Error joining thread for agent: {e:?}"))?;
    }

    // All agents may have stopped early, make sure background threads stop too.
    shutdown_handle.shutdown();

    if let Some(teardown_fn) = definition.teardown_fn {
        // Don't fail the run if the teardown fails. We still want the reporting to happen.
        if let Err(e) = teardown_fn(runner_context.clone()) {
            log::error!("Teardown failed: {e:?}");
        }
    }

    reporter.finalize();

    let mut summary = RunSummary::new(
        run_id,
        definition.name,
        started_at,
        definition.duration.as_millis() as u64,
        definition.agent_count,
        env!("CARGO_PKG_VERSION").to_string(),
    );
    summary.set_vu_end_count(agents_completed.load(Ordering::Relaxed));
    summary.set_total_iterations(iterations.load(Ordering::Relaxed));
    for (name, counts) in reporter.checks().snapshot() {
        summary.add_check(
            name,
            CheckSummary {
                passes: counts.passes,
                fails: counts.fails,
            },
        );
    }
    for (operation_id, stats) in reporter.operation_stats() {
        summary.add_latency(
            operation_id,
            LatencySummary {
                count: stats.count,
                errors: stats.errors,
                min_ms: stats.min_ms(),
                mean_ms: stats.mean_ms(),
                max_ms: stats.max_ms(),
            },
        );
    }
    for (key, value) in definition.env {
        summary.add_env(key, value);
    }

    log::info!(
        "Finished scenario {} ({}): {} iterations, {} failed checks",
        summary.scenario_name,
        summary.run_id,
        summary.total_iterations,
        summary.total_check_failures()
    );

    if let Some(path) = &definition.summary_file {
        append_run_summary(&summary, path)
            .with_context(|| format!("Failed to write run summary to {}", path.display()))?;
    }

    Ok(summary)
}
