use std::sync::Arc;

use anyhow::Context;
use gust_runner::prelude::{
    AgentContext, GustResult, GustScenarioCli, HookResult, RunSummary, RunnerContext,
    ScenarioDefinitionBuilder,
};
use http_client_instrumented::prelude::{
    HeaderMap, HeaderValue, HttpClientInstrumented, AUTHORIZATION, CONTENT_TYPE,
};

use crate::check::{Check, IterationResult};
use crate::config::RunHandle;
use crate::context::HttpAgentContext;
use crate::runner_context::HttpRunnerContext;

/// Global setup: build the shared HTTP client and register the checks so they appear in the
/// summary even if no iteration completes.
pub fn create_client(ctx: &mut RunnerContext<HttpRunnerContext>) -> HookResult {
    let handle = ctx.get().handle()?.clone();
    let config = handle.config();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&config.auth_token).context("Invalid auth token")?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let reporter = ctx.reporter();
    for check in Check::ALL {
        reporter.register_check(check.name());
    }

    let client = HttpClientInstrumented::new(headers, config.request_timeout, reporter)?;
    ctx.get_mut().client = Some(client);

    Ok(())
}

/// Agent setup: give the agent its own random generator for picking targets.
pub fn seed_agent(ctx: &mut AgentContext<HttpRunnerContext, HttpAgentContext>) -> HookResult {
    let seed = ctx.runner_context().get().handle()?.config().seed;
    let agent_index = ctx.agent_index();
    ctx.get_mut().seed(seed, agent_index);
    Ok(())
}

/// One iteration: pick a target, GET it, record the checks, then pause.
///
/// The request always runs to completion so that its result is counted, only the pause is cut
/// short when the run ends. Transport failures are recorded and never returned as errors.
pub fn get_random_target(ctx: &mut AgentContext<HttpRunnerContext, HttpAgentContext>) -> HookResult {
    let handle = ctx.runner_context().get().handle()?.clone();
    let client = ctx.runner_context().get().client()?.clone();

    let target = handle.pick_target(ctx.get_mut().rng()).clone();
    log::trace!("Agent {} requesting {target}", ctx.agent_id());

    let result = ctx
        .runner_context()
        .executor()
        .execute_to_completion(client.get(target.clone()));
    if let Err(e) = &result {
        log::debug!("Request to {target} failed: {e}");
    }

    IterationResult::from(&result).record(&ctx.runner_context().reporter());

    pause(ctx, &handle)
}

fn pause(ctx: &AgentContext<HttpRunnerContext, HttpAgentContext>, handle: &RunHandle) -> HookResult {
    let pause = handle.config().pause;
    if pause.is_zero() {
        return Ok(());
    }

    ctx.runner_context().executor().execute_in_place(async move {
        tokio::time::sleep(pause).await;
        Ok(())
    })
}

/// Build the scenario definition that drives `handle`.
pub fn scenario_definition(
    handle: RunHandle,
) -> ScenarioDefinitionBuilder<HttpRunnerContext, HttpAgentContext> {
    let handle = Arc::new(handle);
    let config = handle.config().clone();

    let cli = GustScenarioCli {
        agents: Some(config.concurrency),
        duration: Some(config.duration),
        no_progress: config.no_progress,
        reporter: config.reporter,
        run_id: config.run_id.clone(),
        summary_file: config.summary_file.clone(),
    };

    let mut builder = ScenarioDefinitionBuilder::new(&config.scenario_name, cli)
        .with_runner_values(HttpRunnerContext::new(handle))
        .add_env("base_url", &config.base_url)
        .add_env("path_suffixes", config.path_suffixes.join(","))
        .add_env("pause_ms", config.pause.as_millis())
        .add_env("request_timeout_ms", config.request_timeout.as_millis());
    if let Some(seed) = config.seed {
        builder = builder.add_env("seed", seed);
    }

    builder
        .use_setup(create_client)
        .use_agent_setup(seed_agent)
        .use_agent_behaviour(get_random_target)
}

/// Drive the configured load until the duration has elapsed and return the summary.
///
/// Must not be called from within an async runtime.
pub fn run(handle: RunHandle) -> GustResult<RunSummary> {
    gust_runner::prelude::run(scenario_definition(handle))
}
