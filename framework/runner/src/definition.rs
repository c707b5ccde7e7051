use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{GustScenarioCli, ReporterOpt};
use crate::context::{AgentContext, RunnerContext, UserValuesConstraint};

pub type HookResult = anyhow::Result<()>;

pub type GlobalHookMut<RV> = fn(&mut RunnerContext<RV>) -> HookResult;
pub type GlobalHook<RV> = fn(Arc<RunnerContext<RV>>) -> HookResult;
pub type AgentHookMut<RV, V> = fn(&mut AgentContext<RV, V>) -> HookResult;

/// The builder for a scenario definition.
///
/// This must be used at the start of a run to define the scenario that you want to run.
pub struct ScenarioDefinitionBuilder<RV: UserValuesConstraint, V: UserValuesConstraint> {
    /// The name of the scenario.
    ///
    /// Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    cli: GustScenarioCli,
    default_agent_count: Option<usize>,
    default_duration: Option<Duration>,
    /// Values placed in the [RunnerContext] before the setup hook runs. Defaults to `RV::default()`.
    runner_values: Option<RV>,
    /// Extra values recorded in the run summary, such as the target URL.
    env: HashMap<String, String>,
    /// Global setup hook for this scenario. It will be run once, before any agents are started.
    setup_fn: Option<GlobalHookMut<RV>>,
    /// Setup hook for an agent, which will be run once for each agent as it starts.
    setup_agent_fn: Option<AgentHookMut<RV, V>>,
    /// The behaviour that every agent runs repeatedly until the run is over.
    agent_behaviour: Option<AgentHookMut<RV, V>>,
    /// Teardown hook for an agent, run once after the agent stops its behaviour.
    teardown_agent_fn: Option<AgentHookMut<RV, V>>,
    /// Global teardown hook, run once after every agent has stopped. Best effort.
    teardown_fn: Option<GlobalHook<RV>>,
}

pub(crate) struct ScenarioDefinition<RV: UserValuesConstraint, V: UserValuesConstraint> {
    pub(crate) name: String,
    pub(crate) agent_count: usize,
    pub(crate) duration: Duration,
    pub(crate) no_progress: bool,
    pub(crate) reporter: ReporterOpt,
    pub(crate) run_id: Option<String>,
    pub(crate) summary_file: Option<PathBuf>,
    pub(crate) runner_values: RV,
    pub(crate) env: HashMap<String, String>,
    pub(crate) setup_fn: Option<GlobalHookMut<RV>>,
    pub(crate) setup_agent_fn: Option<AgentHookMut<RV, V>>,
    pub(crate) agent_behaviour: AgentHookMut<RV, V>,
    pub(crate) teardown_agent_fn: Option<AgentHookMut<RV, V>>,
    pub(crate) teardown_fn: Option<GlobalHook<RV>>,
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> ScenarioDefinitionBuilder<RV, V> {
    /// Initialise a new scenario definition from the scenario name and command line arguments.
    pub fn new(name: &str, cli: GustScenarioCli) -> Self {
        Self {
            name: name.to_string(),
            cli,
            default_agent_count: None,
            default_duration: None,
            runner_values: None,
            env: HashMap::new(),
            setup_fn: None,
            setup_agent_fn: None,
            agent_behaviour: None,
            teardown_agent_fn: None,
            teardown_fn: None,
        }
    }

    /// Number of agents to run when `--agents` is not given. Falls back to 1.
    pub fn with_default_agent_count(mut self, count: usize) -> Self {
        self.default_agent_count = Some(count);
        self
    }

    /// Duration of the run when `--duration` is not given.
    pub fn with_default_duration(mut self, duration: Duration) -> Self {
        self.default_duration = Some(duration);
        self
    }

    /// Convenience for [ScenarioDefinitionBuilder::with_default_duration] in whole seconds.
    pub fn with_default_duration_s(self, duration_s: u64) -> Self {
        self.with_default_duration(Duration::from_secs(duration_s))
    }

    /// Provide the initial runner context values instead of `RV::default()`.
    pub fn with_runner_values(mut self, values: RV) -> Self {
        self.runner_values = Some(values);
        self
    }

    /// Record a value in the run summary. Do not pass secrets here.
    pub fn add_env(mut self, key: &str, value: impl ToString) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Set the global setup hook [ScenarioDefinitionBuilder::setup_fn] for this scenario.
    pub fn use_setup(mut self, setup_fn: GlobalHookMut<RV>) -> Self {
        self.setup_fn = Some(setup_fn);
        self
    }

    /// Set the agent setup hook [ScenarioDefinitionBuilder::setup_agent_fn] for this scenario.
    pub fn use_agent_setup(mut self, setup_agent_fn: AgentHookMut<RV, V>) -> Self {
        self.setup_agent_fn = Some(setup_agent_fn);
        self
    }

    /// Set the agent behaviour hook [ScenarioDefinitionBuilder::agent_behaviour] for this scenario.
    pub fn use_agent_behaviour(mut self, behaviour: AgentHookMut<RV, V>) -> Self {
        self.agent_behaviour = Some(behaviour);
        self
    }

    /// Set the agent teardown hook [ScenarioDefinitionBuilder::teardown_agent_fn] for this scenario.
    pub fn use_agent_teardown(mut self, teardown_agent_fn: AgentHookMut<RV, V>) -> Self {
        self.teardown_agent_fn = Some(teardown_agent_fn);
        self
    }

    /// Set the global teardown hook [ScenarioDefinitionBuilder::teardown_fn] for this scenario.
    pub fn use_teardown(mut self, teardown_fn: GlobalHook<RV>) -> Self {
        self.teardown_fn = Some(teardown_fn);
        self
    }

    pub(crate) fn build(self) -> anyhow::Result<ScenarioDefinition<RV, V>> {
        let agent_count = self
            .cli
            .agents
            .or(self.default_agent_count)
            .unwrap_or(1);
        if agent_count == 0 {
            anyhow::bail!("Scenario [{}] must run at least one agent", self.name);
        }

        let duration = self
            .cli
            .duration
            .or(self.default_duration)
            .ok_or_else(|| anyhow::anyhow!("No duration configured for scenario [{}]", self.name))?;
        if duration.is_zero() {
            anyhow::bail!("Duration of scenario [{}] must be greater than zero", self.name);
        }

        let agent_behaviour = self
            .agent_behaviour
            .ok_or_else(|| anyhow::anyhow!("No agent behaviour defined for scenario [{}]", self.name))?;

        Ok(ScenarioDefinition {
            name: self.name,
            agent_count,
            duration,
            no_progress: self.cli.no_progress,
            reporter: self.cli.reporter,
            run_id: self.cli.run_id,
            summary_file: self.cli.summary_file,
            runner_values: self.runner_values.unwrap_or_default(),
            env: self.env,
            setup_fn: self.setup_fn,
            setup_agent_fn: self.setup_agent_fn,
            agent_behaviour,
            teardown_agent_fn: self.teardown_agent_fn,
            teardown_fn: self.teardown_fn,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Values;
    impl UserValuesConstraint for Values {}

    fn cli() -> GustScenarioCli {
        GustScenarioCli {
            agents: None,
            duration: None,
            no_progress: true,
            reporter: ReporterOpt::Noop,
            run_id: None,
            summary_file: None,
        }
    }

    fn behaviour(_ctx: &mut AgentContext<Values, Values>) -> HookResult {
        Ok(())
    }

    #[test]
    fn cli_values_override_defaults() {
        let mut cli = cli();
        cli.agents = Some(4);
        cli.duration = Some(Duration::from_secs(3));

        let definition = ScenarioDefinitionBuilder::<Values, Values>::new("override", cli)
            .with_default_agent_count(100)
            .with_default_duration_s(30)
            .use_agent_behaviour(behaviour)
            .build()
            .unwrap();

        assert_eq!(4, definition.agent_count);
        assert_eq!(Duration::from_secs(3), definition.duration);
    }

    #[test]
    fn reject_zero_agents() {
        let mut cli = cli();
        cli.agents = Some(0);

        let result = ScenarioDefinitionBuilder::<Values, Values>::new("zero_agents", cli)
            .with_default_duration_s(1)
            .use_agent_behaviour(behaviour)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn reject_missing_or_zero_duration() {
        let result = ScenarioDefinitionBuilder::<Values, Values>::new("no_duration", cli())
            .use_agent_behaviour(behaviour)
            .build();
        assert!(result.is_err());

        let result = ScenarioDefinitionBuilder::<Values, Values>::new("zero_duration", cli())
            .with_default_duration(Duration::ZERO)
            .use_agent_behaviour(behaviour)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn reject_missing_behaviour() {
        let result = ScenarioDefinitionBuilder::<Values, Values>::new("no_behaviour", cli())
            .with_default_duration_s(1)
            .build();
        assert!(result.is_err());
    }
}
