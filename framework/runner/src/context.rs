use std::{fmt::Debug, sync::Arc};

use gust_instruments::Reporter;

use crate::executor::Executor;
use crate::shutdown::{DelegatedShutdownListener, ShutdownHandle};

pub trait UserValuesConstraint: Default + Debug + Send + Sync + 'static {}

/// Shared by every agent for the lifetime of the run.
///
/// Mutable access is only available to the global setup hook, after that the context is shared
/// read-only between agents.
#[derive(Debug)]
pub struct RunnerContext<RV: UserValuesConstraint> {
    executor: Arc<Executor>,
    reporter: Arc<Reporter>,
    shutdown_handle: ShutdownHandle,
    value: RV,
}

impl<RV: UserValuesConstraint> RunnerContext<RV> {
    pub(crate) fn new(
        executor: Arc<Executor>,
        reporter: Arc<Reporter>,
        shutdown_handle: ShutdownHandle,
        value: RV,
    ) -> Self {
        Self {
            executor,
            reporter,
            shutdown_handle,
            value,
        }
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    pub fn reporter(&self) -> Arc<Reporter> {
        self.reporter.clone()
    }

    /// Stop the run early. Agents finish their current behaviour cycle and then stop.
    pub fn force_stop_scenario(&self) {
        self.shutdown_handle.shutdown();
    }

    pub fn get_mut(&mut self) -> &mut RV {
        &mut self.value
    }

    pub fn get(&self) -> &RV {
        &self.value
    }
}

/// Owned by a single agent thread.
pub struct AgentContext<RV: UserValuesConstraint, V: UserValuesConstraint> {
    agent_id: String,
    agent_index: usize,
    runner_context: Arc<RunnerContext<RV>>,
    shutdown_listener: DelegatedShutdownListener,
    value: V,
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> AgentContext<RV, V> {
    pub(crate) fn new(
        agent_id: String,
        agent_index: usize,
        runner_context: Arc<RunnerContext<RV>>,
        shutdown_listener: DelegatedShutdownListener,
    ) -> Self {
        Self {
            agent_id,
            agent_index,
            runner_context,
            shutdown_listener,
            value: Default::default(),
        }
    }

    /// A name for this agent, unique within the run, such as `agent-3`
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Position of this agent in the run, starting at zero
    pub fn agent_index(&self) -> usize {
        self.agent_index
    }

    pub fn runner_context(&self) -> &Arc<RunnerContext<RV>> {
        &self.runner_context
    }

    pub fn shutdown_listener(&mut self) -> &mut DelegatedShutdownListener {
        &mut self.shutdown_listener
    }

    pub fn get_mut(&mut self) -> &mut V {
        &mut self.value
    }

    pub fn get(&self) -> &V {
        &self.value
    }
}
