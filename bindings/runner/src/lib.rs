mod check;
mod cli;
mod common;
mod config;
mod context;
mod runner_context;

pub mod prelude {
    pub use super::{
        check::{Check, IterationResult},
        cli::HttpScenarioCli,
        common::{create_client, get_random_target, run, scenario_definition, seed_agent},
        config::{configure, ConfigError, RunConfig, RunHandle, DEFAULT_PAUSE, DEFAULT_REQUEST_TIMEOUT},
        context::HttpAgentContext,
        runner_context::HttpRunnerContext,
    };

    pub use gust_runner::prelude::*;
}
