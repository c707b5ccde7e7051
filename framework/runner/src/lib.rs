mod cli;
mod context;
mod definition;
mod executor;
mod init;
mod monitor;
mod progress;
mod run;
mod shutdown;
mod types;

pub use cli::{parse_duration, ReporterOpt};

pub mod prelude {
    pub use crate::cli::{GustScenarioCli, ReporterOpt};
    pub use crate::context::{AgentContext, RunnerContext, UserValuesConstraint};
    pub use crate::definition::{HookResult, ScenarioDefinitionBuilder};
    pub use crate::executor::Executor;
    pub use crate::init::init_logging;
    pub use crate::run::run;
    pub use crate::types::GustResult;

    pub use gust_core::prelude::*;
    pub use gust_instruments::{report_operation, OperationRecord, Reporter};
    pub use gust_summary_model::RunSummary;
}
