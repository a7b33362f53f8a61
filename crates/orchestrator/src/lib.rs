pub mod config;
pub mod error;
pub mod response;
pub mod state_machine;
pub mod task_orchestrator;

pub use config::AgentConfig;
pub use error::{OrchestratorError, Result};
pub use response::{ErrorResponse, Round1Summary, Round2Summary, RoundSummary, TaskResponse};
pub use state_machine::{FlowProgress, FlowStateMachine, FlowStep};
pub use task_orchestrator::TaskOrchestrator;
