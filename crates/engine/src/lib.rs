pub mod dispatcher;
pub mod executor;
pub mod planner;
pub mod supervisor;
pub mod validator;
pub mod workflow;

pub use dispatcher::StreamDispatcher;
pub use executor::ExecutorDeps;
pub use planner::PlannerDeps;
pub use supervisor::{route, Node};
pub use validator::ValidatorDeps;
pub use workflow::Workflow;
