//! The Supervisor: a pure router from state to the next node.
//!
//! No I/O, no mutation — `route` depends only on the fields of `AgentState`
//! enumerated below, so the same state always routes the same way.

use pax_domain::state::{AgentState, FinalStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Planner,
    Executor,
    Validator,
    End,
}

pub fn route(state: &AgentState) -> Node {
    if matches!(state.final_status, FinalStatus::Failed | FinalStatus::Success) {
        return Node::End;
    }
    if state.pending_user_input.is_some() {
        return Node::End;
    }
    if state.todo_list.is_empty() {
        return Node::Planner;
    }
    if state.current_step_index < state.todo_list.len() {
        return Node::Executor;
    }
    if state.final_status != FinalStatus::Success {
        return Node::Validator;
    }
    Node::End
}

#[cfg(test)]
mod tests {
    use super::*;
    use pax_domain::state::TaskStep;

    fn base() -> AgentState {
        AgentState::new("hi", "conv-1", "user-1")
    }

    #[test]
    fn terminal_status_always_ends() {
        let mut state = base();
        state.final_status = FinalStatus::Success;
        assert_eq!(route(&state), Node::End);
        state.final_status = FinalStatus::Failed;
        assert_eq!(route(&state), Node::End);
    }

    #[test]
    fn pending_user_input_ends_regardless_of_progress() {
        let mut state = base();
        state.pending_user_input = Some(pax_domain::state::PendingUserInput {
            step_id: "step_1".into(),
            tool_name: "send_email".into(),
            missing_params: vec!["smtp_server".into()],
            reason: "needs SMTP".into(),
        });
        assert_eq!(route(&state), Node::End);
    }

    #[test]
    fn empty_todo_list_routes_to_planner() {
        assert_eq!(route(&base()), Node::Planner);
    }

    #[test]
    fn index_within_todo_list_routes_to_executor() {
        let mut state = base();
        state.todo_list = vec![TaskStep::new("a")];
        assert_eq!(route(&state), Node::Executor);
    }

    #[test]
    fn index_past_todo_list_routes_to_validator() {
        let mut state = base();
        state.todo_list = vec![TaskStep::new("a")];
        state.current_step_index = 1;
        assert_eq!(route(&state), Node::Validator);
    }

    #[test]
    fn index_past_todo_list_with_success_ends() {
        let mut state = base();
        let mut step = TaskStep::new("a");
        step.status = pax_domain::state::StepStatus::Completed;
        state.todo_list = vec![step];
        state.current_step_index = 1;
        state.final_status = FinalStatus::Success;
        assert_eq!(route(&state), Node::End);
    }

    #[test]
    fn route_is_pure() {
        let state = base();
        assert_eq!(route(&state), route(&state));
    }
}
