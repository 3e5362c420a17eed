//! Handoff tool convention.
//!
//! Every permitted handoff target becomes a synthetic tool named
//! `transfer_to_<target>` taking a single `reason` string. Calling it ends the
//! current agent's run.

use baton_core::agent::{AgentDefinition, AgentRegistry};
use baton_core::provider::ToolDefinition;
use baton_core::tool::ToolArgs;
use tracing::warn;

pub const TOOL_PREFIX: &str = "transfer_to_";

pub const DEFAULT_REASON: &str = "No reason provided";

/// Input given to the receiving agent after a handoff.
pub const CONTINUATION_INPUT: &str =
    "You have been reassigned by the previous agent. Continue with the conversation";

pub fn tool_name(target: &str) -> String {
    format!("{TOOL_PREFIX}{target}")
}

/// The target named by a handoff tool call, if `tool_name` follows the convention.
pub fn target_of(tool_name: &str) -> Option<&str> {
    tool_name
        .strip_prefix(TOOL_PREFIX)
        .filter(|target| !target.is_empty())
}

pub fn reason_of(args: &ToolArgs) -> String {
    args.get("reason")
        .and_then(|v| v.as_str())
        .filter(|r| !r.trim().is_empty())
        .unwrap_or(DEFAULT_REASON)
        .to_string()
}

/// The synthetic tool for handing off to `target`.
pub fn definition(target: &AgentDefinition) -> ToolDefinition {
    let name = &target.name;
    let about = if target.description.is_empty() {
        format!("Agent: {name}")
    } else {
        target.description.clone()
    };

    ToolDefinition {
        name: tool_name(name),
        description: format!("Transfer control to {name}. {about}"),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "reason": {
                    "type": "string",
                    "description": "Explanation of why you are transferring to this agent"
                }
            },
            "required": ["reason"]
        }),
    }
}

/// Handoff tools for every registered target `agent` may transfer to.
///
/// Targets missing from the registry get no tool.
pub fn definitions(agent: &AgentDefinition, agents: &AgentRegistry) -> Vec<ToolDefinition> {
    agent
        .handoffs
        .iter()
        .filter_map(|target| match agents.get(target) {
            Some(registered) => Some(definition(&registered)),
            None => {
                warn!(agent = %agent.name, target = %target, "Handoff target not found in registry");
                None
            }
        })
        .collect()
}

/// Tool result recorded for the handoff call itself.
pub fn acknowledgment(target: &str) -> String {
    format!("[Transferring to {target}]")
}

/// Note recorded by the session when control actually changes hands.
pub fn transfer_note(from: &str, to: &str, reason: &str) -> String {
    format!("[Handoff from {from} to {to}: {reason}]")
}

pub fn unknown_target_note(target: &str) -> String {
    format!("[Error] Cannot transfer to '{target}': Agent not found.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_handoff_tool_names() {
        assert_eq!(target_of("transfer_to_billing"), Some("billing"));
        assert_eq!(target_of("transfer_to_"), None);
        assert_eq!(target_of("core_bash"), None);
        assert_eq!(tool_name("support"), "transfer_to_support");
    }

    #[test]
    fn reason_defaults_when_missing_or_blank() {
        let args = json!({"reason": "needs a refund"}).as_object().cloned().unwrap();
        assert_eq!(reason_of(&args), "needs a refund");
        assert_eq!(reason_of(&ToolArgs::new()), "No reason provided");
        let blank = json!({"reason": "  "}).as_object().cloned().unwrap();
        assert_eq!(reason_of(&blank), "No reason provided");
        let wrong_type = json!({"reason": 5}).as_object().cloned().unwrap();
        assert_eq!(reason_of(&wrong_type), "No reason provided");
    }

    #[test]
    fn definition_uses_registry_description() {
        let mut agents = AgentRegistry::new();
        agents.register(AgentDefinition::new("billing", "bill").with_description("Handles invoices"));

        let billing = agents.get("billing").unwrap();
        let def = definition(&billing);
        assert_eq!(def.name, "transfer_to_billing");
        assert_eq!(def.description, "Transfer control to billing. Handles invoices");
        assert_eq!(def.parameters["required"], json!(["reason"]));

        let def = definition(&AgentDefinition::new("support", "help"));
        assert_eq!(def.description, "Transfer control to support. Agent: support");
    }

    #[test]
    fn unregistered_targets_get_no_tool() {
        let mut agents = AgentRegistry::new();
        agents.register(AgentDefinition::new("billing", "bill"));
        let triage = AgentDefinition::new("triage", "route").with_handoffs(["ghost", "billing"]);

        let names: Vec<_> = definitions(&triage, &agents).into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["transfer_to_billing"]);

        let lonely = AgentDefinition::new("a", "x").with_handoffs(["ghost"]);
        assert!(definitions(&lonely, &AgentRegistry::new()).is_empty());
    }

    #[test]
    fn notes_have_fixed_wording() {
        assert_eq!(acknowledgment("b"), "[Transferring to b]");
        assert_eq!(transfer_note("a", "b", "why"), "[Handoff from a to b: why]");
        assert_eq!(
            unknown_target_note("x"),
            "[Error] Cannot transfer to 'x': Agent not found."
        );
    }
}
