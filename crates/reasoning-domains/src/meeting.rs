//! Meeting agendas and notes: agenda items, decisions, action items, owners,
//! outcomes and dates.

use crate::custom::CustomDomainError;
use crate::terminology::{
    table, ChainTemplate, Confidence, DomainDefinition, QuestionTemplate, RelationRule,
    TerminologyDomain,
};

pub const NAME: &str = "meeting";

pub fn definition() -> DomainDefinition {
    DomainDefinition {
        name: NAME.to_string(),
        description: "Meeting agendas and note-taking".to_string(),
        terminology: table(&[
            (
                "agenda_items",
                &[
                    "agenda", "discussion", "topic", "item", "point", "subject", "matter",
                    "issue", "question", "proposal",
                ],
            ),
            (
                "action_items",
                &[
                    "action", "todo", "task", "follow-up", "follow up", "assign", "assignment",
                    "deliverable", "next step", "action required",
                ],
            ),
            (
                "decisions",
                &[
                    "decided", "agreed", "approved", "resolution", "consensus", "decision",
                    "conclusion", "determined", "resolved", "outcome",
                ],
            ),
            (
                "participants",
                &[
                    "attendee", "participant", "present", "absent", "required", "optional",
                    "organizer", "facilitator", "chair", "secretary",
                ],
            ),
            (
                "outcomes",
                &[
                    "outcome", "result", "conclusion", "next steps", "summary", "takeaway",
                    "finding", "recommendation",
                ],
            ),
            (
                "dates",
                &[
                    "deadline", "due date", "timeline", "schedule", "meeting date",
                    "follow-up date", "target date",
                ],
            ),
        ]),
        relations: vec![
            RelationRule::new("agenda_items", "agenda_items", "discussed_in"),
            RelationRule::new("agenda_items", "decisions", "leads_to"),
            RelationRule::new("decisions", "action_items", "requires"),
            RelationRule::new("action_items", "participants", "assigned_to"),
            RelationRule::new("action_items", "dates", "due_by"),
            RelationRule::new("decisions", "outcomes", "produces"),
            RelationRule::new("participants", "action_items", "responsible_for"),
        ],
        default_relation: Some("relates_to".to_string()),
        chains: vec![
            ChainTemplate::new(
                "action",
                0.75,
                &[
                    ("agenda_items", "discuss", "Meeting agenda item"),
                    ("decisions", "decide", "Consensus reached"),
                    ("action_items", "assign", "Action item created"),
                    ("participants", "own", "Action assigned to participant"),
                ],
            ),
            ChainTemplate::new(
                "outcome",
                0.7,
                &[
                    ("decisions", "decide", "Meeting decision"),
                    ("action_items", "execute", "Action taken"),
                    ("outcomes", "achieve", "Outcome reached"),
                ],
            ),
        ],
        questions: vec![
            QuestionTemplate::new(
                "action_items",
                &[
                    "Who is responsible for {}?",
                    "What is the deadline for {}?",
                    "What was the decision that led to {}?",
                ],
            ),
            QuestionTemplate::new(
                "decisions",
                &["What was the outcome of {}?", "Who participated in {}?"],
            ),
            QuestionTemplate::new(
                "agenda_items",
                &["Was {} resolved?", "What were the key points about {}?"],
            ),
        ],
        reasoning_patterns: [
            "agenda_to_discussion",
            "discussion_to_decision",
            "decision_to_action",
            "action_to_owner",
            "owner_to_deadline",
            "action_to_outcome",
        ]
        .iter()
        .map(|p| p.to_string())
        .collect(),
        confidence: Confidence {
            concept: 0.85,
            relationship: 0.8,
        },
    }
}

pub fn domain() -> Result<TerminologyDomain, CustomDomainError> {
    TerminologyDomain::new(definition())
}
