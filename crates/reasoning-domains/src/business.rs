//! Sales and business analysis: strategies, metrics, frameworks, activities
//! and pain points.

use crate::custom::CustomDomainError;
use crate::terminology::{
    table, ChainTemplate, Confidence, DomainDefinition, QuestionTemplate, RelationRule,
    TerminologyDomain,
};

pub const NAME: &str = "business";

pub fn definition() -> DomainDefinition {
    DomainDefinition {
        name: NAME.to_string(),
        description: "Business training and analysis".to_string(),
        terminology: table(&[
            (
                "strategies",
                &[
                    "upselling", "cross-selling", "objection handling", "value proposition",
                    "competitive positioning", "market penetration", "customer retention",
                ],
            ),
            (
                "metrics",
                &[
                    "conversion rate", "LTV", "CAC", "ROI", "churn rate", "NPS", "revenue",
                    "profit margin", "market share",
                ],
            ),
            (
                "frameworks",
                &["MEDDIC", "BANT", "SPIN", "Challenger", "SWOT", "Porter's Five Forces"],
            ),
            (
                "activities",
                &[
                    "prospecting", "qualification", "discovery", "demo", "proposal",
                    "negotiation", "closing", "onboarding",
                ],
            ),
            (
                "pain_points",
                &[
                    "inefficiency", "cost", "complexity", "risk", "compliance", "scalability",
                    "integration",
                ],
            ),
        ]),
        relations: vec![
            RelationRule::new("pain_points", "strategies", "addressed_by"),
            RelationRule::new("strategies", "metrics", "measured_by"),
            RelationRule::new("frameworks", "activities", "guides"),
            RelationRule::new("activities", "metrics", "impacts"),
        ],
        default_relation: Some("relates_to".to_string()),
        chains: vec![ChainTemplate::new(
            "sales",
            0.75,
            &[
                ("pain_points", "identify", "Customer pain point"),
                ("strategies", "apply", "Strategic approach"),
                ("metrics", "measure", "Track effectiveness"),
            ],
        )],
        questions: vec![QuestionTemplate::new(
            "strategies",
            &["When should you use {}?", "What metrics indicate success with {}?"],
        )],
        reasoning_patterns: [
            "problem_to_solution",
            "objection_to_response",
            "feature_to_benefit",
            "pain_to_value",
            "competitor_to_differentiation",
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
