//! Clinical reasoning: symptoms, diseases, tests, treatments and procedures.

use crate::custom::CustomDomainError;
use crate::terminology::{
    table, ChainTemplate, Confidence, DomainDefinition, QuestionTemplate, RelationRule,
    TerminologyDomain,
};

pub const NAME: &str = "medical";

pub fn definition() -> DomainDefinition {
    DomainDefinition {
        name: NAME.to_string(),
        description: "Medical education and clinical reasoning".to_string(),
        terminology: table(&[
            (
                "symptoms",
                &[
                    "pain", "fever", "cough", "dyspnea", "fatigue", "nausea", "vomiting",
                    "diarrhea", "headache", "dizziness",
                ],
            ),
            (
                "diseases",
                &[
                    "myocardial infarction", "MI", "pneumonia", "COPD", "diabetes",
                    "hypertension", "stroke", "sepsis", "heart failure",
                ],
            ),
            (
                "treatments",
                &[
                    "aspirin", "antibiotics", "insulin", "ACE inhibitors", "beta blockers",
                    "statins", "oxygen therapy", "IV fluids",
                ],
            ),
            (
                "tests",
                &["ECG", "CBC", "CXR", "troponin", "D-dimer", "BNP", "CT scan", "MRI", "ultrasound"],
            ),
            (
                "procedures",
                &[
                    "intubation", "catheterization", "surgery", "biopsy", "lumbar puncture",
                    "chest tube",
                ],
            ),
        ]),
        relations: vec![
            RelationRule::new("symptoms", "diseases", "indicates"),
            RelationRule::new("diseases", "tests", "diagnosed_by"),
            RelationRule::new("tests", "diseases", "confirms"),
            RelationRule::new("diseases", "treatments", "treated_with"),
            RelationRule::new("treatments", "diseases", "treats"),
            RelationRule::new("treatments", "symptoms", "alleviates"),
        ],
        default_relation: Some("relates_to".to_string()),
        chains: vec![
            ChainTemplate::new(
                "diagnostic",
                0.8,
                &[
                    ("symptoms", "observe", "Patient presentation"),
                    ("tests", "investigate", "Order diagnostic workup"),
                    ("diseases", "diagnose", "Based on clinical findings"),
                    ("treatments", "treat", "Evidence-based management"),
                ],
            ),
            ChainTemplate::new(
                "therapeutic",
                0.75,
                &[
                    ("diseases", "diagnose", "Clinical diagnosis"),
                    ("treatments", "treat", "Evidence-based treatment plan"),
                    ("tests", "monitor", "Monitor treatment response"),
                ],
            ),
        ],
        questions: vec![QuestionTemplate::new(
            "diseases",
            &[
                "What are the typical presenting symptoms of {}?",
                "What diagnostic tests are used to confirm {}?",
                "What is the first-line treatment for {}?",
            ],
        )],
        reasoning_patterns: [
            "symptom_to_differential",
            "differential_to_workup",
            "workup_to_diagnosis",
            "diagnosis_to_treatment",
            "treatment_to_monitoring",
        ]
        .iter()
        .map(|p| p.to_string())
        .collect(),
        confidence: Confidence {
            concept: 0.9,
            relationship: 0.85,
        },
    }
}

pub fn domain() -> Result<TerminologyDomain, CustomDomainError> {
    TerminologyDomain::new(definition())
}
