//! JSON schemas for the structured agent outputs.
//!
//! All objects list every field as required and forbid extra properties.

use serde_json::{Value, json};

use crate::constants::records::MAX_RECORDS;

pub struct AgentSchemas;

impl AgentSchemas {
    /// Verdict of the infrastructure analyzer.
    pub fn classification_schema() -> Value {
        json!({
            "type": "object",
            "description": "Whether an infrastructure description shows a microservices architecture",
            "required": ["microservices", "confidence", "signals_for", "signals_against"],
            "additionalProperties": false,
            "properties": {
                "microservices": {
                    "type": "boolean",
                    "description": "True when the code describes multiple independently deployable services"
                },
                "confidence": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": 1,
                    "description": "Confidence in the verdict, between 0 and 1"
                },
                "signals_for": {
                    "type": "array",
                    "description": "Cited evidence for a microservices architecture ([R#] rules, [C#] code fragments)",
                    "items": {"type": "string"}
                },
                "signals_against": {
                    "type": "array",
                    "description": "Cited evidence for a monolithic or tightly coupled design",
                    "items": {"type": "string"}
                }
            }
        })
    }

    /// Decision records produced from the architecture comparison.
    pub fn records_schema() -> Value {
        let text = |description: &str| json!({"type": "string", "description": description});
        let list = |description: &str| {
            json!({"type": "array", "description": description, "items": {"type": "string"}})
        };

        json!({
            "type": "object",
            "description": "Architecture decision records for the migration",
            "required": ["adrs"],
            "additionalProperties": false,
            "properties": {
                "adrs": {
                    "type": "array",
                    "maxItems": MAX_RECORDS,
                    "description": "One record per key decision, most important first",
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": [
                            "adr_name", "title", "status", "motivation", "decision_drivers",
                            "main_decision", "alternatives", "pros", "cons", "consequences",
                            "validation", "additional_information"
                        ],
                        "properties": {
                            "adr_name": text("Short decision name used in the '# ADR:' heading"),
                            "title": text("Short, descriptive title of the decision"),
                            "status": {
                                "type": "string",
                                "enum": ["Proposed", "Accepted", "Rejected", "Deprecated", "Superseded"]
                            },
                            "motivation": text("Problem the decision solves, as continuous prose"),
                            "decision_drivers": list("Functional requirements, quality attributes and constraints"),
                            "main_decision": text("The chosen decision and how it addresses the drivers"),
                            "alternatives": list("Options not chosen, each as 'name: one-line description'"),
                            "pros": text("Advantages of the main decision and of each alternative"),
                            "cons": text("Disadvantages of the main decision and of each alternative"),
                            "consequences": text("Positive and negative consequences and trade-offs"),
                            "validation": text("How the decision can be or has been validated"),
                            "additional_information": text("References, related records or other notes; may be empty")
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schemas_require_every_property() {
        for schema in [
            AgentSchemas::classification_schema(),
            AgentSchemas::records_schema()["properties"]["adrs"]["items"].clone(),
        ] {
            let required = schema["required"].as_array().unwrap().len();
            let properties = schema["properties"].as_object().unwrap().len();
            assert_eq!(required, properties);
            assert_eq!(schema["additionalProperties"], false);
        }
    }
}
