//! Prompt composition for one (chunk, wave) unit

use gleaner_domain::traits::PatternExample;
use gleaner_domain::{CandidateEntity, Chunk, Wave};
use serde_json::json;

/// Builds the prompt for one wave over one chunk
pub struct PromptBuilder<'a> {
    wave: &'a Wave,
    chunk: &'a Chunk,
    examples: Vec<PatternExample>,
    known_entities: Vec<&'a CandidateEntity>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(wave: &'a Wave, chunk: &'a Chunk) -> Self {
        Self {
            wave,
            chunk,
            examples: Vec::new(),
            known_entities: Vec::new(),
        }
    }

    /// Add few-shot examples
    pub fn with_examples(mut self, examples: Vec<PatternExample>) -> Self {
        self.examples = examples;
        self
    }

    /// Add entities found by the waves this wave depends on
    pub fn with_known_entities(mut self, entities: Vec<&'a CandidateEntity>) -> Self {
        self.known_entities = entities;
        self
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. Unit header and instructions
        prompt.push_str(&format!(
            "Unit: {}.w{} ({})\n\n",
            self.chunk.chunk_id, self.wave.ordinal, self.wave.name
        ));
        if self.wave.is_relationship_wave() {
            prompt.push_str(RELATIONSHIP_INSTRUCTIONS);
            prompt.push_str("\n\nRelationship types: ");
            let names: Vec<&str> = self
                .wave
                .relationship_types
                .iter()
                .map(|t| t.as_str())
                .collect();
            prompt.push_str(&names.join(", "));
        } else {
            prompt.push_str(ENTITY_INSTRUCTIONS);
            prompt.push_str("\n\nEntity types: ");
            let names: Vec<&str> = self.wave.target_types.iter().map(|t| t.as_str()).collect();
            prompt.push_str(&names.join(", "));
        }
        prompt.push_str("\n\n");

        // 2. Few-shot examples
        if !self.examples.is_empty() {
            prompt.push_str("Examples of each entity type in context:\n");
            for example in &self.examples {
                prompt.push_str(&format!(
                    "- [{}] {}\n",
                    example.entity_type, example.example_text
                ));
            }
            prompt.push('\n');
        }

        // 3. Entities from dependency waves
        if !self.known_entities.is_empty() {
            prompt.push_str("Known entities (refer to them by id):\n");
            for entity in &self.known_entities {
                prompt.push_str(&format!(
                    "- {} [{}] {}\n",
                    entity.id, entity.entity_type, entity.text
                ));
            }
            prompt.push('\n');
        }

        // 4. The text to analyze
        prompt.push_str("Text to analyze:\n");
        prompt.push_str("---\n");
        prompt.push_str(&self.chunk.text);
        prompt.push_str("\n---\n\n");

        // 5. Output format reminder
        if self.wave.is_relationship_wave() {
            prompt.push_str(RELATIONSHIP_OUTPUT_FORMAT);
        } else {
            prompt.push_str(ENTITY_OUTPUT_FORMAT);
        }

        prompt
    }
}

/// JSON Schema the backend must follow for a wave
pub fn output_schema(wave: &Wave) -> String {
    let entity_types: Vec<&str> = wave.target_types.iter().map(|t| t.as_str()).collect();
    let entity_item = json!({
        "type": "object",
        "required": ["type", "text", "confidence"],
        "properties": {
            "type": { "type": "string", "enum": entity_types },
            "text": { "type": "string", "minLength": 1 },
            "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
            "start": { "type": "integer", "minimum": 0 },
            "end": { "type": "integer", "minimum": 0 }
        }
    });

    let schema = if wave.is_relationship_wave() {
        let relationship_types: Vec<&str> =
            wave.relationship_types.iter().map(|t| t.as_str()).collect();
        json!({
            "type": "object",
            "required": ["relationships"],
            "properties": {
                "entities": { "type": "array", "items": entity_item },
                "relationships": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["type", "source", "target", "confidence"],
                        "properties": {
                            "type": { "type": "string", "enum": relationship_types },
                            "source": { "type": "string" },
                            "target": { "type": "string" },
                            "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
                            "evidence": { "type": "string" }
                        }
                    }
                }
            }
        })
    } else {
        json!({
            "type": "object",
            "required": ["entities"],
            "properties": {
                "entities": { "type": "array", "items": entity_item }
            }
        })
    };

    schema.to_string()
}

const ENTITY_INSTRUCTIONS: &str = r#"Extract every named entity of the listed types from the text below.

Rules:
- Copy entity text exactly as it appears in the source
- Only use the listed entity types; skip anything else
- start and end are character offsets of the mention within the text below (end exclusive)
- Confidence reflects how certain the mention is an entity of that type:
  - Ambiguous or partial mention: 0.5 - 0.7
  - Clear mention, type inferred from context: 0.7 - 0.9
  - Explicit, unambiguous mention: 0.9 - 1.0
- List each distinct mention once"#;

const RELATIONSHIP_INSTRUCTIONS: &str = r#"Identify relationships between the known entities listed below, as stated in the text.

Rules:
- source and target must be ids from the known entity list
- Only use the listed relationship types
- evidence is the shortest span of the text that states the relationship
- Do not infer relationships the text does not support"#;

const ENTITY_OUTPUT_FORMAT: &str = r#"Output format (JSON object only, no additional text):
{
  "entities": [
    {"type": "entity_type", "text": "exact text", "confidence": 0.0-1.0, "start": 0, "end": 0}
  ]
}

Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#;

const RELATIONSHIP_OUTPUT_FORMAT: &str = r#"Output format (JSON object only, no additional text):
{
  "relationships": [
    {"type": "relationship_type", "source": "entity id", "target": "entity id", "confidence": 0.0-1.0, "evidence": "exact text"}
  ]
}

Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#;

#[cfg(test)]
mod tests {
    use super::*;
    use gleaner_domain::{ChunkId, EntityRef, EntityType};

    fn chunk(text: &str) -> Chunk {
        Chunk {
            chunk_id: ChunkId(2),
            ..Chunk::whole(text)
        }
    }

    fn entity(index: u32, text: &str) -> CandidateEntity {
        CandidateEntity {
            id: EntityRef::new(ChunkId(2), 1, index),
            entity_type: EntityType::Person,
            text: text.to_string(),
            start_pos: None,
            end_pos: None,
            confidence: 0.9,
            source_wave: 1,
            source_chunk: ChunkId(2),
        }
    }

    #[test]
    fn test_prompt_includes_unit_header_and_text() {
        let wave = Wave::entities(1, "core_entities", &[EntityType::Person]);
        let chunk = chunk("Alice works at Acme Corp");
        let prompt = PromptBuilder::new(&wave, &chunk).build();

        assert!(prompt.starts_with("Unit: c2.w1 (core_entities)"));
        assert!(prompt.contains("Alice works at Acme Corp"));
        assert!(prompt.contains("Entity types: person"));
        assert!(!prompt.contains("Known entities"));
    }

    #[test]
    fn test_prompt_includes_examples() {
        let wave = Wave::entities(2, "temporal_financial", &[EntityType::Date]);
        let chunk = chunk("text");
        let prompt = PromptBuilder::new(&wave, &chunk)
            .with_examples(vec![PatternExample {
                entity_type: EntityType::Date,
                example_text: "Signed on 3 March 2021.".to_string(),
            }])
            .build();

        assert!(prompt.contains("- [date] Signed on 3 March 2021."));
    }

    #[test]
    fn test_relationship_prompt_lists_known_entities() {
        let wave = Wave::relationships(4, &[1, 2, 3]);
        let chunk = chunk("Alice works at Acme");
        let alice = entity(0, "Alice");
        let acme = entity(1, "Acme");
        let prompt = PromptBuilder::new(&wave, &chunk)
            .with_known_entities(vec![&alice, &acme])
            .build();

        assert!(prompt.contains("- c2.w1.e0 [person] Alice"));
        assert!(prompt.contains("- c2.w1.e1 [person] Acme"));
        assert!(prompt.contains("employed_by"));
        assert!(prompt.contains("\"relationships\""));
    }

    #[test]
    fn test_entity_schema_lists_wave_types() {
        let wave = Wave::entities(1, "core_entities", &[EntityType::Person, EntityType::Location]);
        let schema: serde_json::Value = serde_json::from_str(&output_schema(&wave)).unwrap();

        assert_eq!(schema["required"][0], "entities");
        let allowed = &schema["properties"]["entities"]["items"]["properties"]["type"]["enum"];
        assert_eq!(allowed, &json!(["person", "location"]));
    }

    #[test]
    fn test_relationship_schema_requires_relationships() {
        let wave = Wave::relationships(4, &[1]);
        let schema: serde_json::Value = serde_json::from_str(&output_schema(&wave)).unwrap();
        assert_eq!(schema["required"][0], "relationships");
    }
}
