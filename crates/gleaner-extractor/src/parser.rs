//! Parse backend output into wave results

use crate::error::UnitError;
use gleaner_domain::{
    CandidateEntity, CandidateRelationship, Chunk, EntityRef, EntityType, RawWaveResult,
    RelationshipType, Wave,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Parse a backend response for one (chunk, wave) unit
///
/// The response must be a JSON object holding an `entities` array (entity
/// waves) or a `relationships` array (relationship waves); anything else is a
/// [`UnitError::SchemaViolation`] for the whole unit. Individual items that do
/// not match the schema are dropped and counted in
/// [`RawWaveResult::discarded`]. Entity positions stay chunk-local and must
/// fall inside the chunk.
pub fn parse_wave_response(
    response: &str,
    wave: &Wave,
    chunk: &Chunk,
) -> Result<RawWaveResult, UnitError> {
    let json_str = extract_json(response)?;
    let json: Value = serde_json::from_str(&json_str)?;
    let object = json
        .as_object()
        .ok_or_else(|| UnitError::SchemaViolation("Expected JSON object".to_string()))?;

    let mut result = RawWaveResult::empty(chunk.chunk_id, wave.ordinal, wave.target_types.clone());

    let entities: &[Value] = match (object.get("entities"), wave.is_relationship_wave()) {
        (Some(Value::Array(items)), _) => items.as_slice(),
        (None, true) => &[],
        _ => {
            return Err(UnitError::SchemaViolation(
                "Missing or invalid 'entities' array".to_string(),
            ))
        }
    };

    for (idx, item) in entities.iter().enumerate() {
        let index = result.entities.len() as u32;
        match parse_entity(item, wave, chunk, index) {
            Ok(entity) => result.entities.push(entity),
            Err(e) => {
                debug!("Discarding entity {} in {}.w{}: {}", idx, chunk.chunk_id, wave.ordinal, e);
                result.discarded += 1;
            }
        }
    }

    if wave.is_relationship_wave() {
        let relationships = object
            .get("relationships")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                UnitError::SchemaViolation("Missing or invalid 'relationships' array".to_string())
            })?;

        for (idx, item) in relationships.iter().enumerate() {
            match parse_relationship(item, wave, chunk) {
                Ok(relationship) => result.relationships.push(relationship),
                Err(e) => {
                    debug!(
                        "Discarding relationship {} in {}.w{}: {}",
                        idx, chunk.chunk_id, wave.ordinal, e
                    );
                    result.discarded += 1;
                }
            }
        }
    }

    if result.discarded > 0 {
        warn!(
            "Discarded {} malformed items in {}.w{}",
            result.discarded, chunk.chunk_id, wave.ordinal
        );
    }

    Ok(result)
}

/// Extract JSON from response, handling markdown code blocks
fn extract_json(response: &str) -> Result<String, UnitError> {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err(UnitError::SchemaViolation("Empty code block".to_string()));
        }

        // Skip the opening fence and, if present, the closing one
        let end = if lines[lines.len() - 1].trim_start().starts_with("```") {
            lines.len() - 1
        } else {
            lines.len()
        };
        Ok(lines[1..end].join("\n"))
    } else {
        Ok(trimmed.to_string())
    }
}

fn parse_entity(
    json: &Value,
    wave: &Wave,
    chunk: &Chunk,
    index: u32,
) -> Result<CandidateEntity, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Entity is not a JSON object".to_string())?;

    let type_name = required_str(obj, "type")?;
    let entity_type = EntityType::parse(type_name)
        .ok_or_else(|| format!("Unknown entity type '{}'", type_name))?;

    let text = required_str(obj, "text")?.to_string();
    if text.trim().is_empty() {
        return Err("Empty 'text'".to_string());
    }

    let confidence = confidence(obj)?;

    let start = optional_offset(obj, "start")?;
    let end = optional_offset(obj, "end")?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e || e > chunk.len() {
            return Err(format!("Invalid span {}..{}", s, e));
        }
    }

    Ok(CandidateEntity {
        id: EntityRef::new(chunk.chunk_id, wave.ordinal, index),
        entity_type,
        text,
        start_pos: start,
        end_pos: end,
        confidence,
        source_wave: wave.ordinal,
        source_chunk: chunk.chunk_id,
    })
}

fn parse_relationship(
    json: &Value,
    wave: &Wave,
    chunk: &Chunk,
) -> Result<CandidateRelationship, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Relationship is not a JSON object".to_string())?;

    let type_name = required_str(obj, "type")?;
    let relationship_type = RelationshipType::parse(type_name)
        .ok_or_else(|| format!("Unknown relationship type '{}'", type_name))?;

    let source = required_str(obj, "source")?;
    let source_entity_ref =
        EntityRef::parse(source).ok_or_else(|| format!("Invalid source ref '{}'", source))?;

    let target = required_str(obj, "target")?;
    let target_entity_ref =
        EntityRef::parse(target).ok_or_else(|| format!("Invalid target ref '{}'", target))?;

    let confidence = confidence(obj)?;

    let evidence_text = match obj.get("evidence") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err("Invalid 'evidence'".to_string()),
    };

    Ok(CandidateRelationship {
        relationship_type,
        source_entity_ref,
        target_entity_ref,
        confidence,
        evidence_text,
        source_wave: wave.ordinal,
        source_chunk: chunk.chunk_id,
    })
}

fn required_str<'v>(obj: &'v Map<String, Value>, field: &str) -> Result<&'v str, String> {
    obj.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Missing or invalid '{}'", field))
}

fn confidence(obj: &Map<String, Value>) -> Result<f64, String> {
    let value = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| "Missing or invalid 'confidence'".to_string())?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("Confidence {} outside [0, 1]", value));
    }
    Ok(value)
}

fn optional_offset(obj: &Map<String, Value>, field: &str) -> Result<Option<usize>, String> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| format!("Invalid '{}'", field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gleaner_domain::ChunkId;

    fn entity_wave() -> Wave {
        Wave::entities(1, "core_entities", &[EntityType::Person, EntityType::Organization])
    }

    fn chunk() -> Chunk {
        Chunk {
            chunk_id: ChunkId(3),
            start_offset: 1_000,
            end_offset: 1_100,
            text: "x".repeat(100),
            overlap_with_previous: 10,
            sequence_index: 3,
        }
    }

    #[test]
    fn test_parse_valid_entities() {
        let response = r#"{
            "entities": [
                {"type": "person", "text": "Alice", "confidence": 0.9, "start": 0, "end": 5},
                {"type": "organization", "text": "Acme Corp", "confidence": 0.85}
            ]
        }"#;

        let result = parse_wave_response(response, &entity_wave(), &chunk()).unwrap();
        assert_eq!(result.entities.len(), 2);
        assert_eq!(result.discarded, 0);
        assert_eq!(result.chunk_id, ChunkId(3));
        assert_eq!(result.wave_ordinal, 1);

        let alice = &result.entities[0];
        assert_eq!(alice.id.to_string(), "c3.w1.e0");
        // Offsets stay relative to the chunk
        assert_eq!(alice.start_pos, Some(0));
        assert_eq!(alice.end_pos, Some(5));
        assert_eq!(alice.source_chunk, ChunkId(3));
        assert_eq!(result.entities[1].id.index, 1);
        assert_eq!(result.entities[1].start_pos, None);
    }

    #[test]
    fn test_parse_with_markdown_wrapper() {
        let response = "```json\n{\"entities\": [{\"type\": \"PERSON\", \"text\": \"Bob\", \"confidence\": 0.8}]}\n```";
        let result = parse_wave_response(response, &entity_wave(), &chunk()).unwrap();
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.entities[0].entity_type, EntityType::Person);
    }

    #[test]
    fn test_invalid_items_are_discarded_and_counted() {
        let response = r#"{
            "entities": [
                {"type": "person", "text": "Alice", "confidence": 0.9},
                {"type": "spaceship", "text": "Enterprise", "confidence": 0.9},
                {"type": "person", "text": "Bob"},
                {"type": "person", "text": "Carol", "confidence": 1.5},
                {"type": "person", "text": "   ", "confidence": 0.9},
                {"type": "person", "text": "Dan", "confidence": 0.9, "start": 50, "end": 10},
                "not an object",
                {"type": "person", "text": "Erin", "confidence": 0.75}
            ]
        }"#;

        let result = parse_wave_response(response, &entity_wave(), &chunk()).unwrap();
        assert_eq!(result.entities.len(), 2);
        assert_eq!(result.discarded, 6);
        // Refs stay dense over kept items
        assert_eq!(result.entities[1].text, "Erin");
        assert_eq!(result.entities[1].id.index, 1);
    }

    #[test]
    fn test_types_outside_wave_survive_parsing() {
        // Wave taxonomy is enforced by validation, not the parser
        let response = r#"{"entities": [{"type": "date", "text": "1 May 2020", "confidence": 0.9}]}"#;
        let result = parse_wave_response(response, &entity_wave(), &chunk()).unwrap();
        assert_eq!(result.entities.len(), 1);
        assert_eq!(result.entity_taxonomy, vec![EntityType::Person, EntityType::Organization]);
    }

    #[test]
    fn test_schema_violations() {
        let wave = entity_wave();
        let chunk = chunk();
        for response in [
            "This is not JSON",
            r#"[{"type": "person"}]"#,
            r#"{"items": []}"#,
            r#"{"entities": "none"}"#,
            "```",
        ] {
            assert!(
                matches!(parse_wave_response(response, &wave, &chunk), Err(UnitError::SchemaViolation(_))),
                "accepted {:?}",
                response
            );
        }
    }

    #[test]
    fn test_parse_relationships() {
        let wave = Wave::relationships(4, &[1, 2, 3]);
        let response = r#"{
            "relationships": [
                {"type": "employed_by", "source": "c3.w1.e0", "target": "c3.w1.e1", "confidence": 0.8, "evidence": "Alice works at Acme"},
                {"type": "owns", "source": "c3.w1.e1", "target": "c3.w1.e2", "confidence": 0.9},
                {"type": "employed_by", "source": "Alice", "target": "c3.w1.e1", "confidence": 0.8},
                {"type": "married_to", "source": "c3.w1.e0", "target": "c3.w1.e1", "confidence": 0.8}
            ]
        }"#;

        let result = parse_wave_response(response, &wave, &chunk()).unwrap();
        assert_eq!(result.relationships.len(), 2);
        assert_eq!(result.discarded, 2);
        assert!(result.entities.is_empty());

        let first = &result.relationships[0];
        assert_eq!(first.relationship_type, RelationshipType::EmployedBy);
        assert_eq!(first.source_entity_ref, EntityRef::new(ChunkId(3), 1, 0));
        assert_eq!(first.evidence_text, "Alice works at Acme");
        assert_eq!(first.source_wave, 4);
        assert_eq!(result.relationships[1].evidence_text, "");
    }

    #[test]
    fn test_relationship_wave_requires_relationships() {
        let wave = Wave::relationships(4, &[1]);
        let result = parse_wave_response(r#"{"entities": []}"#, &wave, &chunk());
        assert!(matches!(result, Err(UnitError::SchemaViolation(_))));
    }

    #[test]
    fn test_extract_json_from_plain_json() {
        let json = r#"{"key": "value"}"#;
        assert_eq!(extract_json(json).unwrap(), json);
    }

    #[test]
    fn test_extract_json_from_markdown_without_language() {
        let response = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json(response).unwrap(), r#"{"key": "value"}"#);
    }
}
