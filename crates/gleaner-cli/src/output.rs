//! Output formatting for the CLI.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::*;
use gleaner_domain::{ProcessingStats, ReconciledResult, RoutingDecision};
use serde_json::{json, Value};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format an extraction result.
    pub fn format_result(&self, result: &ReconciledResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&result_json(result))?),
            OutputFormat::Table => Ok(self.format_result_table(result)),
        }
    }

    /// Format a routing decision.
    pub fn format_decision(&self, decision: &RoutingDecision) -> Result<String> {
        Ok(serde_json::to_string_pretty(&decision_json(decision))?)
    }

    fn format_result_table(&self, result: &ReconciledResult) -> String {
        let mut sections = Vec::new();

        if result.entities().is_empty() {
            sections.push(self.colorize("No entities found.", "yellow"));
        } else {
            let mut builder = Builder::default();
            builder.push_record(["Type", "Text", "Confidence", "Chunk", "Wave", "Mentions"]);
            for entity in result.entities() {
                builder.push_record([
                    entity.entity_type().to_string(),
                    entity.text.clone(),
                    format!("{:.2}", entity.confidence),
                    entity.source_chunk.to_string(),
                    entity.source_wave.to_string(),
                    entity.mentions.to_string(),
                ]);
            }
            sections.push(rounded(builder));
        }

        if !result.relationships().is_empty() {
            let mut builder = Builder::default();
            builder.push_record(["Source", "Relationship", "Target", "Confidence"]);
            for relationship in result.relationships() {
                builder.push_record([
                    relationship.source.to_string(),
                    relationship.relationship_type.to_string(),
                    relationship.target.to_string(),
                    format!("{:.2}", relationship.confidence),
                ]);
            }
            sections.push(rounded(builder));
        }

        sections.push(result.processing_stats().summary());
        sections.join("\n\n")
    }

    /// One-line note for a degraded run, or `None` when nothing was lost.
    pub fn degraded_notice(&self, stats: &ProcessingStats) -> Option<String> {
        if !stats.is_degraded() {
            return None;
        }
        Some(self.warning(&format!(
            "Degraded result: {} failed, {} cancelled, {} items discarded, {} entities and {} relationships rejected",
            stats.units_failed,
            stats.units_cancelled,
            stats.items_discarded,
            stats.entities_rejected,
            stats.relationships_rejected,
        )))
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn rounded(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

/// JSON view of an extraction result.
pub fn result_json(result: &ReconciledResult) -> Value {
    let entities: Vec<Value> = result
        .entities()
        .iter()
        .map(|e| {
            json!({
                "type": e.entity_type().as_str(),
                "text": e.text,
                "key": e.key.normalized_text,
                "confidence": e.confidence,
                "start_pos": e.start_pos,
                "end_pos": e.end_pos,
                "source_chunk": e.source_chunk.value(),
                "source_wave": e.source_wave,
                "mentions": e.mentions,
            })
        })
        .collect();

    let relationships: Vec<Value> = result
        .relationships()
        .iter()
        .map(|r| {
            json!({
                "type": r.relationship_type.as_str(),
                "source": r.source.to_string(),
                "target": r.target.to_string(),
                "confidence": r.confidence,
                "evidence": r.evidence_text,
                "source_chunk": r.source_chunk.value(),
                "source_wave": r.source_wave,
                "mentions": r.mentions,
            })
        })
        .collect();

    json!({
        "entities": entities,
        "relationships": relationships,
        "stats": stats_json(result.processing_stats()),
    })
}

fn stats_json(stats: &ProcessingStats) -> Value {
    let failures: Vec<Value> = stats
        .failures
        .iter()
        .map(|f| {
            json!({
                "chunk": f.chunk_id.value(),
                "wave": f.wave_ordinal,
                "kind": f.kind.as_str(),
                "message": f.message,
            })
        })
        .collect();

    json!({
        "strategy": stats.strategy.map(|s| s.as_str()),
        "waves_executed": stats.waves_executed,
        "chunks_processed": stats.chunks_processed,
        "units_total": stats.units_total,
        "units_succeeded": stats.units_succeeded,
        "units_failed": stats.units_failed,
        "units_skipped": stats.units_skipped,
        "units_cancelled": stats.units_cancelled,
        "retries": stats.retries,
        "items_discarded": stats.items_discarded,
        "entities_rejected": stats.entities_rejected,
        "relationships_rejected": stats.relationships_rejected,
        "duplicates_merged": stats.duplicates_merged,
        "prompt_tokens": stats.token_usage.prompt_tokens,
        "completion_tokens": stats.token_usage.completion_tokens,
        "wall_time_ms": stats.wall_time_ms,
        "degraded": stats.is_degraded(),
        "failures": failures,
    })
}

/// JSON view of a routing decision.
pub fn decision_json(decision: &RoutingDecision) -> Value {
    let rationale = decision.rationale();
    let chunks: Vec<Value> = decision
        .chunk_plan()
        .map(|plan| {
            plan.chunks
                .iter()
                .map(|c| json!({"id": c.chunk_id.value(), "start": c.start_offset, "end": c.end_offset}))
                .collect()
        })
        .unwrap_or_default();
    let waves: Vec<Value> = decision
        .expected_waves()
        .iter()
        .map(|w| json!({"ordinal": w.ordinal, "name": w.name, "depends_on": w.depends_on}))
        .collect();

    json!({
        "strategy": decision.strategy().as_str(),
        "size_category": rationale.profile.size_category.as_str(),
        "char_count": rationale.profile.char_count,
        "estimated_tokens": rationale.profile.estimated_tokens,
        "fits_single_context": rationale.fits_single_context,
        "overridden": rationale.overridden,
        "reason": rationale.reason,
        "chunks": chunks,
        "waves": waves,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gleaner_domain::{
        ChunkId, EntityKey, EntityType, ReconciledEntity, Strategy, UnitFailure, FailureKind,
    };

    fn sample_result() -> ReconciledResult {
        let mut stats = ProcessingStats::new();
        stats.strategy = Some(Strategy::SinglePass);
        stats.units_total = 2;
        stats.units_succeeded = 1;
        stats.record_failure(UnitFailure {
            chunk_id: ChunkId(0),
            wave_ordinal: 2,
            kind: FailureKind::Timeout,
            message: "no answer".to_string(),
        });

        let entity = ReconciledEntity {
            key: EntityKey::new("Alice", EntityType::Person),
            text: "Alice".to_string(),
            confidence: 0.9,
            source_wave: 1,
            source_chunk: ChunkId(0),
            start_pos: Some(0),
            end_pos: Some(5),
            mentions: 2,
        };
        ReconciledResult::new(vec![entity], Vec::new(), stats)
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_result(&sample_result()).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["entities"][0]["text"], "Alice");
        assert_eq!(value["entities"][0]["type"], "person");
        assert_eq!(value["stats"]["strategy"], "single_pass");
        assert_eq!(value["stats"]["failures"][0]["kind"], "timeout");
        assert_eq!(value["stats"]["degraded"], true);
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_result(&sample_result()).unwrap();
        assert!(output.contains("Alice"));
        assert!(output.contains("Mentions"));
        assert!(output.contains("Processing Summary"));
    }

    #[test]
    fn test_degraded_notice() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let notice = formatter
            .degraded_notice(sample_result().processing_stats())
            .unwrap();
        assert!(notice.contains("1 failed"));
        assert!(formatter.degraded_notice(&ProcessingStats::new()).is_none());
    }
}
