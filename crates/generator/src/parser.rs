use serde_json::Value;
use taskpub_core::{FileContent, GeneratedFile};

use crate::error::{GenerationError, Result};

const FENCE: &str = "```";

/// Removes a leading code fence (with or without a language tag) and a
/// trailing fence, if present.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix(FENCE) {
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.')))
            .unwrap_or(rest.len());
        text = &rest[tag_len..];
    }

    if let Some(rest) = text.trim_end().strip_suffix(FENCE) {
        text = rest;
    }

    text.trim()
}

/// Parses model output into files. The output must be a non-empty JSON
/// array of objects that each carry a string `name` and a string or null
/// `content`, with at least one entry carrying content.
pub fn parse_generated_files(raw: &str) -> Result<Vec<GeneratedFile>> {
    let cleaned = strip_code_fences(raw);

    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| GenerationError::InvalidOutput(format!("not valid JSON: {}", e)))?;

    let Value::Array(items) = value else {
        return Err(GenerationError::InvalidOutput(
            "response is not a list".to_string(),
        ));
    };

    if items.is_empty() {
        return Err(GenerationError::InvalidOutput(
            "response contains no files".to_string(),
        ));
    }

    let files = items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| parse_file(idx, item))
        .collect::<Result<Vec<_>>>()?;

    if files.iter().all(|file| file.content.is_none()) {
        return Err(GenerationError::InvalidOutput(
            "no file has content".to_string(),
        ));
    }

    Ok(files)
}

fn parse_file(idx: usize, item: Value) -> Result<GeneratedFile> {
    let invalid = |reason: &str| {
        GenerationError::InvalidOutput(format!("invalid file structure at {}: {}", idx, reason))
    };

    let Value::Object(mut fields) = item else {
        return Err(invalid("not an object"));
    };

    let name = match fields.remove("name") {
        Some(Value::String(name)) => name,
        Some(_) => return Err(invalid("name is not a string")),
        None => return Err(invalid("missing name")),
    };

    let content = match fields.remove("content") {
        Some(Value::String(text)) => Some(FileContent::Text(text)),
        Some(Value::Null) => None,
        Some(_) => return Err(invalid("content is not a string")),
        None => return Err(invalid("missing content")),
    };

    Ok(GeneratedFile { name, content })
}
