// src/core/exporter.rs

//! Serializes the snippet list for `export`, keeping only the requested fields.

use crate::core::snippet::Snippet;
use crate::models::Parameter;
use serde::Serialize;
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("There are no snippets to export.")]
    NoSnippets,
    #[error("Unknown export field '{0}'. Expected id, title, content or parameters.")]
    UnknownField(String),
    #[error("Unknown export format '{0}'. Expected json, json-pretty or xml.")]
    UnknownFormat(String),
    #[error("Could not serialize snippets: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportField {
    Id,
    Title,
    Content,
    Parameters,
}

impl ExportField {
    pub const ALL: [ExportField; 4] = [
        ExportField::Id,
        ExportField::Title,
        ExportField::Content,
        ExportField::Parameters,
    ];
}

impl FromStr for ExportField {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(ExportField::Id),
            "title" => Ok(ExportField::Title),
            "content" => Ok(ExportField::Content),
            "parameters" | "params" => Ok(ExportField::Parameters),
            other => Err(ExportError::UnknownField(other.to_string())),
        }
    }
}

/// Parses a comma separated field list such as `id,title`. An empty list means every field.
pub fn parse_fields(raw: &str) -> Result<Vec<ExportField>, ExportError> {
    let mut fields = Vec::new();
    for part in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let field: ExportField = part.parse()?;
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    if fields.is_empty() {
        return Ok(ExportField::ALL.to_vec());
    }
    Ok(fields)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    JsonPretty,
    Xml,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "json-pretty" => Ok(ExportFormat::JsonPretty),
            "xml" => Ok(ExportFormat::Xml),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Serialize, Debug)]
struct ExportedSnippet {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Vec<Parameter>>,
}

impl ExportedSnippet {
    fn project(snippet: &dyn Snippet, fields: &[ExportField]) -> Self {
        let wants = |field| fields.contains(&field);
        Self {
            id: wants(ExportField::Id).then(|| snippet.id().to_string()),
            title: wants(ExportField::Title).then(|| snippet.title().to_string()),
            content: wants(ExportField::Content).then(|| snippet.content().to_string()),
            parameters: wants(ExportField::Parameters).then(|| snippet.parameters()),
        }
    }
}

/// Renders `snippets` in `format`. Fails when the list is empty.
pub fn export(snippets: &[Arc<dyn Snippet>], fields: &[ExportField], format: ExportFormat) -> Result<String, ExportError> {
    if snippets.is_empty() {
        return Err(ExportError::NoSnippets);
    }
    let projected: Vec<ExportedSnippet> = snippets
        .iter()
        .map(|s| ExportedSnippet::project(s.as_ref(), fields))
        .collect();
    log::debug!("Exporting {} snippet(s) as {:?}", projected.len(), format);

    match format {
        ExportFormat::Json => Ok(serde_json::to_string(&projected)?),
        ExportFormat::JsonPretty => Ok(serde_json::to_string_pretty(&projected)?),
        ExportFormat::Xml => Ok(to_xml(&projected)),
    }
}

// --- XML ---

fn to_xml(snippets: &[ExportedSnippet]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<snippets>\n");
    for snippet in snippets {
        out.push_str("  <snippet>\n");
        for (tag, value) in [("id", &snippet.id), ("title", &snippet.title), ("content", &snippet.content)] {
            if let Some(value) = value {
                let _ = writeln!(out, "    <{tag}>{}</{tag}>", escape_xml(value));
            }
        }
        if let Some(parameters) = &snippet.parameters {
            out.push_str("    <parameters>\n");
            for p in parameters {
                write_parameter(&mut out, p);
            }
            out.push_str("    </parameters>\n");
        }
        out.push_str("  </snippet>\n");
    }
    out.push_str("</snippets>\n");
    out
}

fn write_parameter(out: &mut String, p: &Parameter) {
    let _ = writeln!(
        out,
        "      <parameter key=\"{}\" name=\"{}\" type=\"{}\">",
        escape_xml(&p.key),
        escape_xml(&p.name),
        p.param_type
    );
    let _ = writeln!(out, "        <description>{}</description>", escape_xml(&p.description));
    let _ = writeln!(out, "        <default>{}</default>", escape_xml(&p.default_value));
    if !p.values.is_empty() {
        out.push_str("        <values>");
        for value in &p.values {
            let _ = write!(out, "<value>{}</value>", escape_xml(value));
        }
        out.push_str("</values>\n");
    }
    out.push_str("      </parameter>\n");
}

pub fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

// MARK: --- UNIT TESTS ---
