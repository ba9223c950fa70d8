//! CLI: check documents against a bundled schema, or convert them between trees.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use tree_codec::shader::ShaderMeta;
use tree_codec::{Codec, CodecResult, JsonOps, ObjectOps, Operations};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// decode JSON documents into typed values and report what degraded, or round-trip them through another tree
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// more logging (-v debug, -vv trace); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// decode each document against a schema and report problems
    Check(CheckOut),
    /// re-express each document through the plain object tree
    Convert(ConvertOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /shaders/basic)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Schema {
    /// a full shader metadata document, keyed by stage
    Shader,
    /// a single stage's metadata
    ShaderMeta,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Tree {
    /// print the plain object tree
    Object,
    /// convert back to JSON and print that
    Json,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[arg(long, value_enum, default_value_t = Schema::Shader)]
    schema: Schema,

    /// accept degraded documents as long as a value was recovered
    #[arg(long)]
    allow_partial: bool,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ConvertOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[arg(long, value_enum, default_value_t = Tree::Object)]
    to: Tree,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One JSON document and where it came from.
#[derive(Debug)]
struct Document {
    source: String,
    value: Value,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum Status {
    Ok,
    Partial,
    Failed,
}

#[derive(Serialize, Debug)]
struct CheckReport {
    source: String,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    /// The decoded value written back out, so defaults and normalised names show.
    #[serde(skip_serializing_if = "Option::is_none")]
    decoded: Option<Value>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths =
            resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        let per_file = source_paths
            .par_iter()
            .map(|source_path| self.load_file(source_path))
            .collect::<Result<Vec<_>>>()?;
        Ok(per_file.into_iter().flatten().collect())
    }

    fn load_file(&self, source_path: &Path) -> Result<Vec<Document>> {
        let source_path_str = source_path.to_string_lossy().to_string();
        let source = std::fs::read_to_string(source_path)
            .with_context(|| format!("failed to read source file ({source_path_str})"))?;
        let mut raw = Vec::new();
        if self.ndjson {
            for (index, line) in source.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let value = serde_json::from_str::<Value>(line).with_context(|| {
                    format!("failed to parse JSON line {} ({source_path_str})", index + 1)
                })?;
                raw.push((format!("{source_path_str}:{}", index + 1), value));
            }
        } else {
            let value = serde_json::from_str::<Value>(&source)
                .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
            raw.push((source_path_str.clone(), value));
        }

        let mut documents = Vec::with_capacity(raw.len());
        for (source, value) in raw {
            let value = match self.json_pointer.as_deref() {
                None => value,
                Some(pointer) => match value.pointer(pointer) {
                    Some(selected) => selected.clone(),
                    None => bail!("JSON pointer {pointer} selects nothing in {source}"),
                },
            };
            match self.jq_expr.as_deref() {
                None => documents.push(Document { source, value }),
                Some(jq_expr) => {
                    let outputs = crate::jq_exec::run_jaq(jq_expr, &value).with_context(|| {
                        format!("failed to apply jq expression to source file ({source})")
                    })?;
                    for value in outputs {
                        documents.push(Document {
                            source: source.clone(),
                            value,
                        });
                    }
                }
            }
        }
        tracing::debug!(source = %source_path_str, documents = documents.len(), "loaded");
        Ok(documents)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn init_tracing(&self) {
        let default = match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    /// Returns `false` when at least one document was rejected.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Check(target) => {
                let documents = target.input_settings.load_documents()?;
                let reports = match target.schema {
                    Schema::Shader => {
                        check_all(&ShaderMeta::map_codec()?, &documents, target.allow_partial)
                    }
                    Schema::ShaderMeta => {
                        check_all(&ShaderMeta::codec()?, &documents, target.allow_partial)
                    }
                };
                let passed = reports.iter().all(|report| report.status != Status::Failed);
                let rendered = match target.format {
                    ReportFormat::Text => render_text(&reports),
                    ReportFormat::Json => serde_json::to_string_pretty(&reports)?,
                };
                write_output(target.out.as_deref(), &rendered)?;
                Ok(passed)
            }
            Command::Convert(target) => {
                let documents = target.input_settings.load_documents()?;
                let mut rendered = Vec::with_capacity(documents.len());
                for document in &documents {
                    let object = JsonOps.convert(&ObjectOps, &document.value);
                    rendered.push(match target.to {
                        Tree::Object => format!("{object:#?}"),
                        Tree::Json => {
                            serde_json::to_string_pretty(&ObjectOps.convert(&JsonOps, &object))?
                        }
                    });
                }
                write_output(target.out.as_deref(), &rendered.join("\n"))?;
                Ok(true)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn check_all<C: Codec>(codec: &C, documents: &[Document], allow_partial: bool) -> Vec<CheckReport> {
    documents
        .par_iter()
        .map(|document| check_document(codec, document, allow_partial))
        .collect()
}

fn check_document<C: Codec>(codec: &C, document: &Document, allow_partial: bool) -> CheckReport {
    let result = codec.decode(&JsonOps, &document.value);
    let status = match &result {
        CodecResult::Success(_) => Status::Ok,
        CodecResult::Partial(partial) if partial.has_value() && allow_partial => Status::Partial,
        CodecResult::Partial(_) => Status::Failed,
    };
    let mut message = None;
    let decoded = result
        .get_or_fail(allow_partial, |text| message = Some(text.to_owned()))
        .ok()
        .and_then(|value| codec.encode(&JsonOps, &value).result_or_partial());
    if status == Status::Failed {
        tracing::warn!(source = %document.source, "document rejected");
    }
    CheckReport {
        source: document.source.clone(),
        status,
        message,
        decoded,
    }
}

fn render_text(reports: &[CheckReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let label = match report.status {
            Status::Ok => format!("{:>8}", "ok").green().bold(),
            Status::Partial => format!("{:>8}", "partial").yellow().bold(),
            Status::Failed => format!("{:>8}", "failed").red().bold(),
        };
        out.push_str(&format!("{label} {}\n", report.source));
        if let Some(message) = report.message.as_ref() {
            out.push_str(&format!("         {}\n", message.dimmed()));
        }
    }
    let failed = reports.iter().filter(|r| r.status == Status::Failed).count();
    out.push_str(&format!("{} checked, {} failed", reports.len(), failed));
    out
}

fn write_output(out: Option<&Path>, contents: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn document(value: Value) -> Document {
        Document {
            source: "test.json".into(),
            value,
        }
    }

    #[test]
    fn partial_documents_pass_only_when_allowed() {
        let codec = ShaderMeta::codec().unwrap();
        let doc = document(json!({"attributes": {"pos": {"type": "NORMAL"}}, "files": {}}));

        let strict = check_document(&codec, &doc, false);
        assert_eq!(strict.status, Status::Failed);
        assert!(strict.decoded.is_none());

        let lenient = check_document(&codec, &doc, true);
        assert_eq!(lenient.status, Status::Partial);
        assert_eq!(lenient.decoded, Some(json!({"files": {}})));
        assert!(lenient.message.unwrap().contains("`NORMAL` is not a valid AttributeType"));
    }

    #[test]
    fn clean_documents_are_ok() {
        let codec = ShaderMeta::codec().unwrap();
        let report = check_document(&codec, &document(json!({"files": {"vertex": "ns:file"}})), false);
        assert_eq!(report.status, Status::Ok);
        assert!(report.message.is_none());
    }

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["a.json", "b/c.json"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.json"), PathBuf::from("b/c.json")]);
    }
}
