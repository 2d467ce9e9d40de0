//! Human and JSON output shared by the bugkit commands.
//!
//! JSON output is one envelope per run, tagged with [`SCHEMA_VERSION`]:
//! `data` on success, `error` on failure. Human output is a header line
//! followed by optional Summary, Details, Warnings and Next steps blocks.

use serde::Serialize;

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: &str = "bugkit.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Details,
    Warnings,
    NextSteps,
}

impl Section {
    const ORDER: [Section; 3] = [Section::Details, Section::Warnings, Section::NextSteps];

    fn title(self) -> &'static str {
        match self {
            Section::Details => "Details",
            Section::Warnings => "Warnings",
            Section::NextSteps => "Next steps",
        }
    }
}

/// Human-readable report of one command run.
#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    entries: Vec<(Section, String)>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.entries.push((Section::Details, value.into()));
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.entries.push((Section::Warnings, value.into()));
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.entries.push((Section::NextSteps, value.into()));
    }

    fn section(&self, section: Section) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(kind, _)| *kind == section)
            .map(|(_, value)| value.clone())
            .collect()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum RunStatus {
    Success,
    Error,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    next_steps: Vec<String>,
}

impl<T: Serialize> Envelope<'_, T> {
    fn print(&self) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

/// Report a successful run as a JSON envelope or as human output.
///
/// `--quiet` silences human output only.
pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let (warnings, next_steps) = human
            .map(|h| (h.section(Section::Warnings), h.section(Section::NextSteps)))
            .unwrap_or_default();
        return Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: RunStatus::Success,
            data: Some(data),
            error: None,
            warnings,
            next_steps,
        }
        .print();
    }

    match human {
        Some(human) if !options.quiet => println!("{}", format_human(human)),
        _ => {}
    }
    Ok(())
}

/// Report a failed run: a JSON envelope on stdout, or `error:` and an
/// optional `hint:` on stderr.
pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let hints = error_hints(err);
    if json {
        return Envelope::<()> {
            schema_version: SCHEMA_VERSION,
            command,
            status: RunStatus::Error,
            data: None,
            error: Some(ErrorBody {
                message: err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            }),
            warnings: Vec::new(),
            next_steps: hints,
        }
        .print();
    }

    eprintln!("error: {err}");
    if let Some(hint) = hints.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut blocks = vec![output.header.clone()];

    if !output.summary.is_empty() {
        let mut block = vec!["Summary:".to_string()];
        block.extend(output.summary.iter().map(|(key, value)| {
            if value.is_empty() {
                format!("- {key}")
            } else {
                format!("- {key}: {value}")
            }
        }));
        blocks.push(block.join("\n"));
    }

    for section in Section::ORDER {
        let lines = output.section(section);
        if lines.is_empty() {
            continue;
        }
        let mut block = vec![format!("{}:", section.title())];
        block.extend(lines.iter().map(|line| format!("- {line}")));
        blocks.push(block.join("\n"));
    }

    blocks.join("\n\n")
}

/// Name of the subcommand being run, for error envelopes emitted before or
/// after clap has parsed the arguments.
pub fn infer_command_name_from_args() -> String {
    std::env::args()
        .skip(1)
        .find(|arg| !arg.starts_with('-'))
        .unwrap_or_else(|| "bugkit".to_string())
}

fn error_kind(err: &Error) -> &'static str {
    if err.exit_code() == crate::error::exit_codes::USER_ERROR {
        "user_error"
    } else {
        "operation_failed"
    }
}

fn error_hints(err: &Error) -> Vec<String> {
    let hint = match err {
        Error::RepoNotFound(_) => "pass --repo <path> or set [branch].location",
        Error::InvalidConfig(_) | Error::TomlParse(_) => "fix bugkit.toml then retry",
        Error::InvalidInput(_) => "check the tracker export and dates",
        _ => return Vec::new(),
    };
    vec![hint.to_string()]
}
