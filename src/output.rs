//! Command output for tb: a JSON envelope for scripts, an aligned plain-text
//! card for people.
//!
//! ```text
//! Board stats
//!   Tasks       4
//!   Completed   25%
//!
//!   #2 [InProgress] Orphan
//!
//! warning: some tasks past the backlog have no developer
//! next: tb warnings
//! ```

use std::io::Write;

use serde::Serialize;

use crate::error::{exit_codes, Error, Result};

pub const SCHEMA_VERSION: &str = "taskboard.v1";

const INDENT: &str = "  ";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Text rendering of one command's result.
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    header: String,
    fields: Vec<(String, String)>,
    lines: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    /// Labelled value shown under the header. An empty value prints the
    /// label alone.
    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    /// Free-form line such as one task of a listing.
    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.lines.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    /// A command worth running next.
    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum Status {
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

/// Everything `--json` prints, success or failure.
#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    next_steps: &'a [String],
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    write_success(&mut stdout, options, command, data, human)
}

/// Write a command result to `out` in the form `options` asks for.
pub fn write_success<W: Write, T: Serialize>(
    out: &mut W,
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let (warnings, next_steps) = match human {
            Some(human) => (human.warnings.as_slice(), human.next_steps.as_slice()),
            None => (&[][..], &[][..]),
        };
        let envelope = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Success,
            data: Some(data),
            error: None,
            warnings,
            next_steps,
        };
        return write_json(out, &envelope);
    }

    if let Some(human) = human.filter(|_| !options.quiet) {
        writeln!(out, "{}", format_human(human))?;
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        let envelope: Envelope<'_, ()> = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Error,
            data: None,
            error: Some(ErrorBody {
                message: err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            }),
            warnings: &[],
            next_steps: &next_steps,
        };
        return write_json(&mut std::io::stdout().lock(), &envelope);
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

fn write_json<W: Write, T: Serialize>(out: &mut W, envelope: &Envelope<'_, T>) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, envelope)?;
    writeln!(out)?;
    Ok(())
}

/// Header, aligned fields, indented lines, then `warning:` and `next:`
/// lines. Blank lines separate the blocks that are present.
pub fn format_human(output: &HumanOutput) -> String {
    let mut blocks = vec![field_block(&output.header, &output.fields)];
    if !output.lines.is_empty() {
        blocks.push(
            output
                .lines
                .iter()
                .map(|line| format!("{INDENT}{line}"))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }

    let notes: Vec<String> = output
        .warnings
        .iter()
        .map(|warning| format!("warning: {warning}"))
        .chain(output.next_steps.iter().map(|step| format!("next: {step}")))
        .collect();
    if !notes.is_empty() {
        blocks.push(notes.join("\n"));
    }

    blocks.join("\n\n")
}

fn field_block(header: &str, fields: &[(String, String)]) -> String {
    let width = fields
        .iter()
        .map(|(key, _)| key.chars().count())
        .max()
        .unwrap_or(0);
    let mut block = header.to_string();
    for (key, value) in fields {
        block.push('\n');
        if value.is_empty() {
            block.push_str(&format!("{INDENT}{key}"));
        } else {
            block.push_str(&format!("{INDENT}{key:<width$}  {value}"));
        }
    }
    block
}

/// Best-effort command name for error envelopes, taken from the raw args so
/// it works even when clap parsing fails.
pub fn infer_command_name_from_args() -> String {
    command_name(std::env::args().skip(1))
}

fn command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut args = args.into_iter();
    let mut command = None;

    while let Some(arg) = args.next() {
        if arg.starts_with('-') {
            // Global flags that take a separate value.
            if matches!(arg.as_str(), "--board" | "--events") {
                args.next();
            }
            continue;
        }
        command = Some(arg);
        break;
    }

    let Some(command) = command else {
        return "tb".to_string();
    };

    if matches!(command.as_str(), "task" | "dev") {
        if let Some(sub) = args.find(|arg| !arg.starts_with('-')) {
            return format!("{command} {sub}");
        }
    }
    command
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        exit_codes::USER_ERROR => "user_error",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::TaskNotFound(_) => vec!["tb task list".to_string()],
        Error::DeveloperNotFound(_) => vec!["tb dev list".to_string()],
        Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            vec!["tb init".to_string()]
        }
        Error::MalformedDocument { path, .. } => vec![format!(
            "repair {} or point --board at another file",
            path.to_string_lossy()
        )],
        Error::InvalidConfig(_) => vec!["fix .taskboard.toml then retry".to_string()],
        _ => Vec::new(),
    }
}
