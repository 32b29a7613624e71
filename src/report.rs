use serde::Serialize;

use crate::error::ExtractError;
use crate::extract::Extraction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// What gets printed for one document: the extraction or the failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Success(Extraction),
    Failure(Failure),
}

impl Report {
    pub fn is_success(&self) -> bool {
        matches!(self, Report::Success(_))
    }
}

impl From<ExtractError> for Report {
    fn from(e: ExtractError) -> Self {
        Report::Failure(Failure {
            error: e.label().to_string(),
            message: e.detail().map(str::to_string),
        })
    }
}

impl From<Result<Extraction, ExtractError>> for Report {
    fn from(r: Result<Extraction, ExtractError>) -> Self {
        match r {
            Ok(x) => Report::Success(x),
            Err(e) => e.into(),
        }
    }
}

/// One JSON line of batch output.
#[derive(Debug, Serialize)]
pub struct SourcedReport<'a> {
    pub source: &'a str,
    #[serde(flatten)]
    pub report: &'a Report,
}

pub fn print_json(report: &Report) {
    match serde_json::to_string_pretty(report) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to serialize report: {}", e),
    }
}

pub fn print_json_line(source: &str, report: &Report) {
    match serde_json::to_string(&SourcedReport { source, report }) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to serialize report for {}: {}", source, e),
    }
}

/// Compact ranked table.
pub fn print_table(source: &str, report: &Report) {
    println!("{}", source);
    let x = match report {
        Report::Failure(f) => {
            match &f.message {
                Some(m) => println!("  error: {} ({})", f.error, m),
                None => println!("  error: {}", f.error),
            }
            return;
        }
        Report::Success(x) => x,
    };
    if x.addresses.is_empty() {
        println!("  No contract address found.\n");
        return;
    }

    println!("{:>3} | {:<42} | {:>5} | {:<60}", "#", "Address", "Score", "Context");
    println!("{}", "-".repeat(120));
    for (i, c) in x.addresses.iter().enumerate() {
        let ctx = c
            .contexts
            .first()
            .map(|s| truncate(&s.context, 60))
            .unwrap_or_default();
        println!("{:>3} | {:<42} | {:>5} | {:<60}", i + 1, c.address, c.score, ctx);
    }
    if let Some(best) = &x.best_guess {
        println!("\nBest guess: {}\n", best);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 3).collect();
        format!("{}...", truncated)
    }
}
