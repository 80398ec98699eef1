//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Outputs
//! 001 1920x800 webp q80
//! 002 breakpoint 320px jpeg q85 [1x 320x480, 2x 640x960]
//!
//! Rejected
//!     outputs[2]: width must be positive, got 0
//!
//! 2 outputs, 3 rectangles, 1 rejected
//! ```
//!
//! ## Generate
//!
//! Progress lines stream while rectangles render, in completion order:
//!
//! ```text
//! Rendering 3 rectangles from 2 outputs
//!     001 beach_1920x800.webp (1920x800) 81.2 KB
//!     002 beach_640x960.jpg (640x960, 2x) 54.0 KB
//!     002 beach_320x480.jpg (320x480, 1x) 18.9 KB
//! ```
//!
//! followed by the summary and the snippet:
//!
//! ```text
//! Source: beach.png 4000x3000 png, focal 50% 50%
//! Wrote 3 files + original → results/responsive-images-3f9a0c1d2e4b5a69
//!
//! <picture>
//! ...
//! </picture>
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::outputs::ParsedOutputs;
use crate::plan::PlanEvent;
use crate::request::RequestOutcome;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count.
fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

/// `0.375` → `37.5%`
fn format_percent(fraction: f64) -> String {
    let pct = format!("{:.1}", fraction * 100.0);
    format!("{}%", pct.trim_end_matches(".0"))
}

fn rejected_lines(parsed_rejected: &[crate::outputs::EntryRejection]) -> Vec<String> {
    let mut lines = Vec::new();
    if !parsed_rejected.is_empty() {
        lines.push("Rejected".to_string());
        for rejection in parsed_rejected {
            lines.push(format!("{}{}", indent(1), rejection));
        }
    }
    lines
}

// ============================================================================
// Check
// ============================================================================

/// Format the accepted and rejected entries of an output configuration.
pub fn format_check_output(parsed: &ParsedOutputs) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Outputs".to_string());
    if parsed.specs.is_empty() {
        lines.push(format!("{}(none, only the original is kept)", indent(1)));
    }
    for (i, spec) in parsed.specs.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), spec.describe()));
    }

    let rejected = rejected_lines(&parsed.rejected);
    if !rejected.is_empty() {
        lines.push(String::new());
        lines.extend(rejected);
    }

    let rectangles: usize = parsed.specs.iter().map(|s| s.rectangle_count()).sum();
    lines.push(String::new());
    lines.push(format!(
        "{} outputs, {} rectangles, {} rejected",
        parsed.specs.len(),
        rectangles,
        parsed.rejected.len()
    ));
    lines
}

pub fn print_check_output(parsed: &ParsedOutputs) {
    for line in format_check_output(parsed) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate
// ============================================================================

/// Format a single plan progress event.
pub fn format_plan_event(event: &PlanEvent) -> Vec<String> {
    match event {
        PlanEvent::Started { specs, rectangles } => {
            vec![format!("Rendering {} rectangles from {} outputs", rectangles, specs)]
        }
        PlanEvent::Rendered {
            spec_index,
            filename,
            density,
            width,
            height,
            bytes,
        } => {
            let dims = match density {
                Some(label) => format!("{}x{}, {}", width, height, label),
                None => format!("{}x{}", width, height),
            };
            vec![format!(
                "{}{} {} ({}) {}",
                indent(1),
                format_index(spec_index + 1),
                filename,
                dims,
                format_size(*bytes)
            )]
        }
    }
}

/// Format the result of a finished request.
pub fn format_request_summary(
    outcome: &RequestOutcome,
    upload_name: &str,
    folder: &Path,
) -> Vec<String> {
    let mut lines = Vec::new();
    let dims = outcome.source.dimensions;
    lines.push(format!(
        "Source: {} {}x{} {}, focal {} {}",
        upload_name,
        dims.width,
        dims.height,
        outcome.source.format,
        format_percent(outcome.focal.x),
        format_percent(outcome.focal.y)
    ));

    lines.extend(rejected_lines(&outcome.rejected));
    for duplicate in &outcome.duplicates {
        lines.push(format!("Duplicate: {} (last entry wins)", duplicate));
    }

    lines.push(format!(
        "Wrote {} files + original \u{2192} {}",
        outcome.generated_count(),
        folder.display()
    ));
    lines.push(String::new());
    lines.extend(outcome.html.lines().map(str::to_string));
    lines
}

pub fn print_request_summary(outcome: &RequestOutcome, upload_name: &str, folder: &Path) {
    for line in format_request_summary(outcome, upload_name, folder) {
        println!("{}", line);
    }
}
