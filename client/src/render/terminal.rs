//! Terminal printer for rendered views

use std::io::{self, Write};

use colored::{ColoredString, Colorize};

use crate::render::highlight::{highlight_code, Rgb, Token};
use crate::render::markup::{Block, Span};
use crate::render::view::{ErrorRegion, LogRegion, SuccessRegion, View};

/// How the log region is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogDisplay {
    /// Every buffered line
    Full,
    /// A line count only; used when lines were already followed live
    #[default]
    Summary,
}

/// Print a whole view; regions appear in success, logs, error order
pub fn write_view<W: Write>(out: &mut W, view: &View, logs: LogDisplay) -> io::Result<()> {
    if let Some(success) = &view.success {
        write_success(out, success)?;
    }
    if let Some(region) = &view.logs {
        write_logs(out, region, logs)?;
    }
    if let Some(error) = &view.error {
        write_error(out, error)?;
    }
    Ok(())
}

/// Print a single streamed build log line
pub fn write_log_line<W: Write>(out: &mut W, line: &str) -> io::Result<()> {
    writeln!(out, "{} {}", "│".dimmed(), line)
}

fn write_success<W: Write>(out: &mut W, region: &SuccessRegion) -> io::Result<()> {
    writeln!(out, "{}", region.heading.green().bold())?;
    writeln!(out, "{}", region.message)?;
    for link in &region.links {
        writeln!(out, "  {}: {}", link.label.bold(), link.url.cyan().underline())?;
    }
    writeln!(out)
}

fn write_logs<W: Write>(out: &mut W, region: &LogRegion, display: LogDisplay) -> io::Result<()> {
    writeln!(out, "{}", "Build Logs".bold())?;
    match display {
        LogDisplay::Full => {
            for line in &region.lines {
                write_log_line(out, line)?;
            }
        }
        LogDisplay::Summary => {
            let count = region.lines.len();
            let noun = if count == 1 { "line" } else { "lines" };
            writeln!(out, "  {} {}", count, noun.dimmed())?;
        }
    }
    writeln!(out)
}

fn write_error<W: Write>(out: &mut W, region: &ErrorRegion) -> io::Result<()> {
    writeln!(out, "{} {}", "Error:".red().bold(), region.message.red())?;

    let label = format!("[{}]", region.action.label);
    let label = match (&region.solution, region.action.enabled) {
        (_, false) => label.dimmed(),
        (None, true) => format!("{} (rerun with --solve)", label).normal(),
        (Some(_), true) => label.normal(),
    };
    writeln!(out, "{}", label)?;

    if let Some(blocks) = &region.solution {
        writeln!(out)?;
        writeln!(out, "{}", "Suggested solution".yellow().bold())?;
        for block in blocks {
            write_block(out, block)?;
        }
    }
    Ok(())
}

fn write_block<W: Write>(out: &mut W, block: &Block) -> io::Result<()> {
    match block {
        Block::Heading { spans, .. } => {
            writeln!(out, "{}", paint_spans(spans).yellow().bold())?;
        }
        Block::Paragraph(spans) => {
            for line in paint_spans(spans).lines() {
                writeln!(out, "{}", line)?;
            }
        }
        Block::ListItem {
            depth,
            number,
            spans,
        } => {
            let marker = match number {
                Some(n) => format!("{}.", n),
                None => "•".to_string(),
            };
            writeln!(
                out,
                "{}{} {}",
                "  ".repeat(*depth),
                marker.bold(),
                paint_spans(spans)
            )?;
        }
        Block::Code { language, code } => {
            let tag = language.as_deref().unwrap_or("code");
            writeln!(out, "  {}", format!("┌─ {}", tag).dimmed())?;
            for line in highlight_code(code, language.as_deref()) {
                let rendered: String = line.iter().map(|token| paint_token(token).to_string()).collect();
                writeln!(out, "  {} {}", "│".dimmed(), rendered)?;
            }
            writeln!(out, "  {}", "└─".dimmed())?;
        }
        Block::Rule => {
            writeln!(out, "{}", "─".repeat(40).dimmed())?;
        }
    }
    Ok(())
}

fn paint_spans(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Plain(s) => s.normal().to_string(),
            Span::Strong(s) => s.bold().to_string(),
            Span::Emphasis(s) => s.italic().to_string(),
            Span::Code(s) => s.cyan().to_string(),
        })
        .collect()
}

fn paint_token(token: &Token) -> ColoredString {
    let painted = match token.color {
        Some(Rgb(r, g, b)) => token.text.truecolor(r, g, b),
        None => token.text.normal(),
    };
    if token.bold {
        painted.bold()
    } else {
        painted
    }
}
