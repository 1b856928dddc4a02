//! View projection

use crate::app::state::SessionSnapshot;
use crate::render::markup::{parse_blocks, Block};

/// File name of the downloadable log artifact
pub const LOGS_FILE_NAME: &str = "logs.txt";

pub const SUCCESS_HEADING: &str = "Success!";
pub const SUCCESS_MESSAGE: &str = "Your Image has been created and Containerized successfully.";
pub const LINK_LABEL: &str = "Docker Image URL";
pub const GENERATE_LABEL: &str = "Generate Solution";
pub const GENERATING_LABEL: &str = "Generating Solution...";

/// Everything shown for one snapshot; regions are independent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub success: Option<SuccessRegion>,
    pub logs: Option<LogRegion>,
    pub error: Option<ErrorRegion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessRegion {
    pub heading: &'static str,
    pub message: &'static str,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub label: &'static str,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRegion {
    pub lines: Vec<String>,
    pub download: LogArtifact,
}

/// The "download all logs" artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogArtifact {
    pub file_name: &'static str,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRegion {
    pub message: String,
    pub action: SolutionAction,
    pub solution: Option<Vec<Block>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionAction {
    pub label: &'static str,
    pub enabled: bool,
}

/// Log lines joined with newlines, nothing appended
pub fn export_logs(lines: &[String]) -> LogArtifact {
    LogArtifact {
        file_name: LOGS_FILE_NAME,
        contents: lines.join("\n"),
    }
}

/// Project a snapshot into its view
pub fn render(snapshot: &SessionSnapshot) -> View {
    let success = snapshot.urls().map(|urls| SuccessRegion {
        heading: SUCCESS_HEADING,
        message: SUCCESS_MESSAGE,
        links: urls
            .iter()
            .flatten()
            .filter(|url| !url.is_empty())
            .map(|url| Link {
                label: LINK_LABEL,
                url: url.clone(),
            })
            .collect(),
    });

    let logs = snapshot.show_logs.then(|| LogRegion {
        lines: snapshot.logs.clone(),
        download: export_logs(&snapshot.logs),
    });

    let error = snapshot.error().map(|message| {
        let in_progress = snapshot.remediation.in_progress;
        ErrorRegion {
            message,
            action: SolutionAction {
                label: if in_progress { GENERATING_LABEL } else { GENERATE_LABEL },
                enabled: !in_progress,
            },
            solution: snapshot
                .remediation
                .text
                .as_deref()
                .filter(|text| !text.is_empty())
                .map(parse_blocks),
        }
    });

    View {
        success,
        logs,
        error,
    }
}
