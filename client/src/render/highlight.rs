//! Syntax colouring for code blocks, backed by syntect's bundled grammars

use std::sync::OnceLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::debug;

/// Theme tuned for dark terminals
pub const THEME: &str = "base16-ocean.dark";

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme() -> Option<&'static Theme> {
    THEME_SET.get_or_init(ThemeSet::load_defaults).themes.get(THEME)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// A run of code sharing one style; `color` is `None` for unstyled text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub color: Option<Rgb>,
    pub bold: bool,
}

impl Token {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            color: None,
            bold: false,
        }
    }

    fn styled(text: &str, style: Style) -> Self {
        let fg = style.foreground;
        Self {
            text: text.to_string(),
            color: Some(Rgb(fg.r, fg.g, fg.b)),
            bold: style.font_style.contains(FontStyle::BOLD),
        }
    }
}

/// Map a fence language to a token the bundled grammars know
fn syntax_token(language: &str) -> String {
    let language = language.to_lowercase();
    match language.as_str() {
        // no Dockerfile grammar is bundled; RUN lines are shell
        "dockerfile" | "docker" => "bash".to_string(),
        "shell" | "console" | "zsh" | "sh" => "bash".to_string(),
        "jsx" | "typescript" | "ts" | "tsx" | "javascript" => "js".to_string(),
        "yml" => "yaml".to_string(),
        "golang" => "go".to_string(),
        _ => language,
    }
}

/// Grammar for a fence language, if one is bundled
pub fn syntax_for(language: &str) -> Option<&'static SyntaxReference> {
    syntax_set().find_syntax_by_token(&syntax_token(language))
}

/// Highlight a code block line by line; unknown languages come back unstyled
pub fn highlight_code(code: &str, language: Option<&str>) -> Vec<Vec<Token>> {
    let plain = || -> Vec<Vec<Token>> { code.lines().map(|line| vec![Token::plain(line)]).collect() };

    let (Some(syntax), Some(theme)) = (language.and_then(syntax_for), theme()) else {
        return plain();
    };

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut lines = Vec::new();
    for line in LinesWithEndings::from(code) {
        let ranges = match highlighter.highlight_line(line, syntax_set()) {
            Ok(ranges) => ranges,
            Err(e) => {
                debug!("Highlighting failed, printing plain code: {}", e);
                return plain();
            }
        };

        lines.push(
            ranges
                .into_iter()
                .filter_map(|(style, text)| {
                    let text = text.trim_end_matches(['\n', '\r']);
                    (!text.is_empty()).then(|| Token::styled(text, style))
                })
                .collect(),
        );
    }
    lines
}
