//! Static report rendering.
//!
//! A [`SummaryArtifact`] is substituted into a fixed template. HTML output
//! embeds the language chart as inline SVG.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::plotting::language_chart_svg;
use crate::types::{RepoSummary, SummaryArtifact};
use crate::utils::ranked_languages;

pub const REPORT_TITLE: &str = "Braggard Report";

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{title}}</title>
<style>
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 2rem auto; max-width: 960px; color: #24292f; }
table { border-collapse: collapse; width: 100%; }
th, td { text-align: left; padding: 0.4rem 0.6rem; border-bottom: 1px solid #d0d7de; }
.totals span { margin-right: 2rem; font-size: 1.2rem; }
footer { margin-top: 2rem; color: #57606a; font-size: 0.85rem; }
</style>
</head>
<body>
<h1>{{title}}</h1>
<p class="totals"><span>{{repo_count}} repositories</span><span>{{total_stars}} stars</span></p>
<section>
<h2>Languages</h2>
{{chart}}
<ul>
{{languages}}</ul>
</section>
<section>
<h2>Repositories</h2>
<table>
<thead><tr><th>Name</th><th>Stars</th><th>CI pass rate</th></tr></thead>
<tbody>
{{repo_rows}}</tbody>
</table>
</section>
<footer>Generated at {{generated_at}}</footer>
</body>
</html>
"#;

const MARKDOWN_TEMPLATE: &str = "# {{title}}

**{{repo_count}}** repositories, **{{total_stars}}** stars.

## Languages

{{languages}}
## Repositories

| Name | Stars | CI pass rate |
| --- | ---: | ---: |
{{repo_rows}}
_Generated at {{generated_at}}_
";

/// Report formats the renderer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Html,
    Markdown,
}

impl OutputFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            OutputFormat::Html => "index.html",
            OutputFormat::Markdown => "README.md",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            _ => Err(Error::UnsupportedFormat(value.to_string())),
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn escape_markdown_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn format_pass_rate(repo: &RepoSummary) -> String {
    match repo.ci_pass_rate {
        Some(rate) => format!("{:.1}%", rate * 100.0),
        None => "n/a".to_string(),
    }
}

fn substitute(template: &str, values: &[(&str, String)]) -> String {
    values.iter().fold(template.to_string(), |page, (key, value)| {
        page.replace(&format!("{{{{{}}}}}", key), value)
    })
}

fn common_values(summary: &SummaryArtifact) -> Vec<(&'static str, String)> {
    vec![
        ("repo_count", summary.aggregate.repo_count.to_string()),
        ("total_stars", summary.aggregate.total_stars.to_string()),
        (
            "generated_at",
            summary
                .generated_at
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        ),
    ]
}

pub fn render_html(summary: &SummaryArtifact) -> Result<String> {
    let mut languages = String::new();
    for (name, count) in ranked_languages(&summary.aggregate.languages) {
        languages.push_str(&format!("<li>{}: {}</li>\n", escape_html(&name), count));
    }

    let mut repo_rows = String::new();
    for repo in &summary.repos {
        repo_rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&repo.name),
            repo.stars,
            format_pass_rate(repo)
        ));
    }

    let mut values = common_values(summary);
    values.push(("title", REPORT_TITLE.to_string()));
    values.push(("chart", language_chart_svg(&summary.aggregate.languages)?));
    values.push(("languages", languages));
    values.push(("repo_rows", repo_rows));
    Ok(substitute(HTML_TEMPLATE, &values))
}

pub fn render_markdown(summary: &SummaryArtifact) -> String {
    let mut languages = String::new();
    for (name, count) in ranked_languages(&summary.aggregate.languages) {
        languages.push_str(&format!("- {}: {}\n", name, count));
    }

    let mut repo_rows = String::new();
    for repo in &summary.repos {
        repo_rows.push_str(&format!(
            "| {} | {} | {} |\n",
            escape_markdown_cell(&repo.name),
            repo.stars,
            format_pass_rate(repo)
        ));
    }

    let mut values = common_values(summary);
    values.push(("title", REPORT_TITLE.to_string()));
    values.push(("languages", languages));
    values.push(("repo_rows", repo_rows));
    substitute(MARKDOWN_TEMPLATE, &values)
}

/// Render the summary at `summary_path` into `output_dir`, returning the
/// written file.
pub fn render(summary_path: &Path, output_dir: &Path, format: OutputFormat) -> Result<PathBuf> {
    let content = fs::read_to_string(summary_path)?;
    let summary: SummaryArtifact = serde_json::from_str(&content)?;

    let page = match format {
        OutputFormat::Html => render_html(&summary)?,
        OutputFormat::Markdown => render_markdown(&summary),
    };

    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format.file_name());
    fs::write(&path, page)?;
    log::info!("rendered {} repositories to {}", summary.repos.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Aggregate;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn summary() -> SummaryArtifact {
        let mut languages = BTreeMap::new();
        languages.insert("Rust".to_string(), 2);
        languages.insert("Python".to_string(), 1);
        SummaryArtifact {
            generated_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            repos: vec![
                RepoSummary {
                    name: "crab<tools>".to_string(),
                    stars: 7,
                    ci_pass_rate: Some(0.6667),
                },
                RepoSummary {
                    name: "snake".to_string(),
                    stars: 1,
                    ci_pass_rate: None,
                },
            ],
            aggregate: Aggregate {
                repo_count: 2,
                total_stars: 8,
                languages,
            },
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("html".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert_eq!("HTML".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("markdown".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);

        let err = "pdf".parse::<OutputFormat>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ref f) if f == "pdf"));
    }

    #[test]
    fn test_html_report() {
        let html = render_html(&summary()).unwrap();

        assert!(html.contains("<title>Braggard Report</title>"));
        assert!(html.contains("crab&lt;tools&gt;"));
        assert!(!html.contains("crab<tools>"));
        assert!(html.contains("<td>66.7%</td>"));
        assert!(html.contains("<td>n/a</td>"));
        assert!(html.contains("<li>Rust: 2</li>"));
        assert!(html.contains("<svg"));
        assert!(html.contains("2025-01-01T00:00:00Z"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_markdown_report() {
        let markdown = render_markdown(&summary());

        assert!(markdown.starts_with("# Braggard Report"));
        assert!(markdown.contains("**2** repositories, **8** stars."));
        assert!(markdown.contains("| crab<tools> | 7 | 66.7% |"));
        assert!(markdown.contains("| snake | 1 | n/a |"));
        assert!(markdown.contains("- Rust: 2\n- Python: 1\n"));
        assert!(!markdown.contains("{{"));
    }

    #[test]
    fn test_render_creates_html() {
        let temp_dir = TempDir::new().unwrap();
        let summary_path = temp_dir.path().join("summary.json");
        std::fs::write(
            &summary_path,
            r#"{"generated_at": "2025-01-01T00:00:00Z", "repos": [],
                "aggregate": {"repo_count": 0, "total_stars": 0, "languages": {}}}"#,
        )
        .unwrap();

        let path = render(&summary_path, &temp_dir.path().join("docs"), OutputFormat::Html).unwrap();

        assert_eq!(path, temp_dir.path().join("docs").join("index.html"));
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("Braggard Report"));
        assert!(content.contains("No language data"));
    }

    #[test]
    fn test_render_missing_summary() {
        let temp_dir = TempDir::new().unwrap();
        let err = render(
            &temp_dir.path().join("summary.json"),
            temp_dir.path(),
            OutputFormat::Markdown,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
