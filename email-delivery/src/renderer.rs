use chrono::{DateTime, Utc};
use interfaces::{Story, SummaryResult};
use std::fmt::Write;
use tracing::info;

const STYLE: &str = r#"
    body { font-family: 'Segoe UI', 'Roboto', Arial, sans-serif; line-height: 1.7; color: #23272f;
           max-width: 820px; margin: 40px auto; padding: 32px 24px 24px 24px; background: #f8fafc; }
    h1 { color: #1a2636; text-align: center; font-size: 2.4em; margin-bottom: 32px; }
    h2 { color: #2d3a4a; margin-top: 36px; margin-bottom: 0; font-size: 1.25em; }
    ul { list-style-type: disc; padding-left: 32px; margin: 10px 0 18px 0; }
    ul li { margin-bottom: 6px; }
    a { color: #2563eb; text-decoration: none; }
    img { max-width: 100%; height: auto; margin: 18px auto 10px auto; border-radius: 12px; display: block; }
    .footer { font-size: 0.97em; color: #8a99ad; }
"#;

/// Figures shown around the stories.
#[derive(Debug, Clone)]
pub struct EmailContext {
    /// Date in the heading, already formatted.
    pub date: String,
    pub total_articles: usize,
    pub sources: usize,
    pub version: String,
    pub generated_at: DateTime<Utc>,
}

impl EmailContext {
    pub fn new(date: impl Into<String>, total_articles: usize, sources: usize) -> Self {
        Self {
            date: date.into(),
            total_articles,
            sources,
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

/// Render the digest as an HTML document. A result without stories still
/// renders a complete email with just the heading and footer.
pub fn render_email(summary: &SummaryResult, ctx: &EmailContext) -> String {
    let mut html = String::with_capacity(4096);

    let _ = write!(
        html,
        "<html>\n<head>\n<meta charset=\"utf-8\">\n<style>{}</style>\n</head>\n<body>\n<h1>Top stories: {}</h1>\n",
        STYLE,
        escape_html(&ctx.date)
    );

    for (i, story) in summary.stories.iter().enumerate() {
        render_story(&mut html, i + 1, story);
    }

    let _ = write!(
        html,
        "<p><strong>Processed {} articles from {} sources.</strong></p>\n\
         <div class=\"footer\">\n<p>Version: {}</p>\n<p>Generated at: {}</p>\n</div>\n</body>\n</html>\n",
        ctx.total_articles,
        ctx.sources,
        escape_html(&ctx.version),
        ctx.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    info!("Formatted email body with {} top stories", summary.stories.len());
    html
}

fn render_story(html: &mut String, index: usize, story: &Story) {
    let _ = writeln!(html, "<h2>{}. {}</h2>", index, escape_html(&story.overview));

    if let Some(image_url) = story.image_url.as_deref().filter(|u| !u.trim().is_empty()) {
        let _ = writeln!(
            html,
            "<img src=\"{}\" alt=\"News image\">",
            escape_html(image_url)
        );
    }

    html.push_str("<ul>\n");
    for highlight in &story.highlights {
        let _ = writeln!(html, "  <li>{}</li>", escape_html(highlight));
    }
    html.push_str("</ul>\n");

    if !story.urls.is_empty() {
        html.push_str("<p><strong>Sources:</strong></p>\n");
        for url in &story.urls {
            let url = escape_html(url);
            let _ = writeln!(html, "<p><a href=\"{}\">{}</a></p>", url, url);
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
