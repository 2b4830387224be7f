use crate::types::{FetchError, RawEntry};
use feed_rs::model::Entry;
use feed_rs::parser;
use std::collections::HashSet;
use tracing::debug;

/// Turns a feed document into `RawEntry` records.
pub struct FeedParser;

impl FeedParser {
    /// Parse an RSS/Atom body. A document the parser rejects is reported as
    /// `FetchError::Malformed` with the parser's own diagnostic.
    pub fn parse(url: &str, body: &[u8]) -> Result<Vec<RawEntry>, FetchError> {
        debug!("Parsing feed content from {} ({} bytes)", url, body.len());

        let feed = parser::parse(body).map_err(|e| FetchError::Malformed {
            url: url.to_string(),
            diagnostic: e.to_string(),
        })?;

        let mut seen_links = HashSet::new();
        let mut entries = Vec::with_capacity(feed.entries.len());

        for entry in feed.entries {
            let Some(raw) = Self::parse_entry(entry) else {
                continue;
            };
            if !seen_links.insert(raw.link.clone()) {
                debug!("Skipping repeated entry in {}: {}", url, raw.link);
                continue;
            }
            entries.push(raw);
        }

        debug!("Parsed {} entries from {}", entries.len(), url);
        Ok(entries)
    }

    fn parse_entry(entry: Entry) -> Option<RawEntry> {
        let link = entry.links.first()?.href.trim().to_string();
        if link.is_empty() {
            return None;
        }

        let title = entry
            .title
            .map(|t| strip_html(&t.content))
            .unwrap_or_default();
        let summary = entry
            .summary
            .map(|s| strip_html(&s.content))
            .unwrap_or_default();
        let content = entry
            .content
            .and_then(|c| c.body)
            .map(|body| strip_html(&body))
            .filter(|body| !body.is_empty());

        let image_url = entry.media.iter().find_map(|media| {
            media
                .content
                .iter()
                .find(|c| {
                    c.content_type
                        .as_ref()
                        .map(|ct| ct.to_string().starts_with("image/"))
                        .unwrap_or(false)
                })
                .and_then(|c| c.url.as_ref().map(|u| u.to_string()))
                .or_else(|| media.thumbnails.first().map(|t| t.image.uri.clone()))
        });

        Some(RawEntry {
            title,
            summary,
            link,
            // Atom feeds may only carry `updated`
            published: entry.published.or(entry.updated),
            content,
            image_url,
        })
    }
}

/// Rewrite a feed body as UTF-8, overriding whatever the XML prolog claims.
pub fn force_utf8(bytes: &[u8]) -> Vec<u8> {
    let decoded = String::from_utf8_lossy(bytes);
    let text = decoded.trim_start_matches('\u{feff}');

    let prolog_end = if text.starts_with("<?xml") {
        text.find("?>")
    } else {
        None
    };
    let Some(prolog_end) = prolog_end else {
        return text.as_bytes().to_vec();
    };

    let prolog = &text[..prolog_end];
    let Some(attr) = prolog.find("encoding=") else {
        return text.as_bytes().to_vec();
    };

    let value_start = attr + "encoding=".len();
    if let Some(quote @ ('"' | '\'')) = prolog[value_start..].chars().next() {
        if let Some(len) = prolog[value_start + 1..].find(quote) {
            let mut out = String::with_capacity(text.len());
            out.push_str(&text[..value_start + 1]);
            out.push_str("UTF-8");
            out.push_str(&text[value_start + 1 + len..]);
            return out.into_bytes();
        }
    }

    text.as_bytes().to_vec()
}

/// Drop markup from feed-provided snippets and collapse whitespace.
pub fn strip_html(html: &str) -> String {
    html.chars()
        .fold((String::new(), false), |(mut text, in_tag), c| match c {
            '<' => (text, true),
            '>' if in_tag => {
                text.push(' ');
                (text, false)
            }
            _ if !in_tag => {
                text.push(c);
                (text, in_tag)
            }
            _ => (text, in_tag),
        })
        .0
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
