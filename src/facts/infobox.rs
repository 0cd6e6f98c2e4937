//! Attribute-table extraction from encyclopedia HTML
//!
//! Pages carry an `infobox` table whose rows pair a label cell (class
//! `infobox-label`) with the adjacent value cell. Values lose footnote
//! superscripts, HTML entities and markup; dates stay as plain text.

use regex::Regex;

use crate::error::{Result, ViewerError};

/// Compiled patterns for infobox extraction
#[derive(Debug, Clone)]
pub struct InfoboxParser {
    table_open: Regex,
    table_tag: Regex,
    row: Regex,
    strip_blocks: Regex,
    line_break: Regex,
    tag: Regex,
    entity: Regex,
    footnote: Regex,
    whitespace: Regex,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ViewerError::Parse(format!("infobox pattern: {e}")))
}

impl InfoboxParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            table_open: compile(
                r#"(?is)<table\b[^>]*\bclass\s*=\s*["'][^"']*\binfobox\b[^"']*["'][^>]*>"#,
            )?,
            table_tag: compile(r"(?i)<(/?)table\b")?,
            row: compile(
                r#"(?is)<t[hd]\b[^>]*\bclass\s*=\s*["'][^"']*\binfobox-label\b[^"']*["'][^>]*>(.*?)</t[hd]>\s*<td\b[^>]*>(.*?)</td>"#,
            )?,
            strip_blocks: compile(r"(?is)<sup\b.*?</sup>|<style\b.*?</style>")?,
            line_break: compile(r"(?i)<br\s*/?>|</li>")?,
            tag: compile(r"(?s)<[^>]*>")?,
            entity: compile(r"&(?:#\d+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);")?,
            footnote: compile(r"\[(?:\d+|[a-z]|note \d+|citation needed)\]")?,
            whitespace: compile(r"\s+")?,
        })
    }

    /// Ordered (label, value) pairs of the first infobox on the page
    ///
    /// A page without an infobox yields an empty list.
    pub fn extract(&self, html: &str) -> Vec<(String, String)> {
        let Some(table) = self.infobox_body(html) else {
            return Vec::new();
        };

        self.row
            .captures_iter(table)
            .filter_map(|caps| {
                let label = self.clean(&caps[1]);
                let value = self.clean(&caps[2]);
                (!label.is_empty()).then_some((label, value))
            })
            .collect()
    }

    /// Slice from the infobox's opening tag to its matching close
    fn infobox_body<'a>(&self, html: &'a str) -> Option<&'a str> {
        let open = self.table_open.find(html)?;
        let mut depth = 1usize;
        for caps in self.table_tag.captures_iter(&html[open.end()..]) {
            let Some(whole) = caps.get(0) else { continue };
            if caps[1].is_empty() {
                depth += 1;
            } else {
                depth -= 1;
                if depth == 0 {
                    return Some(&html[open.end()..open.end() + whole.start()]);
                }
            }
        }
        // Unterminated table: take the rest of the document.
        Some(&html[open.end()..])
    }

    /// Reduce a cell's markup to its visible text
    pub fn clean(&self, cell: &str) -> String {
        let text = self.strip_blocks.replace_all(cell, "");
        let text = self.line_break.replace_all(&text, " ");
        let text = self.tag.replace_all(&text, "");
        let text = self.entity.replace_all(&text, "");
        let text = self.footnote.replace_all(&text, "");
        self.whitespace.replace_all(&text, " ").trim().to_string()
    }
}
