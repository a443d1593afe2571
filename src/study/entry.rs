//! study::entry
//!
//! Literature entries and their BibTeX rendering.
//!
//! Rendering is deterministic: entries are ordered by citation key, fields
//! by name, and exact duplicates are dropped. Fetching the same records
//! twice therefore writes the same bytes, and the second crawl commits
//! nothing.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::types::slug;

/// Directory holding one result file per database.
pub const RESULTS_DIR: &str = "results";

/// A single bibliographic record.
///
/// In JSON the entry is a flat object: `type` and `key` are optional,
/// every other member becomes a BibTeX field.
///
/// ```json
/// {"type": "inproceedings", "title": "Commit Classification", "author": "Doe, Jane", "year": "2021"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteratureEntry {
    #[serde(rename = "type", default = "default_entry_type")]
    pub entry_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

fn default_entry_type() -> String {
    "article".to_string()
}

impl LiteratureEntry {
    pub fn new(entry_type: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into(),
            key: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// The explicit key, or one derived as `<author surname><year><title word>`.
    pub fn citation_key(&self) -> String {
        if let Some(key) = self.key.as_deref().filter(|k| !k.trim().is_empty()) {
            return key.trim().to_string();
        }

        let surname = self
            .fields
            .get("author")
            .and_then(|a| a.split(" and ").next())
            .map(|first| match first.split_once(',') {
                Some((last, _)) => last,
                None => first.split_whitespace().last().unwrap_or(first),
            })
            .unwrap_or("anonymous");
        let year = self.fields.get("year").map(String::as_str).unwrap_or("");
        let word = self
            .fields
            .get("title")
            .and_then(|t| t.split_whitespace().find(|w| w.len() > 3))
            .map(slug)
            .unwrap_or_default();

        format!("{}{}{}", slug(surname), year, word)
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect()
    }

    fn render(&self, key: &str, out: &mut String) {
        out.push('@');
        out.push_str(&self.entry_type.to_ascii_lowercase());
        out.push('{');
        out.push_str(key);
        out.push_str(",\n");
        for (name, value) in &self.fields {
            out.push_str("  ");
            out.push_str(name);
            out.push_str(" = {");
            out.push_str(&value.replace('\n', " "));
            out.push_str("},\n");
        }
        out.push_str("}\n");
    }
}

/// Entries fetched from one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseResults {
    pub database: String,
    pub entries: Vec<LiteratureEntry>,
}

impl DatabaseResults {
    pub fn new(database: impl Into<String>, entries: Vec<LiteratureEntry>) -> Self {
        Self {
            database: database.into(),
            entries,
        }
    }

    /// Repository-relative path of this database's result file.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(RESULTS_DIR).join(format!("{}.bib", slug(&self.database)))
    }

    /// Render all entries as BibTeX.
    ///
    /// Colliding citation keys get `a`, `b`, ... suffixes in render order.
    pub fn render_bibtex(&self) -> String {
        let mut keyed: Vec<(String, &LiteratureEntry)> = self
            .entries
            .iter()
            .map(|e| (e.citation_key(), e))
            .collect();
        keyed.sort_by(|(ka, a), (kb, b)| {
            ka.cmp(kb)
                .then_with(|| a.entry_type.cmp(&b.entry_type))
                .then_with(|| a.fields.cmp(&b.fields))
        });
        keyed.dedup_by(|(ka, a), (kb, b)| {
            ka == kb && a.entry_type == b.entry_type && a.fields == b.fields
        });

        let mut out = String::new();
        let mut i = 0;
        while i < keyed.len() {
            let key = &keyed[i].0;
            let run = keyed[i..].iter().take_while(|(k, _)| k == key).count();
            for (n, (_, entry)) in keyed[i..i + run].iter().enumerate() {
                let key = if run == 1 {
                    key.clone()
                } else {
                    format!("{}{}", key, suffix(n))
                };
                if !out.is_empty() {
                    out.push('\n');
                }
                entry.render(&key, &mut out);
            }
            i += run;
        }
        out
    }
}

/// `a`..`z`, `aa`..`zz`, `aaa`, ... (bijective base 26).
fn suffix(n: usize) -> String {
    let mut n = n;
    let mut letters = Vec::new();
    loop {
        letters.push(b'a' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().map(|&b| char::from(b)).collect()
}
