// src/thread.rs
//
// Downloads a Hacker News thread from the Algolia items API and flattens
// the nested comment tree into a linear XML document: one
// <entry><author/><comment/></entry> per comment, in depth-first order.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::error::{AppError, Result};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static CONTROL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f]").expect("valid regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// A normalized thread reference: the canonical item URL plus its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRef {
    pub url: String,
    pub id: String,
}

/// One node of the Algolia item tree. Stories carry no text; comments
/// carry `author` and `text`.
#[derive(Debug, Deserialize)]
pub struct HnItem {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub children: Vec<HnItem>,
}

/// Accepts either a bare item id (more than 5 digits) or a full item URL
/// with an `id` query parameter.
pub fn normalize_item(hnitem: &str) -> Result<ThreadRef> {
    if hnitem.len() > 5 && hnitem.chars().all(|c| c.is_ascii_digit()) {
        return Ok(ThreadRef {
            url: format!("https://news.ycombinator.com/item?id={hnitem}"),
            id: hnitem.to_string(),
        });
    }

    let parsed = Url::parse(hnitem)?;
    let id = parsed
        .query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| {
            AppError::InvalidItem(format!("no item id in '{hnitem}'"))
        })?;
    Ok(ThreadRef {
        url: hnitem.to_string(),
        id,
    })
}

/// Fetches the thread and writes the flattened XML to `destination`.
pub async fn download_thread(
    http: &reqwest::Client,
    hn_api_base: &Url,
    item_id: &str,
    destination: &Path,
) -> Result<()> {
    let url = hn_api_base.join(&format!("api/v1/items/{item_id}"))?;
    info!(url = %url, "downloading thread");
    let response = http.get(url).send().await?.error_for_status()?;
    let item: HnItem = response.json().await?;
    fs::write(destination, flatten_to_xml(item_id, &item))?;
    info!(file = %destination.display(), "thread written");
    Ok(())
}

/// Flattens the comment tree into the intermediate XML document.
pub fn flatten_to_xml(item_id: &str, root: &HnItem) -> String {
    let mut lines = vec![
        format!("<thread hn_item_id=\"{item_id}\">"),
        "  <tableheader/>".to_string(),
    ];
    collect_entries(root, &mut lines);
    lines.push("</thread>".to_string());
    lines.join("\n") + "\n"
}

fn collect_entries(item: &HnItem, lines: &mut Vec<String>) {
    if let (Some(author), Some(text)) = (item.author.as_deref(), item.text.as_deref()) {
        let comment = sanitize_for_xml(&strip_tags(&decode_entities(text)));
        lines.push("  <entry>".to_string());
        lines.push(format!("    <author>{}</author>", escape_xml(&sanitize_for_xml(author))));
        lines.push(format!("    <comment>{}</comment>", escape_xml(&comment)));
        lines.push("  </entry>".to_string());
    }
    for child in &item.children {
        collect_entries(child, lines);
    }
}

/// Drops XML-invalid control characters (tab/newline/CR survive) and
/// collapses whitespace runs to a single space.
pub fn sanitize_for_xml(text: &str) -> String {
    let cleaned = CONTROL_RE.replace_all(text, "");
    WHITESPACE_RE.replace_all(&cleaned, " ").trim().to_string()
}

fn strip_tags(text: &str) -> String {
    TAG_RE.replace_all(text, " ").into_owned()
}

/// HN comment bodies arrive with a small fixed set of HTML escapes.
fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#x2F;", "/")
        .replace("&amp;", "&")
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
