//! Report rendering
//!
//! Turns a finished [`StorageAccount`] into text: an indented tree, a blob
//! table, a JSON or YAML document, or bare content lines.

use crate::error::{BlobscoutError, Result};
use crate::report::models::{Blob, StorageAccount};
use crate::utils::format::{format_table, OutputFormat};
use tabled::{builder::Builder, Table};

/// What to render besides the structure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub show_content: bool,
    pub content_only: bool,
    pub no_color: bool,
}

/// Rendered output plus the informational lines for empty results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub body: String,
    pub notices: Vec<String>,
}

/// Message used when no container passed the container filter
pub fn no_container_message(filter: Option<&str>) -> String {
    match filter {
        Some(pattern) => format!("No container found matching '{pattern}'"),
        None => "No container found".to_string(),
    }
}

/// Message used when a container matched but none of its blobs did
pub fn no_blob_message(container: &str) -> String {
    format!("No blob found in container '{container}'")
}

/// One tree line: `|` plus one ` |` per level, then `___` and the text
pub fn tree_line(level: usize, content: &str) -> String {
    format!("|{}___{}", " |".repeat(level), content)
}

pub fn render(
    account: &StorageAccount,
    format: &OutputFormat,
    options: RenderOptions,
    container_filter: Option<&str>,
) -> Result<Rendered> {
    // Notices go to stderr, so stdout stays content only
    if options.content_only {
        return Ok(Rendered {
            body: render_content_only(account),
            notices: collect_notices(account, container_filter),
        });
    }

    // The tree carries its own not-found lines
    if *format == OutputFormat::Tree {
        return Ok(Rendered {
            body: render_tree(account, options.show_content, container_filter),
            notices: Vec::new(),
        });
    }

    let body = match format {
        OutputFormat::Table => render_table(account, options.no_color),
        OutputFormat::Yaml => render_yaml(account, options.show_content)?,
        _ => render_json(account, options.show_content)?,
    };

    Ok(Rendered {
        body,
        notices: collect_notices(account, container_filter),
    })
}

fn collect_notices(account: &StorageAccount, container_filter: Option<&str>) -> Vec<String> {
    if account.containers.is_empty() {
        return vec![no_container_message(container_filter)];
    }

    account
        .containers
        .iter()
        .filter(|c| c.blobs.is_empty())
        .map(|c| no_blob_message(&c.name))
        .collect()
}

/// Indented tree: account, containers, blobs, then properties and metadata
pub fn render_tree(
    account: &StorageAccount,
    show_content: bool,
    container_filter: Option<&str>,
) -> String {
    let mut lines = vec![format!("Storage account: {}", account.name)];

    if account.containers.is_empty() {
        lines.push(tree_line(0, &no_container_message(container_filter)));
    }

    for container in &account.containers {
        lines.push(tree_line(0, &format!("Container: {}", container.name)));

        if container.blobs.is_empty() {
            lines.push(tree_line(1, &no_blob_message(&container.name)));
            continue;
        }

        for blob in &container.blobs {
            lines.push(tree_line(1, &format!("Blob: {}", blob.name)));
            for (label, value) in blob.properties.entries() {
                lines.push(tree_line(2, &format!("{label}: {value}")));
            }
            for (key, value) in &blob.metadata {
                lines.push(tree_line(
                    2,
                    &format!("{}: {}", key, value.as_deref().unwrap_or("")),
                ));
            }
            if show_content {
                if let Some(content) = &blob.content {
                    lines.push(tree_line(
                        2,
                        &format!("Content: {}", String::from_utf8_lossy(content)),
                    ));
                }
            }
        }
    }

    lines.join("\n")
}

fn render_table(account: &StorageAccount, no_color: bool) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Container", "Blob", "Type", "Last Modified", "Lease State"]);

    for (container, blob) in account.blobs() {
        let props = &blob.properties;
        builder.push_record([
            container,
            blob.name.as_str(),
            props.blob_type.as_deref().unwrap_or("-"),
            props.last_modified.as_deref().unwrap_or("-"),
            props.lease_state.as_deref().unwrap_or("-"),
        ]);
    }

    let table: Table = builder.build();
    format_table(table, no_color)
}

/// Content is only serialized when it was asked for
fn document(account: &StorageAccount, show_content: bool) -> StorageAccount {
    let mut doc = account.clone();
    if !show_content {
        for container in &mut doc.containers {
            for blob in &mut container.blobs {
                blob.content = None;
            }
        }
    }
    doc
}

pub fn render_json(account: &StorageAccount, show_content: bool) -> Result<String> {
    Ok(serde_json::to_string_pretty(&document(account, show_content))?)
}

pub fn render_yaml(account: &StorageAccount, show_content: bool) -> Result<String> {
    Ok(serde_yaml::to_string(&document(account, show_content))?)
}

/// Parse a document produced by [`render_json`]
pub fn parse_json(document: &str) -> Result<StorageAccount> {
    serde_json::from_str(document)
        .map_err(|e| BlobscoutError::serialization(format!("Invalid report document: {e}")))
}

/// One line per blob that has content
pub fn render_content_only(account: &StorageAccount) -> String {
    account
        .blobs()
        .filter_map(|(_, blob)| content_line(blob))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn content_line(blob: &Blob) -> Option<String> {
    blob.content
        .as_ref()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
}
