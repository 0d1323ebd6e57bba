//! Decoding of super, content and dependency manifests.
//!
//! A field is read from an attribute of the element first and from the text of
//! a child element of the same name second.

use super::types::{
    ContentRef, DependerRecord, DependerVersion, ItemKind, MtbDependency, MtbItem, MtbItemDetails,
    MtbItemVersion, PackManifest,
};
use crate::error::{MtbError, MtbResult};
use reqwest::Url;
use roxmltree::{Document, Node};
use std::path::Path;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Content manifests listed by a super-manifest.
pub fn parse_super_manifest(text: &str, source: &PackManifest) -> MtbResult<Vec<ContentRef>> {
    let doc = parse_document(text, &source.uripath)?;
    let root = doc.root_element();
    if root.tag_name().name() != "super-manifest" {
        return Err(unexpected_root(&source.uripath, root));
    }

    let mut refs = Vec::new();
    for list in elements(root) {
        match list.tag_name().name() {
            "app-manifest-list" | "board-manifest-list" | "middleware-manifest-list" => {}
            other => {
                tracing::debug!("Ignoring <{}> in {}", other, source.uripath);
                continue;
            }
        }

        for entry in elements(list) {
            let uri = field(entry, "uri").ok_or_else(|| {
                schema(
                    &source.uripath,
                    format!("<{}> without <uri>", entry.tag_name().name()),
                )
            })?;
            let dependency_uri =
                field(entry, "dependency-url").map(|d| resolve_uri(&source.uripath, &d));

            refs.push(ContentRef {
                source: PackManifest::new(resolve_uri(&source.uripath, &uri), source.iseap),
                dependency_uri,
            });
        }
    }

    Ok(refs)
}

/// Items of an app, board or middleware manifest.
pub fn parse_content_manifest(text: &str, source: &PackManifest) -> MtbResult<Vec<MtbItem>> {
    let doc = parse_document(text, &source.uripath)?;
    let root = doc.root_element();
    let (kind, item_tag) = match root.tag_name().name() {
        "apps" => (ItemKind::App, "app"),
        "boards" => (ItemKind::Board, "board"),
        "middleware" => (ItemKind::Middleware, "middleware"),
        _ => return Err(unexpected_root(&source.uripath, root)),
    };

    elements(root)
        .filter(|n| n.tag_name().name() == item_tag)
        .map(|node| parse_item(node, kind, source))
        .collect()
}

/// Dependency edges of a dependency manifest.
pub fn parse_dependency_manifest(text: &str, uri: &str) -> MtbResult<Vec<DependerRecord>> {
    let doc = parse_document(text, uri)?;
    let root = doc.root_element();
    if root.tag_name().name() != "dependencies" {
        return Err(unexpected_root(uri, root));
    }

    let mut records = Vec::new();
    for depender in children(root, "depender") {
        let id = field(depender, "id").ok_or_else(|| schema(uri, "<depender> without id"))?;

        let mut versions = Vec::new();
        for version in nested(depender, "versions", "version") {
            let commit = field(version, "commit")
                .ok_or_else(|| schema(uri, format!("version of {} without commit", id)))?;
            let dependees = nested(version, "dependees", "dependee")
                .map(|d| {
                    Ok(MtbDependency {
                        id: field(d, "id")
                            .ok_or_else(|| schema(uri, format!("dependee of {} without id", id)))?,
                        commit: field(d, "commit").unwrap_or_default(),
                    })
                })
                .collect::<MtbResult<Vec<_>>>()?;
            versions.push(DependerVersion { commit, dependees });
        }

        records.push(DependerRecord { id, versions });
    }

    Ok(records)
}

/// Resolve a manifest reference against the document that named it.
pub fn resolve_uri(base: &str, reference: &str) -> String {
    if has_scheme(reference) || Path::new(reference).is_absolute() {
        return reference.to_string();
    }

    if has_scheme(base) {
        if let Ok(joined) = Url::parse(base).and_then(|b| b.join(reference)) {
            return joined.to_string();
        }
    }

    Path::new(base)
        .parent()
        .map(|p| p.join(reference).to_string_lossy().into_owned())
        .unwrap_or_else(|| reference.to_string())
}

/// Split a v2 requirement string on whitespace outside `[...]` groups.
pub fn split_requirements_v2(value: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in value.chars() {
        match c {
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c if c.is_whitespace() => {}
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn parse_item(node: Node, kind: ItemKind, source: &PackManifest) -> MtbResult<MtbItem> {
    let id = field(node, "id").ok_or_else(|| {
        schema(
            &source.uripath,
            format!("<{}> without id", node.tag_name().name()),
        )
    })?;

    let versions = nested(node, "versions", "version")
        .map(|v| parse_version(v, &id, source))
        .collect::<MtbResult<Vec<_>>>()?;

    let category = field(node, "category");
    let details = match kind {
        ItemKind::App => MtbItemDetails::App {
            category,
            uri: field(node, "uri"),
            description: field(node, "description"),
            keywords: split_list(field(node, "keywords"), ','),
        },
        ItemKind::Board => MtbItemDetails::Board {
            category,
            chips: child(node, "chips")
                .map(|chips| elements(chips).filter_map(text).collect())
                .unwrap_or_default(),
            board_uri: field(node, "board_uri"),
            documentation: field(node, "documentation_url"),
            summary: field(node, "summary"),
        },
        ItemKind::Middleware => MtbItemDetails::Middleware {
            category,
            uri: field(node, "uri"),
            description: field(node, "desc").or_else(|| field(node, "description")),
        },
    };

    Ok(MtbItem {
        name: field(node, "name").unwrap_or_else(|| id.clone()),
        id,
        source: source.clone(),
        versions,
        provides: split_tokens(field(node, "prov_capabilities")),
        requires: split_tokens(field(node, "req_capabilities")),
        requiresv2: field(node, "req_capabilities_v2")
            .map(|s| split_requirements_v2(&s))
            .unwrap_or_default(),
        details,
    })
}

fn parse_version(node: Node, id: &str, source: &PackManifest) -> MtbResult<MtbItemVersion> {
    let num = field(node, "num")
        .ok_or_else(|| schema(&source.uripath, format!("version of {} without num", id)))?;

    Ok(MtbItemVersion {
        num,
        commit: field(node, "commit").unwrap_or_default(),
        requirements: split_tokens(field(node, "req_capabilities_per_version")),
        requirementsv2: field(node, "req_capabilities_per_version_v2")
            .map(|s| split_requirements_v2(&s))
            .unwrap_or_default(),
        provides: split_tokens(field(node, "prov_capabilities_per_version")),
        flows: split_list(field(node, "flow_version"), ','),
        tools_min_version: field(node, "tools_min_version"),
        dependencies: Vec::new(),
        eap: source.iseap,
    })
}

fn parse_document<'i>(text: &'i str, uri: &str) -> MtbResult<Document<'i>> {
    Document::parse(text).map_err(|e| schema(uri, e.to_string()))
}

fn field(node: Node, name: &str) -> Option<String> {
    node.attribute(name)
        .map(|s| s.trim().to_string())
        .or_else(|| child(node, name).and_then(text))
        .filter(|s| !s.is_empty())
}

fn text(node: Node) -> Option<String> {
    let t = node.text()?.trim();
    (!t.is_empty()).then(|| t.to_string())
}

fn elements<'a, 'i>(node: Node<'a, 'i>) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children().filter(Node::is_element)
}

fn children<'a, 'i>(node: Node<'a, 'i>, name: &'static str) -> impl Iterator<Item = Node<'a, 'i>> {
    elements(node).filter(move |n| n.tag_name().name() == name)
}

fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    elements(node).find(|n| n.tag_name().name() == name)
}

fn nested<'a, 'i>(
    node: Node<'a, 'i>,
    list: &str,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'i>> {
    child(node, list).into_iter().flat_map(move |l| children(l, name))
}

fn split_tokens(value: Option<String>) -> Vec<String> {
    value
        .map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

fn split_list(value: Option<String>, sep: char) -> Vec<String> {
    value
        .map(|s| {
            s.split(sep)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn has_scheme(s: &str) -> bool {
    Url::parse(s).map(|u| u.scheme().len() > 1).unwrap_or(false)
}

fn schema(uri: &str, reason: impl Into<String>) -> MtbError {
    MtbError::ManifestSchema {
        uri: uri.to_string(),
        reason: reason.into(),
    }
}

fn unexpected_root(uri: &str, root: Node) -> MtbError {
    schema(
        uri,
        format!("unexpected root element <{}>", root.tag_name().name()),
    )
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
