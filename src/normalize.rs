//! Format-aware output normalization.
//!
//! Normalization exists to make textual comparison insensitive to
//! formatting-only differences (whitespace, attribute or key order) in
//! structured output. It must never mask a semantic difference, so every
//! normalizer falls back to the original text on any parse error instead of
//! guessing.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_yaml::Value as YamlValue;

/// A normalization strategy for captured and expected output.
///
/// The set of recognized formats is closed: any unrecognized key (including
/// an absent one or `"none"`) maps to [`Normalizer::Identity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalizer {
    /// Canonicalize and pretty-print XML; output is pure ASCII.
    Xml,
    /// Re-serialize JSON with sorted keys and 2-space indentation.
    Json,
    /// Re-serialize YAML with sorted mapping keys in block style.
    Yaml,
    /// No normalization.
    #[default]
    Identity,
}

impl Normalizer {
    /// Resolve a normalization key from a test file or test case.
    pub fn from_key(key: Option<&str>) -> Self {
        match key {
            Some("xml") => Normalizer::Xml,
            Some("json") => Normalizer::Json,
            Some("yaml") => Normalizer::Yaml,
            _ => Normalizer::Identity,
        }
    }

    /// Normalize `text`. Never fails: malformed input comes back unchanged.
    pub fn apply(&self, text: &str) -> String {
        match self {
            Normalizer::Xml => canonical_xml(text).unwrap_or_else(|| text.to_string()),
            Normalizer::Json => normalize_json(text),
            Normalizer::Yaml => normalize_yaml(text),
            Normalizer::Identity => text.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Round-trip JSON through `serde_json::Value`. Object keys end up sorted
/// because the default map representation is a BTreeMap.
fn normalize_json(text: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| text.to_string()),
        Err(_) => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// YAML
// ---------------------------------------------------------------------------

/// Round-trip YAML through `serde_yaml::Value`, sorting mapping keys
/// recursively. serde_yaml emits block style, which is what we want.
fn normalize_yaml(text: &str) -> String {
    match serde_yaml::from_str::<YamlValue>(text) {
        Ok(value) => {
            let sorted = sort_yaml(value);
            serde_yaml::to_string(&sorted).unwrap_or_else(|_| text.to_string())
        }
        Err(_) => text.to_string(),
    }
}

fn sort_yaml(value: YamlValue) -> YamlValue {
    match value {
        YamlValue::Mapping(map) => {
            let mut pairs: Vec<(YamlValue, YamlValue)> =
                map.into_iter().map(|(k, v)| (k, sort_yaml(v))).collect();
            pairs.sort_by(|a, b| yaml_key(&a.0).cmp(&yaml_key(&b.0)));
            YamlValue::Mapping(pairs.into_iter().collect())
        }
        YamlValue::Sequence(seq) => {
            YamlValue::Sequence(seq.into_iter().map(sort_yaml).collect())
        }
        other => other,
    }
}

/// Sort key for a YAML mapping key. Keys are almost always strings; anything
/// else sorts by its serialized form.
fn yaml_key(value: &YamlValue) -> String {
    match value {
        YamlValue::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// XML
// ---------------------------------------------------------------------------

enum XmlNode {
    Element(XmlElement),
    Text(String),
}

struct XmlElement {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

/// Parse `text` as XML and render a canonical pretty-printed form: comments,
/// declarations and whitespace-only text dropped, attributes sorted by name,
/// 2-space indentation, non-ASCII escaped as numeric character references.
///
/// Returns `None` on any parse or well-formedness error.
fn canonical_xml(text: &str) -> Option<String> {
    let root = parse_xml(text)?;
    let mut out = String::new();
    write_element(&mut out, &root, 0, false);
    Some(out.trim_end().to_string())
}

fn parse_xml(text: &str) -> Option<XmlElement> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if root.is_some() && stack.is_empty() {
                    return None; // second root element
                }
                stack.push(make_element(&e)?);
            }
            Ok(Event::Empty(e)) => {
                let elem = make_element(&e)?;
                attach(&mut stack, &mut root, XmlNode::Element(elem))?;
            }
            Ok(Event::End(_)) => {
                let elem = stack.pop()?;
                attach(&mut stack, &mut root, XmlNode::Element(elem))?;
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().ok()?.into_owned();
                if !text.trim().is_empty() {
                    attach(&mut stack, &mut root, XmlNode::Text(text))?;
                }
            }
            Ok(Event::CData(t)) => {
                let bytes = t.into_inner();
                let text = std::str::from_utf8(&bytes).ok()?.to_string();
                // Blank CDATA is as insignificant as blank text; keeping it
                // would make the canonical form non-idempotent.
                if !text.trim().is_empty() {
                    attach(&mut stack, &mut root, XmlNode::Text(text))?;
                }
            }
            // Canonical form carries no comments, declarations or PIs.
            Ok(Event::Comment(_))
            | Ok(Event::Decl(_))
            | Ok(Event::PI(_))
            | Ok(Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(_) => return None,
        }
    }

    if !stack.is_empty() {
        return None; // unclosed element
    }
    root
}

fn make_element(start: &quick_xml::events::BytesStart<'_>) -> Option<XmlElement> {
    let name = std::str::from_utf8(start.name().as_ref()).ok()?.to_string();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.ok()?;
        let key = std::str::from_utf8(attr.key.as_ref()).ok()?.to_string();
        let value = attr.unescape_value().ok()?.into_owned();
        attrs.push((key, value));
    }
    attrs.sort_by(|a, b| a.0.cmp(&b.0));
    Some(XmlElement { name, attrs, children: Vec::new() })
}

/// Attach a completed node to the open element, or install it as the root.
/// Text outside the root element is ill-formed.
fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    node: XmlNode,
) -> Option<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Some(());
    }
    match node {
        XmlNode::Element(elem) if root.is_none() => {
            *root = Some(elem);
            Some(())
        }
        _ => None,
    }
}

fn write_element(out: &mut String, elem: &XmlElement, depth: usize, inline: bool) {
    if !inline {
        for _ in 0..depth {
            out.push_str("  ");
        }
    }
    out.push('<');
    out.push_str(&elem.name);
    for (key, value) in &elem.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        push_escaped(out, value, true);
        out.push('"');
    }

    if elem.children.is_empty() {
        out.push_str("/>");
        if !inline {
            out.push('\n');
        }
        return;
    }

    out.push('>');
    let has_text = elem
        .children
        .iter()
        .any(|c| matches!(c, XmlNode::Text(_)));
    if has_text {
        // Mixed or text content is rendered verbatim, with no added
        // indentation that would change the element's value.
        for child in &elem.children {
            match child {
                XmlNode::Text(text) => push_escaped(out, text, false),
                XmlNode::Element(child) => write_element(out, child, 0, true),
            }
        }
    } else {
        out.push('\n');
        for child in &elem.children {
            if let XmlNode::Element(child) = child {
                write_element(out, child, depth + 1, false);
            }
        }
        for _ in 0..depth {
            out.push_str("  ");
        }
    }
    out.push_str("</");
    out.push_str(&elem.name);
    out.push('>');
    if !inline {
        out.push('\n');
    }
}

/// Escape markup characters, and render anything outside ASCII as a decimal
/// character reference so the canonical form is pure ASCII.
fn push_escaped(out: &mut String, text: &str, in_attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            c if (c as u32) > 0x7f => {
                out.push_str(&format!("&#{};", c as u32));
            }
            c => out.push(c),
        }
    }
}
