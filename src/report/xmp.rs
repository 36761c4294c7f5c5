//! XMP report section.
//!
//! The packet is parsed as plain XML and flattened into a nested map:
//! namespace prefixes are dropped from element and attribute names,
//! repeated sibling names collect into a list, and leaf text lands
//! under a `text` key. The map is then rendered as a YAML block
//! document with sorted keys.

use std::collections::BTreeMap;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::meta::RawMetadata;

#[derive(Debug, Clone, PartialEq)]
enum XmpValue {
    Map(BTreeMap<String, XmpValue>),
    List(Vec<XmpValue>),
    Text(String),
}

/// An element being built while its subtree is still open.
struct Frame {
    name: String,
    value: BTreeMap<String, XmpValue>,
    text: String,
    has_children: bool,
}

impl Frame {
    fn open(e: &BytesStart<'_>) -> Self {
        let mut value = BTreeMap::new();
        for attr in e.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            // Namespace declarations are not metadata.
            if key == "xmlns" || key.starts_with("xmlns:") {
                continue;
            }
            let raw = String::from_utf8_lossy(&attr.value).to_string();
            let text = match unescape(&raw) {
                Ok(unescaped) => unescaped.to_string(),
                Err(_) => raw,
            };
            value.insert(local_name(&key).to_string(), XmpValue::Text(text));
        }
        Frame {
            name: local_name(&String::from_utf8_lossy(e.name().as_ref())).to_string(),
            value,
            text: String::new(),
            has_children: false,
        }
    }

    fn close(self) -> (String, XmpValue) {
        let Frame {
            name,
            mut value,
            text,
            has_children,
        } = self;
        if !has_children && !text.is_empty() {
            value.insert("text".to_string(), XmpValue::Text(text));
        }
        (name, XmpValue::Map(value))
    }
}

fn local_name(name: &str) -> &str {
    match name.rsplit_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

/// Attaches a finished element to its parent, turning repeated sibling
/// names into a list.
fn attach(
    name: String,
    value: XmpValue,
    stack: &mut [Frame],
    root: &mut BTreeMap<String, XmpValue>,
) {
    let target = match stack.last_mut() {
        Some(parent) => {
            parent.has_children = true;
            &mut parent.value
        }
        None => root,
    };
    match target.get_mut(&name) {
        Some(XmpValue::List(items)) => items.push(value),
        Some(existing) => {
            let first = std::mem::replace(existing, XmpValue::List(Vec::new()));
            if let XmpValue::List(items) = existing {
                items.push(first);
                items.push(value);
            }
        }
        None => {
            target.insert(name, value);
        }
    }
}

fn parse(xml: &str) -> Result<BTreeMap<String, XmpValue>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root = BTreeMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(Frame::open(&e)),
            Ok(Event::Empty(e)) => {
                let (name, value) = Frame::open(&e).close();
                attach(name, value, &mut stack, &mut root);
            }
            Ok(Event::Text(e)) => {
                if let Some(top) = stack.last_mut() {
                    // Text after the first child is tail text and is dropped.
                    if !top.has_children {
                        let raw = String::from_utf8_lossy(e.as_ref()).to_string();
                        match unescape(&raw) {
                            Ok(unescaped) => top.text.push_str(&unescaped),
                            Err(_) => top.text.push_str(&raw),
                        }
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(top) = stack.last_mut() {
                    if !top.has_children {
                        top.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
            }
            Ok(Event::End(_)) => {
                if let Some(frame) = stack.pop() {
                    let (name, value) = frame.close();
                    attach(name, value, &mut stack, &mut root);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(err.to_string()),
        }
    }
    if !stack.is_empty() {
        return Err("unexpected end of document".to_string());
    }
    Ok(root)
}

pub(crate) fn extract(meta: &RawMetadata) -> String {
    let Some(packet) = meta.xmp.as_deref() else {
        return String::new();
    };
    if packet.is_empty() {
        return String::new();
    }
    let tree = match parse(&String::from_utf8_lossy(packet)) {
        Ok(tree) => tree,
        Err(detail) => return format!("XMP: {detail}"),
    };
    if tree.is_empty() {
        return String::new();
    }
    let mut s = String::from("XMP:\n");
    render_map(&mut s, &tree, 0);
    s.trim_end().to_string()
}

fn render_map(out: &mut String, map: &BTreeMap<String, XmpValue>, indent: usize) {
    let pad = "  ".repeat(indent);
    for (key, value) in map {
        out.push_str(&pad);
        out.push_str(&scalar(key, indent));
        out.push(':');
        match value {
            XmpValue::Text(s) => {
                out.push(' ');
                out.push_str(&scalar(s, indent));
                out.push('\n');
            }
            XmpValue::Map(m) if m.is_empty() => out.push_str(" {}\n"),
            XmpValue::Map(m) => {
                out.push('\n');
                render_map(out, m, indent + 1);
            }
            XmpValue::List(items) if items.is_empty() => out.push_str(" []\n"),
            XmpValue::List(items) => {
                out.push('\n');
                render_list(out, items, indent);
            }
        }
    }
}

/// List items sit at the same indent column as their key.
fn render_list(out: &mut String, items: &[XmpValue], indent: usize) {
    let pad = "  ".repeat(indent);
    for item in items {
        out.push_str(&pad);
        out.push_str("- ");
        match item {
            XmpValue::Text(s) => {
                out.push_str(&scalar(s, indent));
                out.push('\n');
            }
            XmpValue::Map(m) if m.is_empty() => out.push_str("{}\n"),
            XmpValue::Map(m) => {
                let mut block = String::new();
                render_map(&mut block, m, indent + 1);
                out.push_str(&block[(indent + 1) * 2..]);
            }
            XmpValue::List(nested) if nested.is_empty() => out.push_str("[]\n"),
            XmpValue::List(nested) => {
                let mut block = String::new();
                render_list(&mut block, nested, indent + 1);
                out.push_str(&block[(indent + 1) * 2..]);
            }
        }
    }
}

fn scalar(s: &str, indent: usize) -> String {
    if !needs_quote(s) {
        return s.to_string();
    }
    let mut quoted = s.replace('\'', "''");
    if quoted.contains('\n') {
        let continuation = format!("\n\n{}", "  ".repeat(indent + 1));
        quoted = quoted.replace('\n', &continuation);
    }
    format!("'{quoted}'")
}

/// Whether a plain rendering would be read back as something other
/// than this string.
fn needs_quote(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    match s.to_ascii_lowercase().as_str() {
        "null" | "~" | "true" | "false" | "yes" | "no" | "on" | "off" => return true,
        _ => {}
    }
    if s.parse::<i64>().is_ok() || s.parse::<f64>().is_ok() || looks_like_date(s) {
        return true;
    }
    if b"!&*?|>%@`\"'#,[]{}".contains(&s.as_bytes()[0]) {
        return true;
    }
    if s == "-" || s == ":" || s.starts_with("- ") || s.starts_with(": ") {
        return true;
    }
    s.starts_with(' ')
        || s.ends_with(' ')
        || s.contains('\n')
        || s.contains(": ")
        || s.ends_with(':')
        || s.contains(" #")
}

fn looks_like_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 10
        && b[..4].iter().all(|c| c.is_ascii_digit())
        && b[4] == b'-'
        && b[5..7].iter().all(|c| c.is_ascii_digit())
        && b[7] == b'-'
        && b[8..10].iter().all(|c| c.is_ascii_digit())
}
