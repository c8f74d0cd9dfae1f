//! Just enough XML for UPnP descriptions and SOAP envelopes.
//!
//! Wemo documents are flat and predictable, so values are pulled out as
//! leaf elements (elements with text content and no children). Namespace
//! prefixes are dropped from element names.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LEAF: Regex =
        Regex::new(r"<([A-Za-z_][\w.:-]*)(?:\s[^<>]*)?>([^<]*)</([A-Za-z_][\w.:-]*)\s*>").unwrap();
    static ref EMPTY: Regex = Regex::new(r"<([A-Za-z_][\w.:-]*)(?:\s[^<>]*)?/>").unwrap();
    static ref ENTITY: Regex = Regex::new(r"&(#x[0-9A-Fa-f]+|#[0-9]+|lt|gt|amp|quot|apos);").unwrap();
    pub static ref SERVICE: Regex = block("service");
    pub static ref ACTION: Regex = block("action");
    pub static ref ARGUMENT: Regex = block("argument");
    pub static ref BODY: Regex =
        Regex::new(r"(?s)<(?:[\w.-]+:)?Body(?:\s[^>]*)?>(.*)</(?:[\w.-]+:)?Body\s*>").unwrap();
}

fn block(tag: &str) -> Regex {
    Regex::new(&format!(
        r"(?s)<(?:[\w.-]+:)?{tag}(?:\s[^>]*)?>(.*?)</(?:[\w.-]+:)?{tag}\s*>"
    ))
    .unwrap()
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// All leaf elements as `(local name, unescaped text)` in document order.
pub fn leaves(xml: &str) -> Vec<(String, String)> {
    let mut found: Vec<(usize, String, String)> = LEAF
        .captures_iter(xml)
        .filter(|c| c[1] == c[3])
        .map(|c| {
            let start = c.get(0).map_or(0, |m| m.start());
            (start, local_name(&c[1]).to_string(), unescape(c[2].trim()))
        })
        .collect();

    found.extend(EMPTY.captures_iter(xml).map(|c| {
        let start = c.get(0).map_or(0, |m| m.start());
        (start, local_name(&c[1]).to_string(), String::new())
    }));

    found.sort_by_key(|(start, _, _)| *start);
    found.into_iter().map(|(_, name, text)| (name, text)).collect()
}

/// Text of the first leaf element named `name`.
pub fn first(xml: &str, name: &str) -> Option<String> {
    leaves(xml)
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, text)| text)
}

/// Inner text of every element matched by one of the block patterns above.
pub fn blocks<'a>(pattern: &Regex, xml: &'a str) -> Vec<&'a str> {
    pattern
        .captures_iter(xml)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn unescape(text: &str) -> String {
    ENTITY
        .replace_all(text, |c: &regex::Captures| {
            let entity = &c[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ if entity.starts_with("#x") => u32::from_str_radix(&entity[2..], 16)
                    .ok()
                    .and_then(char::from_u32),
                _ => entity[1..].parse::<u32>().ok().and_then(char::from_u32),
            };
            decoded.map_or_else(|| c[0].to_string(), String::from)
        })
        .into_owned()
}
