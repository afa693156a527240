//! Placeholder token grammar: `__BLANK[<id>]__`

use gapfill_core::DisplayId;
use std::collections::{HashMap, HashSet};
use std::ops::Range;

const PREFIX: &str = "__BLANK[";
const SUFFIX: &str = "]__";

/// A placeholder occurrence in a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderSpan {
    /// Byte range of the whole token
    pub range: Range<usize>,
    pub id: DisplayId,
}

/// The token text for a display id
pub fn placeholder_token(id: &DisplayId) -> String {
    format!("{}{}{}", PREFIX, id, SUFFIX)
}

/// Find every placeholder token, left to right
pub fn placeholder_spans(template: &str) -> Vec<PlaceholderSpan> {
    let mut spans = Vec::new();
    let mut offset = 0;

    while let Some(found) = template[offset..].find(PREFIX) {
        let start = offset + found;
        let id_start = start + PREFIX.len();
        let id_len = template[id_start..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        let id_end = id_start + id_len;

        if id_len > 0 && template[id_end..].starts_with(SUFFIX) {
            if let Ok(id) = DisplayId::new(&template[id_start..id_end]) {
                let end = id_end + SUFFIX.len();
                spans.push(PlaceholderSpan {
                    range: start..end,
                    id,
                });
                offset = end;
                continue;
            }
        }

        // Not a well-formed token; resume after its first underscore
        offset = start + 1;
    }

    spans
}

/// Ordered display ids referenced by a template, duplicates included
pub fn extract_placeholders(template: &str) -> Vec<DisplayId> {
    placeholder_spans(template)
        .into_iter()
        .map(|span| span.id)
        .collect()
}

/// Distinct display ids in order of first appearance
pub fn distinct_placeholders(template: &str) -> Vec<DisplayId> {
    let mut seen = HashSet::new();
    extract_placeholders(template)
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Rewrite placeholder ids in a single pass.
///
/// Ids absent from `mapping` are left alone. Because every token is
/// rewritten from the original text, swaps such as 1→2, 2→1 are safe.
pub fn remap_placeholders(template: &str, mapping: &HashMap<DisplayId, DisplayId>) -> String {
    rewrite(template, |id| mapping.get(id).map(placeholder_token))
}

/// Replace every occurrence of one placeholder with literal text
pub fn replace_placeholder(template: &str, id: &DisplayId, replacement: &str) -> String {
    rewrite(template, |found| (found == id).then(|| replacement.to_string()))
}

/// Substitute submitted values into a template.
///
/// Placeholders without a value keep their token so callers can still
/// mark them as unanswered.
pub fn fill(template: &str, values: &HashMap<DisplayId, String>) -> String {
    rewrite(template, |id| values.get(id).cloned())
}

fn rewrite(template: &str, mut replace: impl FnMut(&DisplayId) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for span in placeholder_spans(template) {
        if let Some(replacement) = replace(&span.id) {
            out.push_str(&template[last..span.range.start]);
            out.push_str(&replacement);
            last = span.range.end;
        }
    }

    out.push_str(&template[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DisplayId {
        DisplayId::new(s).unwrap()
    }

    #[test]
    fn test_extract_in_order_with_duplicates() {
        let template = "for (int __BLANK[2]__ = 0; __BLANK[2]__ < __BLANK[1]__; __BLANK[2]__++)";
        assert_eq!(
            extract_placeholders(template),
            vec![id("2"), id("2"), id("1"), id("2")]
        );
        assert_eq!(distinct_placeholders(template), vec![id("2"), id("1")]);
    }

    #[test]
    fn test_extract_ignores_malformed_tokens() {
        let template = "__BLANK[]__ __BLANK[a-b]__ __BLANK[__BLANK[ok_1]__ __BLANK[3]_";
        assert_eq!(extract_placeholders(template), vec![id("ok_1")]);
    }

    #[test]
    fn test_extract_empty_template() {
        assert!(extract_placeholders("").is_empty());
        assert!(extract_placeholders("int x = 3;").is_empty());
    }

    #[test]
    fn test_spans() {
        let spans = placeholder_spans("a __BLANK[7]__ b");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].range, 2..14);
        assert_eq!(spans[0].id, id("7"));
    }

    #[test]
    fn test_remap_swap() {
        let template = "__BLANK[1]__ + __BLANK[2]__ + __BLANK[1]__";
        let mapping = HashMap::from([(id("1"), id("2")), (id("2"), id("1"))]);
        assert_eq!(
            remap_placeholders(template, &mapping),
            "__BLANK[2]__ + __BLANK[1]__ + __BLANK[2]__"
        );
    }

    #[test]
    fn test_replace_placeholder() {
        let template = "pinMode(__BLANK[1]__, OUTPUT); digitalWrite(__BLANK[1]__, __BLANK[2]__);";
        assert_eq!(
            replace_placeholder(template, &id("1"), "13"),
            "pinMode(13, OUTPUT); digitalWrite(13, __BLANK[2]__);"
        );
    }

    #[test]
    fn test_fill_leaves_missing_values() {
        let values = HashMap::from([(id("1"), "ledPin".to_string())]);
        assert_eq!(
            fill("__BLANK[1]__ = __BLANK[2]__;", &values),
            "ledPin = __BLANK[2]__;"
        );
    }

    #[test]
    fn test_multibyte_text_around_tokens() {
        let template = "é__BLANK[1]__ü";
        assert_eq!(extract_placeholders(template), vec![id("1")]);
        let values = HashMap::from([(id("1"), "ß".to_string())]);
        assert_eq!(fill(template, &values), "éßü");
    }
}
