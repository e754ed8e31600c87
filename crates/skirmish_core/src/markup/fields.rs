//! Field-level edits inside an entity body.
//!
//! A field is a simple `<Name>value</Name>` element. Lookups are ASCII
//! case-insensitive on the field name, commented-out fields are invisible, and
//! every edit leaves the text outside the touched fields as it was.

use super::locator::{Element, ElementLocator};

const DEFAULT_INDENT: &str = "\t\t";

fn field_elements<'a>(body: &'a str, field: &str) -> impl Iterator<Item = Element<'a>> {
    ElementLocator::new(body, move |name: &str| name.eq_ignore_ascii_case(field))
}

pub fn find_field<'a>(body: &'a str, field: &str) -> Option<Element<'a>> {
    field_elements(body, field).next()
}

pub fn field_value<'a>(body: &'a str, field: &str) -> Option<&'a str> {
    find_field(body, field).map(|element| element.body)
}

pub fn has_field(body: &str, field: &str) -> bool {
    find_field(body, field).is_some()
}

/// Replaces the value of every occurrence of `field`. `None` when absent.
pub fn replace_field_values(body: &str, field: &str, value: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut cursor = 0usize;
    let mut found = false;
    for element in field_elements(body, field) {
        out.push_str(&body[cursor..element.body_range.start]);
        out.push_str(value);
        cursor = element.body_range.end;
        found = true;
    }
    if !found {
        return None;
    }
    out.push_str(&body[cursor..]);
    Some(out)
}

pub fn replace_first_field_value(body: &str, field: &str, value: &str) -> Option<String> {
    let element = find_field(body, field)?;
    let mut out = String::with_capacity(body.len() + value.len());
    out.push_str(&body[..element.body_range.start]);
    out.push_str(value);
    out.push_str(&body[element.body_range.end..]);
    Some(out)
}

/// Sets every occurrence of `field` to `value`, appending the field when the
/// body has none.
pub fn set_field(body: &str, field: &str, value: &str) -> String {
    replace_field_values(body, field, value).unwrap_or_else(|| append_field(body, field, value))
}

/// Leaves exactly one `field` holding `value`: the first occurrence is
/// rewritten and later ones dropped. When absent it is placed after `anchor`,
/// or appended if the anchor is missing too.
pub fn set_single_field(body: &str, field: &str, value: &str, anchor: &str) -> String {
    let Some(first) = find_field(body, field) else {
        return insert_after_field(body, anchor, field, value)
            .unwrap_or_else(|| append_field(body, field, value));
    };

    let head = &body[..first.range.end];
    let tail = remove_field(&body[first.range.end..], field);
    let mut out = String::with_capacity(body.len());
    out.push_str(&head[..first.body_range.start]);
    out.push_str(value);
    out.push_str(&head[first.body_range.end..]);
    out.push_str(&tail);
    out
}

/// Drops every occurrence of `field` together with the whitespace after it.
pub fn remove_field(body: &str, field: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut cursor = 0usize;
    for element in field_elements(body, field) {
        out.push_str(&body[cursor..element.range.start]);
        let rest = &body[element.range.end..];
        cursor = element.range.end + (rest.len() - rest.trim_start().len());
    }
    out.push_str(&body[cursor..]);
    out
}

/// Adds `<field>value</field>` after the last field of the body, keeping the
/// trailing whitespace that precedes the closing tag of the entity.
pub fn append_field(body: &str, field: &str, value: &str) -> String {
    let content = body.trim_end();
    let tail = &body[content.len()..];
    let indent = last_line_indent(content);

    let mut out = String::with_capacity(body.len() + field.len() * 2 + value.len() + 8);
    out.push_str(content);
    out.push('\n');
    out.push_str(indent);
    push_field(&mut out, field, value);
    out.push_str(tail);
    out
}

pub fn insert_after_field(body: &str, anchor: &str, field: &str, value: &str) -> Option<String> {
    let anchor = find_field(body, anchor)?;
    let indent = last_line_indent(&body[..anchor.range.start]);

    let mut out = String::with_capacity(body.len() + field.len() * 2 + value.len() + 8);
    out.push_str(&body[..anchor.range.end]);
    out.push('\n');
    out.push_str(indent);
    push_field(&mut out, field, value);
    out.push_str(&body[anchor.range.end..]);
    Some(out)
}

fn push_field(out: &mut String, field: &str, value: &str) {
    out.push('<');
    out.push_str(field);
    out.push('>');
    out.push_str(value);
    out.push_str("</");
    out.push_str(field);
    out.push('>');
}

fn last_line_indent(text: &str) -> &str {
    let line_start = text.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line = &text[line_start..];
    let indent_len = line.len() - line.trim_start().len();
    if indent_len == 0 {
        DEFAULT_INDENT
    } else {
        &line[..indent_len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "\n\t\t<Affiliation>Neutral</Affiliation>\n\t\t<Tech_Level>3</Tech_Level>\n\t";

    #[test]
    fn finds_values_case_insensitively() {
        assert_eq!(field_value(BODY, "affiliation"), Some("Neutral"));
        assert_eq!(field_value(BODY, "TECH_LEVEL"), Some("3"));
        assert_eq!(field_value(BODY, "Population_Value"), None);
    }

    #[test]
    fn commented_fields_are_ignored() {
        let body = "<!-- <Tech_Level>9</Tech_Level> --><Tech_Level>2</Tech_Level>";
        assert_eq!(field_value(body, "Tech_Level"), Some("2"));
    }

    #[test]
    fn set_field_replaces_in_place() {
        let out = set_field(BODY, "Tech_Level", "1");
        assert_eq!(
            out,
            "\n\t\t<Affiliation>Neutral</Affiliation>\n\t\t<Tech_Level>1</Tech_Level>\n\t"
        );
    }

    #[test]
    fn set_field_appends_before_trailing_whitespace() {
        let out = set_field(BODY, "Population_Value", "0");
        assert!(out.ends_with("<Tech_Level>3</Tech_Level>\n\t\t<Population_Value>0</Population_Value>\n\t"));
        assert_eq!(set_field(&out, "Population_Value", "0"), out);
    }

    #[test]
    fn set_single_field_collapses_duplicates() {
        let body = "<A>x</A>\n\t<R>1</R>\n\t<R>2</R>\n";
        assert_eq!(set_single_field(body, "R", "Yard", "A"), "<A>x</A>\n\t<R>Yard</R>\n\t");
    }

    #[test]
    fn set_single_field_inserts_after_anchor() {
        let out = set_single_field(BODY, "Required_Special_Structures", "Yard", "Affiliation");
        assert!(out.contains(
            "<Affiliation>Neutral</Affiliation>\n\t\t<Required_Special_Structures>Yard</Required_Special_Structures>\n\t\t<Tech_Level>"
        ));
    }

    #[test]
    fn remove_field_drops_every_occurrence() {
        let body = "<Required_Planets>A</Required_Planets>\n\t<Keep>1</Keep><required_planets>B</required_planets>";
        assert_eq!(remove_field(body, "Required_Planets"), "<Keep>1</Keep>");
    }
}
