use std::fmt;
use std::path::Path;

use serde::Serialize;

use super::fields;
use super::scanner::{Tag, TagKind, TagScanner, attribute};
use crate::span::ByteRange;

pub const OWNERSHIP_FIELD: &str = "Affiliation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    SpaceUnit,
    GroundUnit,
    Structure,
    SpaceBuildable,
    GroundBuildable,
    Upgrade,
    HeroUnique,
    Squadron,
    GroundCompany,
}

impl EntityKind {
    pub const ALL: [EntityKind; 9] = [
        Self::SpaceUnit,
        Self::GroundUnit,
        Self::Structure,
        Self::SpaceBuildable,
        Self::GroundBuildable,
        Self::Upgrade,
        Self::HeroUnique,
        Self::Squadron,
        Self::GroundCompany,
    ];

    pub fn tag_names(&self) -> &'static [&'static str] {
        match *self {
            Self::SpaceUnit => &["SpaceUnit"],
            Self::GroundUnit => &["GroundUnit"],
            Self::Structure => &["Structure"],
            Self::SpaceBuildable => &["SpaceBuildable"],
            Self::GroundBuildable => &["GroundBuildable"],
            Self::Upgrade => &["UpgradeObject"],
            Self::HeroUnique => &["UniqueUnit", "HeroUnit", "GenericHeroUnit"],
            Self::Squadron => &["Squadron"],
            Self::GroundCompany => &["GroundCompany"],
        }
    }

    pub fn from_tag(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| {
            kind.tag_names()
                .iter()
                .any(|tag| tag.eq_ignore_ascii_case(name))
        })
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::SpaceUnit => "space unit",
            Self::GroundUnit => "ground unit",
            Self::Structure => "structure",
            Self::SpaceBuildable => "space buildable",
            Self::GroundBuildable => "ground buildable",
            Self::Upgrade => "upgrade",
            Self::HeroUnique => "hero",
            Self::Squadron => "squadron",
            Self::GroundCompany => "ground company",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `<Tag ...> ... </Tag>` span found by [`ElementLocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element<'a> {
    pub tag_name: &'a str,
    pub header: &'a str,
    pub body: &'a str,
    pub range: ByteRange,
    pub body_range: ByteRange,
}

impl<'a> Element<'a> {
    pub fn name(&self) -> Option<&'a str> {
        attribute(self.header, "Name")
    }
}

/// Lazy search for elements whose tag name satisfies a predicate.
///
/// Each match runs from an opening tag to the first closing tag with the same
/// name (ASCII case-insensitive); other tags in between are ignored. An opener
/// without a closer is skipped and the search resumes right after it. The
/// locator can be restarted from any byte offset with [`ElementLocator::at`].
#[derive(Debug, Clone)]
pub struct ElementLocator<'a, F> {
    text: &'a str,
    pos: usize,
    accept: F,
}

impl<'a, F> ElementLocator<'a, F>
where
    F: Fn(&str) -> bool,
{
    pub fn new(text: &'a str, accept: F) -> Self {
        Self::at(text, 0, accept)
    }

    pub fn at(text: &'a str, pos: usize, accept: F) -> Self {
        Self {
            text,
            pos: pos.min(text.len()),
            accept,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn next_opener(&mut self) -> Option<Tag<'a>> {
        let found = TagScanner::at(self.text, self.pos)
            .find(|tag| tag.kind == TagKind::Open && (self.accept)(tag.name));
        self.pos = match found {
            Some(tag) => tag.range.end,
            None => self.text.len(),
        };
        found
    }
}

impl<'a, F> Iterator for ElementLocator<'a, F>
where
    F: Fn(&str) -> bool,
{
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Element<'a>> {
        loop {
            let open = self.next_opener()?;
            let close = TagScanner::at(self.text, open.range.end).find(|tag| {
                tag.kind == TagKind::Close && tag.name.eq_ignore_ascii_case(open.name)
            });

            let Some(close) = close else {
                continue;
            };

            self.pos = close.range.end;
            let body_range = ByteRange::new(open.range.end, close.range.start);
            return Some(Element {
                tag_name: open.name,
                header: open.range.slice(self.text),
                body: body_range.slice(self.text),
                range: ByteRange::new(open.range.start, close.range.end),
                body_range,
            });
        }
    }
}

/// A top-level game-object definition of one of the known [`EntityKind`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityBlock<'a> {
    pub kind: EntityKind,
    pub tag_name: &'a str,
    pub name: Option<&'a str>,
    pub ownership_tag: Option<&'a str>,
    pub header: &'a str,
    pub body: &'a str,
    pub range: ByteRange,
    pub body_range: ByteRange,
    pub source_file: &'a Path,
}

impl<'a> EntityBlock<'a> {
    fn from_element(element: Element<'a>, source_file: &'a Path) -> Option<Self> {
        let kind = EntityKind::from_tag(element.tag_name)?;
        Some(Self {
            kind,
            tag_name: element.tag_name,
            name: element.name(),
            ownership_tag: fields::field_value(element.body, OWNERSHIP_FIELD).map(str::trim),
            header: element.header,
            body: element.body,
            range: element.range,
            body_range: element.body_range,
            source_file,
        })
    }
}

fn is_entity_tag(name: &str) -> bool {
    EntityKind::from_tag(name).is_some()
}

#[derive(Debug, Clone)]
pub struct BlockLocator<'a> {
    elements: ElementLocator<'a, fn(&str) -> bool>,
    source_file: &'a Path,
}

impl<'a> BlockLocator<'a> {
    pub fn new(text: &'a str, source_file: &'a Path) -> Self {
        Self::at(text, 0, source_file)
    }

    pub fn at(text: &'a str, pos: usize, source_file: &'a Path) -> Self {
        Self {
            elements: ElementLocator::at(text, pos, is_entity_tag as fn(&str) -> bool),
            source_file,
        }
    }

    pub fn position(&self) -> usize {
        self.elements.position()
    }
}

impl<'a> Iterator for BlockLocator<'a> {
    type Item = EntityBlock<'a>;

    fn next(&mut self) -> Option<EntityBlock<'a>> {
        let source_file = self.source_file;
        self.elements
            .find_map(|element| EntityBlock::from_element(element, source_file))
    }
}
