pub mod fields;
pub mod locator;
pub mod scanner;

pub use locator::{BlockLocator, Element, ElementLocator, EntityBlock, EntityKind, OWNERSHIP_FIELD};
pub use scanner::{Tag, TagKind, TagScanner};
