pub mod backup;
pub mod classify;
pub mod core_api;
pub mod corpus;
pub mod document_io;
pub mod faction;
pub mod fixes;
pub mod income;
pub mod markup;
pub mod mutate;
pub mod roster;
pub mod span;
pub mod validate;
