pub mod document;
pub mod extractor;

pub use document::{normalize_text, RenderedDocument};
pub use extractor::{extract, CompiledFields, FieldName, FieldSelectors, RecordExtractor};
