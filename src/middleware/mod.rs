pub mod validated;

pub use validated::{ValidatedJson, ValidatedPath, ValidatedQuery};
