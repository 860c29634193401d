#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod batch;
pub mod config;
pub mod dataset;
pub mod date;
pub mod error;
pub mod memory;
pub mod normalize;
pub mod schema;
pub mod traits;
pub mod types;

pub use batch::{BatchAborted, BatchDriver, BatchReport, SkipKind, SkipRecord};
pub use error::{Error, Result};
pub use schema::{FieldTreatment, Schema, SchemaVariant};
pub use types::{Document, FieldValue, OpenMode, RawRecord, RawValue};
