pub mod models;

pub use models::{FormatPartition, Variant, VideoCatalog};
