pub mod answer;
pub mod assistant;
pub mod catalog;
pub mod deadline;
pub mod index;
pub mod paginate;
pub mod persist;
pub mod record;
pub mod source;
pub mod tokenizer;

pub use catalog::{filter_records, sort_by_deadline, FacetOptions, FilterSpec};
pub use index::{DocIndex, InvertedIndex, KnowledgeBase, KnowledgeDocument};
pub use record::{Program, Programs, RawUniversity, UniversityRecord};
pub use source::{DataSource, DataSourceStrategy, SourceError};
