pub mod catalog;
pub mod domain;
pub mod error;
pub mod memory;
pub mod planner;
pub mod policy;
pub mod ports;
pub mod resolver;
pub mod stats;
pub mod validation;

pub use catalog::{BookCatalog, BookFilter, CatalogQuery};
pub use domain::{
    BookChanges, BookDraft, BookPatch, BookQuery, BookView, CatalogStats, CoverImage, FieldKind,
    Genre, MalformedField, NewBook, Patch, ReadingStatus, StatusCounts, StatusRow,
};
pub use error::{CatalogError, CatalogResult};
pub use memory::InMemoryCatalogStore;
pub use planner::{CreatePlanner, UpdatePlanner};
pub use policy::PagePolicy;
pub use ports::{CatalogStore, PortError, PortResult};
pub use resolver::DimensionResolver;
pub use stats::AggregateReporter;
