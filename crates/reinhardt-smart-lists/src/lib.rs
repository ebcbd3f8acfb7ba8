//! Sortable, filterable, searchable and exportable list views for Reinhardt
//!
//! This crate provides django-smart-lists equivalent functionality: a view
//! declares its columns, filters and search fields, and the crate turns the
//! query parameters of each request into a transformed collection and a
//! [`SmartList`] ready to be rendered or exported.
//!
//! # Features
//!
//! - **Columns**: fields, methods, projection keys or render functions, with
//!   derived titles and sortability
//! - **Multi-column sorting**: a compact sort token (`?o=-2.1`) with links
//!   adding, reversing and removing columns
//! - **Filters**: choices, booleans, to-one relations and custom filters
//! - **Search**: `?q=` terms across several fields with `^`, `=` and `@`
//!   lookup prefixes
//! - **Pagination**: `?page=N`, reset by every filter link
//! - **Export**: spreadsheet, CSV and JSON downloads (requires `export`
//!   feature, enabled by default)
//!
//! # Architecture
//!
//! See [`SmartListView`] for the architecture diagram.
//!
//! The data store stays behind the [`QuerySet`] trait. An in-memory
//! implementation lives in [`query::memory`].
//!
//! # Example
//!
//! ```rust
//! use reinhardt_smart_lists::model::{FieldKind, FieldMeta, ModelMeta, ValuesRow};
//! use reinhardt_smart_lists::query::memory::MemoryQuerySet;
//! use reinhardt_smart_lists::view::{ListConfig, ListResponse, SmartListView};
//! use reinhardt_smart_lists::QueryParams;
//!
//! let meta = ModelMeta::new("post").with_field(FieldMeta::new("title", FieldKind::Char));
//! let posts = MemoryQuerySet::new(meta)
//!     .with_record(ValuesRow::new().with("id", 1i64).with("title", "test"))
//!     .with_record(ValuesRow::new().with("id", 2i64).with("title", "other"));
//!
//! let view = SmartListView::new(
//!     ListConfig::new()
//!         .with_list_display(["title"])
//!         .with_search_fields(["title"]),
//! );
//! let response = view.get("/posts/", &QueryParams::parse("q=test&o=1"), posts).unwrap();
//! let ListResponse::Page(context) = response else {
//!     panic!("expected a page");
//! };
//! assert_eq!(context.smart_list.items().unwrap().len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod column;
pub mod error;
#[cfg(feature = "export")]
pub mod export;
pub mod filters;
pub mod html;
pub mod list;
pub mod model;
pub mod ordering;
pub mod pagination;
pub mod params;
pub mod query;
pub mod search;
pub mod settings;
pub mod text;
pub mod value;
pub mod view;

// Re-exports for convenience
pub use column::{Column, ListDisplay};
pub use error::{Result, SmartListError};
pub use filters::{ListFilter, SmartFilter, SmartFilterValue};
pub use list::{SmartList, SmartListField, SmartListItem};
pub use model::{ModelMeta, Record};
pub use ordering::SmartOrder;
pub use params::QueryParams;
pub use query::QuerySet;
pub use settings::SmartListSettings;
pub use value::Value;
pub use view::{ListConfig, SmartListView};
