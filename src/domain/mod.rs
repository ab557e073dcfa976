//! Domain shapes shared by the harvester, the store adapter and the search layer.

pub mod article;
pub mod filter;
pub mod source;

pub use article::{
    AddressDoc, ArticleDocument, CategoryDocument, FacetBucket, LanguageHint, PersonDocument,
    PublisherDocument, PublisherRef,
};
pub use filter::GrandFilterRequest;
pub use source::{GeoPoint, Publisher, Source};
