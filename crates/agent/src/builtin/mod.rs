//! Keyword-matched data sources: the shopping catalog, the support
//! knowledge base and a small reference document collection.
pub mod catalog;
pub mod documents;
pub mod support;

pub use catalog::{catalog_agent, Product, ProductCatalogSkill, PRODUCTS};
pub use documents::{documents_agent, split_into_paragraphs, DocumentRecallSkill, AI_DOCUMENTS};
pub use support::{support_agent, SupportKbSkill, SupportTopic, SUPPORT_TOPICS};
