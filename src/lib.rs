//! apidoc-scanner - Grouped API resource listings from a web application's route table.
//!
//! A scan takes a snapshot of the application's routes, partitions them into named resource
//! groups, expands every group into a listing of documented operations and assembles a
//! resource listing that points at each group's listing. Every step is driven by a pluggable
//! strategy, and the same routes and configuration always produce the same document.
//!
//! # Architecture
//!
//! 1. [`route`] - Route snapshot types and the [`route::RouteSource`] seam
//! 2. [`manifest`] - File-backed route source (YAML or JSON route manifests)
//! 3. [`grouping`] - Resource grouping strategies and the route grouper
//! 4. [`evaluator`], [`readers`], [`authorization`], [`model`], [`settings`] - Expansion plug-ins
//! 5. [`listing`] - Expands one group into its listing
//! 6. [`ordering`] - Reference and operation orderings
//! 7. [`paths`] - Listing locations and base paths
//! 8. [`document`] - Assembles the final document and scan report
//! 9. [`resource_listing`] - Scan configuration and the scanner that runs the pipeline
//! 10. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```
//! use apidoc_scanner::grouping::FirstPathSegmentGrouping;
//! use apidoc_scanner::resource_listing::{ResourceListingScanner, ScanConfig};
//! use apidoc_scanner::route::{HttpMethod, RouteContext};
//!
//! let routes = vec![
//!     RouteContext::new("/pets", vec![HttpMethod::Get], "list_pets"),
//!     RouteContext::new("/pets/{id}", vec![HttpMethod::Get], "get_pet"),
//!     RouteContext::new("/stores", vec![HttpMethod::Get], "list_stores"),
//! ];
//!
//! let config = ScanConfig::new("default").grouping(FirstPathSegmentGrouping::new());
//! let outcome = ResourceListingScanner::new(config).scan(routes).unwrap();
//!
//! assert_eq!(outcome.document.references().len(), 2);
//! assert_eq!(outcome.document.listing("pets").unwrap().operations.len(), 2);
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod authorization;
pub mod cli;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod grouping;
pub mod listing;
pub mod manifest;
pub mod model;
pub mod ordering;
pub mod paths;
pub mod readers;
pub mod resource_listing;
pub mod route;
pub mod serializer;
pub mod settings;
