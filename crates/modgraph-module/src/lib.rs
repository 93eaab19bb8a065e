//! Module graph for modgraph.
//!
//! Given a catalog of module descriptors and a set of root modules, this crate
//! computes which modules take part in a run and who reads whom, then checks
//! the resulting graph:
//!
//! - **Descriptors**: validated module declarations, built in code or parsed
//!   from `.mdesc` files
//! - **Resolution**: breadth-first closure over `requires`, and the
//!   readability relation on top, where automatic modules imply every
//!   resolved module
//! - **Validation**: cycles, split packages, dangling qualified exports and
//!   missing service providers
//!
//! # Example
//!
//! ```ignore
//! use modgraph_module::{resolve_and_validate, Catalog, ModuleDescriptor, ResolveRequest};
//!
//! let catalog = Catalog::from_descriptors([
//!     ModuleDescriptor::builder("app").requires("lib").build()?,
//!     ModuleDescriptor::builder("lib").contains("com.lib").exports("com.lib").build()?,
//! ])?;
//!
//! let report = resolve_and_validate(&catalog, &ResolveRequest::new(["app"]));
//! assert!(report.success);
//! ```

mod catalog;
mod descfile;
mod descriptor;
mod error;
mod report;
mod resolver;
mod validate;

pub use catalog::Catalog;
pub use descfile::{DescriptorFile, DESCRIPTOR_EXTENSION};
pub use descriptor::{
    DescriptorBuilder, ModuleDescriptor, ModuleKind, PackageGrant, Provides, Requires, Targets,
    UNNAMED_MODULE,
};
pub use error::{CatalogError, DescriptorError, DescriptorResult, ParseError, ParseResult};
pub use report::{resolve_and_validate, Report, ResolvedModule};
pub use resolver::{resolve, ModuleResolver, ResolveRequest, ResolvedSet, DEFAULT_BASE_MODULE};
pub use validate::{validate, Validator};
