//! Schema Navigation
//!
//! Schema-driven validation and edit assistance for hierarchical JSON
//! configuration documents.
//!
//! ## Features
//!
//! - **Node Registry**: Compiled schema definitions indexed by name, with
//!   discriminator variants precomputed once at build time
//! - **Path Resolution**: Find the schema node at any document path, with
//!   template values for positions that do not exist yet
//! - **Validation**: Collect every problem in a document as path-tagged
//!   errors in a single pass
//! - **Edit Advice**: Insertable keys, insert templates, value
//!   suggestions and removal checks for an editor
//! - **Diagnostics**: Schema defects are reported separately from
//!   document errors
//!
//! ## Architecture
//!
//! ```text
//! schema.json ──loader──▶ NodeRegistry ──┬─▶ Resolver     (path → node, data)
//!                          (variants,     ├─▶ Validator    (document → errors)
//!                           diagnostics)  ├─▶ EditAdvisor  (insert keys, values)
//!                                         └─▶ RemovalCheck (may this go?)
//! ```
//!
//! [`SchemaNavigator`] binds a registry to one root definition and offers
//! all of the above.

pub mod advisor;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod loader;
pub mod navigator;
pub mod node;
pub mod path;
pub mod registry;
pub mod removal;
pub mod resolver;
pub mod validator;

pub use advisor::{EditAdvisor, InsertCandidate};
pub use config::{NavigatorConfig, OutputFormat};
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use error::{Result, SchemaError};
pub use loader::NodeDef;
pub use navigator::SchemaNavigator;
pub use node::{DataType, Discriminator, NodeBody, SchemaNode};
pub use path::{format_path, parse_path, value_at, JsonPath, PathStep};
pub use registry::{NodeRegistry, RegistryOptions};
pub use removal::{remove_at, RemovalCheck};
pub use resolver::{NavigationError, Resolved, Resolver};
pub use validator::{ErrorKind, ValidationError, Validator, Violation};
