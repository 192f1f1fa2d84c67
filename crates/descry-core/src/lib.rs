//! # descry-core
//!
//! A library for turning serialized protobuf descriptors into a normalized,
//! reflection-style schema tree.
//!
//! This crate provides the core functionality for:
//! - Decoding the protobuf wire format
//! - Decoding `FileDescriptorSet` / `FileDescriptorProto` records
//! - Building a schema tree of namespaces, types, fields, enums and services
//! - Rewriting the tree with visitors (map collapsing and friends)
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`wire`]: Varints, tags and the bounded [`WireReader`] cursor
//! - [`descriptor`]: Descriptor records and their decode routines
//! - [`schema`]: Schema tree nodes, name resolution and JSON output
//! - [`builder`]: Descriptor to schema conversion
//! - [`visitor`]: Tree traversal and the post-processing passes
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use descry_core::{convert_file_descriptor_set, ConversionOptions};
//! use std::fs;
//!
//! // Produced by `protoc --descriptor_set_out=api.pb api.proto`
//! let data = fs::read("api.pb")?;
//!
//! let root = convert_file_descriptor_set(&data, &ConversionOptions::default())?;
//! println!("{}", serde_json::to_string_pretty(&root.to_json())?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! Implement [`Visitor`] to run custom passes over a built tree; combine
//! several with [`CompositeVisitor`] to run them in a single walk.
//!

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod builder;
pub mod descriptor;
pub mod error;
pub mod schema;
pub mod visitor;
pub mod wire;

// Re-export primary types for convenience
pub use builder::{
    convert_file_descriptor, convert_file_descriptor_set, ConversionOptions, SchemaBuilder,
};
pub use descriptor::{FileDescriptorProto, FileDescriptorSet};
pub use error::{Error, Result};
pub use schema::{
    Enum, Field, FieldNode, MapField, Method, Namespace, Nested, OneOf, Service, Type,
};
pub use visitor::{apply_edits, visit, CompositeVisitor, Edit, VisitContext, Visitor};
pub use wire::{WireReader, MAX_FIELD_NUMBER, RECURSION_LIMIT};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
