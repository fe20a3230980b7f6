// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # heapscope
//!
//! A high-performance, cross-platform library for indexing and querying Java heap dumps.
//! Built in pure Rust, `heapscope` parses the HPROF binary format, builds a compact
//! object-graph index, and answers the questions memory analysis tools ask: who holds
//! this object, how much does it retain, and why is it still alive - without requiring
//! a JVM.
//!
//! ## Features
//!
//! - **📦 Efficient memory access** - Memory-mapped dumps with lazy payload decoding
//! - **🔍 Complete HPROF parsing** - Version negotiation, record streaming, heap-dump
//!   segments, GC roots
//! - **⚡ Parallel indexing** - Reference edges extracted on all cores into a compact
//!   CSR reverse index
//! - **🛡️ Robust on real dumps** - Dangling references and duplicate records are
//!   diagnosed and worked around, not fatal
//! - **📊 Graph analytics** - Retained sizes via dominators, shortest paths to GC
//!   roots, incoming/outgoing references
//! - **🧩 Polyglot heaps** - Guest-language fragments project the dump onto one
//!   language by marker class
//!
//! ## Quick Start
//!
//! Add `heapscope` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! heapscope = "0.1"
//! ```
//!
//! ### Using the Prelude
//!
//! For convenient access to the most commonly used types, import the prelude:
//!
//! ```rust,no_run
//! use heapscope::prelude::*;
//!
//! let heap = HeapDump::from_file("dump.hprof".as_ref())?;
//! println!("Indexed {} objects", heap.summary()?.object_count);
//! # Ok::<(), heapscope::Error>(())
//! ```
//!
//! ### Basic Usage
//!
//! ```rust,no_run
//! use heapscope::HeapDump;
//! use std::path::Path;
//!
//! let heap = HeapDump::from_file(Path::new("dump.hprof"))?;
//!
//! // Find all strings and ask why the biggest one is alive.
//! let strings = heap.instances_of("java.lang.String", false)?;
//! if let Some(&id) = strings.first() {
//!     println!("retains {} bytes", heap.retained_size(id)?);
//!     match heap.shortest_path_to_root(id)? {
//!         Some(path) => println!("{} hops from a GC root", path.len()),
//!         None => println!("unreachable - garbage"),
//!     }
//! }
//!
//! heap.close();
//! # Ok::<(), heapscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `heapscope` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`format`] - The HPROF binary format: header, records, sub-records
//! - [`index`] - The two-pass index build and the frozen [`index::HeapIndex`]
//! - [`graph`] - Dominators/retained sizes and paths to GC roots
//! - [`fragment`] - Guest-language projections of polyglot heaps
//! - [`inspection`] - The source-model SPI for embedding environments
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! ### Loading Pipeline
//!
//! [`HeapDump`] is the main entry point. Loading memory-maps the file, streams the
//! record stream once to build the string, class, and object tables, then extracts
//! reference edges in parallel into a CSR reverse index. Instance payloads are never
//! decoded during the scan - outgoing references are decoded lazily, per object, on
//! demand.
//!
//! ### Interactive Embedding
//!
//! Loading reports progress and honors cancellation:
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use heapscope::{file::Physical, index::{CancelToken, LoadOptions}, HeapDump};
//!
//! let cancel = CancelToken::new();
//! let options = LoadOptions {
//!     cancel: cancel.clone(),
//!     ..LoadOptions::default()
//! };
//! // Another thread may call cancel.cancel() at any time.
//! let heap = HeapDump::load_with(Arc::new(Physical::new(Path::new("dump.hprof"))?), &options)?;
//! # Ok::<(), heapscope::Error>(())
//! ```
//!
//! ## Format Compliance
//!
//! `heapscope` implements the HPROF binary format as documented in the JDK
//! (`JAVA PROFILE 1.0.1` and `1.0.2`). Dumps produced by HotSpot, OpenJ9, and
//! GraalVM substrate images follow this layout.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result) with comprehensive error
//! information:
//!
//! ```rust,no_run
//! use heapscope::{Error, HeapDump};
//!
//! match HeapDump::from_file(std::path::Path::new("dump.hprof")) {
//!     Ok(heap) => println!("Loaded successfully"),
//!     Err(Error::UnsupportedVersion(banner)) => println!("Unknown banner: {}", banner),
//!     Err(Error::CorruptFormat { offset, message, .. }) => {
//!         println!("Corrupt at 0x{:x}: {}", offset, message);
//!     }
//!     Err(e) => println!("Error: {}", e),
//! }
//! ```
#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Backends and low-level parsing over raw dump bytes.
///
/// Dumps are accessed through the [`file::Backend`] trait with two
/// implementations: [`file::Physical`] memory-maps a file, [`file::Memory`]
/// wraps an owned buffer. [`file::parser::Parser`] is the bounds-checked
/// big-endian cursor every decoder in the crate is built on.
pub mod file;

/// The HPROF binary format: header, tags, records, and sub-records.
///
/// Implements version negotiation, lazy streaming of the top-level
/// tag-length-value record stream, and decoding of heap-dump segment
/// sub-records (GC roots, class dumps, instance and array dumps).
pub mod format;

/// Collection of non-fatal defects observed while loading a dump.
///
/// Real dumps contain dangling references, duplicate records, and roots naming
/// absent objects; these are collected as [`diagnostics::Diagnostic`] entries
/// instead of failing the load.
pub mod diagnostics;

/// The two-pass index build and the frozen, query-ready [`index::HeapIndex`].
///
/// # Key Components
///
/// - [`index::build`] / [`index::LoadOptions`] - The build entry point with
///   progress and cancellation
/// - [`index::HeapIndex`] - String, class, and object tables, GC roots, and the
///   CSR reverse-reference index
/// - [`index::CancelToken`] / [`index::Progress`] - Cooperative build control
pub mod index;

/// Graph analyses over a built index.
///
/// - [`graph::DominatorTree`] - Immediate dominators and retained sizes
/// - [`graph::shortest_path_to_root`] - Minimal referrer chain to a GC root
pub mod graph;

/// Guest-language heap fragments for polyglot runtimes.
///
/// A [`fragment::HeapFragment`] is the projection of a dump onto one guest
/// language, identified by a marker class; see [`HeapDump::register_language`]
/// and [`HeapDump::fragment`].
pub mod fragment;

/// Source-model inspection SPI for embedding environments.
///
/// [`inspection::SourceInspection`] lets an IDE answer questions the dump
/// cannot; [`inspection::NullSourceInspection`] is the standalone default.
pub mod inspection;

/// The heap dump session facade.
///
/// [`heap::HeapDump`] loads a dump, answers every query, and owns the session
/// lifecycle; [`heap::HeapSummary`] carries top-level statistics.
pub mod heap;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the heapscope library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust,no_run
/// use heapscope::prelude::*;
///
/// let heap = HeapDump::from_file("dump.hprof".as_ref())?;
/// let strings = heap.instances_of("java.lang.String", true)?;
/// # Ok::<(), heapscope::Error>(())
/// ```
pub mod prelude;

/// `heapscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
///
/// # Examples
///
/// ```rust,no_run
/// use heapscope::{HeapDump, Result};
///
/// fn load(path: &str) -> Result<HeapDump> {
///     HeapDump::from_file(std::path::Path::new(path))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `heapscope` Error type
///
/// The main error type for all operations in this crate. Provides detailed error
/// information for dump parsing, index building, and graph queries.
///
/// # Examples
///
/// ```rust,no_run
/// use heapscope::{Error, HeapDump};
///
/// match HeapDump::from_file(std::path::Path::new("dump.hprof")) {
///     Ok(heap) => println!("Loaded successfully"),
///     Err(Error::NotReady) => println!("Session closed"),
///     Err(Error::CorruptFormat { message, .. }) => println!("Corrupt: {}", message),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

/// Main entry point for loading and querying heap dumps.
///
/// See [`heap::HeapDump`] for the full query surface.
///
/// # Example
///
/// ```rust,no_run
/// use heapscope::HeapDump;
/// let heap = HeapDump::from_file(std::path::Path::new("dump.hprof"))?;
/// println!("{} objects", heap.summary()?.object_count);
/// # Ok::<(), heapscope::Error>(())
/// ```
pub use heap::{HeapDump, HeapSummary};

/// Binary parser for dump structures.
///
/// A bounds-checked big-endian cursor over raw dump bytes; every decoder in the
/// crate is built on it. See [`file::parser::Parser`].
///
/// # Example
///
/// ```rust
/// use heapscope::Parser;
///
/// let data = [0x00, 0x2A];
/// let mut parser = Parser::new(&data);
/// assert_eq!(parser.read_be::<u16>()?, 42);
/// # Ok::<(), heapscope::Error>(())
/// ```
pub use file::parser::Parser;
