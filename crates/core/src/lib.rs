//! Core library for quicktoolify
//!
//! This crate implements the **Functional Core** of the quicktoolify application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`quicktoolify_core`** (this crate): catalog data, state machines and pure
//!   transformations. No network, no terminal.
//! - **`quicktoolify`**: HTTP client, file-backed storage, terminal rendering and
//!   the command tree (the Imperative Shell).
//!
//! Persistence is the one place the core touches the outside world, and it
//! only does so through the [`store::Storage`] trait. Tests use
//! [`store::MemoryStorage`]; the binary plugs in a JSON file.
//!
//! Anything random (password batches, practice text selection) takes an
//! injected [`rand::Rng`], so tests seed a `StdRng` and assert exact output.
//!
//! # Module Organization
//!
//! - [`catalog`]: Categories, tools, path parsing and page metadata
//! - [`store`]: Storage trait, observables and the persisted selection
//! - [`images`]: Upload validation, wire decoding and the convert/compress workflow
//! - [`json_format`]: Indentation presets and the formatter session
//! - [`password`]: Batch password generation and strength labels
//! - [`todo`]: To-do list operations and its persisted store
//! - [`typing`]: Practice texts, keyboard layouts and the typing session
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use quicktoolify_core::store::{AppContext, MemoryStorage};
//!
//! let mut ctx = AppContext::new(MemoryStorage::new());
//! let path = ctx.select_category(Some(2), "/category/all");
//!
//! assert_eq!(path.as_deref(), Some("/category/json-formatter"));
//! assert_eq!(ctx.current_category_name(), "JSON formatting");
//! ```

pub mod catalog;
pub mod images;
pub mod json_format;
pub mod password;
pub mod store;
pub mod todo;
pub mod typing;
