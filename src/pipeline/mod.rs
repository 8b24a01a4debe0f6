//! Pipeline stages for inspecting and transforming PDF documents.
//!
//! Each submodule implements exactly one concern and is independently
//! testable against the engine traits in [`crate::engine`].
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ inspect ──▶ select ──▶ extract / compress / split ──▶ write
//! (paths)   (report)    (plan)     (steps)                        (atomic)
//! ```
//!
//! 1. [`input`]    — discover PDFs under a path and check their magic bytes
//! 2. [`inspect`]  — page count, text presence and size metrics
//! 3. [`select`]   — pure decision table from report to [`select::Strategy`]
//! 4. [`extract`]  — page-delimited text file
//! 5. [`compress`] — rasterise, JPEG-encode ([`encode`]) and reassemble
//! 6. [`split`]    — consecutive page-range parts
//! 7. [`write`]    — atomic artifact writes and the per-run path ledger

pub mod compress;
pub mod encode;
pub mod extract;
pub mod input;
pub mod inspect;
pub mod select;
pub mod split;
pub mod write;
