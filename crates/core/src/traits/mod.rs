//! Core traits for pluggable backends

pub mod analyzer;

pub use analyzer::LanguageAnalyzer;
