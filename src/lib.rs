// src/lib.rs

//! tackle-ingest: fishing tackle catalog ingestion.
//!
//! Scrapes manufacturer product pages, expands each product into its
//! color and weight variants, and writes new variants to a relational
//! catalog with transcoded images in blob storage.

pub mod adapters;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod tracker;
pub mod utils;
