//! Copycat recipe generator
//!
//! This library provides the resumable batch pipeline that turns a CSV of
//! branded products into structured copycat recipes by calling a hosted
//! language model, normalizing its output and handing finished records to a
//! persistence sink.

pub mod config;
pub mod db;
pub mod models;
pub mod services;
