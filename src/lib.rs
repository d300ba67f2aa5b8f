// SafeSpace: ML-assisted threat detection over local news.
//
// Core flow: news articles (or raw text) run through a three-model ONNX
// ensemble with deterministic keyword fallbacks, get categorized and
// leveled by keyword rules, and come back as threat records with safety
// advice attached. The web module serves the whole thing over HTTP.

pub mod advice;
pub mod config;
pub mod ensemble;
pub mod models;
pub mod news;
pub mod pipeline;
pub mod rules;
pub mod text;
pub mod types;
pub mod web;
