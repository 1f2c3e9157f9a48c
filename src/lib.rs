//! DengueWatch: historical case heatmap, nearby-hospital ranking and outbreak-alert
//! subscription, as a library plus a small JSON API for the web front-end.

pub mod alerts;
pub mod api;
pub mod cases;
pub mod cli;
pub mod commands;
pub mod constants;
pub mod download;
pub mod gazetteer;
pub mod geo;
pub mod heatmap;
pub mod hospitals;
pub mod latest;
pub mod nav;
pub mod prediction;
pub mod server;
pub mod storage;
