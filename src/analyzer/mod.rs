// src/analyzer/mod.rs — Prompt analysis: static heuristics, oracle critiques, domain insights

pub mod critique;
pub mod dynamic;
pub mod markers;
pub mod static_analysis;
