// src/core/mod.rs — Refinement engines and their shared plumbing

pub mod call_budget;
pub mod layers;
pub mod modes;
pub mod progressive;
pub mod prompts;
pub mod response_cache;
pub mod self_refine;
pub mod types;
