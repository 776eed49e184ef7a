// crates/mw_physics/src/engine/mod.rs

//! 引擎核心
//!
//! - [`stability`]: 循环前的 CFL 与数值频散检查（违反即致命）
//! - [`observer`]: 步后只读观测（地震图记录、状态快照）
//! - [`leapfrog`]: 全阶蛙跳时间推进

pub mod leapfrog;
pub mod observer;
pub mod stability;

pub use leapfrog::{FomIntegrator, IntegratorOptions, MaterialMode};
pub use observer::{Observer, SeismogramRecorder, StateSnapshotter};
pub use stability::{check_stability, StabilityReport};
