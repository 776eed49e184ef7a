// crates/mw_physics/src/rom/mod.rs

//! 降阶模型（ROM）
//!
//! 把全阶算子 Galerkin 投影到预先算好的正交基上，得到小规模稠密
//! 算子，再以与全阶结构相同的蛙跳格式推进降阶状态：
//!
//! ```text
//! J_vp_r = Φ_vpᵀ · J_vp · Φ_sp     J_sp_r = Φ_spᵀ · J_sp · Φ_vp
//! ```
//!
//! - [`basis`]: 基矩阵载体（文件加载结果或随机生成）
//! - [`projector`]: 两段式投影（稀疏×稠密，再稠密ᵀ×稠密）
//! - [`integrator`]: 降阶蛙跳推进

pub mod basis;
pub mod integrator;
pub mod projector;

pub use basis::Basis;
pub use integrator::{RomIntegrator, RomIntegratorOptions};
pub use projector::ProjectedOperators;
