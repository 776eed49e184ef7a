// crates/mw_physics/src/lib.rs

//! 物理求解器模块
//!
//! 提供二维轴对称极坐标剪切波方程的数值求解功能，包括：
//! - 材料模型 (material) - 分层地幔剖面与材料场采样
//! - 数值内核 (numerics) - CSR 稀疏矩阵与稠密小矩阵
//! - 算子组装 (operators) - 速度/应力两个空间导数算子
//! - 震源 (forcing) - Ricker 子波点源与批量源
//! - 状态管理 (state) - 带显式批宽的波场状态
//! - 引擎核心 (engine) - 蛙跳时间推进、稳定性检查、观测者
//! - 降阶模型 (rom) - Galerkin 投影与降阶蛙跳推进
//!
//! # 并行模型
//!
//! 时间步严格串行（蛙跳格式存在步间真依赖）；单步内的矩阵-向量乘、
//! 逐实现强迫累加等数值核按行数据并行，行间无共享可变状态。

pub mod engine;
pub mod forcing;
pub mod material;
pub mod numerics;
pub mod operators;
pub mod rom;
pub mod state;

// 重导出常用类型
pub use engine::{
    FomIntegrator, IntegratorOptions, MaterialMode, Observer, SeismogramRecorder, StabilityReport,
    StateSnapshotter, check_stability,
};
pub use forcing::{ForcingSource, RickerWavelet, sample_periods};
pub use material::{LayeredMantle, MaterialFields, MaterialModel, MaterialSample};
pub use numerics::{CsrBuilder, CsrMatrix, CsrPattern, DenseMatrix};
pub use operators::{AssembledOperators, OperatorAssembler};
pub use rom::{Basis, ProjectedOperators, RomIntegrator, RomIntegratorOptions};
pub use state::WaveState;
