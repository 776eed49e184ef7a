// crates/mw_foundation/src/scalar.rs

//! 标量类型别名与数值常量
//!
//! 全工作区统一使用 f64 精度。波动方程显式时间推进对舍入误差不敏感，
//! 但算子组装的回归基准要求 1e-13 量级的可复现性，故不提供 f32 路径。

/// 计算用标量类型
pub type Scalar = f64;

/// 浮点数相等性比较的默认容差
pub const DEFAULT_EPSILON: Scalar = 1e-14;

/// 地球半径 [m]
pub const EARTH_RADIUS_M: Scalar = 6_371_000.0;

/// 核幔边界半径 [m]
pub const CMB_RADIUS_M: Scalar = 3_480_000.0;

/// 千米到米的换算系数
pub const KM_TO_M: Scalar = 1_000.0;
