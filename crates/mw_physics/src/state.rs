// crates/mw_physics/src/state.rs

//! 波场状态管理
//!
//! [`WaveState`] 持有速度与应力两组状态向量，带显式批宽 `n_real`
//! （单源标量情形取 1）。rank-1 与 rank-2 共用同一类型，内核按批宽
//! 泛化，批宽为 1 时走标量特化路径。
//!
//! # 布局
//!
//! 实现主序（SoA over dof，AoS over realization）：
//!
//! ```text
//! x_vp: [dof0_k0, dof0_k1, ..., dof1_k0, dof1_k1, ...]
//! ```
//!
//! 同一自由度的各实现连续存放，批量矩阵乘的内层循环因此连续访问。
//!
//! 状态由积分器独占持有，每次运行开始时清零；跨运行不共享可变状态。

use mw_foundation::Scalar;
use serde::{Deserialize, Serialize};

/// 波场状态（速度 + 应力，带批宽）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveState {
    n_vp: usize,
    n_sp: usize,
    n_real: usize,
    /// 速度状态，长度 n_vp × n_real
    pub x_vp: Vec<Scalar>,
    /// 应力状态，长度 n_sp × n_real
    pub x_sp: Vec<Scalar>,
}

impl WaveState {
    /// 创建 rank-1（单实现）状态
    pub fn new(n_vp: usize, n_sp: usize) -> Self {
        Self::with_batch(n_vp, n_sp, 1)
    }

    /// 创建带批宽的状态
    ///
    /// # Panics
    ///
    /// - 任一维度为 0
    pub fn with_batch(n_vp: usize, n_sp: usize, n_real: usize) -> Self {
        assert!(n_vp > 0 && n_sp > 0, "自由度个数必须大于 0");
        assert!(n_real > 0, "批宽必须大于 0");
        Self {
            n_vp,
            n_sp,
            n_real,
            x_vp: vec![0.0; n_vp * n_real],
            x_sp: vec![0.0; n_sp * n_real],
        }
    }

    /// 速度自由度个数
    #[inline]
    pub fn n_vp(&self) -> usize {
        self.n_vp
    }

    /// 应力自由度个数
    #[inline]
    pub fn n_sp(&self) -> usize {
        self.n_sp
    }

    /// 批宽（实现个数）
    #[inline]
    pub fn n_real(&self) -> usize {
        self.n_real
    }

    /// 全部清零（每次运行开始时调用）
    pub fn reset(&mut self) {
        self.x_vp.fill(0.0);
        self.x_sp.fill(0.0);
    }

    /// 读取速度状态分量
    #[inline]
    pub fn vp_at(&self, dof: usize, real: usize) -> Scalar {
        self.x_vp[dof * self.n_real + real]
    }

    /// 读取应力状态分量
    #[inline]
    pub fn sp_at(&self, dof: usize, real: usize) -> Scalar {
        self.x_sp[dof * self.n_real + real]
    }

    /// 状态最大绝对值（诊断用）
    pub fn max_abs(&self) -> Scalar {
        self.x_vp
            .iter()
            .chain(self.x_sp.iter())
            .fold(0.0, |acc, v| Scalar::max(acc, v.abs()))
    }

    /// 状态是否全部有限
    pub fn is_finite(&self) -> bool {
        self.x_vp.iter().chain(self.x_sp.iter()).all(|v| v.is_finite())
    }
}
