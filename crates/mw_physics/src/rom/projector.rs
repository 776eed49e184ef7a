// crates/mw_physics/src/rom/projector.rs

//! Galerkin 投影
//!
//! `reduce(J, Φ_from, Φ_to) = Φ_toᵀ · (J · Φ_from)`，分两段计算：
//! 先稀疏 × 稠密得到中间矩阵 T = J·Φ_from，再稠密ᵀ × 稠密收缩，
//! 全程不物化 J 的稠密形式。
//!
//! 必须在基矩阵加载完毕、全阶算子组装完成之后调用一次；禁用模式
//! 把降阶算子填零，仅用于推进核计时（降阶动力学正确性无关紧要）。

use crate::numerics::{CsrMatrix, DenseMatrix};
use crate::operators::AssembledOperators;
use crate::rom::basis::Basis;
use mw_foundation::{MwError, MwResult};

/// 降阶算子对
#[derive(Debug, Clone)]
pub struct ProjectedOperators {
    /// 降阶速度更新算子（r_vp × r_sp）
    pub j_vp_r: DenseMatrix,
    /// 降阶应力更新算子（r_sp × r_vp）
    pub j_sp_r: DenseMatrix,
}

impl ProjectedOperators {
    /// 对两个全阶算子执行 Galerkin 投影
    ///
    /// ```text
    /// J_vp_r = Φ_vpᵀ · J_vp · Φ_sp
    /// J_sp_r = Φ_spᵀ · J_sp · Φ_vp
    /// ```
    pub fn reduce(
        ops: &AssembledOperators,
        phi_vp: &Basis,
        phi_sp: &Basis,
    ) -> MwResult<Self> {
        Ok(Self {
            j_vp_r: reduce_operator(&ops.j_vp, phi_sp.matrix(), phi_vp.matrix())?,
            j_sp_r: reduce_operator(&ops.j_sp, phi_vp.matrix(), phi_sp.matrix())?,
        })
    }

    /// 禁用模式：降阶算子填零
    pub fn disabled(r_vp: usize, r_sp: usize) -> Self {
        Self {
            j_vp_r: DenseMatrix::zeros(r_vp, r_sp),
            j_sp_r: DenseMatrix::zeros(r_sp, r_vp),
        }
    }

    /// 速度侧 ROM 规模
    #[inline]
    pub fn r_vp(&self) -> usize {
        self.j_vp_r.n_rows()
    }

    /// 应力侧 ROM 规模
    #[inline]
    pub fn r_sp(&self) -> usize {
        self.j_sp_r.n_rows()
    }
}

/// 单个算子的两段式投影 Φ_toᵀ · (J · Φ_from)
fn reduce_operator(
    j: &CsrMatrix,
    phi_from: &DenseMatrix,
    phi_to: &DenseMatrix,
) -> MwResult<DenseMatrix> {
    MwError::check_size("Φ_from 行数", j.n_cols(), phi_from.n_rows())?;
    MwError::check_size("Φ_to 行数", j.n_rows(), phi_to.n_rows())?;

    // 第一段：T = J · Φ_from，逐列稀疏矩阵乘
    let mut t = DenseMatrix::zeros(j.n_rows(), phi_from.n_cols());
    for col in 0..phi_from.n_cols() {
        j.mul_vec(phi_from.col(col), t.col_mut(col));
    }

    // 第二段：Φ_toᵀ · T
    Ok(phi_to.tr_mul(&t))
}
