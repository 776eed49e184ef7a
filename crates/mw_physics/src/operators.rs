// crates/mw_physics/src/operators.rs

//! 空间导数算子组装
//!
//! 由网格连接关系、差分模板系数与材料场组装两个 CSR 算子：
//!
//! - `J_vp`: 速度更新算子，行 = 速度自由度，列 = 应力自由度
//! - `J_sp`: 应力更新算子，行 = 应力自由度，列 = 速度自由度
//!
//! # 速度行构造
//!
//! 对速度点 i 读取 西/北/东/南 四个应力邻居与模板系数 c0..c3，
//! 计算四个候选非对角值：
//!
//! ```text
//! c_west  = (−r⁻¹·dθ⁻¹ + r⁻¹·cot θ)·c0·ρ⁻¹
//! c_north = (dr⁻¹ + 1.5·r⁻¹)·c1·ρ⁻¹
//! c_east  = (r⁻¹·dθ⁻¹ + r⁻¹·cot θ)·c2·ρ⁻¹
//! c_south = (−dr⁻¹ + 1.5·r⁻¹)·c3·ρ⁻¹
//! ```
//!
//! `material_in_operator` 为 false 时 ρ⁻¹ 取 1（材料在推进时另行施加）。
//!
//! # 极点合并
//!
//! 北邻 GID 等于南邻 GID（点位于极对称轴上）时，两个条目合并为
//! 值 c_north + c_south 的单条目；西/东独立套用同一规则。合并既
//! 避免了行内重复列索引，也正确地在轴上折半自由度。行非零数因此
//! 为 2、3 或 4。
//!
//! # 应力行构造
//!
//! 按应力点标签分支：
//! - 径向剪切：邻居 [北, 南]，权 (dr⁻¹ − r⁻¹/2)·μ 与 (−dr⁻¹ − r⁻¹/2)·μ
//! - 切向剪切：邻居 [西, 东]，权 (−dθ⁻¹ − cot θ/2)·r⁻¹·μ 与 (dθ⁻¹ − cot θ/2)·r⁻¹·μ
//!
//! `material_in_operator` 为 false 时 μ 取 1。
//!
//! 两个算子都先做一次与合并规则一致的计数预扫，按总非零数一次性
//! 分配列索引/值数组后填充，不发生再分配，行指针不变量天然成立。

use crate::material::MaterialFields;
use crate::numerics::CsrMatrix;
use mw_foundation::{MwError, MwResult, Scalar};
use mw_mesh::connectivity::{EAST, NORTH, SOUTH, WEST};
use mw_mesh::{MeshConnectivity, StressLabel};
use tracing::debug;

/// 组装结果：两个空间导数算子
#[derive(Debug, Clone)]
pub struct AssembledOperators {
    /// 速度更新算子（n_vp × n_sp）
    pub j_vp: CsrMatrix,
    /// 应力更新算子（n_sp × n_vp）
    pub j_sp: CsrMatrix,
    /// 组装口径：材料系数是否已折入算子
    pub material_in_operator: bool,
}

/// 算子组装器
pub struct OperatorAssembler<'a> {
    mesh: &'a MeshConnectivity,
    fields: &'a MaterialFields,
    material_in_operator: bool,
}

impl<'a> OperatorAssembler<'a> {
    /// 创建组装器
    ///
    /// 校验材料场与网格的尺寸一致性（维度类错误，组装前致命）。
    pub fn new(
        mesh: &'a MeshConnectivity,
        fields: &'a MaterialFields,
        material_in_operator: bool,
    ) -> MwResult<Self> {
        MwError::check_size("rho_inv", mesh.n_velocity(), fields.rho_inv.len())?;
        MwError::check_size("shear_modulus", mesh.n_stress(), fields.shear_modulus.len())?;
        Ok(Self {
            mesh,
            fields,
            material_in_operator,
        })
    }

    /// 组装两个算子
    pub fn assemble(&self) -> MwResult<AssembledOperators> {
        let j_vp = self.assemble_velocity();
        let j_sp = self.assemble_stress();
        debug!(
            "算子组装完成: J_vp {}×{} ({} nnz), J_sp {}×{} ({} nnz), 材料折入={}",
            j_vp.n_rows(),
            j_vp.n_cols(),
            j_vp.nnz(),
            j_sp.n_rows(),
            j_sp.n_cols(),
            j_sp.nnz(),
            self.material_in_operator
        );
        Ok(AssembledOperators {
            j_vp,
            j_sp,
            material_in_operator: self.material_in_operator,
        })
    }

    /// 速度点 i 的四个候选系数（西/北/东/南）
    #[inline]
    fn velocity_coeffs(&self, i: usize) -> [Scalar; 4] {
        let v = &self.mesh.velocity;
        let inv_dth = 1.0 / self.mesh.d_theta;
        let inv_dr = 1.0 / self.mesh.d_r;

        let ir = v.inv_radius[i];
        let cot = 1.0 / v.theta[i].tan();
        let c = v.stencil[i];
        let rho_inv = if self.material_in_operator {
            self.fields.rho_inv[i]
        } else {
            1.0
        };

        [
            (-ir * inv_dth + ir * cot) * c[0] * rho_inv,
            (inv_dr + 1.5 * ir) * c[1] * rho_inv,
            (ir * inv_dth + ir * cot) * c[2] * rho_inv,
            (-inv_dr + 1.5 * ir) * c[3] * rho_inv,
        ]
    }

    /// 组装速度更新算子 J_vp
    fn assemble_velocity(&self) -> CsrMatrix {
        let v = &self.mesh.velocity;
        let n_vp = v.len();
        let n_sp = self.mesh.n_stress();

        // 计数预扫：与合并规则一致地统计每行非零数
        let mut row_ptr = Vec::with_capacity(n_vp + 1);
        row_ptr.push(0);
        let mut nnz = 0;
        for i in 0..n_vp {
            let nb = v.neighbors[i];
            nnz += if nb[WEST] == nb[EAST] { 1 } else { 2 };
            nnz += if nb[NORTH] == nb[SOUTH] { 1 } else { 2 };
            row_ptr.push(nnz);
        }

        // 按总量一次性分配后填充
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);
        for i in 0..n_vp {
            let nb = v.neighbors[i];
            let [cw, cn, ce, cs] = self.velocity_coeffs(i);

            if nb[WEST] == nb[EAST] {
                col_idx.push(nb[WEST]);
                values.push(cw + ce);
            } else {
                col_idx.push(nb[WEST]);
                values.push(cw);
                col_idx.push(nb[EAST]);
                values.push(ce);
            }
            if nb[NORTH] == nb[SOUTH] {
                col_idx.push(nb[NORTH]);
                values.push(cn + cs);
            } else {
                col_idx.push(nb[NORTH]);
                values.push(cn);
                col_idx.push(nb[SOUTH]);
                values.push(cs);
            }
        }

        CsrMatrix::from_raw(n_vp, n_sp, row_ptr, col_idx, values)
    }

    /// 应力点 i 的两个系数，顺序与邻接行一致
    #[inline]
    fn stress_coeffs(&self, i: usize) -> [Scalar; 2] {
        let s = &self.mesh.stress;
        let inv_dth = 1.0 / self.mesh.d_theta;
        let inv_dr = 1.0 / self.mesh.d_r;

        let ir = s.inv_radius[i];
        let mu = if self.material_in_operator {
            self.fields.shear_modulus[i]
        } else {
            1.0
        };

        match s.labels[i] {
            StressLabel::RadialShear => [(inv_dr - 0.5 * ir) * mu, (-inv_dr - 0.5 * ir) * mu],
            StressLabel::TangentialShear => {
                let cot = 1.0 / s.theta[i].tan();
                [
                    (-inv_dth - 0.5 * cot) * ir * mu,
                    (inv_dth - 0.5 * cot) * ir * mu,
                ]
            }
        }
    }

    /// 组装应力更新算子 J_sp
    fn assemble_stress(&self) -> CsrMatrix {
        let s = &self.mesh.stress;
        let n_sp = s.len();
        let n_vp = self.mesh.n_velocity();

        // 计数预扫（应力行固定 2 个邻居，仍套用合并规则保证列唯一）
        let mut row_ptr = Vec::with_capacity(n_sp + 1);
        row_ptr.push(0);
        let mut nnz = 0;
        for i in 0..n_sp {
            let nb = s.neighbors[i];
            nnz += if nb[0] == nb[1] { 1 } else { 2 };
            row_ptr.push(nnz);
        }

        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);
        for i in 0..n_sp {
            let nb = s.neighbors[i];
            let [w0, w1] = self.stress_coeffs(i);

            if nb[0] == nb[1] {
                col_idx.push(nb[0]);
                values.push(w0 + w1);
            } else {
                col_idx.push(nb[0]);
                values.push(w0);
                col_idx.push(nb[1]);
                values.push(w1);
            }
        }

        CsrMatrix::from_raw(n_sp, n_vp, row_ptr, col_idx, values)
    }
}
