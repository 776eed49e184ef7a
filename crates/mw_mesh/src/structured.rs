// crates/mw_mesh/src/structured.rs

//! 结构化极坐标网格生成器
//!
//! 在内存中直接构造交错 nθ×nr 网格的连接关系，与网格文件描述的
//! 结构一致。用于测试固定网格（如 21×51 参考网格）和无文件运行。
//!
//! # 布局
//!
//! - 速度点位于整点 (θ_i, r_j)，i=0..nθ-1, j=0..nr-1
//! - 径向剪切点位于径向半点 (θ_i, r_j + dr/2)，j=0..nr-2
//! - 切向剪切点位于角向半点 (θ_i + dθ/2, r_j)，i=0..nθ-2
//!
//! θ 网格取单元中心布点 θ_i = (i + ½)·π/nθ，cot θ 处处有限。
//! r 网格为节点布点，覆盖 [r_inner, r_outer]，逆半径严格为正。
//!
//! # 边缘处理
//!
//! 域边缘的速度点在缺失一侧重复现存邻居的 GID：
//! - i=0 时西邻 := 东邻；i=nθ-1 时东邻 := 西邻
//! - j=0 时南邻 := 北邻；j=nr-1 时北邻 := 南邻
//!
//! 算子组装遇到相等 GID 时按极点合并规则收缩为单条目。

use crate::connectivity::{MeshConnectivity, StressDofs, StressLabel, VelocityDofs};
use mw_foundation::Scalar;
use std::f64::consts::PI;

/// 结构化极坐标网格描述
#[derive(Debug, Clone, Copy)]
pub struct StructuredPolarGrid {
    /// 角向点数
    pub n_theta: usize,
    /// 径向点数
    pub n_r: usize,
    /// 内边界半径 [m]
    pub r_inner_m: Scalar,
    /// 外边界半径 [m]
    pub r_outer_m: Scalar,
}

impl StructuredPolarGrid {
    /// 创建网格描述
    ///
    /// # Panics
    ///
    /// - 点数少于 3
    /// - 半径非正或内外顺序颠倒
    pub fn new(n_theta: usize, n_r: usize, r_inner_m: Scalar, r_outer_m: Scalar) -> Self {
        assert!(n_theta >= 3, "角向至少 3 个点");
        assert!(n_r >= 3, "径向至少 3 个点");
        assert!(
            r_inner_m > 0.0 && r_inner_m < r_outer_m,
            "半径必须满足 0 < r_inner < r_outer"
        );
        Self {
            n_theta,
            n_r,
            r_inner_m,
            r_outer_m,
        }
    }

    /// 角向间距 [rad]
    #[inline]
    pub fn d_theta(&self) -> Scalar {
        PI / self.n_theta as Scalar
    }

    /// 径向间距 [m]
    #[inline]
    pub fn d_r(&self) -> Scalar {
        (self.r_outer_m - self.r_inner_m) / (self.n_r - 1) as Scalar
    }

    /// 速度点个数
    #[inline]
    pub fn n_velocity(&self) -> usize {
        self.n_theta * self.n_r
    }

    /// 应力点个数（径向剪切 + 切向剪切）
    #[inline]
    pub fn n_stress(&self) -> usize {
        self.n_theta * (self.n_r - 1) + (self.n_theta - 1) * self.n_r
    }

    /// 速度点 GID
    #[inline]
    fn vp_gid(&self, i: usize, j: usize) -> usize {
        j * self.n_theta + i
    }

    /// 径向剪切点 GID（位于 r_j 与 r_{j+1} 之间）
    #[inline]
    fn srp_gid(&self, i: usize, j: usize) -> usize {
        j * self.n_theta + i
    }

    /// 切向剪切点 GID（位于 θ_i 与 θ_{i+1} 之间）
    #[inline]
    fn stp_gid(&self, i: usize, j: usize) -> usize {
        self.n_theta * (self.n_r - 1) + j * (self.n_theta - 1) + i
    }

    /// θ_i [rad]（单元中心布点）
    #[inline]
    fn theta_at(&self, i: usize) -> Scalar {
        (i as Scalar + 0.5) * self.d_theta()
    }

    /// r_j [m]
    #[inline]
    fn r_at(&self, j: usize) -> Scalar {
        self.r_inner_m + j as Scalar * self.d_r()
    }

    /// 生成完整连接关系
    pub fn build(&self) -> MeshConnectivity {
        let nt = self.n_theta;
        let nr = self.n_r;
        let dth = self.d_theta();
        let dr = self.d_r();

        // ------------------------------------------------------------
        // 速度自由度
        // ------------------------------------------------------------
        let n_vp = self.n_velocity();
        let mut v_theta = Vec::with_capacity(n_vp);
        let mut v_inv_r = Vec::with_capacity(n_vp);
        let mut v_axis = Vec::with_capacity(n_vp);
        let mut v_nbrs = Vec::with_capacity(n_vp);
        let mut v_stencil = Vec::with_capacity(n_vp);

        for j in 0..nr {
            for i in 0..nt {
                v_theta.push(self.theta_at(i));
                v_inv_r.push(1.0 / self.r_at(j));
                v_axis.push(i == 0 || i == nt - 1);

                // 缺失侧重复现存邻居 GID，组装时触发合并
                let west = if i > 0 {
                    self.stp_gid(i - 1, j)
                } else {
                    self.stp_gid(i, j)
                };
                let east = if i < nt - 1 {
                    self.stp_gid(i, j)
                } else {
                    self.stp_gid(i - 1, j)
                };
                let north = if j < nr - 1 {
                    self.srp_gid(i, j)
                } else {
                    self.srp_gid(i, j - 1)
                };
                let south = if j > 0 {
                    self.srp_gid(i, j - 1)
                } else {
                    self.srp_gid(i, j)
                };

                v_nbrs.push([west, north, east, south]);
                v_stencil.push([1.0, 1.0, 1.0, 1.0]);
            }
        }

        // ------------------------------------------------------------
        // 应力自由度：先径向剪切，再切向剪切
        // ------------------------------------------------------------
        let n_sp = self.n_stress();
        let mut s_theta = Vec::with_capacity(n_sp);
        let mut s_inv_r = Vec::with_capacity(n_sp);
        let mut s_labels = Vec::with_capacity(n_sp);
        let mut s_nbrs = Vec::with_capacity(n_sp);

        for j in 0..nr - 1 {
            for i in 0..nt {
                s_theta.push(self.theta_at(i));
                s_inv_r.push(1.0 / (self.r_at(j) + 0.5 * dr));
                s_labels.push(StressLabel::RadialShear);
                // [北, 南] = [外侧, 内侧]
                s_nbrs.push([self.vp_gid(i, j + 1), self.vp_gid(i, j)]);
            }
        }
        for j in 0..nr {
            for i in 0..nt - 1 {
                s_theta.push(self.theta_at(i) + 0.5 * dth);
                s_inv_r.push(1.0 / self.r_at(j));
                s_labels.push(StressLabel::TangentialShear);
                // [西, 东]
                s_nbrs.push([self.vp_gid(i, j), self.vp_gid(i + 1, j)]);
            }
        }

        MeshConnectivity {
            velocity: VelocityDofs {
                theta: v_theta,
                inv_radius: v_inv_r,
                on_axis: v_axis,
                neighbors: v_nbrs,
                stencil: v_stencil,
            },
            stress: StressDofs {
                theta: s_theta,
                inv_radius: s_inv_r,
                labels: s_labels,
                neighbors: s_nbrs,
            },
            d_theta: dth,
            d_r: dr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mw_foundation::scalar::{CMB_RADIUS_M, EARTH_RADIUS_M};

    fn reference_grid() -> StructuredPolarGrid {
        StructuredPolarGrid::new(21, 51, CMB_RADIUS_M, EARTH_RADIUS_M)
    }

    #[test]
    fn test_reference_grid_counts() {
        // 21×51 参考网格：1071 个速度点，2070 个应力点
        let grid = reference_grid();
        assert_eq!(grid.n_velocity(), 1071);
        assert_eq!(grid.n_stress(), 2070);

        let mesh = grid.build();
        assert_eq!(mesh.n_velocity(), 1071);
        assert_eq!(mesh.n_stress(), 2070);
        mesh.validate().unwrap();
    }

    #[test]
    fn test_edge_neighbor_duplication() {
        let mesh = reference_grid().build();
        let grid = reference_grid();

        // i=0 的速度点：西邻 == 东邻
        let gid = grid.vp_gid(0, 25);
        let row = mesh.velocity.neighbors[gid];
        assert_eq!(row[0], row[2]);
        assert_ne!(row[1], row[3]);

        // j=0 的速度点：南邻 == 北邻
        let gid = grid.vp_gid(10, 0);
        let row = mesh.velocity.neighbors[gid];
        assert_eq!(row[1], row[3]);
        assert_ne!(row[0], row[2]);

        // 角点：两侧都重复
        let gid = grid.vp_gid(0, 0);
        let row = mesh.velocity.neighbors[gid];
        assert_eq!(row[0], row[2]);
        assert_eq!(row[1], row[3]);

        // 内部点：四个邻居互不相同
        let gid = grid.vp_gid(10, 25);
        let row = mesh.velocity.neighbors[gid];
        assert_ne!(row[0], row[2]);
        assert_ne!(row[1], row[3]);
    }

    #[test]
    fn test_theta_stays_off_axis() {
        // 单元中心布点不触碰 θ=0 和 θ=π，cot θ 处处有限
        let mesh = reference_grid().build();
        for &t in mesh.velocity.theta.iter().chain(mesh.stress.theta.iter()) {
            assert!(t > 0.0 && t < std::f64::consts::PI);
            assert!(t.tan().abs() > 1e-12);
        }
    }

    #[test]
    fn test_inv_radius_positive_and_ordered() {
        let mesh = reference_grid().build();
        for &ir in mesh
            .velocity
            .inv_radius
            .iter()
            .chain(mesh.stress.inv_radius.iter())
        {
            assert!(ir > 0.0);
        }
        assert!((mesh.min_radius() - CMB_RADIUS_M).abs() < 1e-6);
        assert!((mesh.max_radius() - EARTH_RADIUS_M).abs() < 1e-6);
    }

    #[test]
    fn test_stress_neighbor_orientation() {
        let grid = reference_grid();
        let mesh = grid.build();

        // 径向剪切点：北邻在外侧（半径更大 → 逆半径更小）
        let gid = grid.srp_gid(5, 10);
        assert_eq!(mesh.stress.labels[gid], StressLabel::RadialShear);
        let [north, south] = mesh.stress.neighbors[gid];
        assert!(mesh.velocity.inv_radius[north] < mesh.velocity.inv_radius[south]);

        // 切向剪切点：东邻角度更大
        let gid = grid.stp_gid(5, 10);
        assert_eq!(mesh.stress.labels[gid], StressLabel::TangentialShear);
        let [west, east] = mesh.stress.neighbors[gid];
        assert!(mesh.velocity.theta[west] < mesh.velocity.theta[east]);
    }

    #[test]
    fn test_nearest_velocity_gid() {
        let grid = reference_grid();
        let mesh = grid.build();

        // 精确命中某个网格点
        let i = 10;
        let j = 25;
        let theta = (i as f64 + 0.5) * grid.d_theta();
        let r = CMB_RADIUS_M + j as f64 * grid.d_r();
        assert_eq!(mesh.nearest_velocity_gid(theta, r), grid.vp_gid(i, j));
    }
}
