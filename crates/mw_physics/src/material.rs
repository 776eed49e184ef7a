// crates/mw_physics/src/material.rs

//! 材料模型与材料场
//!
//! - [`MaterialModel`]: 给定物理位置返回密度与剪切波速的抽象
//! - [`LayeredMantle`]: 深度分段线性的地幔剖面
//! - [`MaterialFields`]: 在网格点上采样得到的只读材料数组
//!
//! 材料场在算子结构确定之后一次性构建（组装可选择把材料折入算子），
//! 运行期间不再变化。

use mw_foundation::scalar::EARTH_RADIUS_M;
use mw_foundation::{MwError, MwResult, Scalar};
use mw_mesh::MeshConnectivity;

/// 单点材料采样结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialSample {
    /// 密度 [kg/m³]
    pub density: Scalar,
    /// 剪切波速 [m/s]
    pub shear_velocity: Scalar,
}

/// 材料模型抽象
///
/// 实现者给定 (θ, r) 返回局部密度与剪切波速。轴对称模型通常只依赖
/// 半径，θ 参数保留给侧向非均匀扩展。
pub trait MaterialModel {
    /// 采样指定位置的材料属性
    ///
    /// # 参数
    ///
    /// - `theta`: 角坐标 [rad]
    /// - `radius`: 半径 [m]
    fn sample(&self, theta: Scalar, radius: Scalar) -> MaterialSample;
}

/// 深度分段线性地幔剖面
///
/// 控制点为 (深度 [km], 密度 [kg/m³], 剪切波速 [m/s])，按深度
/// 升序排列；控制点之间线性插值，深度范围外取边界值。
#[derive(Debug, Clone)]
pub struct LayeredMantle {
    /// 控制点（深度升序）
    knots: Vec<(Scalar, Scalar, Scalar)>,
}

impl LayeredMantle {
    /// 从控制点创建剖面
    ///
    /// # Panics
    ///
    /// - 控制点为空
    /// - 深度非严格升序
    pub fn new(knots: Vec<(Scalar, Scalar, Scalar)>) -> Self {
        assert!(!knots.is_empty(), "剖面至少需要一个控制点");
        for w in knots.windows(2) {
            assert!(w[1].0 > w[0].0, "控制点深度必须严格升序");
        }
        Self { knots }
    }

    /// PREM 风格的参考地幔剖面
    pub fn prem_like() -> Self {
        Self::new(vec![
            // (深度 km, 密度 kg/m³, vs m/s)
            (0.0, 2900.0, 3200.0),
            (400.0, 3540.0, 4870.0),
            (670.0, 3990.0, 5570.0),
            (2891.0, 5570.0, 7260.0),
        ])
    }
}

impl MaterialModel for LayeredMantle {
    fn sample(&self, _theta: Scalar, radius: Scalar) -> MaterialSample {
        let depth_km = (EARTH_RADIUS_M - radius) / 1000.0;

        let first = self.knots[0];
        let last = *self.knots.last().unwrap();
        if depth_km <= first.0 {
            return MaterialSample {
                density: first.1,
                shear_velocity: first.2,
            };
        }
        if depth_km >= last.0 {
            return MaterialSample {
                density: last.1,
                shear_velocity: last.2,
            };
        }

        // 定位所在分段并线性插值
        for w in self.knots.windows(2) {
            let (d0, rho0, vs0) = w[0];
            let (d1, rho1, vs1) = w[1];
            if depth_km <= d1 {
                let t = (depth_km - d0) / (d1 - d0);
                return MaterialSample {
                    density: rho0 + t * (rho1 - rho0),
                    shear_velocity: vs0 + t * (vs1 - vs0),
                };
            }
        }
        unreachable!("深度已被边界分支覆盖")
    }
}

/// 网格点上的材料场
///
/// 速度点存逆密度 ρ⁻¹，应力点存剪切模量 μ = ρ·vs²。
/// 同时记录采样到的剪切波速最小/最大值，供稳定性检查使用。
#[derive(Debug, Clone)]
pub struct MaterialFields {
    /// 速度点逆密度 [m³/kg]
    pub rho_inv: Vec<Scalar>,
    /// 应力点剪切模量 [Pa]
    pub shear_modulus: Vec<Scalar>,
    /// 最小剪切波速 [m/s]
    pub vs_min: Scalar,
    /// 最大剪切波速 [m/s]
    pub vs_max: Scalar,
}

impl MaterialFields {
    /// 在网格点上采样材料模型
    pub fn build(mesh: &MeshConnectivity, model: &dyn MaterialModel) -> MwResult<Self> {
        let n_vp = mesh.n_velocity();
        let n_sp = mesh.n_stress();

        let mut rho_inv = Vec::with_capacity(n_vp);
        let mut shear_modulus = Vec::with_capacity(n_sp);
        let mut vs_min = Scalar::INFINITY;
        let mut vs_max = 0.0;

        for gid in 0..n_vp {
            let theta = mesh.velocity.theta[gid];
            let radius = 1.0 / mesh.velocity.inv_radius[gid];
            let s = model.sample(theta, radius);
            if s.density <= 0.0 || s.shear_velocity <= 0.0 {
                return Err(MwError::invalid_input(format!(
                    "材料采样非正: 速度点 {} 处 ρ={}, vs={}",
                    gid, s.density, s.shear_velocity
                )));
            }
            rho_inv.push(1.0 / s.density);
            vs_min = vs_min.min(s.shear_velocity);
            vs_max = Scalar::max(vs_max, s.shear_velocity);
        }

        for gid in 0..n_sp {
            let theta = mesh.stress.theta[gid];
            let radius = 1.0 / mesh.stress.inv_radius[gid];
            let s = model.sample(theta, radius);
            if s.density <= 0.0 || s.shear_velocity <= 0.0 {
                return Err(MwError::invalid_input(format!(
                    "材料采样非正: 应力点 {} 处 ρ={}, vs={}",
                    gid, s.density, s.shear_velocity
                )));
            }
            shear_modulus.push(s.density * s.shear_velocity * s.shear_velocity);
            vs_min = vs_min.min(s.shear_velocity);
            vs_max = Scalar::max(vs_max, s.shear_velocity);
        }

        Ok(Self {
            rho_inv,
            shear_modulus,
            vs_min,
            vs_max,
        })
    }

    /// 均匀材料场（测试用）
    pub fn uniform(n_vp: usize, n_sp: usize, density: Scalar, vs: Scalar) -> Self {
        Self {
            rho_inv: vec![1.0 / density; n_vp],
            shear_modulus: vec![density * vs * vs; n_sp],
            vs_min: vs,
            vs_max: vs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mw_foundation::scalar::CMB_RADIUS_M;
    use mw_mesh::StructuredPolarGrid;

    #[test]
    fn test_prem_like_endpoints() {
        let model = LayeredMantle::prem_like();

        // 地表
        let s = model.sample(1.0, EARTH_RADIUS_M);
        assert!((s.shear_velocity - 3200.0).abs() < 1e-9);

        // 核幔边界（深度 2891 km）
        let s = model.sample(1.0, CMB_RADIUS_M);
        assert!((s.shear_velocity - 7260.0).abs() < 1.0);
    }

    #[test]
    fn test_prem_like_interpolates() {
        let model = LayeredMantle::prem_like();
        // 200 km 深度位于 0..400 段中点
        let s = model.sample(1.0, EARTH_RADIUS_M - 200_000.0);
        assert!((s.shear_velocity - 0.5 * (3200.0 + 4870.0)).abs() < 1e-6);
        assert!((s.density - 0.5 * (2900.0 + 3540.0)).abs() < 1e-6);
    }

    #[test]
    fn test_fields_build_dimensions_and_extrema() {
        let mesh = StructuredPolarGrid::new(9, 11, CMB_RADIUS_M, EARTH_RADIUS_M).build();
        let model = LayeredMantle::prem_like();
        let fields = MaterialFields::build(&mesh, &model).unwrap();

        assert_eq!(fields.rho_inv.len(), mesh.n_velocity());
        assert_eq!(fields.shear_modulus.len(), mesh.n_stress());
        assert!(fields.vs_min >= 3200.0 - 1e-9);
        assert!(fields.vs_max <= 7260.0 + 1e-9);
        assert!(fields.vs_min < fields.vs_max);
    }

    #[test]
    fn test_uniform_fields() {
        let fields = MaterialFields::uniform(4, 6, 3000.0, 5000.0);
        assert!((fields.rho_inv[0] - 1.0 / 3000.0).abs() < 1e-18);
        assert!((fields.shear_modulus[0] - 3000.0 * 25.0e6).abs() < 1e-3);
        assert!((fields.vs_min - fields.vs_max).abs() < 1e-12);
    }
}
