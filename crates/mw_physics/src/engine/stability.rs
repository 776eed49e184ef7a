// crates/mw_physics/src/engine/stability.rs

//! 稳定性判据
//!
//! 时间推进开始前的两项检查，任一违反即致命终止
//! （继续推进只会产出数值上无意义的结果）：
//!
//! 1. **CFL 条件**: `vs_max·Δt·sqrt(dr⁻² + (r_min·dθ)⁻²) ≤ 上限`，
//!    角向间距取最内半径处的弧长（全网格最紧处）。
//! 2. **数值频散**: 最短波长 λ_min = vs_min / f_max 内的网格点数
//!    沿径向（dx = dr）与角向（dx = r_min·dθ）均不得低于下限，
//!    f_max 取本次运行震源的最高有效频率。

use crate::material::MaterialFields;
use mw_config::StabilityConfig;
use mw_foundation::{MwError, MwResult, Scalar};
use mw_mesh::MeshConnectivity;

/// 稳定性检查结果（全部通过时返回，供日志汇报）
#[derive(Debug, Clone, Copy)]
pub struct StabilityReport {
    /// 实际 CFL 数
    pub cfl: Scalar,
    /// 径向每最短波长网格点数
    pub ppw_radial: Scalar,
    /// 角向每最短波长网格点数
    pub ppw_angular: Scalar,
    /// 采用的最小剪切波速 [m/s]
    pub vs_min: Scalar,
    /// 采用的最大剪切波速 [m/s]
    pub vs_max: Scalar,
}

/// 执行循环前稳定性检查
///
/// # 参数
///
/// - `mesh`: 网格（提供 dr、dθ 与最小半径）
/// - `fields`: 材料场（提供 vs_min/vs_max）
/// - `dt`: 时间步长 [s]
/// - `max_frequency`: 震源最高有效频率 [Hz]
/// - `config`: 判据阈值
pub fn check_stability(
    mesh: &MeshConnectivity,
    fields: &MaterialFields,
    dt: Scalar,
    max_frequency: Scalar,
    config: &StabilityConfig,
) -> MwResult<StabilityReport> {
    let dx_radial = mesh.d_r;
    let dx_angular = mesh.min_radius() * mesh.d_theta;

    // CFL
    let inv_sq = 1.0 / (dx_radial * dx_radial) + 1.0 / (dx_angular * dx_angular);
    let cfl = fields.vs_max * dt * inv_sq.sqrt();
    if cfl > config.cfl_limit {
        return Err(MwError::stability("CFL", cfl, config.cfl_limit));
    }

    // 频散
    if max_frequency <= 0.0 {
        return Err(MwError::invalid_input(format!(
            "震源最高频率必须为正: {}",
            max_frequency
        )));
    }
    let lambda_min = fields.vs_min / max_frequency;
    let ppw_radial = lambda_min / dx_radial;
    let ppw_angular = lambda_min / dx_angular;

    if ppw_radial < config.min_points_per_wavelength {
        return Err(MwError::stability(
            "径向频散（每波长点数）",
            ppw_radial,
            config.min_points_per_wavelength,
        ));
    }
    if ppw_angular < config.min_points_per_wavelength {
        return Err(MwError::stability(
            "角向频散（每波长点数）",
            ppw_angular,
            config.min_points_per_wavelength,
        ));
    }

    Ok(StabilityReport {
        cfl,
        ppw_radial,
        ppw_angular,
        vs_min: fields.vs_min,
        vs_max: fields.vs_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{LayeredMantle, MaterialFields};
    use mw_foundation::scalar::{CMB_RADIUS_M, EARTH_RADIUS_M};
    use mw_mesh::StructuredPolarGrid;

    fn reference_setup() -> (MeshConnectivity, MaterialFields) {
        let mesh = StructuredPolarGrid::new(21, 51, CMB_RADIUS_M, EARTH_RADIUS_M).build();
        let fields = MaterialFields::build(&mesh, &LayeredMantle::prem_like()).unwrap();
        (mesh, fields)
    }

    #[test]
    fn test_reference_run_passes() {
        // 参考场景：Δt=1.5 s，f0=2e-4 Hz → f_max=5e-4 Hz
        let (mesh, fields) = reference_setup();
        let report =
            check_stability(&mesh, &fields, 1.5, 5.0e-4, &StabilityConfig::default()).unwrap();

        assert!(report.cfl <= 0.28);
        assert!(report.ppw_radial >= 8.0);
        assert!(report.ppw_angular >= 8.0);
        assert!(report.vs_min < report.vs_max);
    }

    #[test]
    fn test_cfl_violation_is_fatal() {
        let (mesh, fields) = reference_setup();
        let err =
            check_stability(&mesh, &fields, 5.0, 5.0e-4, &StabilityConfig::default()).unwrap_err();
        match err {
            MwError::Stability { criterion, .. } => assert_eq!(criterion, "CFL"),
            other => panic!("期望稳定性错误，得到 {:?}", other),
        }
    }

    #[test]
    fn test_dispersion_violation_is_fatal() {
        // 高频震源：角向先违反
        let (mesh, fields) = reference_setup();
        let err =
            check_stability(&mesh, &fields, 1.5, 0.05, &StabilityConfig::default()).unwrap_err();
        assert!(matches!(err, MwError::Stability { .. }));
    }

    #[test]
    fn test_angular_direction_is_binding() {
        // 角向弧长远大于 dr，频散判据由角向先触发：
        // 取恰好满足径向但不满足角向的频率
        let (mesh, fields) = reference_setup();
        let dx_ang = mesh.min_radius() * mesh.d_theta;
        let f = fields.vs_min / (8.0 * dx_ang) * 1.5; // 角向 ppw ≈ 5.3 < 8
        let err = check_stability(&mesh, &fields, 1.5, f, &StabilityConfig::default()).unwrap_err();
        match err {
            MwError::Stability { criterion, .. } => {
                assert!(criterion.contains("角向"));
            }
            other => panic!("期望稳定性错误，得到 {:?}", other),
        }
    }
}
