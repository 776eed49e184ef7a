// apps/mw_cli/src/commands/mod.rs

//! 子命令实现与公共装配逻辑

pub mod info;
pub mod rom;
pub mod run;

use anyhow::{Context, Result};
use mw_config::SimulationConfig;
use mw_foundation::scalar::KM_TO_M;
use mw_foundation::Scalar;
use mw_mesh::{load_mesh_dir, MeshConnectivity, StructuredPolarGrid};
use mw_physics::{LayeredMantle, MaterialFields, RickerWavelet};
use std::path::PathBuf;

/// 加载配置文件，未给路径时取默认配置
pub fn load_config(path: &Option<PathBuf>) -> Result<SimulationConfig> {
    let config = match path {
        Some(p) => SimulationConfig::from_file(p)
            .with_context(|| format!("加载配置失败: {}", p.display()))?,
        None => SimulationConfig::default(),
    };
    config.validate().context("配置校验失败")?;
    Ok(config)
}

/// 按配置构建网格：给了网格目录则加载，否则用结构化生成器
pub fn build_mesh(config: &SimulationConfig) -> Result<MeshConnectivity> {
    let mesh = match &config.grid.mesh_dir {
        Some(dir) => load_mesh_dir(dir)
            .with_context(|| format!("加载网格目录失败: {}", dir.display()))?,
        None => StructuredPolarGrid::new(
            config.grid.n_theta,
            config.grid.n_r,
            config.grid.r_inner_km * KM_TO_M,
            config.grid.r_outer_km * KM_TO_M,
        )
        .build(),
    };
    Ok(mesh)
}

/// 构建材料场（参考地幔剖面）
pub fn build_fields(mesh: &MeshConnectivity) -> Result<MaterialFields> {
    MaterialFields::build(mesh, &LayeredMantle::prem_like()).context("材料场采样失败")
}

/// 解析震源所在速度点 GID：显式 GID 优先，否则按物理位置映射
pub fn resolve_source_gid(config: &SimulationConfig, mesh: &MeshConnectivity) -> usize {
    match config.source.gid {
        Some(gid) => gid,
        None => {
            let theta = config.source.angle_deg.to_radians();
            let radius =
                config.grid.r_outer_km * KM_TO_M - config.source.depth_km * KM_TO_M;
            mesh.nearest_velocity_gid(theta, radius)
        }
    }
}

/// 按配置构建单源子波
pub fn build_wavelet(config: &SimulationConfig) -> RickerWavelet {
    let f0: Scalar = config.source.peak_frequency_hz;
    match config.source.delay_s {
        Some(t0) => RickerWavelet::with_delay(f0, t0),
        None => RickerWavelet::new(f0),
    }
}
