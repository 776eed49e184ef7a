// apps/mw_cli/src/commands/info.rs

//! 显示信息命令
//!
//! 按配置装配网格与算子，打印规模、材料范围与稳定性判据数值，
//! 不执行时间推进。用于正式运行前核对参数。

use anyhow::{Context, Result};
use clap::Args;
use mw_physics::{check_stability, OperatorAssembler};
use std::path::PathBuf;
use tracing::info;

use super::{build_fields, build_mesh, build_wavelet, load_config, resolve_source_gid};

/// 信息参数
#[derive(Args)]
pub struct InfoArgs {
    /// 配置文件路径（JSON）
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    let config = load_config(&args.config)?;

    let mesh = build_mesh(&config)?;
    info!("网格: {} 速度点, {} 应力点", mesh.n_velocity(), mesh.n_stress());
    info!(
        "间距: dθ={:.5} rad, dr={:.1} m; 半径 ∈ [{:.1}, {:.1}] km",
        mesh.d_theta,
        mesh.d_r,
        mesh.min_radius() / 1000.0,
        mesh.max_radius() / 1000.0
    );

    let fields = build_fields(&mesh)?;
    info!(
        "材料: vs ∈ [{:.0}, {:.0}] m/s",
        fields.vs_min, fields.vs_max
    );

    let ops = OperatorAssembler::new(&mesh, &fields, config.material_in_operator)?
        .assemble()
        .context("算子组装失败")?;
    info!(
        "算子: J_vp {}×{} ({} nnz, ‖·‖∞={:.3e}), J_sp {}×{} ({} nnz, ‖·‖∞={:.3e})",
        ops.j_vp.n_rows(),
        ops.j_vp.n_cols(),
        ops.j_vp.nnz(),
        ops.j_vp.infinity_norm(),
        ops.j_sp.n_rows(),
        ops.j_sp.n_cols(),
        ops.j_sp.nnz(),
        ops.j_sp.infinity_norm()
    );

    let gid = resolve_source_gid(&config, &mesh);
    let wavelet = build_wavelet(&config);
    info!(
        "震源: 速度点 GID {}, f0={:.3e} Hz, t0={:.1} s",
        gid,
        wavelet.peak_frequency(),
        wavelet.delay()
    );

    match check_stability(
        &mesh,
        &fields,
        config.time.dt,
        wavelet.max_frequency(),
        &config.stability,
    ) {
        Ok(report) => info!(
            "稳定性: CFL={:.4} (≤{}), 径向 ppw={:.1}, 角向 ppw={:.1} (≥{})",
            report.cfl,
            config.stability.cfl_limit,
            report.ppw_radial,
            report.ppw_angular,
            config.stability.min_points_per_wavelength
        ),
        Err(e) => info!("稳定性: 不满足 — {}", e),
    }

    if config.rom.enabled {
        info!(
            "ROM: r_vp={}, r_sp={}, 随机基={}, 投影={}",
            config.rom.size_vp,
            config.rom.size_sp,
            config.rom.random_basis,
            config.rom.project_operators
        );
    }

    Ok(())
}
