// apps/mw_cli/src/commands/rom.rs

//! 运行降阶模拟命令
//!
//! 装配全阶算子后加载（或随机生成）基矩阵，执行 Galerkin 投影并
//! 推进降阶状态。`project_operators = false` 时降阶算子填零，仅作
//! 推进核计时。

use anyhow::{bail, Context, Result};
use clap::Args;
use mw_io::FileFormat;
use mw_physics::{
    Basis, ForcingSource, Observer, OperatorAssembler, ProjectedOperators, RickerWavelet,
    RomIntegrator, RomIntegratorOptions, sample_periods, StateSnapshotter,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use super::{build_fields, build_mesh, build_wavelet, load_config, resolve_source_gid};

/// 降阶模拟参数
#[derive(Args)]
pub struct RomArgs {
    /// 配置文件路径（JSON）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 覆盖速度侧 ROM 规模
    #[arg(long)]
    pub size_vp: Option<usize>,

    /// 覆盖应力侧 ROM 规模
    #[arg(long)]
    pub size_sp: Option<usize>,

    /// 覆盖输出目录
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// 执行降阶命令
pub fn execute(args: RomArgs) -> Result<()> {
    info!("=== MantleWave 降阶模拟启动 ===");

    let mut config = load_config(&args.config)?;
    config.rom.enabled = true;
    if let Some(r) = args.size_vp {
        config.rom.size_vp = r;
    }
    if let Some(r) = args.size_sp {
        config.rom.size_sp = r;
    }
    if let Some(output) = args.output {
        config.output.directory = output;
    }
    config.validate().context("配置校验失败")?;

    // 全阶装配（投影要求材料折入算子的口径）
    if !config.material_in_operator {
        warn!("降阶运行固定使用材料折入算子的组装口径");
    }
    let mesh = build_mesh(&config)?;
    let fields = build_fields(&mesh)?;
    let ops = OperatorAssembler::new(&mesh, &fields, true)?
        .assemble()
        .context("算子组装失败")?;
    info!(
        "全阶: {} 速度点, {} 应力点, J_vp {} nnz",
        mesh.n_velocity(),
        mesh.n_stress(),
        ops.j_vp.nnz()
    );

    // 基矩阵：文件加载或随机生成
    let (phi_vp, phi_sp) = if config.rom.random_basis {
        info!(
            "随机基: r_vp={}, r_sp={}（仅规模测试）",
            config.rom.size_vp, config.rom.size_sp
        );
        (
            Basis::random(mesh.n_velocity(), config.rom.size_vp, config.sampling.seed),
            Basis::random(mesh.n_stress(), config.rom.size_sp, config.sampling.seed + 1),
        )
    } else {
        let vp_path = config.rom.vp_basis_path.as_ref().expect("已在校验中确认");
        let sp_path = config.rom.sp_basis_path.as_ref().expect("已在校验中确认");
        let phi_vp = Basis::from_matrix(
            mw_io::read_basis(vp_path, FileFormat::from_path(vp_path))
                .with_context(|| format!("加载速度基失败: {}", vp_path.display()))?,
        );
        let phi_sp = Basis::from_matrix(
            mw_io::read_basis(sp_path, FileFormat::from_path(sp_path))
                .with_context(|| format!("加载应力基失败: {}", sp_path.display()))?,
        );
        // 基列数与请求的 ROM 规模不符属维度类错误，循环前致命
        phi_vp.check_dims(mesh.n_velocity(), config.rom.size_vp)?;
        phi_sp.check_dims(mesh.n_stress(), config.rom.size_sp)?;
        info!(
            "基矩阵: Φ_vp {}×{}, Φ_sp {}×{}",
            phi_vp.n_rows(),
            phi_vp.n_cols(),
            phi_sp.n_rows(),
            phi_sp.n_cols()
        );
        (phi_vp, phi_sp)
    };

    // Galerkin 投影（一次）
    let project_start = Instant::now();
    let reduced = if config.rom.project_operators {
        ProjectedOperators::reduce(&ops, &phi_vp, &phi_sp).context("Galerkin 投影失败")?
    } else {
        info!("投影禁用：降阶算子填零（计时模式）");
        ProjectedOperators::disabled(config.rom.size_vp, config.rom.size_sp)
    };
    info!(
        "降阶算子: J_vp_r {}×{}, J_sp_r {}×{}，投影耗时 {:.3} s",
        reduced.j_vp_r.n_rows(),
        reduced.j_vp_r.n_cols(),
        reduced.j_sp_r.n_rows(),
        reduced.j_sp_r.n_cols(),
        project_start.elapsed().as_secs_f64()
    );

    // 震源
    let gid = resolve_source_gid(&config, &mesh);
    if gid >= mesh.n_velocity() {
        bail!("源点 GID {} 超出速度自由度范围 0..{}", gid, mesh.n_velocity());
    }
    let n_real = config.sampling.num_realizations;
    let batch = config.sampling.forcing_size;
    if n_real > 1 && batch != n_real {
        bail!("降阶采样运行要求批宽等于实现总数（一次批量推进）");
    }
    let source = if n_real == 1 {
        ForcingSource::point(gid, build_wavelet(&config))
    } else {
        let wavelets: Vec<RickerWavelet> = sample_periods(
            n_real,
            config.sampling.period_min_s,
            config.sampling.period_max_s,
            config.sampling.seed,
        )
        .into_iter()
        .map(RickerWavelet::from_period)
        .collect();
        ForcingSource::batched(gid, wavelets)
    };
    info!("震源: 速度点 GID {}，{} 个实现", gid, n_real);

    let opts = RomIntegratorOptions {
        dt: config.time.dt,
        n_steps: config.time.n_steps,
        observer_stride: config.output.observer_stride,
    };
    let mut integrator =
        RomIntegrator::new(reduced, &phi_vp, fields.rho_inv[gid], source, opts)
            .context("降阶积分器构造失败")?;

    let mut snapshotter = config
        .output
        .snapshot_stride
        .map(|stride| StateSnapshotter::with_stride(config.rom.size_vp * n_real, stride));

    let start = Instant::now();
    {
        let mut observers: Vec<&mut dyn Observer> = Vec::new();
        if let Some(snap) = snapshotter.as_mut() {
            observers.push(snap);
        }
        integrator.run(&mut observers).context("降阶推进失败")?;
    }
    let elapsed = start.elapsed().as_secs_f64();
    info!(
        "降阶推进: {} 步耗时 {:.3} s（平均 {:.3} ms/步）",
        config.time.n_steps,
        elapsed,
        elapsed / config.time.n_steps as f64 * 1000.0
    );

    // 输出
    std::fs::create_dir_all(&config.output.directory)?;
    let format = if config.output.binary {
        FileFormat::Binary
    } else {
        FileFormat::Text
    };
    let ext = if config.output.binary { "bin" } else { "txt" };

    let final_path = config
        .output
        .directory
        .join(format!("rom_state_vp.{}", ext));
    mw_io::write_array(
        &final_path,
        &[config.rom.size_vp, n_real],
        &integrator.state().x_vp,
        format,
        config.output.write_header,
    )?;
    info!("降阶末态: {}", final_path.display());

    if let Some(snap) = &snapshotter {
        let path = config
            .output
            .directory
            .join(format!("rom_snapshots.{}", ext));
        mw_io::write_array(
            &path,
            &[snap.n_rows(), snap.n_cols()],
            snap.data(),
            format,
            config.output.write_header,
        )?;
        info!("降阶快照: {} ({} × {})", path.display(), snap.n_rows(), snap.n_cols());
    }

    info!("=== 降阶模拟完成 ===");
    Ok(())
}
