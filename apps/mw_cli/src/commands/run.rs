// apps/mw_cli/src/commands/run.rs

//! 运行全阶模拟命令
//!
//! 装配网格、材料场、算子与震源，执行蛙跳推进并写出地震图/快照。
//! rank-2 采样运行按批宽分批，每批构造新的强迫源并重置状态。

use anyhow::{Context, Result};
use clap::Args;
use mw_io::FileFormat;
use mw_physics::{
    ForcingSource, FomIntegrator, IntegratorOptions, MaterialMode, Observer, OperatorAssembler,
    RickerWavelet, SeismogramRecorder, StateSnapshotter, sample_periods,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use super::{build_fields, build_mesh, build_wavelet, load_config, resolve_source_gid};

/// 运行模拟参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径（JSON）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 覆盖时间步长 [s]
    #[arg(long)]
    pub dt: Option<f64>,

    /// 覆盖总步数
    #[arg(long)]
    pub steps: Option<usize>,

    /// 覆盖输出目录
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== MantleWave 全阶模拟启动 ===");

    let mut config = load_config(&args.config)?;
    if let Some(dt) = args.dt {
        config.time.dt = dt;
    }
    if let Some(steps) = args.steps {
        config.time.n_steps = steps;
    }
    if let Some(output) = args.output {
        config.output.directory = output;
    }
    config.validate().context("配置校验失败")?;

    // 装配
    let mesh = build_mesh(&config)?;
    info!(
        "网格: {} 速度点, {} 应力点 (dθ={:.4} rad, dr={:.1} m)",
        mesh.n_velocity(),
        mesh.n_stress(),
        mesh.d_theta,
        mesh.d_r
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
        "算子: J_vp {}×{} ({} nnz), J_sp {}×{} ({} nnz)",
        ops.j_vp.n_rows(),
        ops.j_vp.n_cols(),
        ops.j_vp.nnz(),
        ops.j_sp.n_rows(),
        ops.j_sp.n_cols(),
        ops.j_sp.nnz()
    );

    let gid = resolve_source_gid(&config, &mesh);
    info!("震源: 速度点 GID {}", gid);

    let mode = if config.material_in_operator {
        MaterialMode::InOperator
    } else {
        MaterialMode::Factored
    };
    let opts = IntegratorOptions {
        dt: config.time.dt,
        n_steps: config.time.n_steps,
        mode,
        exploit_forcing_sparsity: config.exploit_forcing_sparsity,
        observer_stride: config.output.observer_stride,
        stability: config.stability.clone(),
    };

    std::fs::create_dir_all(&config.output.directory)?;
    let format = if config.output.binary {
        FileFormat::Binary
    } else {
        FileFormat::Text
    };

    let start = Instant::now();
    let n_real = config.sampling.num_realizations;
    let batch = config.sampling.forcing_size;

    if n_real == 1 {
        // rank-1 单源运行
        let source = ForcingSource::point(gid, build_wavelet(&config));
        run_once(&mesh, &ops, &fields, source, opts, &config, format, None)?;
    } else {
        // rank-2 采样：周期采样一次，按批宽分批运行
        let periods = sample_periods(
            n_real,
            config.sampling.period_min_s,
            config.sampling.period_max_s,
            config.sampling.seed,
        );
        info!(
            "采样: {} 个实现，批宽 {}，周期 ∈ [{:.0}, {:.0}] s",
            n_real, batch, config.sampling.period_min_s, config.sampling.period_max_s
        );

        for (batch_idx, chunk) in periods.chunks(batch).enumerate() {
            let wavelets: Vec<RickerWavelet> =
                chunk.iter().map(|&p| RickerWavelet::from_period(p)).collect();
            let source = ForcingSource::batched(gid, wavelets);
            run_once(
                &mesh,
                &ops,
                &fields,
                source,
                opts.clone(),
                &config,
                format,
                Some(batch_idx),
            )?;
        }
    }

    info!("=== 模拟完成，总耗时 {:.2} s ===", start.elapsed().as_secs_f64());
    Ok(())
}

/// 执行一次（单批）推进并写出观测结果
#[allow(clippy::too_many_arguments)]
fn run_once(
    mesh: &mw_mesh::MeshConnectivity,
    ops: &mw_physics::AssembledOperators,
    fields: &mw_physics::MaterialFields,
    source: ForcingSource,
    opts: IntegratorOptions,
    config: &mw_config::SimulationConfig,
    format: FileFormat,
    batch_idx: Option<usize>,
) -> Result<()> {
    let n_real = source.n_real();
    let mut integrator = FomIntegrator::new(mesh, ops, fields, source, opts)
        .context("积分器构造失败")?;

    let mut recorder = if config.output.receiver_gids.is_empty() {
        warn!("未配置接收点，跳过地震图记录");
        None
    } else {
        for &gid in &config.output.receiver_gids {
            if gid >= mesh.n_velocity() {
                anyhow::bail!(
                    "接收点 GID {} 超出速度自由度范围 0..{}",
                    gid,
                    mesh.n_velocity()
                );
            }
        }
        Some(SeismogramRecorder::new(
            config.output.receiver_gids.clone(),
            n_real,
        ))
    };
    let mut snapshotter = config
        .output
        .snapshot_stride
        .map(|stride| StateSnapshotter::with_stride(mesh.n_velocity() * n_real, stride));

    let report = {
        let mut observers: Vec<&mut dyn Observer> = Vec::new();
        if let Some(rec) = recorder.as_mut() {
            observers.push(rec);
        }
        if let Some(snap) = snapshotter.as_mut() {
            observers.push(snap);
        }
        integrator.run(&mut observers).context("时间推进失败")?
    };

    info!(
        "稳定性: CFL={:.4}, 径向 ppw={:.1}, 角向 ppw={:.1}, vs ∈ [{:.0}, {:.0}] m/s",
        report.cfl, report.ppw_radial, report.ppw_angular, report.vs_min, report.vs_max
    );

    let suffix = |stem: &str, ext: &str| match batch_idx {
        Some(i) => format!("{}_batch{}.{}", stem, i, ext),
        None => format!("{}.{}", stem, ext),
    };
    let ext = if config.output.binary { "bin" } else { "txt" };

    if let Some(rec) = &recorder {
        let path = config.output.directory.join(suffix("seismogram", ext));
        mw_io::write_seismogram(&path, rec, format, config.output.write_header)?;
        info!(
            "地震图: {} ({} 接收点 × {} 采样 × {} 实现)",
            path.display(),
            rec.n_receivers(),
            rec.n_samples(),
            rec.n_real()
        );
    }
    if let Some(snap) = &snapshotter {
        let path = config.output.directory.join(suffix("snapshots", ext));
        mw_io::write_array(
            &path,
            &[snap.n_rows(), snap.n_cols()],
            snap.data(),
            format,
            config.output.write_header,
        )?;
        info!("快照: {} ({} × {})", path.display(), snap.n_rows(), snap.n_cols());
    }

    Ok(())
}
