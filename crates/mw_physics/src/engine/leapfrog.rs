// crates/mw_physics/src/engine/leapfrog.rs

//! 全阶蛙跳时间推进
//!
//! 速度与应力交错更新，每步内核顺序固定：
//! 矩阵乘 → 强迫累加 → 矩阵乘 → 观测读取，
//! 每个写状态的内核之后、下一个读它的内核之前存在同步栅栏
//! （rayon 作用域的结束即栅栏）。时间步之间严格串行。
//!
//! # 两种材料模式
//!
//! **模式 A（材料折入算子）**，每步 t = 1..N：
//! 1. 取 t·Δt 时刻强迫信号 f
//! 2. `x_vp += Δt · J_vp · x_sp`（稀疏矩阵乘累加）
//! 3. 强迫累加：点源走 O(1) 路径 `x_vp[gid] += Δt·ρ⁻¹(gid)·f`，
//!    否则全向量 `x_vp += Δt · ρ⁻¹ ⊙ f`
//! 4. `x_sp += Δt · J_sp · x_vp`
//! 5. 向观测者报告（步后只读）
//!
//! **模式 B（材料析出）**，原始空间导数要在矩阵乘之后再与材料缩放
//! 组合，需要辅助缓冲：
//! 1. `f_aux = J_vp · x_sp`（系数 1，非 Δt）
//! 2. `f_aux += f`（未缩放的原始强迫）
//! 3. `x_vp += Δt · ρ⁻¹ ⊙ f_aux`
//! 4. `x_sp += Δt · μ ⊙ (J_sp · x_vp)`（应力侧对称地经辅助缓冲）
//!
//! 两种模式的浮点运算次序不同，舍入结果不可互换；一次运行内只用
//! 其中一种，模式与算子的组装口径在构造时校验一致。
//!
//! # rank-2 批量
//!
//! 状态带实现维后，矩阵乘变为稀疏 × 稠密批量积，强迫累加变为
//! 沿批维的逐实现并行累加。

use crate::engine::observer::Observer;
use crate::engine::stability::{check_stability, StabilityReport};
use crate::forcing::ForcingSource;
use crate::material::MaterialFields;
use crate::operators::AssembledOperators;
use crate::state::WaveState;
use mw_config::StabilityConfig;
use mw_foundation::{MwError, MwResult, Scalar};
use mw_mesh::MeshConnectivity;
use rayon::prelude::*;
use tracing::debug;

/// 材料模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialMode {
    /// 模式 A：ρ⁻¹/μ 已折入算子
    InOperator,
    /// 模式 B：算子为纯空间导数，材料在推进时逐元素施加
    Factored,
}

/// 积分器选项（普通值结构体）
#[derive(Debug, Clone)]
pub struct IntegratorOptions {
    /// 时间步长 [s]
    pub dt: Scalar,
    /// 总步数
    pub n_steps: usize,
    /// 材料模式
    pub mode: MaterialMode,
    /// 是否利用点源稀疏性
    pub exploit_forcing_sparsity: bool,
    /// 观测步距
    pub observer_stride: usize,
    /// 稳定性判据阈值
    pub stability: StabilityConfig,
}

/// 全阶蛙跳积分器
///
/// 独占持有状态向量；每次 `run` 开始时状态清零，跨运行不共享
/// 可变状态，多次采样运行各自构造新的强迫源即可。
#[derive(Debug)]
pub struct FomIntegrator<'a> {
    mesh: &'a MeshConnectivity,
    ops: &'a AssembledOperators,
    fields: &'a MaterialFields,
    source: ForcingSource,
    opts: IntegratorOptions,
    state: WaveState,
    /// 当前时刻各实现的信号值
    signal: Vec<Scalar>,
    /// 稠密强迫缓冲（仅非稀疏路径分配）
    f_dense: Vec<Scalar>,
    /// 模式 B 速度侧辅助缓冲
    aux_vp: Vec<Scalar>,
    /// 模式 B 应力侧辅助缓冲
    aux_sp: Vec<Scalar>,
}

impl<'a> FomIntegrator<'a> {
    /// 创建积分器
    ///
    /// 维度与口径一致性在此全部前置校验（致命）：
    /// - 算子尺寸与网格/材料场匹配
    /// - 源点 GID 在速度自由度范围内
    /// - 材料模式与算子组装口径一致
    pub fn new(
        mesh: &'a MeshConnectivity,
        ops: &'a AssembledOperators,
        fields: &'a MaterialFields,
        source: ForcingSource,
        opts: IntegratorOptions,
    ) -> MwResult<Self> {
        let n_vp = mesh.n_velocity();
        let n_sp = mesh.n_stress();

        MwError::check_size("J_vp 行数", n_vp, ops.j_vp.n_rows())?;
        MwError::check_size("J_vp 列数", n_sp, ops.j_vp.n_cols())?;
        MwError::check_size("J_sp 行数", n_sp, ops.j_sp.n_rows())?;
        MwError::check_size("J_sp 列数", n_vp, ops.j_sp.n_cols())?;
        MwError::check_size("rho_inv", n_vp, fields.rho_inv.len())?;
        MwError::check_size("shear_modulus", n_sp, fields.shear_modulus.len())?;
        source.validate(n_vp)?;

        if opts.dt <= 0.0 {
            return Err(MwError::out_of_range("dt", opts.dt, 0.0, Scalar::INFINITY));
        }
        if opts.observer_stride == 0 {
            return Err(MwError::invalid_input("观测步距必须大于 0"));
        }

        let expect_material = matches!(opts.mode, MaterialMode::InOperator);
        if ops.material_in_operator != expect_material {
            return Err(MwError::config(format!(
                "材料模式与算子组装口径不一致: 模式 {:?}，算子折入材料 = {}",
                opts.mode, ops.material_in_operator
            )));
        }

        let n_real = source.n_real();
        let needs_dense = !opts.exploit_forcing_sparsity;
        let is_factored = matches!(opts.mode, MaterialMode::Factored);

        Ok(Self {
            mesh,
            ops,
            fields,
            source,
            opts,
            state: WaveState::with_batch(n_vp, n_sp, n_real),
            signal: vec![0.0; n_real],
            f_dense: if needs_dense {
                vec![0.0; n_vp * n_real]
            } else {
                Vec::new()
            },
            aux_vp: if is_factored {
                vec![0.0; n_vp * n_real]
            } else {
                Vec::new()
            },
            aux_sp: if is_factored {
                vec![0.0; n_sp * n_real]
            } else {
                Vec::new()
            },
        })
    }

    /// 当前状态（只读）
    #[inline]
    pub fn state(&self) -> &WaveState {
        &self.state
    }

    /// 强迫源（只读）
    #[inline]
    pub fn source(&self) -> &ForcingSource {
        &self.source
    }

    /// 执行完整时间推进
    ///
    /// 先做循环前稳定性检查（违反即致命），随后状态清零并推进
    /// `n_steps` 步；每 `observer_stride` 步向观测者报告一次。
    pub fn run(&mut self, observers: &mut [&mut dyn Observer]) -> MwResult<StabilityReport> {
        let report = check_stability(
            self.mesh,
            self.fields,
            self.opts.dt,
            self.source.max_frequency(),
            &self.opts.stability,
        )?;
        debug!(
            "稳定性检查通过: CFL={:.4}, 径向 ppw={:.1}, 角向 ppw={:.1}",
            report.cfl, report.ppw_radial, report.ppw_angular
        );

        self.state.reset();

        for step in 1..=self.opts.n_steps {
            let t = step as Scalar * self.opts.dt;
            match self.opts.mode {
                MaterialMode::InOperator => self.advance_in_operator(t),
                MaterialMode::Factored => self.advance_factored(t),
            }

            if step % self.opts.observer_stride == 0 {
                for obs in observers.iter_mut() {
                    obs.observe(step, t, &self.state);
                }
            }
        }

        Ok(report)
    }

    /// 模式 A 推进一步
    fn advance_in_operator(&mut self, t: Scalar) {
        let dt = self.opts.dt;
        let n_real = self.state.n_real();

        // x_vp += Δt · J_vp · x_sp
        if n_real == 1 {
            self.ops
                .j_vp
                .mul_vec_add_parallel(dt, &self.state.x_sp, &mut self.state.x_vp);
        } else {
            self.ops
                .j_vp
                .mul_batch_add(dt, &self.state.x_sp, n_real, &mut self.state.x_vp);
        }

        // 强迫累加（模式 A 在 Δt 缩放的矩阵乘之后加入）
        self.source.values_at(t, &mut self.signal);
        if self.opts.exploit_forcing_sparsity {
            let gid = self.source.gid();
            let scale = dt * self.fields.rho_inv[gid];
            let slot = &mut self.state.x_vp[gid * n_real..(gid + 1) * n_real];
            if n_real == 1 {
                slot[0] += scale * self.signal[0];
            } else {
                // 沿批维的逐实现并行累加
                slot.par_iter_mut()
                    .zip(self.signal.par_iter())
                    .for_each(|(x, &f)| *x += scale * f);
            }
        } else {
            self.source.fill_dense(&self.signal, &mut self.f_dense);
            let rho_inv = &self.fields.rho_inv;
            let f = &self.f_dense;
            self.state
                .x_vp
                .par_chunks_mut(n_real)
                .enumerate()
                .for_each(|(dof, chunk)| {
                    let scale = dt * rho_inv[dof];
                    let src = &f[dof * n_real..][..n_real];
                    for k in 0..n_real {
                        chunk[k] += scale * src[k];
                    }
                });
        }

        // x_sp += Δt · J_sp · x_vp
        if n_real == 1 {
            self.ops
                .j_sp
                .mul_vec_add_parallel(dt, &self.state.x_vp, &mut self.state.x_sp);
        } else {
            self.ops
                .j_sp
                .mul_batch_add(dt, &self.state.x_vp, n_real, &mut self.state.x_sp);
        }
    }

    /// 模式 B 推进一步
    fn advance_factored(&mut self, t: Scalar) {
        let dt = self.opts.dt;
        let n_real = self.state.n_real();

        // f_aux = J_vp · x_sp（系数 1）
        self.aux_vp.fill(0.0);
        if n_real == 1 {
            self.ops
                .j_vp
                .mul_vec_add_parallel(1.0, &self.state.x_sp, &mut self.aux_vp);
        } else {
            self.ops
                .j_vp
                .mul_batch_add(1.0, &self.state.x_sp, n_real, &mut self.aux_vp);
        }

        // f_aux += f（未缩放强迫，在 Δt·ρ⁻¹ 之前加入）
        self.source.values_at(t, &mut self.signal);
        if self.opts.exploit_forcing_sparsity {
            let base = self.source.gid() * n_real;
            for k in 0..n_real {
                self.aux_vp[base + k] += self.signal[k];
            }
        } else {
            self.source.fill_dense(&self.signal, &mut self.f_dense);
            self.aux_vp
                .par_iter_mut()
                .zip(self.f_dense.par_iter())
                .for_each(|(a, &f)| *a += f);
        }

        // x_vp += Δt · ρ⁻¹ ⊙ f_aux
        let rho_inv = &self.fields.rho_inv;
        let aux_vp = &self.aux_vp;
        self.state
            .x_vp
            .par_chunks_mut(n_real)
            .enumerate()
            .for_each(|(dof, chunk)| {
                let scale = dt * rho_inv[dof];
                let src = &aux_vp[dof * n_real..][..n_real];
                for k in 0..n_real {
                    chunk[k] += scale * src[k];
                }
            });

        // x_sp += Δt · μ ⊙ (J_sp · x_vp)
        self.aux_sp.fill(0.0);
        if n_real == 1 {
            self.ops
                .j_sp
                .mul_vec_add_parallel(1.0, &self.state.x_vp, &mut self.aux_sp);
        } else {
            self.ops
                .j_sp
                .mul_batch_add(1.0, &self.state.x_vp, n_real, &mut self.aux_sp);
        }
        let mu = &self.fields.shear_modulus;
        let aux_sp = &self.aux_sp;
        self.state
            .x_sp
            .par_chunks_mut(n_real)
            .enumerate()
            .for_each(|(dof, chunk)| {
                let scale = dt * mu[dof];
                let src = &aux_sp[dof * n_real..][..n_real];
                for k in 0..n_real {
                    chunk[k] += scale * src[k];
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::observer::SeismogramRecorder;
    use crate::forcing::RickerWavelet;
    use crate::material::{LayeredMantle, MaterialFields};
    use crate::operators::OperatorAssembler;
    use mw_foundation::scalar::{CMB_RADIUS_M, EARTH_RADIUS_M};
    use mw_mesh::StructuredPolarGrid;

    fn reference_setup() -> (MeshConnectivity, MaterialFields) {
        let mesh = StructuredPolarGrid::new(21, 51, CMB_RADIUS_M, EARTH_RADIUS_M).build();
        let fields = MaterialFields::build(&mesh, &LayeredMantle::prem_like()).unwrap();
        (mesh, fields)
    }

    fn default_opts(mode: MaterialMode) -> IntegratorOptions {
        IntegratorOptions {
            dt: 1.5,
            n_steps: 100,
            mode,
            exploit_forcing_sparsity: true,
            observer_stride: 1,
            stability: StabilityConfig::default(),
        }
    }

    fn reference_source(mesh: &MeshConnectivity) -> ForcingSource {
        // 深度 640 km、θ=90° 的点源，f0 = 2e-4 Hz
        let gid = mesh.nearest_velocity_gid(
            std::f64::consts::FRAC_PI_2,
            EARTH_RADIUS_M - 640_000.0,
        );
        ForcingSource::point(gid, RickerWavelet::new(2.0e-4))
    }

    #[test]
    fn test_end_to_end_reference_run() {
        // 21×51 网格，Δt=1.5，100 步：稳定性检查通过，汇报材料波速范围
        let (mesh, fields) = reference_setup();
        let ops = OperatorAssembler::new(&mesh, &fields, true)
            .unwrap()
            .assemble()
            .unwrap();
        let source = reference_source(&mesh);

        let mut integrator = FomIntegrator::new(
            &mesh,
            &ops,
            &fields,
            source,
            default_opts(MaterialMode::InOperator),
        )
        .unwrap();

        let report = integrator.run(&mut []).unwrap();
        assert!(report.cfl <= 0.28);
        assert!((report.vs_min - fields.vs_min).abs() < 1e-12);
        assert!((report.vs_max - fields.vs_max).abs() < 1e-12);

        // 波场被激发且保持有限
        assert!(integrator.state().is_finite());
        assert!(integrator.state().max_abs() > 0.0);
    }

    #[test]
    fn test_zero_forcing_keeps_state_exactly_zero() {
        // 子波时延远在时窗之外，信号值下溢为精确零：
        // 零强迫 + 零初值 ⇒ 全程精确零（无伪源）
        let (mesh, fields) = reference_setup();
        let ops = OperatorAssembler::new(&mesh, &fields, true)
            .unwrap()
            .assemble()
            .unwrap();
        let source = ForcingSource::point(100, RickerWavelet::with_delay(2.0e-4, 1.0e12));

        for sparsity in [true, false] {
            let mut opts = default_opts(MaterialMode::InOperator);
            opts.exploit_forcing_sparsity = sparsity;
            let mut integrator =
                FomIntegrator::new(&mesh, &ops, &fields, source.clone(), opts).unwrap();
            integrator.run(&mut []).unwrap();

            for &v in integrator
                .state()
                .x_vp
                .iter()
                .chain(integrator.state().x_sp.iter())
            {
                assert_eq!(v, 0.0, "零强迫下状态必须保持精确零");
            }
        }
    }

    #[test]
    fn test_modes_agree_to_rounding() {
        // 模式 A 与模式 B 的浮点次序不同，结果只要求在舍入级别一致
        let (mesh, fields) = reference_setup();
        let source = reference_source(&mesh);

        let ops_a = OperatorAssembler::new(&mesh, &fields, true)
            .unwrap()
            .assemble()
            .unwrap();
        let mut int_a = FomIntegrator::new(
            &mesh,
            &ops_a,
            &fields,
            source.clone(),
            default_opts(MaterialMode::InOperator),
        )
        .unwrap();
        int_a.run(&mut []).unwrap();

        let ops_b = OperatorAssembler::new(&mesh, &fields, false)
            .unwrap()
            .assemble()
            .unwrap();
        let mut int_b = FomIntegrator::new(
            &mesh,
            &ops_b,
            &fields,
            source,
            default_opts(MaterialMode::Factored),
        )
        .unwrap();
        int_b.run(&mut []).unwrap();

        let scale = int_a.state().max_abs().max(1e-30);
        for (a, b) in int_a
            .state()
            .x_vp
            .iter()
            .zip(int_b.state().x_vp.iter())
        {
            assert!(
                (a - b).abs() < 1e-10 * scale,
                "模式间差异超出舍入级别: {} vs {}",
                a,
                b
            );
        }
    }

    #[test]
    fn test_sparse_and_dense_forcing_paths_agree() {
        let (mesh, fields) = reference_setup();
        let ops = OperatorAssembler::new(&mesh, &fields, true)
            .unwrap()
            .assemble()
            .unwrap();
        let source = reference_source(&mesh);

        let mut sparse = FomIntegrator::new(
            &mesh,
            &ops,
            &fields,
            source.clone(),
            default_opts(MaterialMode::InOperator),
        )
        .unwrap();
        sparse.run(&mut []).unwrap();

        let mut opts = default_opts(MaterialMode::InOperator);
        opts.exploit_forcing_sparsity = false;
        let mut dense = FomIntegrator::new(&mesh, &ops, &fields, source, opts).unwrap();
        dense.run(&mut []).unwrap();

        // 同一运算只是累加位置选择不同，结果应逐位一致
        for (a, b) in sparse
            .state()
            .x_vp
            .iter()
            .zip(dense.state().x_vp.iter())
        {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_batched_matches_rank1_runs() {
        // 批量运行的每一列等于对应子波的独立 rank-1 运行
        let (mesh, fields) = reference_setup();
        let ops = OperatorAssembler::new(&mesh, &fields, true)
            .unwrap()
            .assemble()
            .unwrap();
        let gid = reference_source(&mesh).gid();
        let wavelets = vec![
            RickerWavelet::from_period(6000.0),
            RickerWavelet::from_period(8000.0),
        ];

        let mut batched = FomIntegrator::new(
            &mesh,
            &ops,
            &fields,
            ForcingSource::batched(gid, wavelets.clone()),
            default_opts(MaterialMode::InOperator),
        )
        .unwrap();
        batched.run(&mut []).unwrap();

        for (k, w) in wavelets.iter().enumerate() {
            let mut single = FomIntegrator::new(
                &mesh,
                &ops,
                &fields,
                ForcingSource::point(gid, *w),
                default_opts(MaterialMode::InOperator),
            )
            .unwrap();
            single.run(&mut []).unwrap();

            for dof in 0..batched.state().n_vp() {
                let a = batched.state().vp_at(dof, k);
                let b = single.state().vp_at(dof, 0);
                assert!(
                    (a - b).abs() < 1e-14 * b.abs().max(1e-30),
                    "批量列 {} 与独立运行不一致",
                    k
                );
            }
        }
    }

    #[test]
    fn test_observer_stride() {
        let (mesh, fields) = reference_setup();
        let ops = OperatorAssembler::new(&mesh, &fields, true)
            .unwrap()
            .assemble()
            .unwrap();
        let source = reference_source(&mesh);

        let mut opts = default_opts(MaterialMode::InOperator);
        opts.observer_stride = 10;
        let mut integrator = FomIntegrator::new(&mesh, &ops, &fields, source, opts).unwrap();

        let mut recorder = SeismogramRecorder::new(vec![0, 500], 1);
        {
            let mut observers: Vec<&mut dyn Observer> = vec![&mut recorder];
            integrator.run(&mut observers).unwrap();
        }
        // 100 步、步距 10 → 10 个采样
        assert_eq!(recorder.n_samples(), 10);
        assert!((recorder.times()[0] - 15.0).abs() < 1e-12);
        assert!((recorder.times()[9] - 150.0).abs() < 1e-12);
    }

    #[test]
    fn test_mode_operator_mismatch_is_fatal() {
        let (mesh, fields) = reference_setup();
        let ops = OperatorAssembler::new(&mesh, &fields, true)
            .unwrap()
            .assemble()
            .unwrap();
        let source = reference_source(&mesh);

        // 算子折入材料但请求模式 B
        let err = FomIntegrator::new(
            &mesh,
            &ops,
            &fields,
            source,
            default_opts(MaterialMode::Factored),
        )
        .unwrap_err();
        assert!(matches!(err, MwError::Config { .. }));
    }

    #[test]
    fn test_source_gid_out_of_range_is_fatal() {
        let (mesh, fields) = reference_setup();
        let ops = OperatorAssembler::new(&mesh, &fields, true)
            .unwrap()
            .assemble()
            .unwrap();
        let source = ForcingSource::point(10_000, RickerWavelet::new(2.0e-4));

        let err = FomIntegrator::new(
            &mesh,
            &ops,
            &fields,
            source,
            default_opts(MaterialMode::InOperator),
        )
        .unwrap_err();
        assert!(matches!(err, MwError::IndexOutOfBounds { .. }));
    }
}
