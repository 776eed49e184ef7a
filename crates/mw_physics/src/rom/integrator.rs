// crates/mw_physics/src/rom/integrator.rs

//! 降阶蛙跳推进
//!
//! 与全阶积分器结构相同的状态机，但算子是小规模稠密矩阵，
//! 矩阵乘全为稠密 gemv/gemm。强迫项每次运行预先投影一次：
//!
//! ```text
//! g = Φ_vp(source_gid, :) · ρ⁻¹(source_gid)
//! ```
//!
//! 单源情形 g 在各时间步之间不变，步内只做 `x_vp_r += Δt·f(t)·g`，
//! 不再逐步重算投影。

use crate::engine::observer::Observer;
use crate::forcing::ForcingSource;
use crate::rom::basis::Basis;
use crate::rom::projector::ProjectedOperators;
use crate::state::WaveState;
use mw_foundation::{MwError, MwResult, Scalar};
use rayon::prelude::*;

/// 降阶积分器选项（普通值结构体）
#[derive(Debug, Clone)]
pub struct RomIntegratorOptions {
    /// 时间步长 [s]
    pub dt: Scalar,
    /// 总步数
    pub n_steps: usize,
    /// 观测步距
    pub observer_stride: usize,
}

/// 降阶蛙跳积分器
///
/// 降阶状态复用 [`WaveState`] 容器（自由度维取 ROM 规模），
/// 观测者接口与全阶一致。
#[derive(Debug)]
pub struct RomIntegrator {
    reduced: ProjectedOperators,
    source: ForcingSource,
    opts: RomIntegratorOptions,
    /// 预投影强迫行 g（长度 r_vp）
    forcing_row: Vec<Scalar>,
    state: WaveState,
    signal: Vec<Scalar>,
}

impl RomIntegrator {
    /// 创建降阶积分器
    ///
    /// # 参数
    ///
    /// - `reduced`: 投影好的降阶算子对
    /// - `phi_vp`: 速度基（用于预投影强迫行）
    /// - `rho_inv_at_source`: 源点逆密度 ρ⁻¹(source_gid)
    /// - `source`: 强迫源（GID 须在 `phi_vp` 行范围内）
    pub fn new(
        reduced: ProjectedOperators,
        phi_vp: &Basis,
        rho_inv_at_source: Scalar,
        source: ForcingSource,
        opts: RomIntegratorOptions,
    ) -> MwResult<Self> {
        let r_vp = reduced.r_vp();
        let r_sp = reduced.r_sp();

        MwError::check_size("J_vp_r 列数", r_sp, reduced.j_vp_r.n_cols())?;
        MwError::check_size("J_sp_r 列数", r_vp, reduced.j_sp_r.n_cols())?;
        MwError::check_size("Φ_vp 列数", r_vp, phi_vp.n_cols())?;
        source.validate(phi_vp.n_rows())?;

        if opts.dt <= 0.0 {
            return Err(MwError::out_of_range("dt", opts.dt, 0.0, Scalar::INFINITY));
        }
        if opts.observer_stride == 0 {
            return Err(MwError::invalid_input("观测步距必须大于 0"));
        }
        if rho_inv_at_source <= 0.0 {
            return Err(MwError::invalid_input(format!(
                "源点逆密度必须为正: {}",
                rho_inv_at_source
            )));
        }

        // 预投影强迫行：g = Φ_vp(gid, :) · ρ⁻¹(gid)，每次运行只算一次
        let mut forcing_row = phi_vp.matrix().row_copy(source.gid());
        for g in &mut forcing_row {
            *g *= rho_inv_at_source;
        }

        let n_real = source.n_real();
        Ok(Self {
            reduced,
            opts,
            forcing_row,
            state: WaveState::with_batch(r_vp, r_sp, n_real),
            signal: vec![0.0; n_real],
            source,
        })
    }

    /// 当前降阶状态（只读）
    #[inline]
    pub fn state(&self) -> &WaveState {
        &self.state
    }

    /// 预投影强迫行（只读，诊断用）
    #[inline]
    pub fn forcing_row(&self) -> &[Scalar] {
        &self.forcing_row
    }

    /// 执行完整降阶推进
    pub fn run(&mut self, observers: &mut [&mut dyn Observer]) -> MwResult<()> {
        self.state.reset();
        let dt = self.opts.dt;
        let n_real = self.state.n_real();

        for step in 1..=self.opts.n_steps {
            let t = step as Scalar * dt;

            // x_vp_r += Δt · J_vp_r · x_sp_r
            if n_real == 1 {
                self.reduced
                    .j_vp_r
                    .mul_vec_add(dt, &self.state.x_sp, &mut self.state.x_vp);
            } else {
                self.reduced
                    .j_vp_r
                    .mul_batch_add(dt, &self.state.x_sp, n_real, &mut self.state.x_vp);
            }

            // x_vp_r += Δt · f(t) · g（逐实现缩放累加）
            self.source.values_at(t, &mut self.signal);
            let forcing_row = &self.forcing_row;
            let signal = &self.signal;
            if n_real == 1 {
                let scale = dt * signal[0];
                for (x, &g) in self.state.x_vp.iter_mut().zip(forcing_row.iter()) {
                    *x += scale * g;
                }
            } else {
                self.state
                    .x_vp
                    .par_chunks_mut(n_real)
                    .enumerate()
                    .for_each(|(i, chunk)| {
                        let g = forcing_row[i];
                        for k in 0..n_real {
                            chunk[k] += dt * signal[k] * g;
                        }
                    });
            }

            // x_sp_r += Δt · J_sp_r · x_vp_r
            if n_real == 1 {
                self.reduced
                    .j_sp_r
                    .mul_vec_add(dt, &self.state.x_vp, &mut self.state.x_sp);
            } else {
                self.reduced
                    .j_sp_r
                    .mul_batch_add(dt, &self.state.x_vp, n_real, &mut self.state.x_sp);
            }

            if step % self.opts.observer_stride == 0 {
                for obs in observers.iter_mut() {
                    obs.observe(step, t, &self.state);
                }
            }
        }

        Ok(())
    }
}
