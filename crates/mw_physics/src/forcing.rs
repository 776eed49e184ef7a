// crates/mw_physics/src/forcing.rs

//! 震源（强迫项）
//!
//! - [`RickerWavelet`]: 时间子波，峰值频率 f0，缺省时延 t0 = 1.2/f0
//! - [`ForcingSource`]: 位于单个速度点的点源（rank-1）或批量源
//!   （rank-2，每个实现一个子波，共享源点）
//!
//! 源对外暴露逐步取值接口，以及非稀疏路径所需的稠密向量填充。

use mw_foundation::{MwError, MwResult, Scalar};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Ricker 子波
///
/// w(t) = (1 − 2a)·e^{−a}，a = (π·f0·(t − t0))²
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RickerWavelet {
    /// 峰值频率 [Hz]
    f0: Scalar,
    /// 时延 [s]
    t0: Scalar,
}

impl RickerWavelet {
    /// 创建子波，时延按 1.2/f0 自动推算
    pub fn new(f0: Scalar) -> Self {
        assert!(f0 > 0.0, "峰值频率必须为正");
        Self { f0, t0: 1.2 / f0 }
    }

    /// 创建子波并显式指定时延
    pub fn with_delay(f0: Scalar, t0: Scalar) -> Self {
        assert!(f0 > 0.0, "峰值频率必须为正");
        Self { f0, t0 }
    }

    /// 按周期创建子波（f0 = 1/T）
    pub fn from_period(period_s: Scalar) -> Self {
        assert!(period_s > 0.0, "周期必须为正");
        Self::new(1.0 / period_s)
    }

    /// 峰值频率 [Hz]
    #[inline]
    pub fn peak_frequency(&self) -> Scalar {
        self.f0
    }

    /// 时延 [s]
    #[inline]
    pub fn delay(&self) -> Scalar {
        self.t0
    }

    /// 有效最高频率 [Hz]
    ///
    /// Ricker 频谱在 2.5·f0 以上能量可忽略，作为频散判据的 f_max。
    #[inline]
    pub fn max_frequency(&self) -> Scalar {
        2.5 * self.f0
    }

    /// 取 t 时刻的子波值
    #[inline]
    pub fn value(&self, t: Scalar) -> Scalar {
        let arg = (PI * self.f0 * (t - self.t0)).powi(2);
        (1.0 - 2.0 * arg) * (-arg).exp()
    }
}

/// 对子波周期做均匀随机采样
///
/// 用于 rank-2 批量源的实现生成；种子固定即可复现。
pub fn sample_periods(n: usize, min_s: Scalar, max_s: Scalar, seed: u64) -> Vec<Scalar> {
    assert!(n > 0, "采样数必须大于 0");
    assert!(
        min_s > 0.0 && min_s <= max_s,
        "周期范围必须满足 0 < min <= max"
    );
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(min_s..=max_s)).collect()
}

/// 强迫源：单点源或批量源
///
/// 两种形态共享源点 GID；批量源的每个实现携带独立子波，
/// 状态向量的批宽即实现个数。
#[derive(Debug, Clone)]
pub enum ForcingSource {
    /// rank-1 单点源
    Point {
        /// 源所在速度点 GID
        gid: usize,
        /// 时间子波
        wavelet: RickerWavelet,
    },
    /// rank-2 批量源（每实现一个子波）
    Batched {
        /// 源所在速度点 GID
        gid: usize,
        /// 各实现的子波
        wavelets: Vec<RickerWavelet>,
    },
}

impl ForcingSource {
    /// 创建单点源
    pub fn point(gid: usize, wavelet: RickerWavelet) -> Self {
        Self::Point { gid, wavelet }
    }

    /// 创建批量源
    ///
    /// # Panics
    ///
    /// - 子波列表为空
    pub fn batched(gid: usize, wavelets: Vec<RickerWavelet>) -> Self {
        assert!(!wavelets.is_empty(), "批量源至少需要一个子波");
        Self::Batched { gid, wavelets }
    }

    /// 源点 GID
    #[inline]
    pub fn gid(&self) -> usize {
        match self {
            Self::Point { gid, .. } | Self::Batched { gid, .. } => *gid,
        }
    }

    /// 实现个数（状态批宽）
    #[inline]
    pub fn n_real(&self) -> usize {
        match self {
            Self::Point { .. } => 1,
            Self::Batched { wavelets, .. } => wavelets.len(),
        }
    }

    /// 全部实现中的最高有效频率 [Hz]
    pub fn max_frequency(&self) -> Scalar {
        match self {
            Self::Point { wavelet, .. } => wavelet.max_frequency(),
            Self::Batched { wavelets, .. } => wavelets
                .iter()
                .map(|w| w.max_frequency())
                .fold(0.0, Scalar::max),
        }
    }

    /// 校验源点在速度自由度范围内
    pub fn validate(&self, n_vp: usize) -> MwResult<()> {
        MwError::check_index("源点 VelocityGid", self.gid(), n_vp)
    }

    /// 取 t 时刻各实现的信号值，写入 `out`（长度 = 批宽）
    pub fn values_at(&self, t: Scalar, out: &mut [Scalar]) {
        match self {
            Self::Point { wavelet, .. } => {
                debug_assert_eq!(out.len(), 1);
                out[0] = wavelet.value(t);
            }
            Self::Batched { wavelets, .. } => {
                debug_assert_eq!(out.len(), wavelets.len());
                for (o, w) in out.iter_mut().zip(wavelets.iter()) {
                    *o = w.value(t);
                }
            }
        }
    }

    /// 填充稠密强迫向量（非稀疏路径）
    ///
    /// `signal` 为当前时刻各实现的信号值；`out` 长度为 n_vp × 批宽，
    /// 实现主序；先整体清零再写入源点条目。
    pub fn fill_dense(&self, signal: &[Scalar], out: &mut [Scalar]) {
        let n_real = self.n_real();
        debug_assert_eq!(signal.len(), n_real);
        debug_assert_eq!(out.len() % n_real, 0);

        out.fill(0.0);
        let base = self.gid() * n_real;
        out[base..base + n_real].copy_from_slice(signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ricker_peak_at_delay() {
        let w = RickerWavelet::new(0.01);
        // t = t0 处取最大值 1
        assert!((w.value(w.delay()) - 1.0).abs() < 1e-14);
        // 远离时延处趋于 0
        assert!(w.value(w.delay() + 50.0 / 0.01).abs() < 1e-10);
    }

    #[test]
    fn test_ricker_auto_delay() {
        let w = RickerWavelet::new(0.05);
        assert!((w.delay() - 1.2 / 0.05).abs() < 1e-12);
        assert!((w.max_frequency() - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_from_period() {
        let w = RickerWavelet::from_period(2000.0);
        assert!((w.peak_frequency() - 5.0e-4).abs() < 1e-15);
    }

    #[test]
    fn test_sample_periods_reproducible() {
        let a = sample_periods(8, 2000.0, 8000.0, 42);
        let b = sample_periods(8, 2000.0, 8000.0, 42);
        assert_eq!(a, b);
        for &p in &a {
            assert!(p >= 2000.0 && p <= 8000.0);
        }
        // 不同种子给出不同序列
        let c = sample_periods(8, 2000.0, 8000.0, 43);
        assert_ne!(a, c);
    }

    #[test]
    fn test_point_source_interface() {
        let src = ForcingSource::point(17, RickerWavelet::new(0.01));
        assert_eq!(src.gid(), 17);
        assert_eq!(src.n_real(), 1);
        assert!(src.validate(100).is_ok());
        assert!(src.validate(10).is_err());

        let mut sig = [0.0];
        src.values_at(120.0, &mut sig);
        assert!((sig[0] - RickerWavelet::new(0.01).value(120.0)).abs() < 1e-15);
    }

    #[test]
    fn test_batched_source_dense_fill() {
        let wavelets: Vec<_> = sample_periods(3, 2000.0, 8000.0, 7)
            .into_iter()
            .map(RickerWavelet::from_period)
            .collect();
        let src = ForcingSource::batched(2, wavelets);
        assert_eq!(src.n_real(), 3);

        let mut sig = vec![0.0; 3];
        src.values_at(1000.0, &mut sig);

        let n_vp = 5;
        let mut dense = vec![9.0; n_vp * 3];
        src.fill_dense(&sig, &mut dense);

        // 源点以外清零，源点处为各实现信号
        for dof in 0..n_vp {
            for k in 0..3 {
                let v = dense[dof * 3 + k];
                if dof == 2 {
                    assert!((v - sig[k]).abs() < 1e-15);
                } else {
                    assert!(v.abs() < 1e-300);
                }
            }
        }
    }

    #[test]
    fn test_batched_max_frequency() {
        let src = ForcingSource::batched(
            0,
            vec![
                RickerWavelet::from_period(4000.0),
                RickerWavelet::from_period(2000.0),
            ],
        );
        // 最短周期 2000 s → f0 = 5e-4 → f_max = 1.25e-3
        assert!((src.max_frequency() - 1.25e-3).abs() < 1e-15);
    }
}
