// crates/mw_physics/src/engine/observer.rs

//! 步后观测
//!
//! 观测在每个时间步完成后、以均匀步距触发，读取的是已经写完的
//! 状态快照，不引入任何顺序冲突。观测者只读，不回写状态。
//!
//! - [`SeismogramRecorder`]: 在接收点记录速度时间序列
//!   （接收点 × 采样 × 实现）
//! - [`StateSnapshotter`]: 采集完整速度状态快照（POD 基构建用）

use crate::state::WaveState;
use mw_foundation::Scalar;

/// 观测者抽象
///
/// 积分器在步距命中时调用 `observe`，传入只读状态。
pub trait Observer {
    /// 观测一次状态
    ///
    /// # 参数
    ///
    /// - `step`: 当前步号（从 1 开始）
    /// - `time`: 当前模拟时刻 [s]
    /// - `state`: 步后状态（只读）
    fn observe(&mut self, step: usize, time: Scalar, state: &WaveState);
}

/// 地震图记录器
///
/// 逐次观测时在每个接收点读取速度状态，按时间追加。
/// 数据布局：`data[(rec * n_samples + sample) * n_real + k]`，
/// 即（接收点 × 采样 × 实现）的稠密三维数组。
#[derive(Debug, Clone)]
pub struct SeismogramRecorder {
    receiver_gids: Vec<usize>,
    n_real: usize,
    times: Vec<Scalar>,
    /// 按接收点分块暂存，写出时重排为最终布局
    traces: Vec<Vec<Scalar>>,
}

impl SeismogramRecorder {
    /// 创建记录器
    ///
    /// # Panics
    ///
    /// - 接收点列表为空
    pub fn new(receiver_gids: Vec<usize>, n_real: usize) -> Self {
        assert!(!receiver_gids.is_empty(), "至少需要一个接收点");
        assert!(n_real > 0, "批宽必须大于 0");
        let n_rec = receiver_gids.len();
        Self {
            receiver_gids,
            n_real,
            times: Vec::new(),
            traces: vec![Vec::new(); n_rec],
        }
    }

    /// 接收点个数
    #[inline]
    pub fn n_receivers(&self) -> usize {
        self.receiver_gids.len()
    }

    /// 已记录的采样个数
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.times.len()
    }

    /// 批宽
    #[inline]
    pub fn n_real(&self) -> usize {
        self.n_real
    }

    /// 采样时刻序列
    #[inline]
    pub fn times(&self) -> &[Scalar] {
        &self.times
    }

    /// 接收点 GID 列表
    #[inline]
    pub fn receiver_gids(&self) -> &[usize] {
        &self.receiver_gids
    }

    /// 读取单个记录值
    #[inline]
    pub fn value(&self, receiver: usize, sample: usize, real: usize) -> Scalar {
        self.traces[receiver][sample * self.n_real + real]
    }

    /// 导出为（接收点 × 采样 × 实现）连续数组
    pub fn to_dense(&self) -> Vec<Scalar> {
        let mut out = Vec::with_capacity(self.n_receivers() * self.n_samples() * self.n_real);
        for trace in &self.traces {
            out.extend_from_slice(trace);
        }
        out
    }
}

impl Observer for SeismogramRecorder {
    fn observe(&mut self, _step: usize, time: Scalar, state: &WaveState) {
        debug_assert_eq!(state.n_real(), self.n_real);
        self.times.push(time);
        for (trace, &gid) in self.traces.iter_mut().zip(self.receiver_gids.iter()) {
            for k in 0..self.n_real {
                trace.push(state.vp_at(gid, k));
            }
        }
    }
}

/// 速度状态快照采集器
///
/// 每次命中步距时追加一列完整速度状态（长度 n_vp × 批宽），
/// 得到的快照矩阵供 POD 基构建使用。快照步距独立于观测步距，
/// 按绝对步号取模判断。
#[derive(Debug, Clone)]
pub struct StateSnapshotter {
    n_rows: usize,
    stride: usize,
    snapshots: Vec<Scalar>,
    n_cols: usize,
}

impl StateSnapshotter {
    /// 创建采集器（每次观测都采集）
    ///
    /// # 参数
    ///
    /// - `n_rows`: 每列长度（n_vp × 批宽）
    pub fn new(n_rows: usize) -> Self {
        Self::with_stride(n_rows, 1)
    }

    /// 创建带独立步距的采集器
    pub fn with_stride(n_rows: usize, stride: usize) -> Self {
        assert!(n_rows > 0, "快照行数必须大于 0");
        assert!(stride > 0, "快照步距必须大于 0");
        Self {
            n_rows,
            stride,
            snapshots: Vec::new(),
            n_cols: 0,
        }
    }

    /// 已采集的快照列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// 每列长度
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 列主序快照数据
    #[inline]
    pub fn data(&self) -> &[Scalar] {
        &self.snapshots
    }
}

impl Observer for StateSnapshotter {
    fn observe(&mut self, step: usize, _time: Scalar, state: &WaveState) {
        if step % self.stride != 0 {
            return;
        }
        debug_assert_eq!(state.x_vp.len(), self.n_rows);
        self.snapshots.extend_from_slice(&state.x_vp);
        self.n_cols += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seismogram_records_in_order() {
        let mut state = WaveState::new(10, 10);
        let mut rec = SeismogramRecorder::new(vec![3, 7], 1);

        state.x_vp[3] = 1.0;
        state.x_vp[7] = -1.0;
        rec.observe(1, 0.5, &state);

        state.x_vp[3] = 2.0;
        state.x_vp[7] = -2.0;
        rec.observe(2, 1.0, &state);

        assert_eq!(rec.n_samples(), 2);
        assert_eq!(rec.n_receivers(), 2);
        assert!((rec.value(0, 0, 0) - 1.0).abs() < 1e-14);
        assert!((rec.value(0, 1, 0) - 2.0).abs() < 1e-14);
        assert!((rec.value(1, 0, 0) + 1.0).abs() < 1e-14);
        assert!((rec.value(1, 1, 0) + 2.0).abs() < 1e-14);
        assert_eq!(rec.times(), &[0.5, 1.0]);

        let dense = rec.to_dense();
        assert_eq!(dense.len(), 2 * 2);
        assert_eq!(dense, vec![1.0, 2.0, -1.0, -2.0]);
    }

    #[test]
    fn test_seismogram_batched() {
        let mut state = WaveState::with_batch(4, 4, 2);
        let mut rec = SeismogramRecorder::new(vec![1], 2);

        state.x_vp[1 * 2] = 5.0;
        state.x_vp[1 * 2 + 1] = 6.0;
        rec.observe(1, 1.0, &state);

        assert!((rec.value(0, 0, 0) - 5.0).abs() < 1e-14);
        assert!((rec.value(0, 0, 1) - 6.0).abs() < 1e-14);
    }

    #[test]
    fn test_snapshotter_columns() {
        let mut state = WaveState::new(3, 3);
        let mut snap = StateSnapshotter::new(3);

        state.x_vp.copy_from_slice(&[1.0, 2.0, 3.0]);
        snap.observe(1, 0.1, &state);
        state.x_vp.copy_from_slice(&[4.0, 5.0, 6.0]);
        snap.observe(2, 0.2, &state);

        assert_eq!(snap.n_cols(), 2);
        assert_eq!(snap.data(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
