// crates/mw_mesh/src/connectivity.rs

//! 网格连接关系
//!
//! 按自由度类型分开的静态类型容器（SoA 布局）：
//! - [`VelocityDofs`]: 速度点坐标、4 邻接表、差分模板系数
//! - [`StressDofs`]: 应力点坐标、标签、2 邻接表
//!
//! # 不变量
//!
//! - 逆半径严格为正（计算域不含地心）
//! - 邻接表中的 GID 均在对方自由度类型的编号范围内
//! - 速度邻接行顺序固定为 西/北/东/南，应力邻接行顺序为
//!   北/南（径向剪切）或 西/东（切向剪切）

use mw_foundation::{MwError, MwResult, Scalar};
use serde::{Deserialize, Serialize};

/// 自由度类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DofKind {
    /// 速度自由度（整网格点）
    Velocity,
    /// 应力自由度（半网格点）
    Stress,
}

impl std::fmt::Display for DofKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Velocity => write!(f, "velocity"),
            Self::Stress => write!(f, "stress"),
        }
    }
}

/// 应力点标签，区分两类剪切分量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressLabel {
    /// 径向剪切 σ_rφ
    RadialShear,
    /// 切向剪切 σ_θφ
    TangentialShear,
}

impl StressLabel {
    /// 从文件中的整数标签解码
    ///
    /// 越界标签属于数据错误，致命终止。
    pub fn from_code(code: i64) -> MwResult<Self> {
        match code {
            0 => Ok(Self::RadialShear),
            1 => Ok(Self::TangentialShear),
            other => Err(MwError::UnknownStressLabel { label: other }),
        }
    }

    /// 文件中的整数标签
    pub fn code(&self) -> i64 {
        match self {
            Self::RadialShear => 0,
            Self::TangentialShear => 1,
        }
    }
}

/// 速度邻接行中的方位索引
pub const WEST: usize = 0;
/// 北 = 径向外侧（r+）
pub const NORTH: usize = 1;
/// 东 = 角向正侧（θ+）
pub const EAST: usize = 2;
/// 南 = 径向内侧（r−）
pub const SOUTH: usize = 3;

/// 速度自由度容器（SoA）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelocityDofs {
    /// 角坐标 θ [rad]
    pub theta: Vec<Scalar>,
    /// 逆半径 1/r [1/m]，严格为正
    pub inv_radius: Vec<Scalar>,
    /// 对称轴标志
    pub on_axis: Vec<bool>,
    /// 应力邻居 GID，顺序 西/北/东/南；缺失侧重复现存邻居
    pub neighbors: Vec<[usize; 4]>,
    /// 差分模板系数 c0..c3，与邻接行一一对应
    pub stencil: Vec<[Scalar; 4]>,
}

impl VelocityDofs {
    /// 速度点个数
    #[inline]
    pub fn len(&self) -> usize {
        self.theta.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.theta.is_empty()
    }
}

/// 应力自由度容器（SoA）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressDofs {
    /// 角坐标 θ [rad]
    pub theta: Vec<Scalar>,
    /// 逆半径 1/r [1/m]，严格为正
    pub inv_radius: Vec<Scalar>,
    /// 剪切分量标签
    pub labels: Vec<StressLabel>,
    /// 速度邻居 GID：径向剪切为 [北, 南]，切向剪切为 [西, 东]
    pub neighbors: Vec<[usize; 2]>,
}

impl StressDofs {
    /// 应力点个数
    #[inline]
    pub fn len(&self) -> usize {
        self.theta.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.theta.is_empty()
    }
}

/// 完整网格连接关系
///
/// 两类自由度的容器加上均匀网格间距。间距由生成器直接给出，
/// 或由加载器从坐标推断。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConnectivity {
    /// 速度自由度
    pub velocity: VelocityDofs,
    /// 应力自由度
    pub stress: StressDofs,
    /// 角向间距 dθ [rad]
    pub d_theta: Scalar,
    /// 径向间距 dr [m]
    pub d_r: Scalar,
}

impl MeshConnectivity {
    /// 速度自由度个数
    #[inline]
    pub fn n_velocity(&self) -> usize {
        self.velocity.len()
    }

    /// 应力自由度个数
    #[inline]
    pub fn n_stress(&self) -> usize {
        self.stress.len()
    }

    /// 最小半径 [m]
    pub fn min_radius(&self) -> Scalar {
        let max_inv = self
            .velocity
            .inv_radius
            .iter()
            .chain(self.stress.inv_radius.iter())
            .cloned()
            .fold(0.0, Scalar::max);
        1.0 / max_inv
    }

    /// 最大半径 [m]
    pub fn max_radius(&self) -> Scalar {
        let min_inv = self
            .velocity
            .inv_radius
            .iter()
            .chain(self.stress.inv_radius.iter())
            .cloned()
            .fold(Scalar::INFINITY, Scalar::min);
        1.0 / min_inv
    }

    /// 按物理位置查找最近的速度点 GID
    ///
    /// # 参数
    ///
    /// - `theta`: 角坐标 [rad]
    /// - `radius`: 半径 [m]
    pub fn nearest_velocity_gid(&self, theta: Scalar, radius: Scalar) -> usize {
        let mut best = 0;
        let mut best_dist = Scalar::INFINITY;
        for gid in 0..self.velocity.len() {
            let r = 1.0 / self.velocity.inv_radius[gid];
            let dt = self.velocity.theta[gid] - theta;
            let dr = r - radius;
            // 弧长近似的平方距离
            let dist = (r * dt) * (r * dt) + dr * dr;
            if dist < best_dist {
                best_dist = dist;
                best = gid;
            }
        }
        best
    }

    /// 校验连接关系的结构不变量
    ///
    /// - 各数组长度一致
    /// - 逆半径严格为正
    /// - 邻接 GID 在对方编号范围内
    pub fn validate(&self) -> MwResult<()> {
        let n_vp = self.velocity.len();
        let n_sp = self.stress.len();

        MwError::check_size("velocity.inv_radius", n_vp, self.velocity.inv_radius.len())?;
        MwError::check_size("velocity.on_axis", n_vp, self.velocity.on_axis.len())?;
        MwError::check_size("velocity.neighbors", n_vp, self.velocity.neighbors.len())?;
        MwError::check_size("velocity.stencil", n_vp, self.velocity.stencil.len())?;
        MwError::check_size("stress.inv_radius", n_sp, self.stress.inv_radius.len())?;
        MwError::check_size("stress.labels", n_sp, self.stress.labels.len())?;
        MwError::check_size("stress.neighbors", n_sp, self.stress.neighbors.len())?;

        for (gid, &ir) in self
            .velocity
            .inv_radius
            .iter()
            .chain(self.stress.inv_radius.iter())
            .enumerate()
        {
            if ir <= 0.0 {
                return Err(MwError::invalid_mesh(format!(
                    "逆半径必须严格为正: 点 {} 处为 {}",
                    gid, ir
                )));
            }
        }

        for (gid, row) in self.velocity.neighbors.iter().enumerate() {
            for &nb in row {
                if nb >= n_sp {
                    return Err(MwError::invalid_mesh(format!(
                        "速度点 {} 的应力邻居 {} 超出范围 0..{}",
                        gid, nb, n_sp
                    )));
                }
            }
        }
        for (gid, row) in self.stress.neighbors.iter().enumerate() {
            for &nb in row {
                if nb >= n_vp {
                    return Err(MwError::invalid_mesh(format!(
                        "应力点 {} 的速度邻居 {} 超出范围 0..{}",
                        gid, nb, n_vp
                    )));
                }
            }
        }

        if self.d_theta <= 0.0 || self.d_r <= 0.0 {
            return Err(MwError::invalid_mesh(format!(
                "网格间距必须为正: dθ={}, dr={}",
                self.d_theta, self.d_r
            )));
        }

        Ok(())
    }
}
