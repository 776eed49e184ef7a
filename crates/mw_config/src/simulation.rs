// crates/mw_config/src/simulation.rs

//! SimulationConfig - 模拟配置（全 f64）
//!
//! 定义剪切波求解器的所有配置参数，使用纯 f64 类型以便 JSON 序列化。
//! 所有字段均有默认值，缺省字段按 `#[serde(default)]` 补全。

use mw_foundation::{MwError, MwResult, Scalar};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 模拟配置
///
/// 包含一次完整运行（全阶或降阶）所需的全部参数。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 网格配置
    #[serde(default)]
    pub grid: GridConfig,

    /// 时间推进配置
    #[serde(default)]
    pub time: TimeConfig,

    /// 震源配置
    #[serde(default)]
    pub source: SourceConfig,

    /// 多实现采样配置（rank-2 批量源）
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// ROM 配置
    #[serde(default)]
    pub rom: RomConfig,

    /// 输出配置
    #[serde(default)]
    pub output: OutputConfig,

    /// 稳定性判据配置
    #[serde(default)]
    pub stability: StabilityConfig,

    /// 是否在算子组装时折入材料系数
    ///
    /// true: ρ⁻¹/μ 进入 Jacobian 数值（模式 A）
    /// false: 算子为纯空间导数，材料系数在推进时逐元素施加（模式 B）
    #[serde(default = "default_true")]
    pub material_in_operator: bool,

    /// 是否利用点源稀疏性
    ///
    /// true 时单点源的强迫项以 O(1) 方式加到对应自由度上，
    /// false 时退化为全向量逐元素累加。
    #[serde(default = "default_true")]
    pub exploit_forcing_sparsity: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            time: TimeConfig::default(),
            source: SourceConfig::default(),
            sampling: SamplingConfig::default(),
            rom: RomConfig::default(),
            output: OutputConfig::default(),
            stability: StabilityConfig::default(),
            material_in_operator: true,
            exploit_forcing_sparsity: true,
        }
    }
}

impl SimulationConfig {
    /// 从 JSON 文件加载配置
    ///
    /// 这是唯一的配置入口；下游组件只接受已填充的值结构体。
    pub fn from_file(path: impl AsRef<Path>) -> MwResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|_| MwError::file_not_found(path))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| MwError::config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// 校验配置的内部一致性
    ///
    /// 在构造任何求解器对象之前调用，把配置类与维度类错误前置。
    pub fn validate(&self) -> MwResult<()> {
        if self.time.dt <= 0.0 {
            return Err(MwError::invalid_config(
                "time.dt",
                self.time.dt.to_string(),
                "时间步长必须为正",
            ));
        }
        if self.time.n_steps == 0 {
            return Err(MwError::invalid_config(
                "time.n_steps",
                "0",
                "步数必须大于 0",
            ));
        }
        self.grid.validate()?;
        self.source.validate()?;
        self.sampling.validate()?;
        if self.rom.enabled {
            self.rom.validate()?;
        }
        if self.output.observer_stride == 0 {
            return Err(MwError::invalid_config(
                "output.observer_stride",
                "0",
                "观测步距必须大于 0",
            ));
        }
        Ok(())
    }
}

/// 网格配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// 网格目录（为空时使用内置结构化网格生成器）
    #[serde(default)]
    pub mesh_dir: Option<PathBuf>,

    /// 角向网格点数（生成模式）
    #[serde(default = "default_n_theta")]
    pub n_theta: usize,

    /// 径向网格点数（生成模式）
    #[serde(default = "default_n_r")]
    pub n_r: usize,

    /// 内边界半径 [km]（默认核幔边界）
    #[serde(default = "default_r_inner_km")]
    pub r_inner_km: Scalar,

    /// 外边界半径 [km]（默认地表）
    #[serde(default = "default_r_outer_km")]
    pub r_outer_km: Scalar,
}

fn default_n_theta() -> usize {
    21
}
fn default_n_r() -> usize {
    51
}
fn default_r_inner_km() -> Scalar {
    3480.0
}
fn default_r_outer_km() -> Scalar {
    6371.0
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            mesh_dir: None,
            n_theta: default_n_theta(),
            n_r: default_n_r(),
            r_inner_km: default_r_inner_km(),
            r_outer_km: default_r_outer_km(),
        }
    }
}

impl GridConfig {
    fn validate(&self) -> MwResult<()> {
        if self.mesh_dir.is_some() {
            return Ok(());
        }
        if self.n_theta < 3 || self.n_r < 3 {
            return Err(MwError::invalid_config(
                "grid",
                format!("{}x{}", self.n_theta, self.n_r),
                "生成网格至少需要 3x3 个点",
            ));
        }
        if self.r_inner_km <= 0.0 || self.r_inner_km >= self.r_outer_km {
            return Err(MwError::invalid_config(
                "grid.r_inner_km",
                self.r_inner_km.to_string(),
                "内边界半径必须为正且小于外边界",
            ));
        }
        Ok(())
    }
}

/// 时间推进配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// 时间步长 [s]
    #[serde(default = "default_dt")]
    pub dt: Scalar,

    /// 总步数
    #[serde(default = "default_n_steps")]
    pub n_steps: usize,
}

fn default_dt() -> Scalar {
    0.1
}
fn default_n_steps() -> usize {
    1000
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            n_steps: default_n_steps(),
        }
    }
}

/// 震源配置
///
/// 点源位置可直接给出速度点 GID，或给出物理位置（深度 + 角度）
/// 由网格映射到最近的速度点。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// 速度点 GID（优先于物理位置）
    #[serde(default)]
    pub gid: Option<usize>,

    /// 震源深度 [km]
    #[serde(default = "default_source_depth_km")]
    pub depth_km: Scalar,

    /// 震源角位置 [deg]
    #[serde(default = "default_source_angle_deg")]
    pub angle_deg: Scalar,

    /// Ricker 子波峰值频率 [Hz]
    #[serde(default = "default_peak_frequency")]
    pub peak_frequency_hz: Scalar,

    /// 时延 [s]（缺省按 1.2/f0 自动推算）
    #[serde(default)]
    pub delay_s: Option<Scalar>,
}

fn default_source_depth_km() -> Scalar {
    640.0
}
fn default_source_angle_deg() -> Scalar {
    90.0
}
fn default_peak_frequency() -> Scalar {
    2.0e-4
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            gid: None,
            depth_km: default_source_depth_km(),
            angle_deg: default_source_angle_deg(),
            peak_frequency_hz: default_peak_frequency(),
            delay_s: None,
        }
    }
}

impl SourceConfig {
    fn validate(&self) -> MwResult<()> {
        if self.peak_frequency_hz <= 0.0 {
            return Err(MwError::invalid_config(
                "source.peak_frequency_hz",
                self.peak_frequency_hz.to_string(),
                "峰值频率必须为正",
            ));
        }
        Ok(())
    }
}

/// 多实现采样配置
///
/// rank-2 批量源：对子波周期做均匀采样，每个实现一列状态。
/// `forcing_size` 为一次推进携带的实现个数（批宽），必须整除
/// `num_realizations`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// 采样实现总数（1 表示单源 rank-1 运行）
    #[serde(default = "default_one")]
    pub num_realizations: usize,

    /// 批宽（一次推进的实现个数）
    #[serde(default = "default_one")]
    pub forcing_size: usize,

    /// 采样周期下界 [s]
    #[serde(default = "default_period_min")]
    pub period_min_s: Scalar,

    /// 采样周期上界 [s]
    #[serde(default = "default_period_max")]
    pub period_max_s: Scalar,

    /// 随机种子
    #[serde(default)]
    pub seed: u64,
}

fn default_one() -> usize {
    1
}
fn default_period_min() -> Scalar {
    2000.0
}
fn default_period_max() -> Scalar {
    8000.0
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            num_realizations: 1,
            forcing_size: 1,
            period_min_s: default_period_min(),
            period_max_s: default_period_max(),
            seed: 0,
        }
    }
}

impl SamplingConfig {
    fn validate(&self) -> MwResult<()> {
        if self.num_realizations == 0 || self.forcing_size == 0 {
            return Err(MwError::invalid_config(
                "sampling",
                format!("{}/{}", self.num_realizations, self.forcing_size),
                "实现数与批宽必须大于 0",
            ));
        }
        if self.num_realizations % self.forcing_size != 0 {
            return Err(MwError::invalid_config(
                "sampling.forcing_size",
                self.forcing_size.to_string(),
                format!("批宽必须整除实现总数 {}", self.num_realizations),
            ));
        }
        if self.period_min_s <= 0.0 || self.period_min_s > self.period_max_s {
            return Err(MwError::invalid_config(
                "sampling.period_min_s",
                self.period_min_s.to_string(),
                "周期下界必须为正且不大于上界",
            ));
        }
        Ok(())
    }
}

/// ROM 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RomConfig {
    /// 是否运行降阶模型
    #[serde(default)]
    pub enabled: bool,

    /// 速度基矩阵文件
    #[serde(default)]
    pub vp_basis_path: Option<PathBuf>,

    /// 应力基矩阵文件
    #[serde(default)]
    pub sp_basis_path: Option<PathBuf>,

    /// 速度侧 ROM 规模（基列数）
    #[serde(default = "default_rom_size")]
    pub size_vp: usize,

    /// 应力侧 ROM 规模（基列数）
    #[serde(default = "default_rom_size")]
    pub size_sp: usize,

    /// 使用随机基（纯规模测试，不保证动力学正确性）
    #[serde(default)]
    pub random_basis: bool,

    /// 是否执行 Galerkin 投影
    ///
    /// false 时降阶算子填零，仅用于推进核的计时测量。
    #[serde(default = "default_true")]
    pub project_operators: bool,
}

fn default_rom_size() -> usize {
    64
}

impl Default for RomConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            vp_basis_path: None,
            sp_basis_path: None,
            size_vp: default_rom_size(),
            size_sp: default_rom_size(),
            random_basis: false,
            project_operators: true,
        }
    }
}

impl RomConfig {
    fn validate(&self) -> MwResult<()> {
        if self.size_vp == 0 || self.size_sp == 0 {
            return Err(MwError::invalid_config(
                "rom",
                format!("{}/{}", self.size_vp, self.size_sp),
                "ROM 规模必须大于 0",
            ));
        }
        if !self.random_basis && (self.vp_basis_path.is_none() || self.sp_basis_path.is_none()) {
            return Err(MwError::config(
                "ROM 已启用但未给出基矩阵文件，也未选择随机基",
            ));
        }
        Ok(())
    }
}

/// 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 输出目录
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,

    /// 观测步距（每多少步向观测者报告一次状态）
    #[serde(default = "default_one")]
    pub observer_stride: usize,

    /// 接收点速度 GID 列表（地震图记录位置）
    #[serde(default)]
    pub receiver_gids: Vec<usize>,

    /// 状态快照步距（None 表示不采集快照）
    #[serde(default)]
    pub snapshot_stride: Option<usize>,

    /// 二进制输出（false 为文本）
    #[serde(default = "default_true")]
    pub binary: bool,

    /// 输出时写入前导尺寸头
    #[serde(default = "default_true")]
    pub write_header: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            observer_stride: 1,
            receiver_gids: Vec::new(),
            snapshot_stride: None,
            binary: true,
            write_header: true,
        }
    }
}

/// 稳定性判据配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityConfig {
    /// CFL 数上限
    #[serde(default = "default_cfl_limit")]
    pub cfl_limit: Scalar,

    /// 最短波长内的最少网格点数
    #[serde(default = "default_min_ppw")]
    pub min_points_per_wavelength: Scalar,
}

fn default_cfl_limit() -> Scalar {
    0.28
}
fn default_min_ppw() -> Scalar {
    8.0
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            cfl_limit: default_cfl_limit(),
            min_points_per_wavelength: default_min_ppw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.material_in_operator);
        assert!((config.stability.cfl_limit - 0.28).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_dt() {
        let mut config = SimulationConfig::default();
        config.time.dt = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_forcing_size_divisibility() {
        let mut config = SimulationConfig::default();
        config.sampling.num_realizations = 10;
        config.sampling.forcing_size = 3;
        // 3 不能整除 10，维度类错误必须在循环前被捕获
        assert!(config.validate().is_err());

        config.sampling.forcing_size = 5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rom_requires_basis_or_random() {
        let mut config = SimulationConfig::default();
        config.rom.enabled = true;
        assert!(config.validate().is_err());

        config.rom.random_basis = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip_with_defaults() {
        // 缺省字段按默认值补全
        let json = r#"{ "time": { "dt": 1.5, "n_steps": 100 } }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert!((config.time.dt - 1.5).abs() < 1e-12);
        assert_eq!(config.time.n_steps, 100);
        assert_eq!(config.grid.n_theta, 21);
        assert!(config.exploit_forcing_sparsity);
    }
}
