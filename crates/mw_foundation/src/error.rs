// crates/mw_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `MwError` 枚举和 `MwResult` 类型别名，用于整个项目的错误处理。
//!
//! # 错误分类
//!
//! 1. **配置错误**: 网格/系数文件缺失或格式错误、未知 DOF 类型、未知应力标签
//! 2. **稳定性错误**: CFL 或数值频散判据不满足，在时间推进开始前致命终止
//! 3. **维度错误**: 基矩阵列数与 ROM 规模不符、批量源个数不能整除采样数
//!
//! 三类错误均不可本地恢复，直接向上传播并终止本次运行。

use std::path::PathBuf;
use thiserror::Error;

/// 统一结果类型
pub type MwResult<T> = Result<T, MwError>;

/// MantleWave 错误类型
#[derive(Error, Debug)]
pub enum MwError {
    /// IO 错误
    #[error("IO 错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        /// 可选的底层 IO 错误
        #[source]
        source: Option<std::io::Error>,
    },

    /// 文件不存在
    #[error("文件不存在: {path}")]
    FileNotFound {
        /// 未找到的路径
        path: PathBuf,
    },

    /// 文件解析错误
    #[error("文件解析错误: {file} 第 {line} 行: {message}")]
    ParseError {
        /// 文件路径
        file: PathBuf,
        /// 行号（从 1 开始）
        line: usize,
        /// 错误信息
        message: String,
    },

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数据超出范围
    #[error("数据超出范围: {field}={value}, 期望范围=[{min}, {max}]")]
    OutOfRange {
        /// 字段名
        field: &'static str,
        /// 实际值
        value: f64,
        /// 最小允许值
        min: f64,
        /// 最大允许值
        max: f64,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望 {expected}, 实际 {actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 索引越界
    #[error("索引越界: {index_type} 索引 {index} 超出范围 0..{len}")]
    IndexOutOfBounds {
        /// 索引类别描述
        index_type: &'static str,
        /// 访问的索引
        index: usize,
        /// 上界（长度）
        len: usize,
    },

    /// 无效网格拓扑
    #[error("无效的网格拓扑: {message}")]
    InvalidMesh {
        /// 具体错误信息
        message: String,
    },

    /// 未知应力点标签
    #[error("未知的应力点标签: {label} (合法值: 0=径向剪切, 1=切向剪切)")]
    UnknownStressLabel {
        /// 文件中出现的标签值
        label: i64,
    },

    /// 稳定性判据不满足
    #[error("稳定性判据不满足: {criterion} = {value:.6e}, 允许上限/下限 = {limit:.6e}")]
    Stability {
        /// 判据名称（CFL 或频散方向）
        criterion: &'static str,
        /// 实际值
        value: f64,
        /// 判据阈值
        limit: f64,
    },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 配置值无效
    #[error("配置值无效: {key}={value}, 原因: {reason}")]
    InvalidConfig {
        /// 配置键名
        key: String,
        /// 配置值
        value: String,
        /// 无效原因说明
        reason: String,
    },

    /// 序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        /// 序列化失败原因
        message: String,
    },

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl MwError {
    /// 从 IO 错误创建
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// 文件不存在
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// 解析错误
    pub fn parse(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数据超出范围
    pub fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 索引越界
    pub fn index_out_of_bounds(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            index_type,
            index,
            len,
        }
    }

    /// 无效网格
    pub fn invalid_mesh(message: impl Into<String>) -> Self {
        Self::InvalidMesh {
            message: message.into(),
        }
    }

    /// 稳定性判据失败
    pub fn stability(criterion: &'static str, value: f64, limit: f64) -> Self {
        Self::Stability {
            criterion,
            value,
            limit,
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 配置值无效
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 序列化错误
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl MwError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> MwResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查值是否在范围内
    #[inline]
    pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> MwResult<()> {
        if value < min || value > max {
            Err(Self::out_of_range(field, value, min, max))
        } else {
            Ok(())
        }
    }

    /// 检查索引是否在范围内
    #[inline]
    pub fn check_index(index_type: &'static str, index: usize, len: usize) -> MwResult<()> {
        if index >= len {
            Err(Self::index_out_of_bounds(index_type, index, len))
        } else {
            Ok(())
        }
    }
}

// ========================================================================
// 标准库错误转换
// ========================================================================

impl From<std::io::Error> for MwError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

// ========================================================================
// 测试
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MwError::config("测试配置错误");
        assert!(err.to_string().contains("配置错误"));
    }

    #[test]
    fn test_parse_error() {
        let err = MwError::parse("mesh/coords_vp.dat", 12, "字段数不足");
        let s = err.to_string();
        assert!(s.contains("coords_vp.dat"));
        assert!(s.contains("12"));
    }

    #[test]
    fn test_stability_error() {
        let err = MwError::stability("CFL", 0.41, 0.28);
        assert!(err.to_string().contains("CFL"));
    }

    #[test]
    fn test_unknown_stress_label() {
        let err = MwError::UnknownStressLabel { label: 7 };
        assert!(err.to_string().contains("7"));
    }

    #[test]
    fn test_check_size() {
        assert!(MwError::check_size("basis", 10, 10).is_ok());
        assert!(MwError::check_size("basis", 10, 5).is_err());
    }

    #[test]
    fn test_check_range() {
        assert!(MwError::check_range("dt", 0.5, 0.0, 10.0).is_ok());
        assert!(MwError::check_range("dt", -1.0, 0.0, 10.0).is_err());
    }

    #[test]
    fn test_check_index() {
        assert!(MwError::check_index("VelocityGid", 5, 10).is_ok());
        assert!(MwError::check_index("VelocityGid", 10, 10).is_err());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let mw_err: MwError = io_err.into();
        assert!(matches!(mw_err, MwError::Io { .. }));
    }
}
