// crates/mw_config/src/lib.rs

//! MantleWave 配置层
//!
//! 提供剪切波模拟的全部运行参数。设计为单一配置结构体
//! [`SimulationConfig`]，由唯一的加载函数 [`SimulationConfig::from_file`]
//! 填充，下游构造函数一律接受普通值结构体而非解析器对象。
//!
//! # 使用示例
//!
//! ```ignore
//! use mw_config::SimulationConfig;
//!
//! let config = SimulationConfig::from_file("run.json")?;
//! config.validate()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod simulation;

pub use simulation::{
    GridConfig, OutputConfig, RomConfig, SamplingConfig, SimulationConfig, SourceConfig,
    StabilityConfig, TimeConfig,
};
