// crates/mw_mesh/src/lib.rs

//! MantleWave 网格层
//!
//! 提供交错极坐标网格的连接关系表示：
//! - [`connectivity`]: 自由度类型、邻接表、坐标与差分模板系数
//! - [`loader`]: 网格/模板系数文本文件加载
//! - [`structured`]: 结构化 nθ×nr 极坐标网格的内存生成器
//!
//! # 交错布局
//!
//! 速度自由度位于整网格点，应力自由度位于半网格点，分两类：
//! - 径向剪切（σ_rφ）：径向半点，两个速度邻居沿 r 方向
//! - 切向剪切（σ_θφ）：角向半点，两个速度邻居沿 θ 方向
//!
//! 每个速度点最多 4 个应力邻居（西/北/东/南）；位于域边缘的速度点
//! 在缺失的一侧重复引用同一个应力 GID，算子组装据此执行合并。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connectivity;
pub mod loader;
pub mod structured;

pub use connectivity::{
    DofKind, MeshConnectivity, StressDofs, StressLabel, VelocityDofs,
};
pub use loader::load_mesh_dir;
pub use structured::StructuredPolarGrid;
