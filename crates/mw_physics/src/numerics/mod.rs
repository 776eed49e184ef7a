// crates/mw_physics/src/numerics/mod.rs

//! 数值内核
//!
//! - [`csr`]: 压缩稀疏行（CSR）矩阵，空间导数算子的存储格式
//! - [`dense`]: 列主序稠密小矩阵，降阶算子与基矩阵的存储格式

pub mod csr;
pub mod dense;

pub use csr::{CsrBuilder, CsrMatrix, CsrPattern, RowView};
pub use dense::DenseMatrix;
