// crates/mw_io/src/lib.rs

//! MantleWave IO 层
//!
//! 提供数据输入输出功能：
//!
//! - [`basis`]: 基矩阵文件（前导行/列数头 + 列主序原始值，二进制或文本）
//! - [`array`]: 地震图/快照等稠密数组（可选前导尺寸头，二进制或文本）
//!
//! 二进制格式统一小端字节序；文本格式空白分隔，首行为尺寸头。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod basis;

pub use array::{read_array, write_array, write_seismogram};
pub use basis::{read_basis, write_basis, FileFormat};
