// crates/mw_physics/src/numerics/csr.rs

//! 压缩稀疏行（CSR）矩阵格式
//!
//! CSR 是最常用的稀疏矩阵存储格式之一，特别适合：
//! - 高效的矩阵-向量乘法 (SpMV)
//! - 行遍历操作
//! - 与交错网格差分算子的自然配合
//!
//! # 格式说明
//!
//! CSR 使用三个数组存储：
//! - `row_ptr`: 行指针，长度 n_rows + 1，row_ptr[i] 是第 i 行第一个非零元的索引
//! - `col_idx`: 列索引，与非零元一一对应
//! - `values`: 非零元值
//!
//! 行指针单调不减；行内列索引不要求有序，但必须唯一
//! （相同邻居 GID 在组装时已合并，不会留下重复条目）。
//!
//! # 使用示例
//!
//! ```ignore
//! use mw_physics::numerics::csr::{CsrBuilder, CsrMatrix};
//!
//! let mut builder = CsrBuilder::new(3, 3);
//! builder.set(0, 0, 4.0);
//! builder.set(0, 1, -1.0);
//! let matrix = builder.build();
//!
//! let x = vec![1.0, 2.0, 3.0];
//! let mut y = vec![0.0; 3];
//! matrix.mul_vec(&x, &mut y);
//! ```

use mw_foundation::Scalar;
use rayon::prelude::*;
use std::collections::BTreeMap;

// =============================================================================
// 稀疏模式（与值分离，用于复用）
// =============================================================================

/// CSR 矩阵的稀疏模式
///
/// 存储矩阵的结构信息（哪些位置有非零元），与值分离。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrPattern {
    /// 行数
    n_rows: usize,
    /// 列数
    n_cols: usize,
    /// 行指针
    row_ptr: Vec<usize>,
    /// 列索引
    col_idx: Vec<usize>,
}

impl CsrPattern {
    /// 获取行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 获取列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// 获取非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// 获取行指针切片
    #[inline]
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// 获取列索引切片
    #[inline]
    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    /// 获取第 row 行的非零元列索引
    #[inline]
    pub fn row_indices(&self, row: usize) -> &[usize] {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        &self.col_idx[start..end]
    }

    /// 获取第 row 行的非零元数量
    #[inline]
    pub fn row_nnz(&self, row: usize) -> usize {
        self.row_ptr[row + 1] - self.row_ptr[row]
    }

    /// 查找 (row, col) 对应的值索引
    ///
    /// 行内列索引不保证有序（组装按方位顺序写入），行宽最多 4，
    /// 线性扫描即可。
    pub fn find_index(&self, row: usize, col: usize) -> Option<usize> {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        (start..end).find(|&idx| self.col_idx[idx] == col)
    }

    /// 检查 (row, col) 是否有非零元
    pub fn has_entry(&self, row: usize, col: usize) -> bool {
        self.find_index(row, col).is_some()
    }

    /// 校验行指针不变量：单调不减且末尾等于 nnz
    pub fn check_invariants(&self) -> bool {
        if self.row_ptr.len() != self.n_rows + 1 {
            return false;
        }
        if self.row_ptr[0] != 0 || self.row_ptr[self.n_rows] != self.col_idx.len() {
            return false;
        }
        self.row_ptr.windows(2).all(|w| w[0] <= w[1])
    }
}

// =============================================================================
// CSR 矩阵主体
// =============================================================================

/// CSR 格式稀疏矩阵
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    /// 稀疏模式（不可变）
    pattern: CsrPattern,
    /// 非零元值（可变）
    values: Vec<Scalar>,
}

impl CsrMatrix {
    /// 从原始 CSR 数据创建矩阵
    ///
    /// # 参数
    ///
    /// - `n_rows`: 行数
    /// - `n_cols`: 列数
    /// - `row_ptr`: 行指针数组，长度 n_rows + 1
    /// - `col_idx`: 列索引数组
    /// - `values`: 非零元值数组
    ///
    /// # Panics
    ///
    /// - `row_ptr` 长度不为 n_rows + 1 或末尾不等于 nnz
    /// - `col_idx` 和 `values` 长度不等
    pub fn from_raw(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<Scalar>,
    ) -> Self {
        assert_eq!(row_ptr.len(), n_rows + 1, "row_ptr 长度必须为 n_rows + 1");
        assert_eq!(col_idx.len(), values.len(), "col_idx 和 values 长度必须相等");
        assert_eq!(row_ptr[n_rows], col_idx.len(), "row_ptr 末尾必须等于 nnz");

        Self {
            pattern: CsrPattern {
                n_rows,
                n_cols,
                row_ptr,
                col_idx,
            },
            values,
        }
    }

    /// 创建单位矩阵
    #[inline]
    pub fn identity(n: usize) -> Self {
        let mut builder = CsrBuilder::new(n, n);
        for i in 0..n {
            builder.set(i, i, 1.0);
        }
        builder.build()
    }

    /// 获取行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.pattern.n_rows()
    }

    /// 获取列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.pattern.n_cols()
    }

    /// 获取非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// 获取稀疏模式引用
    #[inline]
    pub fn pattern(&self) -> &CsrPattern {
        &self.pattern
    }

    /// 获取值切片
    #[inline]
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    /// 获取可变值切片
    #[inline]
    pub fn values_mut(&mut self) -> &mut [Scalar] {
        &mut self.values
    }

    /// 获取行指针
    #[inline]
    pub fn row_ptr(&self) -> &[usize] {
        self.pattern.row_ptr()
    }

    /// 获取列索引
    #[inline]
    pub fn col_idx(&self) -> &[usize] {
        self.pattern.col_idx()
    }

    /// 获取 (row, col) 位置的值（不存在返回 0）
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Scalar {
        self.pattern
            .find_index(row, col)
            .map_or(0.0, |idx| self.values[idx])
    }

    /// 获取第 row 行的非零元视图
    #[inline]
    pub fn row(&self, row: usize) -> RowView<'_> {
        let start = self.pattern.row_ptr[row];
        let end = self.pattern.row_ptr[row + 1];
        RowView {
            col_idx: &self.pattern.col_idx[start..end],
            values: &self.values[start..end],
        }
    }

    /// 矩阵-向量乘法 y = A * x
    ///
    /// # Panics
    /// - `x.len() != self.n_cols()`
    /// - `y.len() != self.n_rows()`
    pub fn mul_vec(&self, x: &[Scalar], y: &mut [Scalar]) {
        assert_eq!(x.len(), self.n_cols(), "x 长度必须等于矩阵列数");
        assert_eq!(y.len(), self.n_rows(), "y 长度必须等于矩阵行数");

        for row in 0..self.n_rows() {
            let start = self.pattern.row_ptr[row];
            let end = self.pattern.row_ptr[row + 1];

            let mut sum = 0.0;
            for idx in start..end {
                sum += self.values[idx] * x[self.pattern.col_idx[idx]];
            }
            y[row] = sum;
        }
    }

    /// 矩阵-向量乘法累加 y += alpha * A * x
    ///
    /// # Panics
    /// - `x.len() != self.n_cols()`
    /// - `y.len() != self.n_rows()`
    pub fn mul_vec_add(&self, alpha: Scalar, x: &[Scalar], y: &mut [Scalar]) {
        assert_eq!(x.len(), self.n_cols(), "x 长度必须等于矩阵列数");
        assert_eq!(y.len(), self.n_rows(), "y 长度必须等于矩阵行数");

        for row in 0..self.n_rows() {
            let start = self.pattern.row_ptr[row];
            let end = self.pattern.row_ptr[row + 1];

            let mut sum = 0.0;
            for idx in start..end {
                sum += self.values[idx] * x[self.pattern.col_idx[idx]];
            }
            y[row] += alpha * sum;
        }
    }

    /// 并行矩阵-向量乘法累加 y += alpha * A * x
    ///
    /// 每行只写自己的输出槽位，行间无共享可变状态，无需加锁。
    pub fn mul_vec_add_parallel(&self, alpha: Scalar, x: &[Scalar], y: &mut [Scalar]) {
        assert_eq!(x.len(), self.n_cols(), "x 长度必须等于矩阵列数");
        assert_eq!(y.len(), self.n_rows(), "y 长度必须等于矩阵行数");

        y.par_iter_mut().enumerate().for_each(|(row, out)| {
            let start = self.pattern.row_ptr[row];
            let end = self.pattern.row_ptr[row + 1];

            let mut sum = 0.0;
            for idx in start..end {
                sum += self.values[idx] * x[self.pattern.col_idx[idx]];
            }
            *out += alpha * sum;
        });
    }

    /// 批量矩阵乘法累加 Y += alpha * A * X（rank-2 状态）
    ///
    /// X/Y 按实现主序存储：第 dof 行的 n_real 个实现连续排列，
    /// 即 `X[col * n_real + k]`。每个输出行的所有实现由同一任务写出。
    ///
    /// # Panics
    /// - `x.len() != self.n_cols() * n_real`
    /// - `y.len() != self.n_rows() * n_real`
    pub fn mul_batch_add(&self, alpha: Scalar, x: &[Scalar], n_real: usize, y: &mut [Scalar]) {
        assert_eq!(x.len(), self.n_cols() * n_real, "X 尺寸必须为 n_cols × n_real");
        assert_eq!(y.len(), self.n_rows() * n_real, "Y 尺寸必须为 n_rows × n_real");

        y.par_chunks_mut(n_real).enumerate().for_each(|(row, out)| {
            let start = self.pattern.row_ptr[row];
            let end = self.pattern.row_ptr[row + 1];

            for idx in start..end {
                let v = alpha * self.values[idx];
                let src = &x[self.pattern.col_idx[idx] * n_real..][..n_real];
                for k in 0..n_real {
                    out[k] += v * src[k];
                }
            }
        });
    }

    /// 计算矩阵的无穷范数（最大行绝对值和）
    pub fn infinity_norm(&self) -> Scalar {
        let mut max_row_sum = 0.0;
        for row in 0..self.n_rows() {
            let start = self.pattern.row_ptr[row];
            let end = self.pattern.row_ptr[row + 1];
            let row_sum: Scalar = self.values[start..end].iter().map(|v| v.abs()).sum();
            max_row_sum = Scalar::max(max_row_sum, row_sum);
        }
        max_row_sum
    }

    /// 将所有值清零（保持稀疏模式不变）
    pub fn clear_values(&mut self) {
        self.values.fill(0.0);
    }

    /// 缩放所有值 A *= factor
    pub fn scale(&mut self, factor: Scalar) {
        for v in &mut self.values {
            *v *= factor;
        }
    }
}

// =============================================================================
// 行视图辅助类型
// =============================================================================

/// 行视图：提供对矩阵某一行的非零元的只读访问
pub struct RowView<'a> {
    col_idx: &'a [usize],
    values: &'a [Scalar],
}

impl<'a> RowView<'a> {
    /// 获取列索引切片
    #[inline]
    pub fn col_indices(&self) -> &'a [usize] {
        self.col_idx
    }

    /// 获取值切片
    #[inline]
    pub fn values(&self) -> &'a [Scalar] {
        self.values
    }

    /// 获取非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// 迭代 (列索引, 值) 对
    pub fn iter(&self) -> impl Iterator<Item = (usize, Scalar)> + 'a {
        self.col_idx
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

// =============================================================================
// 构建器
// =============================================================================

/// CSR 矩阵构建器
///
/// 使用 BTreeMap 临时存储，构建时转换为紧凑 CSR 格式。
/// 适合测试与小规模构造；算子组装的热路径走计数预扫 +
/// [`CsrMatrix::from_raw`]，不经过构建器。
pub struct CsrBuilder {
    n_rows: usize,
    n_cols: usize,
    /// 每行的 (列索引, 值) 映射
    rows: Vec<BTreeMap<usize, Scalar>>,
}

impl CsrBuilder {
    /// 创建构建器
    ///
    /// # Panics
    /// - `n_rows == 0` 或 `n_cols == 0`
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        assert!(n_rows > 0, "行数必须大于 0");
        assert!(n_cols > 0, "列数必须大于 0");

        Self {
            n_rows,
            n_cols,
            rows: vec![BTreeMap::new(); n_rows],
        }
    }

    /// 设置 (row, col) 的值（覆盖）
    ///
    /// # Panics
    /// - 索引越界
    pub fn set(&mut self, row: usize, col: usize, value: Scalar) {
        assert!(row < self.n_rows, "行索引越界");
        assert!(col < self.n_cols, "列索引越界");
        self.rows[row].insert(col, value);
    }

    /// 累加到 (row, col)
    ///
    /// # Panics
    /// - 索引越界
    pub fn add(&mut self, row: usize, col: usize, value: Scalar) {
        assert!(row < self.n_rows, "行索引越界");
        assert!(col < self.n_cols, "列索引越界");
        *self.rows[row].entry(col).or_insert(0.0) += value;
    }

    /// 获取当前非零元总数
    #[inline]
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    /// 构建 CSR 矩阵（消耗构建器）
    pub fn build(self) -> CsrMatrix {
        let nnz = self.nnz();
        let mut row_ptr = Vec::with_capacity(self.n_rows + 1);
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        row_ptr.push(0);
        for row_map in self.rows {
            for (col, val) in row_map {
                col_idx.push(col);
                values.push(val);
            }
            row_ptr.push(col_idx.len());
        }

        CsrMatrix {
            pattern: CsrPattern {
                n_rows: self.n_rows,
                n_cols: self.n_cols,
                row_ptr,
                col_idx,
            },
            values,
        }
    }
}

// =============================================================================
// 测试
// =============================================================================
