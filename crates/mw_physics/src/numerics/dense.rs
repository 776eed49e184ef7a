// crates/mw_physics/src/numerics/dense.rs

//! 列主序稠密矩阵
//!
//! 降阶算子与基矩阵的存储格式。规模为 ROM 维度（几十到几百），
//! 朴素三重循环即可；与基矩阵文件的列主序布局一致，整列可以
//! 连续读写。

use mw_foundation::{MwError, MwResult, Scalar};
use rayon::prelude::*;

/// 列主序稠密矩阵
///
/// 元素 (i, j) 存储在 `data[j * n_rows + i]`。
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<Scalar>,
}

impl DenseMatrix {
    /// 创建零矩阵
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            data: vec![0.0; n_rows * n_cols],
        }
    }

    /// 从列主序数据创建
    pub fn from_raw(n_rows: usize, n_cols: usize, data: Vec<Scalar>) -> MwResult<Self> {
        MwError::check_size("dense data", n_rows * n_cols, data.len())?;
        Ok(Self {
            n_rows,
            n_cols,
            data,
        })
    }

    /// 单位矩阵
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// 列主序数据切片
    #[inline]
    pub fn data(&self) -> &[Scalar] {
        &self.data
    }

    /// 可变列主序数据切片
    #[inline]
    pub fn data_mut(&mut self) -> &mut [Scalar] {
        &mut self.data
    }

    /// 读取元素
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Scalar {
        debug_assert!(row < self.n_rows && col < self.n_cols);
        self.data[col * self.n_rows + row]
    }

    /// 写入元素
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: Scalar) {
        debug_assert!(row < self.n_rows && col < self.n_cols);
        self.data[col * self.n_rows + row] = value;
    }

    /// 第 col 列的只读切片
    #[inline]
    pub fn col(&self, col: usize) -> &[Scalar] {
        &self.data[col * self.n_rows..(col + 1) * self.n_rows]
    }

    /// 第 col 列的可变切片
    #[inline]
    pub fn col_mut(&mut self, col: usize) -> &mut [Scalar] {
        &mut self.data[col * self.n_rows..(col + 1) * self.n_rows]
    }

    /// 拷贝第 row 行（跨列跳步读取）
    pub fn row_copy(&self, row: usize) -> Vec<Scalar> {
        (0..self.n_cols).map(|c| self.get(row, c)).collect()
    }

    /// 清零
    pub fn fill_zero(&mut self) {
        self.data.fill(0.0);
    }

    /// 矩阵-向量乘法累加 y += alpha * A * x
    ///
    /// # Panics
    /// - `x.len() != n_cols` 或 `y.len() != n_rows`
    pub fn mul_vec_add(&self, alpha: Scalar, x: &[Scalar], y: &mut [Scalar]) {
        assert_eq!(x.len(), self.n_cols, "x 长度必须等于矩阵列数");
        assert_eq!(y.len(), self.n_rows, "y 长度必须等于矩阵行数");

        // 按列遍历保持连续访问
        for col in 0..self.n_cols {
            let xv = alpha * x[col];
            let column = self.col(col);
            for row in 0..self.n_rows {
                y[row] += xv * column[row];
            }
        }
    }

    /// 批量矩阵乘法累加 Y += alpha * A * X（rank-2 状态）
    ///
    /// X/Y 按实现主序存储（与稀疏侧相同布局）：`X[col * n_real + k]`。
    pub fn mul_batch_add(&self, alpha: Scalar, x: &[Scalar], n_real: usize, y: &mut [Scalar]) {
        assert_eq!(x.len(), self.n_cols * n_real, "X 尺寸必须为 n_cols × n_real");
        assert_eq!(y.len(), self.n_rows * n_real, "Y 尺寸必须为 n_rows × n_real");

        y.par_chunks_mut(n_real).enumerate().for_each(|(row, out)| {
            for col in 0..self.n_cols {
                let v = alpha * self.get(row, col);
                let src = &x[col * n_real..][..n_real];
                for k in 0..n_real {
                    out[k] += v * src[k];
                }
            }
        });
    }

    /// 矩阵乘法 C = Aᵀ * B
    ///
    /// # Panics
    /// - `self.n_rows != other.n_rows`
    pub fn tr_mul(&self, other: &DenseMatrix) -> DenseMatrix {
        assert_eq!(
            self.n_rows, other.n_rows,
            "Aᵀ·B 要求两矩阵行数一致"
        );
        let mut out = DenseMatrix::zeros(self.n_cols, other.n_cols);
        for j in 0..other.n_cols {
            let bj = other.col(j);
            for i in 0..self.n_cols {
                let ai = self.col(i);
                let mut sum = 0.0;
                for k in 0..self.n_rows {
                    sum += ai[k] * bj[k];
                }
                out.set(i, j, sum);
            }
        }
        out
    }

    /// Frobenius 范数
    pub fn frobenius_norm(&self) -> Scalar {
        self.data.iter().map(|v| v * v).sum::<Scalar>().sqrt()
    }
}
