// crates/mw_physics/src/rom/basis.rs

//! 降阶基矩阵
//!
//! 基矩阵按列正交（由生成方保证，通常为 POD），一次运行加载一次，
//! 此后不可变。本模块只校验维度（维度类错误在循环前致命），不验证
//! 正交性；随机基仅用于规模/计时研究，不做正交化。

use crate::numerics::DenseMatrix;
use mw_foundation::{MwError, MwResult, Scalar};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 降阶基（#自由度 × r，列正交）
#[derive(Debug, Clone)]
pub struct Basis {
    matrix: DenseMatrix,
}

impl Basis {
    /// 从稠密矩阵创建（文件加载结果）
    pub fn from_matrix(matrix: DenseMatrix) -> Self {
        Self { matrix }
    }

    /// 生成随机基（纯规模测试，不保证动力学正确性）
    ///
    /// 元素取 [-1, 1] 均匀分布并按 1/√n_rows 缩放，量级与正交基一致。
    pub fn random(n_rows: usize, n_cols: usize, seed: u64) -> Self {
        assert!(n_rows > 0 && n_cols > 0, "基矩阵维度必须大于 0");
        let mut rng = StdRng::seed_from_u64(seed);
        let scale = 1.0 / (n_rows as Scalar).sqrt();
        let data: Vec<Scalar> = (0..n_rows * n_cols)
            .map(|_| rng.gen_range(-1.0..=1.0) * scale)
            .collect();
        Self {
            matrix: DenseMatrix::from_raw(n_rows, n_cols, data).expect("维度按构造一致"),
        }
    }

    /// 标准基列选择（测试用）
    ///
    /// 第 k 列为 e_{cols[k]}，投影等价于行/列抽取。
    pub fn identity_selection(n_rows: usize, cols: &[usize]) -> MwResult<Self> {
        let mut m = DenseMatrix::zeros(n_rows, cols.len());
        for (k, &row) in cols.iter().enumerate() {
            MwError::check_index("基列选择", row, n_rows)?;
            m.set(row, k, 1.0);
        }
        Ok(Self { matrix: m })
    }

    /// 基矩阵行数（全阶自由度个数）
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.matrix.n_rows()
    }

    /// 基矩阵列数（ROM 规模）
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.matrix.n_cols()
    }

    /// 基矩阵引用
    #[inline]
    pub fn matrix(&self) -> &DenseMatrix {
        &self.matrix
    }

    /// 校验基与全阶自由度数、请求的 ROM 规模一致
    ///
    /// 不一致属维度类错误，循环开始前致命。
    pub fn check_dims(&self, n_full: usize, rom_size: usize) -> MwResult<()> {
        MwError::check_size("基矩阵行数", n_full, self.n_rows())?;
        MwError::check_size("基矩阵列数", rom_size, self.n_cols())?;
        Ok(())
    }
}
