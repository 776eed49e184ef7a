// crates/mw_io/src/basis.rs

//! 基矩阵文件
//!
//! 稠密列主序矩阵，前导尺寸头（行数、列数），随后为原始值：
//!
//! ```text
//! 二进制: [行数: u64 LE] [列数: u64 LE] [值: rows×cols × f64 LE，列主序]
//! 文本:   首行 "rows cols"，随后每行一个值，列主序
//! ```
//!
//! 读取时把头部与实际数据量交叉校验；与请求的 ROM 规模的一致性
//! 由调用方（`Basis::check_dims`）负责。

use mw_foundation::{MwError, MwResult, Scalar};
use mw_physics::DenseMatrix;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// 文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// 小端二进制
    Binary,
    /// 空白分隔文本
    Text,
}

impl FileFormat {
    /// 按扩展名推断格式（`.txt`/`.dat` 为文本，其余二进制）
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("txt") | Some("dat") => Self::Text,
            _ => Self::Binary,
        }
    }
}

/// 写出基矩阵
pub fn write_basis(path: impl AsRef<Path>, matrix: &DenseMatrix, format: FileFormat) -> MwResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut w = BufWriter::new(std::fs::File::create(path)?);

    match format {
        FileFormat::Binary => {
            w.write_all(&(matrix.n_rows() as u64).to_le_bytes())?;
            w.write_all(&(matrix.n_cols() as u64).to_le_bytes())?;
            for v in matrix.data() {
                w.write_all(&v.to_le_bytes())?;
            }
        }
        FileFormat::Text => {
            writeln!(w, "{} {}", matrix.n_rows(), matrix.n_cols())?;
            for v in matrix.data() {
                writeln!(w, "{:.17e}", v)?;
            }
        }
    }
    w.flush()?;
    Ok(())
}

/// 读取基矩阵
pub fn read_basis(path: impl AsRef<Path>, format: FileFormat) -> MwResult<DenseMatrix> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MwError::file_not_found(path));
    }

    match format {
        FileFormat::Binary => read_binary(path),
        FileFormat::Text => read_text(path),
    }
}

fn read_binary(path: &Path) -> MwResult<DenseMatrix> {
    let mut r = BufReader::new(std::fs::File::open(path)?);

    let mut u64_buf = [0u8; 8];
    r.read_exact(&mut u64_buf)
        .map_err(|_| MwError::serialization(format!("{}: 尺寸头不完整", path.display())))?;
    let n_rows = u64::from_le_bytes(u64_buf) as usize;
    r.read_exact(&mut u64_buf)
        .map_err(|_| MwError::serialization(format!("{}: 尺寸头不完整", path.display())))?;
    let n_cols = u64::from_le_bytes(u64_buf) as usize;

    if n_rows == 0 || n_cols == 0 {
        return Err(MwError::serialization(format!(
            "{}: 非法矩阵尺寸 {}x{}",
            path.display(),
            n_rows,
            n_cols
        )));
    }

    let mut data = Vec::with_capacity(n_rows * n_cols);
    let mut f64_buf = [0u8; 8];
    for _ in 0..n_rows * n_cols {
        r.read_exact(&mut f64_buf).map_err(|_| {
            MwError::serialization(format!(
                "{}: 数据不足，期望 {} 个值",
                path.display(),
                n_rows * n_cols
            ))
        })?;
        data.push(Scalar::from_le_bytes(f64_buf));
    }

    DenseMatrix::from_raw(n_rows, n_cols, data)
}

fn read_text(path: &Path) -> MwResult<DenseMatrix> {
    let r = BufReader::new(std::fs::File::open(path)?);
    let mut lines = r.lines();

    let header = lines
        .next()
        .ok_or_else(|| MwError::parse(path, 1, "缺少尺寸头"))??;
    let mut it = header.split_whitespace();
    let n_rows: usize = it
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| MwError::parse(path, 1, "行数非法"))?;
    let n_cols: usize = it
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| MwError::parse(path, 1, "列数非法"))?;

    let mut data = Vec::with_capacity(n_rows * n_cols);
    for (idx, line) in lines.enumerate() {
        let line = line?;
        for tok in line.split_whitespace() {
            let v: Scalar = tok
                .parse()
                .map_err(|_| MwError::parse(path, idx + 2, format!("数值非法: {:?}", tok)))?;
            data.push(v);
        }
    }
    MwError::check_size("基矩阵值个数", n_rows * n_cols, data.len())?;

    DenseMatrix::from_raw(n_rows, n_cols, data)
}
