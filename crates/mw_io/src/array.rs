// crates/mw_io/src/array.rs

//! 稠密数组输出（地震图、快照）
//!
//! 二维或三维稠密数组（接收点/网格点 × 时间 × 可选实现维），
//! 带可选的前导尺寸头：
//!
//! ```text
//! 二进制: [维数: u64 LE] [各维长度: u64 LE ...] [值: f64 LE ...]
//! 文本:   首行各维长度，随后每行一个值
//! ```
//!
//! 无头模式只写原始值，尺寸由调用方另行记录。

use crate::basis::FileFormat;
use mw_foundation::{MwError, MwResult, Scalar};
use mw_physics::SeismogramRecorder;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// 写出稠密数组
///
/// # 参数
///
/// - `dims`: 各维长度，乘积必须等于 `data.len()`
/// - `with_header`: 是否写前导尺寸头
pub fn write_array(
    path: impl AsRef<Path>,
    dims: &[usize],
    data: &[Scalar],
    format: FileFormat,
    with_header: bool,
) -> MwResult<()> {
    let expected: usize = dims.iter().product();
    MwError::check_size("数组值个数", expected, data.len())?;

    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut w = BufWriter::new(std::fs::File::create(path)?);

    match format {
        FileFormat::Binary => {
            if with_header {
                w.write_all(&(dims.len() as u64).to_le_bytes())?;
                for &d in dims {
                    w.write_all(&(d as u64).to_le_bytes())?;
                }
            }
            for v in data {
                w.write_all(&v.to_le_bytes())?;
            }
        }
        FileFormat::Text => {
            if with_header {
                let header: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                writeln!(w, "{}", header.join(" "))?;
            }
            for v in data {
                writeln!(w, "{:.17e}", v)?;
            }
        }
    }
    w.flush()?;
    Ok(())
}

/// 读取带头的稠密数组（往返校验用）
pub fn read_array(path: impl AsRef<Path>, format: FileFormat) -> MwResult<(Vec<usize>, Vec<Scalar>)> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MwError::file_not_found(path));
    }

    match format {
        FileFormat::Binary => {
            let mut r = BufReader::new(std::fs::File::open(path)?);
            let mut u64_buf = [0u8; 8];
            r.read_exact(&mut u64_buf)
                .map_err(|_| MwError::serialization(format!("{}: 尺寸头不完整", path.display())))?;
            let ndims = u64::from_le_bytes(u64_buf) as usize;
            if ndims == 0 || ndims > 4 {
                return Err(MwError::serialization(format!(
                    "{}: 非法维数 {}",
                    path.display(),
                    ndims
                )));
            }

            let mut dims = Vec::with_capacity(ndims);
            for _ in 0..ndims {
                r.read_exact(&mut u64_buf).map_err(|_| {
                    MwError::serialization(format!("{}: 尺寸头不完整", path.display()))
                })?;
                dims.push(u64::from_le_bytes(u64_buf) as usize);
            }

            let total: usize = dims.iter().product();
            let mut data = Vec::with_capacity(total);
            let mut f64_buf = [0u8; 8];
            for _ in 0..total {
                r.read_exact(&mut f64_buf).map_err(|_| {
                    MwError::serialization(format!("{}: 数据不足", path.display()))
                })?;
                data.push(Scalar::from_le_bytes(f64_buf));
            }
            Ok((dims, data))
        }
        FileFormat::Text => {
            let r = BufReader::new(std::fs::File::open(path)?);
            let mut lines = r.lines();
            let header = lines
                .next()
                .ok_or_else(|| MwError::parse(path, 1, "缺少尺寸头"))??;
            let dims: Vec<usize> = header
                .split_whitespace()
                .map(|s| s.parse())
                .collect::<Result<_, _>>()
                .map_err(|_| MwError::parse(path, 1, "尺寸头非法"))?;

            let mut data = Vec::new();
            for (idx, line) in lines.enumerate() {
                let line = line?;
                for tok in line.split_whitespace() {
                    let v: Scalar = tok.parse().map_err(|_| {
                        MwError::parse(path, idx + 2, format!("数值非法: {:?}", tok))
                    })?;
                    data.push(v);
                }
            }
            let total: usize = dims.iter().product();
            MwError::check_size("数组值个数", total, data.len())?;
            Ok((dims, data))
        }
    }
}

/// 写出地震图记录
///
/// 布局（接收点 × 采样 × 实现）；rank-1 运行退化为二维数组。
pub fn write_seismogram(
    path: impl AsRef<Path>,
    recorder: &SeismogramRecorder,
    format: FileFormat,
    with_header: bool,
) -> MwResult<()> {
    let data = recorder.to_dense();
    if recorder.n_real() == 1 {
        write_array(
            path,
            &[recorder.n_receivers(), recorder.n_samples()],
            &data,
            format,
            with_header,
        )
    } else {
        write_array(
            path,
            &[
                recorder.n_receivers(),
                recorder.n_samples(),
                recorder.n_real(),
            ],
            &data,
            format,
            with_header,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("mw_io_array_{}_{}", tag, std::process::id()))
    }

    #[test]
    fn test_binary_roundtrip_3d() {
        let path = temp_path("bin3d");
        let dims = [2usize, 3, 2];
        let data: Vec<Scalar> = (0..12).map(|i| i as Scalar * 0.5).collect();
        write_array(&path, &dims, &data, FileFormat::Binary, true).unwrap();

        let (rdims, rdata) = read_array(&path, FileFormat::Binary).unwrap();
        assert_eq!(rdims, dims.to_vec());
        assert_eq!(rdata, data);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_text_roundtrip_2d() {
        let path = temp_path("txt2d");
        let dims = [3usize, 4];
        let data: Vec<Scalar> = (0..12).map(|i| (i as Scalar).sin()).collect();
        write_array(&path, &dims, &data, FileFormat::Text, true).unwrap();

        let (rdims, rdata) = read_array(&path, FileFormat::Text).unwrap();
        assert_eq!(rdims, dims.to_vec());
        for (a, b) in rdata.iter().zip(data.iter()) {
            assert!((a - b).abs() < 1e-15);
        }
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_headerless_binary_size() {
        let path = temp_path("nohdr");
        let data = vec![1.0, 2.0, 3.0, 4.0];
        write_array(&path, &[2, 2], &data, FileFormat::Binary, false).unwrap();
        // 无头模式只有原始值
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 4 * 8);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_dims_mismatch_is_fatal() {
        let path = temp_path("mismatch");
        let err = write_array(&path, &[2, 3], &[1.0; 5], FileFormat::Binary, true).unwrap_err();
        assert!(matches!(err, MwError::SizeMismatch { .. }));
    }
}
