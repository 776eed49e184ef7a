// crates/mw_mesh/src/loader.rs

//! 网格目录加载与写出
//!
//! 网格目录包含三个文本文件，每行一个网格点：
//!
//! ```text
//! connectivity_vp.dat   GID 轴标志 θ[rad] r[km] 西 北 东 南
//! connectivity_sp.dat   GID 标签 轴标志 θ[rad] r[km] 邻居1 邻居2
//! stencil_vp.dat        GID c0 c1 c2 c3
//! ```
//!
//! 半径在解析时由 km 换算为逆米（1/m）存储。行内字段数不足、
//! 数值非法、GID 重复或越界均为致命解析错误，报告文件与行号。

use crate::connectivity::{MeshConnectivity, StressDofs, StressLabel, VelocityDofs};
use mw_foundation::scalar::KM_TO_M;
use mw_foundation::{MwError, MwResult, Scalar};
use std::io::Write;
use std::path::Path;

/// 速度连接文件名
pub const VELOCITY_FILE: &str = "connectivity_vp.dat";
/// 应力连接文件名
pub const STRESS_FILE: &str = "connectivity_sp.dat";
/// 模板系数文件名
pub const STENCIL_FILE: &str = "stencil_vp.dat";

/// 从网格目录加载完整连接关系
pub fn load_mesh_dir(dir: impl AsRef<Path>) -> MwResult<MeshConnectivity> {
    let dir = dir.as_ref();
    let mut velocity = load_velocity_file(&dir.join(VELOCITY_FILE))?;
    let stress = load_stress_file(&dir.join(STRESS_FILE))?;
    load_stencil_file(&dir.join(STENCIL_FILE), &mut velocity)?;

    let d_theta = infer_spacing(&velocity.theta)
        .ok_or_else(|| MwError::invalid_mesh("无法从速度点坐标推断角向间距"))?;
    let radii: Vec<Scalar> = velocity.inv_radius.iter().map(|&ir| 1.0 / ir).collect();
    let d_r = infer_spacing(&radii)
        .ok_or_else(|| MwError::invalid_mesh("无法从速度点坐标推断径向间距"))?;

    let mesh = MeshConnectivity {
        velocity,
        stress,
        d_theta,
        d_r,
    };
    mesh.validate()?;
    Ok(mesh)
}

/// 逐行读取文件，跳过空行与 # 注释行
fn read_data_lines(path: &Path) -> MwResult<Vec<(usize, String)>> {
    if !path.exists() {
        return Err(MwError::file_not_found(path));
    }
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim().to_string()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .collect())
}

fn parse_field<T: std::str::FromStr>(
    path: &Path,
    line_no: usize,
    fields: &[&str],
    idx: usize,
    name: &str,
) -> MwResult<T> {
    let raw = fields.get(idx).ok_or_else(|| {
        MwError::parse(path, line_no, format!("缺少字段 {} (第 {} 列)", name, idx + 1))
    })?;
    raw.parse::<T>()
        .map_err(|_| MwError::parse(path, line_no, format!("字段 {} 非法: {:?}", name, raw)))
}

/// 加载速度连接文件
///
/// 模板系数由 `stencil_vp.dat` 单独提供，此处先填 1 占位。
fn load_velocity_file(path: &Path) -> MwResult<VelocityDofs> {
    let lines = read_data_lines(path)?;
    let n = lines.len();
    if n == 0 {
        return Err(MwError::invalid_mesh(format!("{} 为空", path.display())));
    }

    let mut dofs = VelocityDofs {
        theta: vec![0.0; n],
        inv_radius: vec![0.0; n],
        on_axis: vec![false; n],
        neighbors: vec![[0; 4]; n],
        stencil: vec![[1.0; 4]; n],
    };
    let mut seen = vec![false; n];

    for (line_no, line) in &lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let gid: usize = parse_field(path, *line_no, &fields, 0, "GID")?;
        if gid >= n {
            return Err(MwError::parse(
                path,
                *line_no,
                format!("GID {} 超出行数 {}", gid, n),
            ));
        }
        if seen[gid] {
            return Err(MwError::parse(path, *line_no, format!("GID {} 重复", gid)));
        }
        seen[gid] = true;

        let axis: i64 = parse_field(path, *line_no, &fields, 1, "轴标志")?;
        let theta: Scalar = parse_field(path, *line_no, &fields, 2, "θ")?;
        let r_km: Scalar = parse_field(path, *line_no, &fields, 3, "r")?;
        if r_km <= 0.0 {
            return Err(MwError::parse(
                path,
                *line_no,
                format!("半径必须为正: {}", r_km),
            ));
        }

        dofs.on_axis[gid] = axis != 0;
        dofs.theta[gid] = theta;
        dofs.inv_radius[gid] = 1.0 / (r_km * KM_TO_M);
        for (slot, name) in ["西", "北", "东", "南"].iter().enumerate() {
            dofs.neighbors[gid][slot] = parse_field(path, *line_no, &fields, 4 + slot, name)?;
        }
    }

    Ok(dofs)
}

/// 加载应力连接文件
fn load_stress_file(path: &Path) -> MwResult<StressDofs> {
    let lines = read_data_lines(path)?;
    let n = lines.len();
    if n == 0 {
        return Err(MwError::invalid_mesh(format!("{} 为空", path.display())));
    }

    let mut dofs = StressDofs {
        theta: vec![0.0; n],
        inv_radius: vec![0.0; n],
        labels: vec![StressLabel::RadialShear; n],
        neighbors: vec![[0; 2]; n],
    };
    let mut seen = vec![false; n];

    for (line_no, line) in &lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let gid: usize = parse_field(path, *line_no, &fields, 0, "GID")?;
        if gid >= n {
            return Err(MwError::parse(
                path,
                *line_no,
                format!("GID {} 超出行数 {}", gid, n),
            ));
        }
        if seen[gid] {
            return Err(MwError::parse(path, *line_no, format!("GID {} 重复", gid)));
        }
        seen[gid] = true;

        let label_code: i64 = parse_field(path, *line_no, &fields, 1, "标签")?;
        let _axis: i64 = parse_field(path, *line_no, &fields, 2, "轴标志")?;
        let theta: Scalar = parse_field(path, *line_no, &fields, 3, "θ")?;
        let r_km: Scalar = parse_field(path, *line_no, &fields, 4, "r")?;
        if r_km <= 0.0 {
            return Err(MwError::parse(
                path,
                *line_no,
                format!("半径必须为正: {}", r_km),
            ));
        }

        dofs.labels[gid] = StressLabel::from_code(label_code)?;
        dofs.theta[gid] = theta;
        dofs.inv_radius[gid] = 1.0 / (r_km * KM_TO_M);
        dofs.neighbors[gid][0] = parse_field(path, *line_no, &fields, 5, "邻居1")?;
        dofs.neighbors[gid][1] = parse_field(path, *line_no, &fields, 6, "邻居2")?;
    }

    Ok(dofs)
}

/// 加载模板系数文件，填入速度容器
fn load_stencil_file(path: &Path, dofs: &mut VelocityDofs) -> MwResult<()> {
    let lines = read_data_lines(path)?;
    MwError::check_size("stencil 行数", dofs.len(), lines.len())?;

    for (line_no, line) in &lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let gid: usize = parse_field(path, *line_no, &fields, 0, "GID")?;
        MwError::check_index("VelocityGid", gid, dofs.len())?;
        for k in 0..4 {
            dofs.stencil[gid][k] =
                parse_field(path, *line_no, &fields, 1 + k, "系数")?;
        }
    }
    Ok(())
}

/// 从有序坐标集合推断均匀间距
///
/// 取去重排序后相邻差值的最小正值。坐标按 1e-9 相对容差去重。
fn infer_spacing(values: &[Scalar]) -> Option<Scalar> {
    let mut sorted: Vec<Scalar> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let scale = sorted.last()?.abs().max(1.0);
    let tol = 1e-9 * scale;

    let mut spacing: Option<Scalar> = None;
    for w in sorted.windows(2) {
        let d = w[1] - w[0];
        if d > tol {
            spacing = Some(match spacing {
                Some(s) => s.min(d),
                None => d,
            });
        }
    }
    spacing
}

/// 将连接关系写出为网格目录（加载格式的逆操作）
pub fn write_mesh_dir(mesh: &MeshConnectivity, dir: impl AsRef<Path>) -> MwResult<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let mut f = std::io::BufWriter::new(std::fs::File::create(dir.join(VELOCITY_FILE))?);
    for gid in 0..mesh.velocity.len() {
        let r_km = 1.0 / mesh.velocity.inv_radius[gid] / KM_TO_M;
        let nb = mesh.velocity.neighbors[gid];
        writeln!(
            f,
            "{} {} {:.17e} {:.17e} {} {} {} {}",
            gid,
            mesh.velocity.on_axis[gid] as u8,
            mesh.velocity.theta[gid],
            r_km,
            nb[0],
            nb[1],
            nb[2],
            nb[3]
        )?;
    }
    f.flush()?;

    let mut f = std::io::BufWriter::new(std::fs::File::create(dir.join(STRESS_FILE))?);
    for gid in 0..mesh.stress.len() {
        let r_km = 1.0 / mesh.stress.inv_radius[gid] / KM_TO_M;
        let nb = mesh.stress.neighbors[gid];
        writeln!(
            f,
            "{} {} 0 {:.17e} {:.17e} {} {}",
            gid,
            mesh.stress.labels[gid].code(),
            mesh.stress.theta[gid],
            r_km,
            nb[0],
            nb[1]
        )?;
    }
    f.flush()?;

    let mut f = std::io::BufWriter::new(std::fs::File::create(dir.join(STENCIL_FILE))?);
    for gid in 0..mesh.velocity.len() {
        let c = mesh.velocity.stencil[gid];
        writeln!(
            f,
            "{} {:.17e} {:.17e} {:.17e} {:.17e}",
            gid, c[0], c[1], c[2], c[3]
        )?;
    }
    f.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured::StructuredPolarGrid;
    use mw_foundation::scalar::{CMB_RADIUS_M, EARTH_RADIUS_M};

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("mw_mesh_{}_{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_roundtrip_structured_grid() {
        let mesh = StructuredPolarGrid::new(7, 9, CMB_RADIUS_M, EARTH_RADIUS_M).build();
        let dir = temp_dir("roundtrip");
        write_mesh_dir(&mesh, &dir).unwrap();
        let loaded = load_mesh_dir(&dir).unwrap();

        assert_eq!(loaded.n_velocity(), mesh.n_velocity());
        assert_eq!(loaded.n_stress(), mesh.n_stress());
        assert_eq!(loaded.velocity.neighbors, mesh.velocity.neighbors);
        assert_eq!(loaded.stress.neighbors, mesh.stress.neighbors);
        assert_eq!(loaded.stress.labels, mesh.stress.labels);
        for gid in 0..mesh.n_velocity() {
            assert!((loaded.velocity.theta[gid] - mesh.velocity.theta[gid]).abs() < 1e-12);
            assert!(
                (loaded.velocity.inv_radius[gid] - mesh.velocity.inv_radius[gid]).abs()
                    < 1e-18
            );
        }
        // 间距推断与生成器一致
        assert!((loaded.d_theta - mesh.d_theta).abs() < 1e-9 * mesh.d_theta);
        assert!((loaded.d_r - mesh.d_r).abs() < 1e-6);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = temp_dir("missing");
        std::fs::create_dir_all(&dir).unwrap();
        let err = load_mesh_dir(&dir).unwrap_err();
        assert!(matches!(err, MwError::FileNotFound { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_malformed_line_reports_location() {
        let dir = temp_dir("malformed");
        std::fs::create_dir_all(&dir).unwrap();
        // 速度文件第 2 行字段数不足
        std::fs::write(
            dir.join(VELOCITY_FILE),
            "0 0 1.0 6000.0 0 1 2 3\n1 0 1.0\n",
        )
        .unwrap();
        std::fs::write(dir.join(STRESS_FILE), "0 0 0 1.0 6000.0 0 1\n").unwrap();
        std::fs::write(dir.join(STENCIL_FILE), "0 1 1 1 1\n1 1 1 1 1\n").unwrap();

        let err = load_mesh_dir(&dir).unwrap_err();
        match err {
            MwError::ParseError { line, .. } => assert_eq!(line, 2),
            other => panic!("期望解析错误，得到 {:?}", other),
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unknown_label_is_fatal() {
        let dir = temp_dir("label");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(VELOCITY_FILE), "0 0 1.0 6000.0 0 0 0 0\n").unwrap();
        std::fs::write(dir.join(STRESS_FILE), "0 5 0 1.0 6000.0 0 0\n").unwrap();
        std::fs::write(dir.join(STENCIL_FILE), "0 1 1 1 1\n").unwrap();

        let err = load_mesh_dir(&dir).unwrap_err();
        assert!(matches!(err, MwError::UnknownStressLabel { label: 5 }));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
