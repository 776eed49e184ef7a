// crates/mw_io/tests/full_pipeline.rs

//! 跨层集成测试：推进 → 记录 → 序列化 → 回读，以及基矩阵经文件
//! 往返后的降阶一致性。

use mw_config::StabilityConfig;
use mw_foundation::scalar::{CMB_RADIUS_M, EARTH_RADIUS_M};
use mw_foundation::MwError;
use mw_io::{read_array, read_basis, write_basis, write_seismogram, FileFormat};
use mw_mesh::StructuredPolarGrid;
use mw_physics::{
    Basis, FomIntegrator, ForcingSource, IntegratorOptions, LayeredMantle, MaterialFields,
    MaterialMode, Observer, OperatorAssembler, ProjectedOperators, RickerWavelet, RomIntegrator,
    RomIntegratorOptions, SeismogramRecorder,
};

fn temp_dir(tag: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("mw_io_it_{}_{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn seismogram_roundtrip_from_run() {
    let mesh = StructuredPolarGrid::new(21, 51, CMB_RADIUS_M, EARTH_RADIUS_M).build();
    let fields = MaterialFields::build(&mesh, &LayeredMantle::prem_like()).unwrap();
    let ops = OperatorAssembler::new(&mesh, &fields, true)
        .unwrap()
        .assemble()
        .unwrap();

    let gid = mesh.nearest_velocity_gid(std::f64::consts::FRAC_PI_2, EARTH_RADIUS_M - 640_000.0);
    let mut integrator = FomIntegrator::new(
        &mesh,
        &ops,
        &fields,
        ForcingSource::point(gid, RickerWavelet::new(2.0e-4)),
        IntegratorOptions {
            dt: 1.5,
            n_steps: 60,
            mode: MaterialMode::InOperator,
            exploit_forcing_sparsity: true,
            observer_stride: 2,
            stability: StabilityConfig::default(),
        },
    )
    .unwrap();

    let mut recorder = SeismogramRecorder::new(vec![gid, 0, 1070], 1);
    {
        let mut observers: Vec<&mut dyn Observer> = vec![&mut recorder];
        integrator.run(&mut observers).unwrap();
    }
    assert_eq!(recorder.n_samples(), 30);

    let dir = temp_dir("seis");
    let path = dir.join("seismogram.bin");
    write_seismogram(&path, &recorder, FileFormat::Binary, true).unwrap();

    let (dims, data) = read_array(&path, FileFormat::Binary).unwrap();
    assert_eq!(dims, vec![3, 30]);
    // 二进制往返逐位一致
    assert_eq!(data, recorder.to_dense());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn basis_file_roundtrip_preserves_rom_dynamics() {
    // 基矩阵写出再读回，降阶推进与内存基一致
    let mesh = StructuredPolarGrid::new(7, 9, CMB_RADIUS_M, EARTH_RADIUS_M).build();
    let fields = MaterialFields::build(&mesh, &LayeredMantle::prem_like()).unwrap();
    let ops = OperatorAssembler::new(&mesh, &fields, true)
        .unwrap()
        .assemble()
        .unwrap();

    let phi_vp = Basis::random(mesh.n_velocity(), 6, 21);
    let phi_sp = Basis::random(mesh.n_stress(), 8, 22);

    let dir = temp_dir("basis");
    let vp_path = dir.join("phi_vp.bin");
    let sp_path = dir.join("phi_sp.bin");
    write_basis(&vp_path, phi_vp.matrix(), FileFormat::Binary).unwrap();
    write_basis(&sp_path, phi_sp.matrix(), FileFormat::Binary).unwrap();

    let phi_vp_loaded = Basis::from_matrix(read_basis(&vp_path, FileFormat::Binary).unwrap());
    let phi_sp_loaded = Basis::from_matrix(read_basis(&sp_path, FileFormat::Binary).unwrap());
    phi_vp_loaded.check_dims(mesh.n_velocity(), 6).unwrap();
    phi_sp_loaded.check_dims(mesh.n_stress(), 8).unwrap();

    let gid = 10;
    let source = ForcingSource::point(gid, RickerWavelet::new(2.0e-4));
    let opts = RomIntegratorOptions {
        dt: 1.5,
        n_steps: 40,
        observer_stride: 1,
    };

    let reduced_a = ProjectedOperators::reduce(&ops, &phi_vp, &phi_sp).unwrap();
    let mut rom_a = RomIntegrator::new(
        reduced_a,
        &phi_vp,
        fields.rho_inv[gid],
        source.clone(),
        opts.clone(),
    )
    .unwrap();
    rom_a.run(&mut []).unwrap();

    let reduced_b = ProjectedOperators::reduce(&ops, &phi_vp_loaded, &phi_sp_loaded).unwrap();
    let mut rom_b = RomIntegrator::new(
        reduced_b,
        &phi_vp_loaded,
        fields.rho_inv[gid],
        source,
        opts,
    )
    .unwrap();
    rom_b.run(&mut []).unwrap();

    // 二进制基往返逐位一致，降阶轨迹也逐位一致
    assert_eq!(rom_a.state().x_vp, rom_b.state().x_vp);
    assert_eq!(rom_a.state().x_sp, rom_b.state().x_sp);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn basis_size_mismatch_from_file_is_fatal() {
    // 文件里的基列数与请求的 ROM 规模不符：循环前维度类致命错误
    let dir = temp_dir("mismatch");
    let path = dir.join("phi.bin");
    let phi = Basis::random(50, 4, 0);
    write_basis(&path, phi.matrix(), FileFormat::Binary).unwrap();

    let loaded = Basis::from_matrix(read_basis(&path, FileFormat::Binary).unwrap());
    let err = loaded.check_dims(50, 8).unwrap_err();
    assert!(matches!(err, MwError::SizeMismatch { .. }));

    let _ = std::fs::remove_dir_all(&dir);
}
