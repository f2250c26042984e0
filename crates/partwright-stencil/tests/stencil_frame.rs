//! End-to-end build of the stencil frame.

use approx::assert_relative_eq;
use partwright::BuiltAssembly;
use partwright_ir::{BuildReport, Engagement, Operation, OperationKind};
use partwright_stencil::{
    build_stencil_frame, FrameDimensions, StencilDimensions, StencilFrameConfig,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn build(debug: bool) -> BuiltAssembly {
    init_tracing();
    let config = StencilFrameConfig {
        debug,
        ..Default::default()
    };
    build_stencil_frame(&config).expect("stencil frame builds")
}

const PARTS: [&str; 5] = [
    "Stencil_Frame/Stencil",
    "Stencil_Frame/Frame_Block",
    "Stencil_Frame/East_Clamp",
    "Stencil_Frame/West_Clamp",
    "Stencil_Frame/Bottom_Clamp",
];

#[test]
fn test_builds_every_part_in_declaration_order() {
    let built = build(false);
    let paths: Vec<_> = built.parts().map(|p| p.path().to_string()).collect();
    let mut expected = vec!["Stencil_Frame".to_string()];
    expected.extend(PARTS.iter().map(|p| p.to_string()));
    assert_eq!(paths, expected);

    for path in PARTS {
        let part = built.part(path).expect(path);
        assert_eq!(part.operations().kinds()[0], OperationKind::StockBlock, "{path}");
        assert!(part.operations().iter().all(|op| !op.is_debug()), "{path}");
    }
    assert!(built.root().operations().is_empty());
}

#[test]
fn test_stencil_dimensions() {
    let built = build(false);
    let stencil = built.part("Stencil_Frame/Stencil").unwrap();
    let bbox = stencil.bounding_box();
    assert_relative_eq!(bbox.dx().as_mm(), 137.3, epsilon = 1e-9);
    assert_relative_eq!(bbox.dy().as_mm(), 100.0, epsilon = 1e-9);
    assert_relative_eq!(bbox.low().z.as_mm(), -6.35, epsilon = 1e-9);
    assert_eq!(bbox.high().z.as_mm(), 0.0);

    let sheet = stencil.published::<StencilDimensions>().expect("published");
    assert_relative_eq!(sheet.thickness.as_mm(), 1.0);
    assert_relative_eq!(sheet.fold_amount.as_inch(), 0.25, epsilon = 1e-12);
}

#[test]
fn test_frame_block_encloses_everything() {
    let built = build(false);
    let frame = built.part("Stencil_Frame/Frame_Block").unwrap();
    let frame_box = frame.bounding_box();
    assert_relative_eq!(frame_box.dz().as_inch(), 0.8, epsilon = 1e-12);
    for path in PARTS {
        assert!(
            frame_box.encloses(&built.part(path).unwrap().bounding_box()),
            "{path} sticks out of the frame"
        );
    }
    assert_eq!(built.root().bounding_box(), frame_box);

    let dims = frame.published::<FrameDimensions>().expect("published");
    assert_relative_eq!(dims.y_gap.as_inch(), 0.5, epsilon = 1e-12);
}

#[test]
fn test_main_and_clamp_pockets_are_fenced() {
    let built = build(false);
    let log = built.part("Stencil_Frame/Frame_Block").unwrap().operations();

    let main = log.position("Main_Pocket").unwrap();
    assert!(matches!(log.get(main + 1), Some(Operation::FenceCheckpoint)));
    assert!(matches!(
        log.get(main),
        Some(Operation::Pocket { flags, .. }) if flags.through
    ));

    let clamp = log.position("Clamp_Pocket").unwrap();
    let landing = log.position("Stencil_Landing").unwrap();
    let lock = log.position("Stencil_Lock").unwrap();
    assert!(log.fence_between(main, clamp));
    assert!(log.fence_between(clamp, landing));
    assert!(!log.fence_between(landing, lock));

    let setups = log.setups();
    assert_eq!(setups.len(), 1);
    assert_eq!(log.get(setups[0].mount).and_then(Operation::label), Some("Top_Vice"));
}

#[test]
fn test_every_fastener_joins_threaded_and_clearance() {
    let built = build(false);
    let report = built.report();
    assert_eq!(report.fasteners.len(), 6);
    for fastener in &report.fasteners {
        assert_eq!(fastener.spec, "#4-40");
        let sides: Vec<_> = fastener.attachments.iter().map(|a| a.engagement).collect();
        assert_eq!(sides, vec![Engagement::Clearance, Engagement::Threaded], "{}", fastener.name);
    }

    let east = report.fastener("east_screw_1").unwrap();
    assert_eq!(east.attachments[0].part, "Stencil_Frame/East_Clamp");
    assert_eq!(east.attachments[1].part, "Stencil_Frame/Frame_Block");
    assert_eq!(east.attachments[1].hole, "East_Screw_1");

    let west = report.fastener("west_screw_2").unwrap();
    assert_eq!(west.attachments[1].part, "Stencil_Frame/Bottom_Clamp");

    let bottom = report.fastener("bottom_screw_1").unwrap();
    assert_eq!(bottom.attachments[0].part, "Stencil_Frame/Bottom_Clamp");
    assert_eq!(bottom.head.z, bottom.tip.z);

    let fastens = built
        .part("Stencil_Frame/Frame_Block")
        .unwrap()
        .operations()
        .kinds()
        .into_iter()
        .filter(|k| *k == OperationKind::Fasten)
        .count();
    assert_eq!(fastens, 4);
}

#[test]
fn test_debug_only_appends_visualization() {
    let plain = build(false);
    let debug = build(true);

    for path in PARTS {
        let a = plain.part(path).unwrap();
        let b = debug.part(path).unwrap();
        assert_eq!(a.bounding_box(), b.bounding_box(), "{path}");

        let ops = b.operations().as_slice();
        let first_debug = ops.iter().position(Operation::is_debug).expect(path);
        assert!(ops[first_debug..].iter().all(Operation::is_debug), "{path}");
        assert_eq!(ops.len() - first_debug, 1, "{path}");
        let through_view = !path.ends_with("_Clamp") || path.ends_with("Bottom_Clamp");
        assert!(
            matches!(&ops[first_debug], Operation::Pocket { flags, .. } if flags.through == through_view),
            "{path}"
        );

        let structural: Vec<_> = b.operations().structural().cloned().collect();
        if path.ends_with("Stencil") {
            // The stencil only mounts for its debug view.
            assert_eq!(structural.len(), a.operations().len() + 1);
        } else {
            assert_eq!(structural, a.operations().as_slice());
        }
    }
}

#[test]
fn test_report_roundtrips_through_json() {
    let built = build(true);
    let report = built.report();
    let json = report.to_json().unwrap();
    let restored = BuildReport::from_json(&json).unwrap();
    assert_eq!(restored, report);
    assert_eq!(restored.assembly, "Stencil_Frame");
    assert_eq!(restored.parts.len(), 6);
}

#[test]
fn test_deeper_sheet_moves_dependent_parts() {
    init_tracing();
    let base = build_stencil_frame(&StencilFrameConfig::default()).unwrap();
    let deeper = build_stencil_frame(&StencilFrameConfig {
        sheet_depth: partwright_units::Length::cm(12.0),
        ..Default::default()
    })
    .unwrap();

    for path in ["Stencil_Frame/East_Clamp", "Stencil_Frame/Frame_Block"] {
        let before = base.part(path).unwrap().bounding_box();
        let after = deeper.part(path).unwrap().bounding_box();
        assert_relative_eq!((after.dy() - before.dy()).as_mm(), 20.0, epsilon = 1e-9);
        assert_eq!(after.dx(), before.dx());
    }
}

#[test]
fn test_loads_config_from_toml() {
    init_tracing();
    let config = StencilFrameConfig::from_toml_str("debug = true\nscrew_spec = \"M3\"").unwrap();
    let built = build_stencil_frame(&config).unwrap();
    assert!(built.report().fasteners.iter().all(|f| f.spec == "M3"));
}
