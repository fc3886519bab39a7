//! Integration tests for the flock update shader.
//!
//! The WGSL is parsed and validated with naga, then its declared interface is checked
//! against the host-side records it binds.

use maxboid::kernel::FLOCK_STEP_WGSL;
use maxboid::{Force, GpuVec3, SimulationParameters, WORKGROUP_SIZE};

fn parse() -> naga::Module {
    naga::front::wgsl::parse_str(FLOCK_STEP_WGSL).unwrap_or_else(|e| panic!("WGSL parse error: {:?}", e))
}

fn validate(module: &naga::Module) -> naga::valid::ModuleInfo {
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(module)
        .unwrap_or_else(|e| panic!("WGSL validation error: {:?}", e))
}

fn struct_size(module: &naga::Module, name: &str) -> u32 {
    module
        .types
        .iter()
        .find(|(_, ty)| ty.name.as_deref() == Some(name))
        .map(|(_, ty)| ty.inner.size(module.to_ctx()))
        .unwrap_or_else(|| panic!("struct {} not found", name))
}

fn member_offset(module: &naga::Module, struct_name: &str, member: &str) -> u32 {
    let ty = module
        .types
        .iter()
        .find(|(_, ty)| ty.name.as_deref() == Some(struct_name))
        .map(|(_, ty)| ty)
        .unwrap_or_else(|| panic!("struct {} not found", struct_name));
    match &ty.inner {
        naga::TypeInner::Struct { members, .. } => members
            .iter()
            .find(|m| m.name.as_deref() == Some(member))
            .map(|m| m.offset)
            .unwrap_or_else(|| panic!("{}.{} not found", struct_name, member)),
        other => panic!("{} is not a struct: {:?}", struct_name, other),
    }
}

#[test]
fn test_flock_shader_validates() {
    let module = parse();
    validate(&module);
}

#[test]
fn test_entry_point_and_workgroup_size() {
    let module = parse();
    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.name == "main")
        .expect("main entry point");
    assert_eq!(entry.stage, naga::ShaderStage::Compute);
    assert_eq!(entry.workgroup_size, [WORKGROUP_SIZE, 1, 1]);
}

#[test]
fn test_shader_records_match_host_layout() {
    let module = parse();
    assert_eq!(struct_size(&module, "SimParams") as usize, std::mem::size_of::<SimulationParameters>());
    assert_eq!(member_offset(&module, "SimParams", "model_transform"), 64);
    assert_eq!(member_offset(&module, "SimParams", "reaction_factor"), 52);

    assert_eq!(struct_size(&module, "Force") as usize, std::mem::size_of::<Force>());
    assert_eq!(member_offset(&module, "Force", "position"), 16);

    assert_eq!(std::mem::size_of::<GpuVec3>(), 16);
}

#[test]
fn test_bindings() {
    let module = parse();
    let mut bindings: Vec<(u32, String)> = module
        .global_variables
        .iter()
        .filter_map(|(_, var)| {
            let binding = var.binding.as_ref()?;
            assert_eq!(binding.group, 0);
            Some((binding.binding, var.name.clone().unwrap_or_default()))
        })
        .collect();
    bindings.sort();

    let expected = [
        (0, "positions_in"),
        (1, "velocities_in"),
        (2, "forces"),
        (3, "positions_out"),
        (4, "velocities_out"),
        (5, "params"),
    ];
    assert_eq!(bindings.len(), expected.len());
    for ((binding, name), (want_binding, want_name)) in bindings.iter().zip(expected) {
        assert_eq!(*binding, want_binding);
        assert_eq!(name, want_name);
    }
}
