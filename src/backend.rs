//! Native object emission for a finished module.

use std::path::Path;

use inkwell::{
    module::Module,
    targets::{CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine, TargetTriple},
    OptimizationLevel,
};
use tracing::info;

use crate::error::{CompileError, Result};

/// Grab the default target triple for the build machine.
pub fn host_triple() -> TargetTriple {
    TargetMachine::get_default_triple()
}

/// Verify `module` and write it out as an object file for `triple`.
///
/// The module is stamped with the triple and the target's data layout first.
/// Code is position independent so the system compiler can link it as a PIE.
pub fn write_object(module: &Module<'_>, triple: &TargetTriple, out_obj: &Path) -> Result<()> {
    module.verify().map_err(|e| CompileError::Backend(e.to_string()))?;
    Target::initialize_all(&InitializationConfig::default());
    let target = Target::from_triple(triple).map_err(|e| CompileError::Backend(e.to_string()))?;
    let machine = target
        .create_target_machine(
            triple,
            "generic",
            "",
            OptimizationLevel::None,
            RelocMode::PIC,
            CodeModel::Default,
        )
        .ok_or_else(|| CompileError::Backend("create target machine failed".into()))?;

    module.set_triple(triple);
    module.set_data_layout(&machine.get_target_data().get_data_layout());

    machine
        .write_to_file(module, FileType::Object, out_obj)
        .map_err(|e| CompileError::Backend(e.to_string()))?;
    info!(object = %out_obj.display(), triple = ?triple, "wrote object file");
    Ok(())
}
