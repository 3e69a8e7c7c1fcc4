//! Provenance header prepended to every exported definition.

use crate::models::{ObjectDescriptor, ReconstructionStrategy};

/// Disclaimer for synthesized table declarations.
pub const TABLE_DISCLAIMER: &str =
    "NOTE: User table is generated as table variable for reference purposes only";

/// Disclaimer for objects exported from their stored text.
pub const DEFINITION_DISCLAIMER: &str = "NOTE: Object is exported with definition only";

/// Builds the comment block for `descriptor`.
///
/// The layout is fixed; downstream tooling compares exported files byte for
/// byte.
pub fn comment_block(descriptor: &ObjectDescriptor) -> String {
    let disclaimer = match descriptor.kind.strategy() {
        ReconstructionStrategy::TableVariable => TABLE_DISCLAIMER,
        ReconstructionStrategy::StoredText => DEFINITION_DISCLAIMER,
    };
    format!(
        "/* \n\t{} Object Generated by sqlobjectdump\n\n\t{}.{}\n\n\t{}\n*/\n\n",
        descriptor.kind_label, descriptor.schema_name, descriptor.object_name, disclaimer
    )
}

/// Prefixes the definition of `descriptor` with its comment block.
pub fn annotate(descriptor: &mut ObjectDescriptor) {
    let mut annotated = comment_block(descriptor);
    annotated.push_str(&descriptor.definition);
    descriptor.definition = annotated;
}
