use procontext_types::{ProContextError, ResolveLibraryInput, ResolveLibraryOutput};

use crate::state::AppState;

pub fn resolve_library(
    state: &AppState,
    input: ResolveLibraryInput,
) -> Result<ResolveLibraryOutput, ProContextError> {
    let query = input.validated_query()?;
    let matches = procontext_registry::resolve_library(&query, &state.registry_indexes);
    Ok(ResolveLibraryOutput { matches })
}
