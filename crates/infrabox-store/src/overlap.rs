//! CIDR overlap guard between environments.

use crate::declaration::{read_declaration, Declaration};
use infrabox_schema::AddressBlock;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "address block {candidate} for environment '{owner}' overlaps {conflicting_block} \
     declared by environment '{conflicting_environment}'"
)]
pub struct OverlapError {
    pub candidate: AddressBlock,
    pub owner: String,
    pub conflicting_block: AddressBlock,
    pub conflicting_environment: String,
}

/// Check `candidate` against every block declared by every environment in
/// `environments` except `owner`.
///
/// Environments without a discoverable declaration are skipped. The first
/// overlap found is returned.
pub fn check_overlap<I, N, P>(
    candidate: &AddressBlock,
    owner: &str,
    environments: I,
) -> Result<(), OverlapError>
where
    I: IntoIterator<Item = (N, P)>,
    N: AsRef<str>,
    P: AsRef<Path>,
{
    debug!("checking {candidate} for '{owner}' against existing environments");
    for (name, dir) in environments {
        let name = name.as_ref();
        if name == owner {
            continue;
        }
        let Some(decl) = read_declaration(dir.as_ref()) else {
            debug!("'{name}' declares no address blocks, skipping");
            continue;
        };
        check_against(candidate, owner, name, &decl)?;
    }
    Ok(())
}

fn check_against(
    candidate: &AddressBlock,
    owner: &str,
    peer: &str,
    decl: &Declaration,
) -> Result<(), OverlapError> {
    match decl.blocks().find(|block| candidate.overlaps(block)) {
        Some(block) => Err(OverlapError {
            candidate: *candidate,
            owner: owner.to_owned(),
            conflicting_block: *block,
            conflicting_environment: peer.to_owned(),
        }),
        None => Ok(()),
    }
}

/// Every overlapping pair among already-declared environments, each pair
/// reported once. Used to audit an existing tree.
pub fn find_conflicts(declared: &[(String, Declaration)]) -> Vec<OverlapError> {
    let mut conflicts = Vec::new();
    for (i, (name, decl)) in declared.iter().enumerate() {
        for (peer, peer_decl) in &declared[i + 1..] {
            for block in decl.blocks() {
                if let Err(e) = check_against(block, name, peer, peer_decl) {
                    conflicts.push(e);
                }
            }
        }
    }
    conflicts
}
