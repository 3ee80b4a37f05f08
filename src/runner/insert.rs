//! Insert-in-section execution
//!
//! Effectful wrapper around the pure planner in [`crate::section`]: an
//! optional create-from-template fallback, then a read-modify-write of the
//! target document. Soft failures (missing template, missing file, missing
//! section) notify the user and leave the vault untouched. The
//! read-modify-write is not atomic against concurrent external writers;
//! single-user usage is assumed.

use crate::error::Result;
use crate::interaction::Interaction;
use crate::section::{find_section, heading_level, insertion_index, Position};
use crate::vault::{display_name, ensure_extension, Vault};
use tracing::debug;

/// A fully resolved insert request (all templates already substituted).
pub struct SectionInsert {
    pub target: String,
    pub section: String,
    pub position: Position,
    pub text: String,
    pub create_if_missing: bool,
    pub template_path: String,
}

pub async fn insert_in_section(
    vault: &dyn Vault,
    interaction: &dyn Interaction,
    request: SectionInsert,
) -> Result<()> {
    let target = ensure_extension(&request.target);

    if !vault.exists(&target).await? && request.create_if_missing {
        if request.template_path.is_empty() {
            vault
                .create(&target, &format!("{}\n", request.section))
                .await?;
        } else {
            let template_path = ensure_extension(&request.template_path);
            if !vault.exists(&template_path).await? {
                interaction.notify(&format!("Template not found: {template_path}"));
                return Ok(());
            }
            let seed = vault.read(&template_path).await?;
            vault.create(&target, &seed).await?;
        }
    }

    if !vault.exists(&target).await? {
        interaction.notify(&format!("File not found: {target}"));
        return Ok(());
    }

    let content = vault.read(&target).await?;
    let mut lines: Vec<&str> = content.split('\n').collect();

    let Some(section_index) = find_section(&lines, &request.section) else {
        interaction.notify(&format!(
            "Section \"{}\" not found in {target}",
            request.section
        ));
        return Ok(());
    };

    let level = heading_level(&request.section);
    let index = insertion_index(&lines, section_index, level, request.position);
    debug!(target = %target, index, "inserting into section");

    lines.insert(index, request.text.as_str());
    vault.write(&target, &lines.join("\n")).await?;
    interaction.notify(&format!("Updated {}", display_name(&target)));
    Ok(())
}
