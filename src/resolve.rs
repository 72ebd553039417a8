//! API surface resolution.
//!
//! Slices the parsed registry into the concrete set of commands and enums
//! available for one (api, profile, version ceiling) combination, by folding
//! the feature require/remove deltas in ascending version order. Extensions
//! are a separate, optional overlay applied on top of the core surface.

use std::collections::HashSet;

use tracing::debug;

use crate::ir::{Api, Command, Extension, Feature, Profile, Specification, Version};

/// The resolved command/enum surface for one api/profile/version request.
///
/// Membership is set-based; iteration order for output purposes comes from
/// [`ApiSurface::commands_in_declaration_order`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApiSurface {
    /// Entry points available on this surface.
    pub commands: HashSet<String>,
    /// Enum names available on this surface.
    pub enums: HashSet<String>,
}

impl Specification {
    /// Resolve the available surface at a version ceiling.
    ///
    /// Walks features in ascending version order; each feature matching the
    /// requested API with version at or below the ceiling applies its require
    /// entries, then its remove entries. An entry with no profile qualifier
    /// applies unconditionally; a qualified entry applies only when it matches
    /// the requested profile.
    pub fn resolve_surface(&self, api: Api, profile: Profile, ceiling: Version) -> ApiSurface {
        let mut matching: Vec<&Feature> = self
            .features
            .iter()
            .filter(|feature| feature.api == api && feature.version <= ceiling)
            .collect();
        matching.sort_by_key(|feature| feature.version);

        let mut surface = ApiSurface::default();
        for feature in matching {
            debug!(feature = %feature.name, "applying feature deltas");
            for require in &feature.requires {
                if !profile_matches(require.profile, profile) {
                    continue;
                }
                surface.commands.extend(require.commands.iter().cloned());
                surface.enums.extend(require.enums.iter().cloned());
            }
            for remove in &feature.removes {
                if !profile_matches(remove.profile, profile) {
                    continue;
                }
                for name in &remove.commands {
                    surface.commands.remove(name);
                }
                for name in &remove.enums {
                    surface.enums.remove(name);
                }
            }
        }
        surface
    }
}

fn profile_matches(entry: Profile, requested: Profile) -> bool {
    entry == Profile::None || entry == requested
}

impl ApiSurface {
    /// Overlay an extension's require entries. Extensions only add; they
    /// never remove.
    pub fn apply_extension(&mut self, extension: &Extension) {
        debug!(extension = %extension.name, "applying extension overlay");
        for require in &extension.requires {
            self.commands.extend(require.commands.iter().cloned());
            self.enums.extend(require.enums.iter().cloned());
        }
    }

    /// The surface's commands in original registry declaration order.
    ///
    /// Downstream output stability is an explicit contract: the overload
    /// pipeline and the writer receive commands in this order regardless of
    /// any internal set iteration.
    pub fn commands_in_declaration_order<'spec>(
        &self,
        spec: &'spec Specification,
    ) -> Vec<&'spec Command> {
        spec.commands
            .iter()
            .filter(|command| self.commands.contains(&command.entry_point))
            .collect()
    }
}
