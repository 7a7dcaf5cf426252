//! Reconciliation planner
//!
//! Compares a probe snapshot against the candidate index and produces the
//! ordered list of uninstall/install actions that brings the installation
//! to the desired state. Pure decision logic: nothing here touches the
//! filesystem, and identical inputs always yield the identical plan.
//!
//! Loader rules, in precedence order:
//! - choice = OneLoader: install or refresh OneLoader when it is absent or
//!   not at the candidate version. GOMORI is never removed automatically -
//!   the two loaders can coexist, and removal is an explicit user decision.
//! - choice = GOMORI with OneLoader installed: remove OneLoader first, then
//!   install/upgrade GOMORI.
//! - choice = GOMORI with OneLoader absent: act only when GOMORI is absent
//!   or its data-format fix is not verifiably applied; a present-but-
//!   unpatched GOMORI is removed and freshly installed (no in-place patch).
//! - The translation patch is always replaced cleanly: uninstall whatever
//!   form is on disk, then install the candidate, regardless of version.

use std::error::Error;
use std::fmt;

use crate::detect::{CompatPatch, Detection, InstallSnapshot};
use crate::manifest::CandidateIndex;
use crate::package::{Component, PackageDescriptor};

// ============================================================================
// Plan Types
// ============================================================================

/// Which mod loader the user wants to end up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderChoice {
    Gomori,
    OneLoader,
}

impl LoaderChoice {
    pub fn display_name(&self) -> &'static str {
        match self {
            LoaderChoice::Gomori => Component::Gomori.display_name(),
            LoaderChoice::OneLoader => Component::OneLoader.display_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Uninstall(Component),
    Install(PackageDescriptor),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Uninstall(component) => write!(f, "remove {}", component.display_name()),
            Action::Install(descriptor) => {
                write!(f, "install {} {}", descriptor.name, descriptor.version)
            }
        }
    }
}

/// Ordered action sequence for one reconciliation pass. Immutable once
/// built; never persisted across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallationPlan {
    actions: Vec<Action>,
}

impl InstallationPlan {
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

// ============================================================================
// Plan Errors
// ============================================================================

/// Raised before any mutation when no meaningful plan exists; distinct from
/// mid-plan failures so "nothing was touched" is never reported as a
/// partial failure.
#[derive(Debug)]
pub enum PlanError {
    /// The candidate index has no entry for a component the plan needs.
    NoCandidate { component: Component },
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::NoCandidate { component } => write!(
                f,
                "no installable package available for {}",
                component.display_name()
            ),
        }
    }
}

impl Error for PlanError {}

// ============================================================================
// Planner
// ============================================================================

/// Compute the ordered plan for one reconciliation pass.
///
/// Loader actions are fully resolved before translation-patch actions are
/// appended; every uninstall precedes its matching install.
pub fn build_plan(
    snapshot: &InstallSnapshot,
    candidates: &CandidateIndex,
    choice: LoaderChoice,
) -> Result<InstallationPlan, PlanError> {
    let mut actions = Vec::new();

    match choice {
        LoaderChoice::OneLoader => plan_oneloader(snapshot, candidates, &mut actions)?,
        LoaderChoice::Gomori => plan_gomori(snapshot, candidates, &mut actions)?,
    }

    // There is no meaningful installation without the translation content,
    // so a missing candidate aborts the whole plan.
    let translations = require(candidates, Component::Translations)?;
    if snapshot.translations.is_present() {
        actions.push(Action::Uninstall(Component::Translations));
    }
    actions.push(Action::Install(translations.clone()));

    Ok(InstallationPlan { actions })
}

fn plan_oneloader(
    snapshot: &InstallSnapshot,
    candidates: &CandidateIndex,
    actions: &mut Vec<Action>,
) -> Result<(), PlanError> {
    let wanted = require(candidates, Component::OneLoader)?;

    // GOMORI, installed or not, is deliberately left alone here.
    if !at_candidate_version(&snapshot.oneloader, wanted) {
        actions.push(Action::Install(wanted.clone()));
    }
    Ok(())
}

fn plan_gomori(
    snapshot: &InstallSnapshot,
    candidates: &CandidateIndex,
    actions: &mut Vec<Action>,
) -> Result<(), PlanError> {
    let wanted = require(candidates, Component::Gomori)?;

    if snapshot.oneloader.is_present() {
        actions.push(Action::Uninstall(Component::OneLoader));

        // then install/upgrade GOMORI unless it is already healthy
        let healthy = at_candidate_version(&snapshot.gomori, wanted)
            && snapshot.gomori_compat == CompatPatch::Applied;
        if !healthy {
            if snapshot.gomori.is_present() {
                actions.push(Action::Uninstall(Component::Gomori));
            }
            actions.push(Action::Install(wanted.clone()));
        }
        return Ok(());
    }

    match (&snapshot.gomori, snapshot.gomori_compat) {
        (Detection::NotFound, _) => actions.push(Action::Install(wanted.clone())),
        // verifiably patched: leave it alone even if outdated
        (_, CompatPatch::Applied) => {}
        // present but unpatched (or unverifiable): clean replace, since
        // in-place patching is not supported
        (_, CompatPatch::Missing) | (_, CompatPatch::Unknown) => {
            actions.push(Action::Uninstall(Component::Gomori));
            actions.push(Action::Install(wanted.clone()));
        }
    }
    Ok(())
}

fn at_candidate_version(detection: &Detection, wanted: &PackageDescriptor) -> bool {
    matches!(detection, Detection::Found { version: Some(v) } if *v == wanted.version)
}

fn require(
    candidates: &CandidateIndex,
    component: Component,
) -> Result<&PackageDescriptor, PlanError> {
    candidates
        .get(component)
        .ok_or(PlanError::NoCandidate { component })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageSource;

    fn descriptor(name: &str, version: &str) -> PackageDescriptor {
        PackageDescriptor {
            name: name.to_string(),
            source: PackageSource::Remote(format!("https://example.invalid/{}.zip", name)),
            filename: format!("{}.zip", name),
            version: version.to_string(),
            target: "www/mods".to_string(),
        }
    }

    fn full_index() -> CandidateIndex {
        CandidateIndex {
            gomori: Some(descriptor("gomori", "4.1.0")),
            oneloader: Some(descriptor("oneloader", "1.0.3")),
            translations: Some(descriptor("translations", "2.0")),
        }
    }

    fn snapshot(
        gomori: Detection,
        gomori_compat: CompatPatch,
        oneloader: Detection,
        translations: Detection,
    ) -> InstallSnapshot {
        InstallSnapshot {
            gomori,
            gomori_compat,
            oneloader,
            translations,
        }
    }

    fn found(version: &str) -> Detection {
        Detection::Found {
            version: Some(version.to_string()),
        }
    }

    #[test]
    fn test_fresh_install_oneloader() {
        let snap = snapshot(
            Detection::NotFound,
            CompatPatch::Unknown,
            Detection::NotFound,
            Detection::NotFound,
        );
        let plan = build_plan(&snap, &full_index(), LoaderChoice::OneLoader).unwrap();

        assert_eq!(plan.len(), 2);
        assert!(matches!(&plan.actions()[0], Action::Install(d) if d.name == "oneloader"));
        assert!(matches!(&plan.actions()[1], Action::Install(d) if d.name == "translations"));
    }

    #[test]
    fn test_oneloader_beside_patched_gomori_keeps_gomori() {
        let snap = snapshot(
            found("4.1.0"),
            CompatPatch::Applied,
            Detection::NotFound,
            Detection::NotFound,
        );
        let plan = build_plan(&snap, &full_index(), LoaderChoice::OneLoader).unwrap();

        let installs: Vec<_> = plan
            .actions()
            .iter()
            .filter(|a| matches!(a, Action::Install(d) if d.name == "oneloader"))
            .collect();
        assert_eq!(installs.len(), 1);
        assert!(!plan
            .actions()
            .iter()
            .any(|a| matches!(a, Action::Uninstall(Component::Gomori))));
    }

    #[test]
    fn test_oneloader_already_current_is_not_reinstalled() {
        let snap = snapshot(
            Detection::NotFound,
            CompatPatch::Unknown,
            found("1.0.3"),
            found("2.0"),
        );
        let plan = build_plan(&snap, &full_index(), LoaderChoice::OneLoader).unwrap();

        assert!(!plan
            .actions()
            .iter()
            .any(|a| matches!(a, Action::Install(d) if d.name == "oneloader")));
    }

    #[test]
    fn test_oneloader_outdated_or_unknown_version_is_reinstalled() {
        for oneloader in [found("1.0.2"), Detection::Found { version: None }] {
            let snap = snapshot(
                Detection::NotFound,
                CompatPatch::Unknown,
                oneloader,
                Detection::NotFound,
            );
            let plan = build_plan(&snap, &full_index(), LoaderChoice::OneLoader).unwrap();
            assert!(plan
                .actions()
                .iter()
                .any(|a| matches!(a, Action::Install(d) if d.name == "oneloader")));
        }
    }

    #[test]
    fn test_gomori_unpatched_is_replaced() {
        let snap = snapshot(
            found("4.1.0"),
            CompatPatch::Missing,
            Detection::NotFound,
            Detection::NotFound,
        );
        let plan = build_plan(&snap, &full_index(), LoaderChoice::Gomori).unwrap();

        assert_eq!(plan.actions()[0], Action::Uninstall(Component::Gomori));
        assert!(matches!(&plan.actions()[1], Action::Install(d) if d.name == "gomori"));
    }

    #[test]
    fn test_gomori_patched_is_left_alone() {
        let snap = snapshot(
            found("4.0.0"),
            CompatPatch::Applied,
            Detection::NotFound,
            Detection::NotFound,
        );
        let plan = build_plan(&snap, &full_index(), LoaderChoice::Gomori).unwrap();

        assert!(!plan
            .actions()
            .iter()
            .any(|a| matches!(a, Action::Install(d) if d.name == "gomori")));
    }

    #[test]
    fn test_gomori_choice_removes_oneloader_first() {
        let snap = snapshot(
            Detection::NotFound,
            CompatPatch::Unknown,
            found("1.0.3"),
            Detection::NotFound,
        );
        let plan = build_plan(&snap, &full_index(), LoaderChoice::Gomori).unwrap();

        assert_eq!(plan.actions()[0], Action::Uninstall(Component::OneLoader));
        assert!(matches!(&plan.actions()[1], Action::Install(d) if d.name == "gomori"));
    }

    #[test]
    fn test_translations_always_replaced_even_when_current() {
        let snap = snapshot(
            Detection::NotFound,
            CompatPatch::Unknown,
            found("1.0.3"),
            found("2.0"),
        );
        let plan = build_plan(&snap, &full_index(), LoaderChoice::OneLoader).unwrap();

        assert_eq!(
            plan.actions(),
            &[
                Action::Uninstall(Component::Translations),
                Action::Install(descriptor("translations", "2.0")),
            ]
        );
    }

    #[test]
    fn test_conflicted_translations_are_uninstalled_first() {
        let snap = snapshot(
            Detection::NotFound,
            CompatPatch::Unknown,
            found("1.0.3"),
            Detection::Conflicted,
        );
        let plan = build_plan(&snap, &full_index(), LoaderChoice::OneLoader).unwrap();

        assert!(plan
            .actions()
            .iter()
            .any(|a| matches!(a, Action::Uninstall(Component::Translations))));
    }

    #[test]
    fn test_missing_translation_candidate_is_no_plan() {
        let mut index = full_index();
        index.translations = None;

        let snap = snapshot(
            Detection::NotFound,
            CompatPatch::Unknown,
            Detection::NotFound,
            Detection::NotFound,
        );
        let err = build_plan(&snap, &index, LoaderChoice::OneLoader).unwrap_err();
        assert!(matches!(
            err,
            PlanError::NoCandidate {
                component: Component::Translations
            }
        ));
    }

    #[test]
    fn test_missing_loader_candidate_is_no_plan() {
        let mut index = full_index();
        index.oneloader = None;

        let snap = snapshot(
            Detection::NotFound,
            CompatPatch::Unknown,
            Detection::NotFound,
            Detection::NotFound,
        );
        let err = build_plan(&snap, &index, LoaderChoice::OneLoader).unwrap_err();
        assert!(matches!(
            err,
            PlanError::NoCandidate {
                component: Component::OneLoader
            }
        ));
    }

    #[test]
    fn test_planner_is_deterministic() {
        let snap = snapshot(
            found("4.1.0"),
            CompatPatch::Missing,
            found("1.0.2"),
            Detection::Conflicted,
        );
        let index = full_index();

        let first = build_plan(&snap, &index, LoaderChoice::Gomori).unwrap();
        let second = build_plan(&snap, &index, LoaderChoice::Gomori).unwrap();
        assert_eq!(first, second);
    }
}
