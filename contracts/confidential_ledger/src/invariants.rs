#![allow(dead_code)]

extern crate std;

use soroban_sdk::Address;

use crate::types::{EncryptedValue, PlatformStats, Project, ProjectStatus, StatusEvent};

/// INV-1: status transitions are forward-only:
///   Active -> Successful | Failed
///   Successful -> Withdrawn
///   Failed, Withdrawn -> (none)
pub fn assert_valid_status_transition(from: &ProjectStatus, to: &ProjectStatus) {
    let valid = matches!(
        (from, to),
        (ProjectStatus::Active, ProjectStatus::Successful)
            | (ProjectStatus::Active, ProjectStatus::Failed)
            | (ProjectStatus::Successful, ProjectStatus::Withdrawn)
    );
    assert!(
        valid,
        "INV-1 violated: invalid status transition from {:?} to {:?}",
        from, to
    );
}

/// INV-2: a sealed encrypted value is always decryptable by `ledger` and by
/// every expected holder — the double-grant rule.
pub fn assert_sealed_for(value: &EncryptedValue, ledger: &Address, holders: &[&Address]) {
    assert!(
        value.can_decrypt(ledger),
        "INV-2 violated: sealed value missing the ledger's own capability"
    );
    for holder in holders {
        assert!(
            value.can_decrypt(holder),
            "INV-2 violated: sealed value missing capability for {:?}",
            holder
        );
    }
}

/// INV-3: `funds_withdrawn` implies terminal `Withdrawn` status and vice
/// versa — the two can never disagree.
pub fn assert_withdrawal_consistent(project: &Project) {
    assert_eq!(
        project.funds_withdrawn,
        project.status == ProjectStatus::Withdrawn,
        "INV-3 violated: project {} funds_withdrawn={} but status={:?}",
        project.id,
        project.funds_withdrawn,
        project.status
    );
}

/// INV-4: backer_count never decreases.
pub fn assert_backer_count_monotonic(count_before: u32, count_after: u32) {
    assert!(
        count_after >= count_before,
        "INV-4 violated: backer_count decreased from {} to {}",
        count_before,
        count_after
    );
}

/// INV-5: plaintext metadata is immutable after creation.
pub fn assert_project_immutable_fields(original: &Project, current: &Project) {
    assert_eq!(original.id, current.id, "INV-5 violated: project id changed");
    assert_eq!(
        original.creator, current.creator,
        "INV-5 violated: project creator changed"
    );
    assert_eq!(
        original.title, current.title,
        "INV-5 violated: project title changed"
    );
    assert_eq!(
        original.deadline, current.deadline,
        "INV-5 violated: project deadline changed"
    );
    assert_eq!(
        original.metadata_hash, current.metadata_hash,
        "INV-5 violated: project metadata_hash changed"
    );
}

/// INV-6: platform counters partition the project population.
pub fn assert_stats_partition(stats: &PlatformStats) {
    assert_eq!(
        stats.total_projects,
        stats.active + stats.successful + stats.failed + stats.withdrawn,
        "INV-6 violated: status counters do not sum to total_projects"
    );
}

/// INV-7: the transition function rejects every event on terminal states
/// except the one legal withdrawal.
pub fn assert_terminal_states_closed() {
    for status in [
        ProjectStatus::Failed,
        ProjectStatus::Withdrawn,
        ProjectStatus::Successful,
    ] {
        for event in [StatusEvent::GoalMet, StatusEvent::GoalMissed] {
            assert!(
                status.transition(event).is_err(),
                "INV-7 violated: finalize event accepted on {:?}",
                status
            );
        }
    }
    assert!(
        ProjectStatus::Failed
            .transition(StatusEvent::Withdraw)
            .is_err(),
        "INV-7 violated: withdraw accepted on Failed"
    );
    assert!(
        ProjectStatus::Withdrawn
            .transition(StatusEvent::Withdraw)
            .is_err(),
        "INV-7 violated: withdraw accepted on Withdrawn"
    );
}
