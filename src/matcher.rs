//! Resource Matcher (spec §4.2): pure functions deciding whether a [`Job`]
//! fits within a remaining [`Resources`] budget, and which disks it
//! consumes. No I/O, no logging, no locking — grounded on `bid_logic.rs`'s
//! separation of scoring/validation from the stateful assignment service.

use crate::types::{DiskSpec, Job, Offer, Resources};

/// Project a raw offer into the mutable resource budget the matcher
/// consumes across a single offer-handling pass.
pub fn resources_from(offer: &Offer) -> Resources {
    Resources {
        host: offer.host.clone(),
        cpus: offer.cpus,
        mem: offer.mem,
        disks: offer.disks.clone(),
    }
}

/// True when `job` pins a host and `resources` is not that host.
fn host_mismatch(resources: &Resources, job: &Job) -> bool {
    matches!(&job.host, Some(h) if h != &resources.host)
}

/// True when the offer has a large enough (or exactly named) disk set for
/// `spec`, without consuming it.
pub fn has_enough_disks(resources: &Resources, spec: &DiskSpec) -> bool {
    match spec {
        DiskSpec::Count { n } => resources.disks.len() >= *n,
        DiskSpec::Named { names } => names.iter().all(|n| resources.disks.contains(n)),
    }
}

/// Choose which of the offer's disks satisfy `spec`, without mutating
/// `resources`. Count specs take disks in listed order, for deterministic,
/// reproducible placement across retries of the same offer.
pub fn select_disks(resources: &Resources, spec: &DiskSpec) -> Option<Vec<String>> {
    match spec {
        DiskSpec::Count { n } => {
            if resources.disks.len() < *n {
                return None;
            }
            Some(resources.disks[..*n].to_vec())
        }
        DiskSpec::Named { names } => {
            if names.iter().all(|n| resources.disks.contains(n)) {
                Some(names.clone())
            } else {
                None
            }
        }
    }
}

/// Remove `selected` disks from `resources`, consuming them for the
/// remainder of the offer-handling pass.
pub fn remove_disks(resources: &mut Resources, selected: &[String]) {
    resources.disks.retain(|d| !selected.contains(d));
}

/// Whether `resources` currently has enough of everything `job` needs:
/// host affinity, cpu, mem and disks, in that order (spec §4.2 edge cases).
pub fn offer_has_enough_resources(resources: &Resources, job: &Job) -> bool {
    if host_mismatch(resources, job) {
        return false;
    }
    if resources.cpus < job.cpus || resources.mem < job.mem {
        return false;
    }
    has_enough_disks(resources, &job.disks)
}

/// Attempt to place `job` against `resources`. On success, consumes the
/// matched cpu/mem/disks from `resources` in place and returns the disks
/// assigned to the job. Returns `None` (and leaves `resources` untouched)
/// when the job does not fit.
pub fn match_job(resources: &mut Resources, job: &Job) -> Option<Vec<String>> {
    if !offer_has_enough_resources(resources, job) {
        return None;
    }
    let selected = select_disks(resources, &job.disks)?;
    resources.cpus -= job.cpus;
    resources.mem -= job.mem;
    remove_disks(resources, &selected);
    Some(selected)
}
