// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job status event handlers.

use pin_core::JobEvent;

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &JobEvent) {
    match event {
        JobEvent::Created { job } => {
            // A live job keeps its record; only a finished one may be replaced
            // by a new run under the same id.
            match state.jobs.get(job.id.as_str()) {
                Some(existing) if !existing.is_terminal() => {}
                _ => {
                    state.jobs.insert(job.id.to_string(), job.clone());
                }
            }
        }

        JobEvent::Transitioned { id, state: next, result, at_ms } => {
            if let Some(job) = state.jobs.get_mut(id.as_str()) {
                if let Err(e) = job.transition(*next, result.clone(), *at_ms) {
                    tracing::warn!(job_id = %id, error = %e, "ignoring replayed transition");
                }
            }
        }

        JobEvent::CancelRequested { id, at_ms } => {
            if let Some(job) = state.jobs.get_mut(id.as_str()) {
                job.request_cancel(*at_ms);
            }
        }

        JobEvent::Deleted { id } => {
            state.jobs.remove(id.as_str());
        }
    }
}
