use crate::peer_connection::sdp::{MediaLine, SessionModel};

const REQUIRES_FINGERPRINT: u8 = 1 << 0;
const REQUIRES_ICE_CREDENTIALS: u8 = 1 << 1;
const REQUIRES_SSRC: u8 = 1 << 2;
const REQUIRES_CNAME: u8 = 1 << 3;

fn requirements(line: &MediaLine) -> u8 {
    let mut pending = 0;
    if line.dtls.fingerprint.is_none() {
        pending |= REQUIRES_FINGERPRINT;
    }
    if !line.ice.has_credentials() {
        pending |= REQUIRES_ICE_CREDENTIALS;
    }
    if line.ssrcs.is_empty() {
        pending |= REQUIRES_SSRC;
    }
    if line.cname.is_none() {
        pending |= REQUIRES_CNAME;
    }
    pending
}

/// CompletionTracker keeps, per local media line, the set of facts the
/// backend still owes, and counts lines with anything outstanding.
#[derive(Default, Debug)]
pub(crate) struct CompletionTracker {
    pending: Vec<u8>,
    incomplete: usize,
}

impl CompletionTracker {
    /// reset recomputes every line of `model`.
    pub(crate) fn reset(&mut self, model: &SessionModel) {
        self.pending = model.media_lines.iter().map(requirements).collect();
        self.incomplete = self.pending.iter().filter(|p| **p != 0).count();
    }

    /// update folds the current facts of line `index` in. It returns true
    /// only on the transition from incomplete to complete.
    pub(crate) fn update(&mut self, index: usize, line: &MediaLine) -> bool {
        let Some(pending) = self.pending.get_mut(index) else {
            return false;
        };

        let was_complete = self.incomplete == 0;
        let before = *pending;
        let after = requirements(line);
        *pending = after;

        match (before != 0, after != 0) {
            (true, false) => self.incomplete -= 1,
            (false, true) => self.incomplete += 1,
            _ => {}
        }

        !was_complete && self.incomplete == 0
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.incomplete == 0
    }
}
