//! Credential change detection.
//!
//! Decides whether a credential has to be pushed to the Target by comparing
//! the decoded secret against the one last pushed.

use tracing::{debug, warn};

use profile_bridge_core::EncodedCredential;

/// What to do with a user's credential on the create path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialDecision {
    /// Value for the Target's password field; `None` leaves it unchanged.
    pub transmit: Option<String>,
    /// Record to store once the push succeeds.
    pub persist: Option<EncodedCredential>,
}

impl CredentialDecision {
    fn push(transmit: String, credential: &EncodedCredential) -> Self {
        Self {
            transmit: Some(transmit),
            persist: Some(credential.clone()),
        }
    }
}

/// Compare a freshly supplied credential with the last one pushed.
///
/// A credential that cannot be decoded is sent and stored as given. One that
/// decodes to an empty secret leaves the Target's password untouched. A prior
/// record that cannot be decoded counts as no prior record.
#[must_use]
pub fn reconcile_credential(
    supplied: Option<&EncodedCredential>,
    prior: Option<&EncodedCredential>,
) -> CredentialDecision {
    let Some(supplied) = supplied else {
        return CredentialDecision::default();
    };

    let parts = match supplied.decode() {
        Ok(parts) => parts,
        Err(e) => {
            warn!(error = %e, "Credential not decodable, sending it raw");
            return CredentialDecision::push(supplied.as_str().to_owned(), supplied);
        }
    };

    if parts.secret.is_empty() {
        warn!("Credential has an empty secret, leaving password unchanged");
        return CredentialDecision::default();
    }

    let prior_secret = prior.and_then(|prior| match prior.decode() {
        Ok(prior_parts) => Some(prior_parts.secret),
        Err(e) => {
            warn!(error = %e, "Stored credential not decodable, ignoring it");
            None
        }
    });

    if prior_secret.as_deref() == Some(parts.secret.as_str()) {
        debug!("Credential unchanged since last push");
        return CredentialDecision::default();
    }

    CredentialDecision::push(parts.secret, supplied)
}
