use serde::{Deserialize, Serialize};
use tracing::debug;

/// Token a reviewer uses to accept an artifact
pub const ACCEPT_TOKEN: &str = "APPROVED";
/// Token a reviewer uses to ask for another round
pub const CHANGES_TOKEN: &str = "CHANGES_REQUESTED";

/// The critic's decision in the convergence loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticVerdict {
    Approved,
    ChangesRequested,
}

impl CriticVerdict {
    /// Classify a critic response by its leading token.
    ///
    /// Only a response that begins with the accept token (ignoring case and
    /// leading whitespace) approves. Anything else, including text with no
    /// recognizable verdict, is a change request.
    pub fn from_leading_token(response: &str) -> Self {
        let approved = response
            .trim_start()
            .get(..ACCEPT_TOKEN.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(ACCEPT_TOKEN));

        debug!(approved, response_len = response.len(), "Classified critic verdict");

        if approved {
            CriticVerdict::Approved
        } else {
            CriticVerdict::ChangesRequested
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, CriticVerdict::Approved)
    }

    pub fn short_description(&self) -> &'static str {
        match self {
            CriticVerdict::Approved => "APPROVED",
            CriticVerdict::ChangesRequested => "CHANGES_REQUESTED",
        }
    }
}

/// Verdict rule for synthesized and single-shot reviews: the text mentions the
/// accept token and never mentions the change token. Case-sensitive.
pub fn synthesis_approved(text: &str) -> bool {
    text.contains(ACCEPT_TOKEN) && !text.contains(CHANGES_TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_token_approves() {
        assert!(CriticVerdict::from_leading_token("APPROVED - ship it").is_approved());
        assert!(CriticVerdict::from_leading_token("  \n approved.").is_approved());
    }

    #[test]
    fn test_token_elsewhere_does_not_approve() {
        let v = CriticVerdict::from_leading_token("This will be APPROVED once tests pass");
        assert_eq!(v, CriticVerdict::ChangesRequested);
    }

    #[test]
    fn test_unrecognized_response_is_change_request() {
        assert_eq!(
            CriticVerdict::from_leading_token("Looks fine to me"),
            CriticVerdict::ChangesRequested
        );
        assert_eq!(
            CriticVerdict::from_leading_token(""),
            CriticVerdict::ChangesRequested
        );
        assert_eq!(
            CriticVerdict::from_leading_token("APPR"),
            CriticVerdict::ChangesRequested
        );
    }

    #[test]
    fn test_multibyte_prefix_does_not_panic() {
        assert_eq!(
            CriticVerdict::from_leading_token("✅✅✅ APPROVED"),
            CriticVerdict::ChangesRequested
        );
    }

    #[test]
    fn test_synthesis_rule() {
        assert!(synthesis_approved("**APPROVED** no blocking issues"));
        assert!(!synthesis_approved(
            "**CHANGES_REQUESTED** - nothing would be APPROVED as is"
        ));
        assert!(!synthesis_approved("Looks good"));
        assert!(!synthesis_approved("approved"));
    }
}
