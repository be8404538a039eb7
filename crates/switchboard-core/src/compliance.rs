// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exclude-from-training compliance headers, one exact mapping per provider
//! family.
//!
//! Every external provider call must carry its family's documented header;
//! local providers carry none. The mapping is a compliance obligation, so it
//! lives in this single module and is referenced by both the provider
//! adapters (which install the header into their default header map) and the
//! registry descriptors (which expose it as routing metadata).

/// Header/value pair asserting the Anthropic API must not train on the
/// request content.
pub const ANTHROPIC_OPT_OUT: CompliancePolicy = CompliancePolicy::TrainingOptOut {
    header: "anthropic-no-training",
    value: "opt-out",
};

/// Header/value pair asserting the OpenAI API must not retain the request
/// content for training.
pub const OPENAI_OPT_OUT: CompliancePolicy = CompliancePolicy::TrainingOptOut {
    header: "openai-data-retention",
    value: "no-train",
};

/// Compliance policy attached to every outbound call for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompliancePolicy {
    /// External provider: attach the exact header/value pair on every call.
    TrainingOptOut {
        header: &'static str,
        value: &'static str,
    },
    /// Local provider: no header required, data never leaves the host.
    NotRequired,
}

impl CompliancePolicy {
    /// The header/value pair to attach, or `None` for local providers.
    pub fn header_pair(&self) -> Option<(&'static str, &'static str)> {
        match self {
            CompliancePolicy::TrainingOptOut { header, value } => Some((header, value)),
            CompliancePolicy::NotRequired => None,
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, CompliancePolicy::TrainingOptOut { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anthropic_mapping_is_exact() {
        assert_eq!(
            ANTHROPIC_OPT_OUT.header_pair(),
            Some(("anthropic-no-training", "opt-out"))
        );
    }

    #[test]
    fn openai_mapping_is_exact() {
        assert_eq!(
            OPENAI_OPT_OUT.header_pair(),
            Some(("openai-data-retention", "no-train"))
        );
    }

    #[test]
    fn local_policy_has_no_header() {
        assert_eq!(CompliancePolicy::NotRequired.header_pair(), None);
        assert!(!CompliancePolicy::NotRequired.is_required());
    }

    #[test]
    fn families_use_distinct_pairs() {
        assert_ne!(
            ANTHROPIC_OPT_OUT.header_pair(),
            OPENAI_OPT_OUT.header_pair()
        );
    }
}
