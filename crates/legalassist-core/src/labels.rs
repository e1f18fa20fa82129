//! Fixed label lookups for tier and confidence values.
//!
//! Every lookup is total: unknown values fall back to a generic label
//! instead of failing.

use crate::types::{Confidence, Tier};

/// Generic label for tiers the client does not know.
pub const STANDARD_TIER_LABEL: &str = "Standard Legal Info";

/// Visual weight of a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeVariant {
    Destructive,
    Secondary,
    Outline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierBadge {
    pub label: &'static str,
    pub variant: BadgeVariant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceBadge {
    pub level: ConfidenceLevel,
    pub label: &'static str,
    pub description: &'static str,
}

pub fn tier_badge(tier: &Tier) -> TierBadge {
    match tier {
        Tier::Tier1 => TierBadge {
            label: "Tier 1: Procedural (Urgent)",
            variant: BadgeVariant::Destructive,
        },
        Tier::Tier2Evidence => TierBadge {
            label: "Tier 2: Evidence Manual",
            variant: BadgeVariant::Secondary,
        },
        Tier::Tier2Compensation => TierBadge {
            label: "Tier 2: Compensation",
            variant: BadgeVariant::Secondary,
        },
        Tier::Tier3 => TierBadge {
            label: "Tier 3: General Procedure",
            variant: BadgeVariant::Outline,
        },
        Tier::Standard | Tier::Other(_) => TierBadge {
            label: STANDARD_TIER_LABEL,
            variant: BadgeVariant::Outline,
        },
    }
}

/// Badge for a confidence value; `None` for values the client does not know.
pub fn confidence_badge(confidence: &Confidence) -> Option<ConfidenceBadge> {
    match confidence {
        Confidence::High => Some(ConfidenceBadge {
            level: ConfidenceLevel::High,
            label: "High Confidence",
            description: "Verified against explicit SOPs/BNS sections.",
        }),
        Confidence::Medium => Some(ConfidenceBadge {
            level: ConfidenceLevel::Medium,
            label: "Medium Confidence",
            description: "Based on general legal principles; specifics may vary.",
        }),
        Confidence::Low => Some(ConfidenceBadge {
            level: ConfidenceLevel::Low,
            label: "Low Confidence",
            description: "Requires further verification. Consult a lawyer.",
        }),
        Confidence::Other(_) => None,
    }
}

/// `"pre_fir"` → `"pre fir"`.
pub fn stage_label(stage: &str) -> String {
    stage.replace('_', " ")
}

/// `"sop_manual"` → `"SOP MANUAL"`; empty input yields `"SOURCE"`.
pub fn source_type_label(source_type: &str) -> String {
    if source_type.trim().is_empty() {
        return "SOURCE".to_string();
    }
    source_type.replace('_', " ").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_labels() {
        assert_eq!(tier_badge(&Tier::Tier1).label, "Tier 1: Procedural (Urgent)");
        assert_eq!(tier_badge(&Tier::Tier1).variant, BadgeVariant::Destructive);
        assert_eq!(tier_badge(&Tier::Tier2Evidence).label, "Tier 2: Evidence Manual");
        assert_eq!(tier_badge(&Tier::Tier3).variant, BadgeVariant::Outline);
    }

    #[test]
    fn unknown_tier_falls_back() {
        let badge = tier_badge(&Tier::from("tier7_unheard_of"));
        assert_eq!(badge.label, STANDARD_TIER_LABEL);
        assert_eq!(tier_badge(&Tier::from("")).label, STANDARD_TIER_LABEL);
    }

    #[test]
    fn confidence_labels() {
        assert_eq!(confidence_badge(&Confidence::Medium).unwrap().label, "Medium Confidence");
        assert_eq!(
            confidence_badge(&Confidence::Low).unwrap().level,
            ConfidenceLevel::Low
        );
        assert!(confidence_badge(&Confidence::from("certain-ish")).is_none());
    }

    #[test]
    fn stage_and_source_labels() {
        assert_eq!(stage_label("pre_fir"), "pre fir");
        assert_eq!(source_type_label("sop_manual"), "SOP MANUAL");
        assert_eq!(source_type_label(""), "SOURCE");
    }
}
