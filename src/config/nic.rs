//! NIC eligibility decisions from allow/deny rules.

use super::spec::{NicFilterSpec, NicRule};

/// Precedence used when a NIC matches both an allow and a deny rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NicPolicy {
    /// Any matching deny rule rejects the NIC.
    #[default]
    DenyWins,
    /// A rule naming the exact model beats a vendor wildcard; ties deny.
    MostSpecificWins,
}

/// How closely a rule matches a NIC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Specificity {
    Vendor,
    Model,
}

impl NicRule {
    /// Returns true if the rule matches the given vendor and model.
    ///
    /// Comparison is ASCII case-insensitive; an empty rule model is a
    /// wildcard.
    #[must_use]
    pub fn matches(&self, vendor: &str, model: &str) -> bool {
        self.specificity(vendor, model).is_some()
    }

    fn specificity(&self, vendor: &str, model: &str) -> Option<Specificity> {
        if !self.vendor.eq_ignore_ascii_case(vendor) {
            return None;
        }
        if self.model.is_empty() {
            Some(Specificity::Vendor)
        } else if self.model.eq_ignore_ascii_case(model) {
            Some(Specificity::Model)
        } else {
            None
        }
    }
}

impl NicFilterSpec {
    /// Decides whether a NIC may be offered to the operator.
    ///
    /// An empty allow list admits every NIC that is not denied.
    #[must_use]
    pub fn permits(&self, vendor: &str, model: &str, policy: NicPolicy) -> bool {
        let allow = best_match(&self.allowed, vendor, model);
        let deny = best_match(&self.denied, vendor, model);

        match (allow, deny) {
            (_, None) => allow.is_some() || self.allowed.is_empty(),
            (None, Some(_)) => false,
            (Some(allow), Some(deny)) => match policy {
                NicPolicy::DenyWins => false,
                NicPolicy::MostSpecificWins => allow > deny,
            },
        }
    }
}

fn best_match(rules: &[NicRule], vendor: &str, model: &str) -> Option<Specificity> {
    rules.iter().filter_map(|r| r.specificity(vendor, model)).max()
}
