//! Status actions - 現在の状態から選べる操作
//!
//! 遷移表（`ProductStatus::allowed_transitions`）をそのまま操作の一覧にします。

use std::fmt;

use crate::domain::ProductStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusAction {
    pub from: ProductStatus,
    pub to: ProductStatus,
    pub label: &'static str,
}

impl fmt::Display for StatusAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} → {})", self.label, self.from, self.to)
    }
}

fn label(from: ProductStatus, to: ProductStatus) -> &'static str {
    match (from, to) {
        (ProductStatus::Available, ProductStatus::Sold) => "Mark as sold",
        (ProductStatus::Available, ProductStatus::Cancelled) => "Deactivate listing",
        (ProductStatus::Sold, ProductStatus::Available) => "Unmark as sold",
        (ProductStatus::Cancelled, ProductStatus::Available) => "Reactivate listing",
        _ => "Change status",
    }
}

/// The legal next statuses of `status`, in table order.
pub fn status_actions(status: ProductStatus) -> Vec<StatusAction> {
    status
        .allowed_transitions()
        .iter()
        .map(|&to| StatusAction {
            from: status,
            to,
            label: label(status, to),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::available(ProductStatus::Available, vec![ProductStatus::Sold, ProductStatus::Cancelled])]
    #[case::sold(ProductStatus::Sold, vec![ProductStatus::Available])]
    #[case::cancelled(ProductStatus::Cancelled, vec![ProductStatus::Available])]
    fn offers_exactly_the_legal_targets(
        #[case] status: ProductStatus,
        #[case] expected: Vec<ProductStatus>,
    ) {
        let targets: Vec<_> = status_actions(status).iter().map(|a| a.to).collect();
        assert_eq!(targets, expected);
    }

    #[test]
    fn every_table_entry_has_its_own_label() {
        for status in ProductStatus::ALL {
            for action in status_actions(status) {
                assert_ne!(action.label, "Change status", "{action:?}");
                assert_eq!(action.from, status);
            }
        }
    }

    #[test]
    fn display_names_both_ends() {
        let action = status_actions(ProductStatus::Sold)[0];
        assert_eq!(action.to_string(), "Unmark as sold (sold → available)");
    }
}
